#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use framecap::{
    CancelToken, ChunkEncoder, CodecDescriptor, Decoder, DecodeService, EncoderConfig,
    EncoderFactory, FrameRGBA, FramecapError, FramecapResult, MediaInfo, SeekSignal, SourceInput,
    SyntheticSource,
};

/// Synthetic source input; frames carry `tag` and their timestamp in the pixels.
pub fn synthetic(name: &str, width: u32, height: u32, duration_secs: f64, tag: u8) -> SourceInput {
    SyntheticSource {
        width,
        height,
        duration_secs,
        tag,
    }
    .to_input(name)
    .unwrap()
}

/// Decode service over [`SyntheticSource`] inputs with scripted misbehaviour.
#[derive(Clone, Default)]
pub struct ScriptedDecodeService {
    /// Seeks from this index on never report.
    pub stall_from: Option<usize>,
    /// Cancel this token when the n-th seek is requested.
    pub cancel_at: Option<(usize, CancelToken)>,
    /// Seeks requested and abandoned, across all decoders.
    pub log: Arc<Mutex<SeekLog>>,
}

#[derive(Debug, Default)]
pub struct SeekLog {
    pub requested: Vec<f64>,
    pub abandoned: usize,
    pub open: usize,
}

impl DecodeService for ScriptedDecodeService {
    fn open(&self, input: &SourceInput) -> FramecapResult<Box<dyn Decoder>> {
        let source: SyntheticSource = serde_json::from_slice(&input.bytes)
            .map_err(|e| FramecapError::unsupported(e.to_string()))?;
        self.log.lock().unwrap().open += 1;
        Ok(Box::new(ScriptedDecoder {
            source,
            script: self.clone(),
            seeks: 0,
            stalled: Vec::new(),
        }))
    }
}

struct ScriptedDecoder {
    source: SyntheticSource,
    script: ScriptedDecodeService,
    seeks: usize,
    stalled: Vec<SeekSignal>,
}

impl Decoder for ScriptedDecoder {
    fn info(&self) -> MediaInfo {
        MediaInfo {
            width: self.source.width,
            height: self.source.height,
            duration_secs: self.source.duration_secs,
        }
    }

    fn request_seek(&mut self, signal: SeekSignal) {
        let n = self.seeks;
        self.seeks += 1;
        self.script
            .log
            .lock()
            .unwrap()
            .requested
            .push(signal.target_secs());

        if let Some((at, token)) = &self.script.cancel_at
            && *at == n
        {
            token.cancel();
        }
        if self.script.stall_from.is_some_and(|from| n >= from) {
            self.stalled.push(signal);
            return;
        }
        match self.source.render(signal.target_secs()) {
            Ok(frame) => signal.complete(frame),
            Err(e) => signal.fail(e.to_string()),
        }
    }

    fn abandon_seek(&mut self) {
        self.script.log.lock().unwrap().abandoned += 1;
        self.stalled.clear();
    }
}

impl Drop for ScriptedDecoder {
    fn drop(&mut self) {
        self.script.log.lock().unwrap().open -= 1;
    }
}

/// One frame as seen by a [`RecordingFactory`] encoder.
#[derive(Clone, Debug, PartialEq)]
pub struct Recorded {
    pub timestamp_secs: f64,
    pub width: u32,
    pub height: u32,
    /// Synthetic tag and timestamp read back from the center pixel.
    pub tag: u8,
    pub drawn_secs: f64,
    /// Top-left pixel.
    pub corner: [u8; 4],
}

/// Encoder factory that records every frame; each frame becomes one 8-byte chunk.
#[derive(Clone)]
pub struct RecordingFactory {
    /// Codec names that can be constructed.
    pub available: Vec<String>,
    /// Fail `encode_frame` on this frame index.
    pub fail_at: Option<usize>,
    pub frames: Arc<Mutex<Vec<Recorded>>>,
    pub created: Arc<Mutex<Vec<CodecDescriptor>>>,
    pub finished: Arc<Mutex<usize>>,
}

impl RecordingFactory {
    pub fn new(available: &[&str]) -> Self {
        Self {
            available: available.iter().map(|s| s.to_string()).collect(),
            fail_at: None,
            frames: Arc::default(),
            created: Arc::default(),
            finished: Arc::default(),
        }
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.frames.lock().unwrap().clone()
    }
}

impl EncoderFactory for RecordingFactory {
    fn create(
        &self,
        codec: &CodecDescriptor,
        _cfg: &EncoderConfig,
    ) -> FramecapResult<Box<dyn ChunkEncoder>> {
        if !self.available.iter().any(|n| *n == codec.name) {
            return Err(FramecapError::codec_unavailable(format!(
                "{codec} is not installed"
            )));
        }
        self.created.lock().unwrap().push(codec.clone());
        Ok(Box::new(RecordingEncoder {
            factory: self.clone(),
            count: 0,
        }))
    }
}

struct RecordingEncoder {
    factory: RecordingFactory,
    count: usize,
}

impl ChunkEncoder for RecordingEncoder {
    fn encode_frame(
        &mut self,
        timestamp_secs: f64,
        frame: &FrameRGBA,
    ) -> FramecapResult<Vec<Vec<u8>>> {
        if self.factory.fail_at == Some(self.count) {
            return Err(FramecapError::validation("encoder rejected frame"));
        }
        self.count += 1;
        let center = frame
            .pixel(frame.width / 2, frame.height / 2)
            .unwrap_or([0; 4]);
        let (tag, drawn_secs) = SyntheticSource::decode_pixel(center);
        let corner = frame.pixel(0, 0).unwrap_or([0; 4]);
        self.factory.frames.lock().unwrap().push(Recorded {
            timestamp_secs,
            width: frame.width,
            height: frame.height,
            tag,
            drawn_secs,
            corner,
        });
        Ok(vec![timestamp_secs.to_le_bytes().to_vec()])
    }

    fn finish(&mut self) -> FramecapResult<Vec<Vec<u8>>> {
        *self.factory.finished.lock().unwrap() += 1;
        Ok(Vec::new())
    }
}
