use std::sync::{Arc, Mutex};

use super::*;
use crate::encode::codec::Container;
use crate::foundation::core::{Dimensions, Fps};

#[derive(Default)]
struct Log {
    frames: Vec<f64>,
    finished: bool,
}

struct Recording {
    log: Arc<Mutex<Log>>,
    fail_at: Option<usize>,
}

impl ChunkEncoder for Recording {
    fn encode_frame(&mut self, ts: f64, frame: &FrameRGBA) -> FramecapResult<Vec<Vec<u8>>> {
        let mut log = self.log.lock().unwrap();
        if self.fail_at == Some(log.frames.len()) {
            return Err(FramecapError::validation("scripted failure"));
        }
        log.frames.push(ts);
        // Odd frames produce no output, even frames one fragment.
        if log.frames.len() % 2 == 0 {
            Ok(vec![Vec::new()])
        } else {
            Ok(vec![frame.data[..4].to_vec()])
        }
    }

    fn finish(&mut self) -> FramecapResult<Vec<Vec<u8>>> {
        self.log.lock().unwrap().finished = true;
        Ok(vec![b"tail".to_vec()])
    }
}

struct Factory {
    log: Arc<Mutex<Log>>,
    available: Vec<&'static str>,
    fail_at: Option<usize>,
}

impl Factory {
    fn new(available: &[&'static str]) -> Self {
        Self {
            log: Arc::default(),
            available: available.to_vec(),
            fail_at: None,
        }
    }
}

impl EncoderFactory for Factory {
    fn create(
        &self,
        codec: &CodecDescriptor,
        _cfg: &EncoderConfig,
    ) -> FramecapResult<Box<dyn ChunkEncoder>> {
        if !self.available.contains(&codec.name.as_str()) {
            return Err(FramecapError::codec_unavailable(format!("no {}", codec.name)));
        }
        Ok(Box::new(Recording {
            log: self.log.clone(),
            fail_at: self.fail_at,
        }))
    }
}

fn cfg() -> EncoderConfig {
    EncoderConfig {
        dims: Dimensions::new(2, 2).unwrap(),
        fps: Fps::new(10, 1).unwrap(),
    }
}

fn frame(v: u8) -> FrameRGBA {
    FrameRGBA::from_raw(2, 2, [v, v, v, 255].repeat(4)).unwrap()
}

fn opts(capacity: usize) -> SessionOpts {
    SessionOpts {
        channel_capacity: capacity,
        ..SessionOpts::default()
    }
}

#[test]
fn falls_back_to_next_codec() {
    let factory = Factory::new(&["vp8"]);
    let session =
        EncoderSession::start(&factory, &CodecList::default(), cfg(), opts(2)).unwrap();
    assert_eq!(session.codec(), &CodecDescriptor::vp8());
}

#[test]
fn exhausted_list_is_codec_unavailable() {
    let factory = Factory::new(&[]);
    let err = EncoderSession::start(&factory, &CodecList::default(), cfg(), opts(2)).unwrap_err();
    let FramecapError::CodecUnavailable(msg) = err else {
        panic!("unexpected error: {err}");
    };
    assert!(msg.contains("vp9/webm"));
    assert!(msg.contains("y4m/y4m"));
}

#[test]
fn chunks_are_ordered_and_contiguous() {
    let factory = Factory::new(&["vp9"]);
    let mut session =
        EncoderSession::start(&factory, &CodecList::default(), cfg(), opts(1)).unwrap();
    for i in 0..5u8 {
        session.ingest(f64::from(i) * 0.1, frame(i)).unwrap();
    }
    assert_eq!(session.frames_ingested(), 5);

    let stream = session.stop().unwrap();
    assert_eq!(stream.frames, 5);
    // Frames 0, 2, 4 produce data; the rest are empty and skipped; plus the tail.
    assert_eq!(stream.chunks.len(), 4);
    for (i, c) in stream.chunks.iter().enumerate() {
        assert_eq!(c.seq, i as u64);
    }
    assert_eq!(stream.chunks[1].data, vec![2, 2, 2, 255]);
    assert_eq!(stream.chunks[3].data, b"tail".to_vec());
    assert!(factory.log.lock().unwrap().finished);
    assert_eq!(factory.log.lock().unwrap().frames.len(), 5);

    let total = stream.total_bytes();
    assert_eq!(stream.into_bytes().len(), total);
}

#[test]
fn rejects_wrong_size_and_out_of_order_frames() {
    let factory = Factory::new(&["vp9"]);
    let mut session =
        EncoderSession::start(&factory, &CodecList::default(), cfg(), opts(2)).unwrap();
    let big = FrameRGBA::from_raw(3, 3, vec![0; 36]).unwrap();
    assert!(matches!(
        session.ingest(0.0, big),
        Err(FramecapError::Validation(_))
    ));
    session.ingest(1.0, frame(1)).unwrap();
    assert!(matches!(
        session.ingest(0.5, frame(2)),
        Err(FramecapError::Validation(_))
    ));
    session.ingest(1.0, frame(3)).unwrap();
    assert_eq!(session.stop().unwrap().frames, 2);
}

#[test]
fn encoder_failure_surfaces_as_flush_failure() {
    let mut factory = Factory::new(&["y4m"]);
    factory.fail_at = Some(1);
    let codecs = CodecList::new(vec![CodecDescriptor::new("y4m", Container::Y4m)]).unwrap();
    let mut session = EncoderSession::start(&factory, &codecs, cfg(), opts(1)).unwrap();

    // The worker dies on the second frame; later sends observe it either at ingest or at stop.
    let mut failed = None;
    for i in 0..6u8 {
        if let Err(e) = session.ingest(f64::from(i), frame(i)) {
            failed = Some(e);
            break;
        }
    }
    let err = match failed {
        Some(e) => e,
        None => session.stop().unwrap_err(),
    };
    let FramecapError::EncodeFlushFailed(msg) = err else {
        panic!("unexpected error: {err}");
    };
    assert!(msg.contains("scripted failure"));
}

#[test]
fn dropping_a_session_joins_the_worker() {
    let factory = Factory::new(&["vp9"]);
    let mut session =
        EncoderSession::start(&factory, &CodecList::default(), cfg(), opts(1)).unwrap();
    session.ingest(0.0, frame(0)).unwrap();
    drop(session);
    assert!(factory.log.lock().unwrap().finished);
}
