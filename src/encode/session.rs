use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::encode::codec::{CodecDescriptor, CodecList};
use crate::encode::sink::{ChunkEncoder, EncodedChunk, EncoderConfig, EncoderFactory};
use crate::foundation::error::{FramecapError, FramecapResult};
use crate::raster::frame::FrameRGBA;

/// Options controlling an [`EncoderSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionOpts {
    /// Bounded channel capacity between the producer and the encoder thread.
    pub channel_capacity: usize,
    /// Wait before closing the feed on stop.
    pub settle: Duration,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            channel_capacity: 4,
            settle: Duration::ZERO,
        }
    }
}

/// Ordered encoder output returned by [`EncoderSession::stop`].
#[derive(Clone, Debug)]
pub struct EncodedStream {
    /// Codec that produced the stream.
    pub codec: CodecDescriptor,
    /// Session geometry and rate.
    pub config: EncoderConfig,
    /// Chunks in stream order.
    pub chunks: Vec<EncodedChunk>,
    /// Frames consumed by the encoder.
    pub frames: u64,
}

impl EncodedStream {
    /// Total encoded size in bytes.
    pub fn total_bytes(&self) -> usize {
        self.chunks.iter().map(|c| c.data.len()).sum()
    }

    /// Concatenate all chunks in order.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.total_bytes());
        for c in self.chunks {
            out.extend_from_slice(&c.data);
        }
        out
    }
}

enum EncoderMessage {
    Frame { timestamp_secs: f64, frame: FrameRGBA },
}

#[derive(Default)]
struct EncoderOutput {
    chunks: Vec<EncodedChunk>,
    frames: u64,
}

impl EncoderOutput {
    fn append(&mut self, timestamp_secs: f64, fragments: Vec<Vec<u8>>) {
        for data in fragments.into_iter().filter(|d| !d.is_empty()) {
            let seq = self.chunks.len() as u64;
            self.chunks.push(EncodedChunk {
                seq,
                timestamp_secs,
                data,
            });
        }
    }
}

/// Long-lived encoder sink fed with owned frame copies.
///
/// The session owns one encoder thread fed through a bounded channel. A full channel blocks the
/// producer, so a frame is never overwritten before the encoder has read it. Chunks are appended
/// strictly in arrival order.
pub struct EncoderSession {
    codec: CodecDescriptor,
    cfg: EncoderConfig,
    opts: SessionOpts,

    tx: Option<mpsc::SyncSender<EncoderMessage>>,
    worker: Option<JoinHandle<FramecapResult<EncoderOutput>>>,

    frames_sent: u64,
    last_ts: Option<f64>,
}

impl std::fmt::Debug for EncoderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderSession")
            .field("codec", &self.codec)
            .field("cfg", &self.cfg)
            .field("frames_sent", &self.frames_sent)
            .field("running", &self.worker.is_some())
            .finish()
    }
}

impl EncoderSession {
    /// Start a session with the first codec in `codecs` that `factory` can construct.
    ///
    /// Fails with [`FramecapError::CodecUnavailable`] when every codec fails.
    pub fn start(
        factory: &dyn EncoderFactory,
        codecs: &CodecList,
        cfg: EncoderConfig,
        opts: SessionOpts,
    ) -> FramecapResult<Self> {
        let mut failures = Vec::new();
        for codec in codecs {
            match factory.create(codec, &cfg) {
                Ok(encoder) => {
                    if !failures.is_empty() {
                        tracing::warn!(%codec, skipped = failures.len(), "using fallback codec");
                    }
                    return Self::spawn(codec.clone(), cfg, opts, encoder);
                }
                Err(e) => {
                    tracing::warn!(%codec, "codec unavailable: {e}");
                    failures.push(format!("{codec}: {e}"));
                }
            }
        }

        Err(FramecapError::codec_unavailable(if failures.is_empty() {
            "codec list is empty".to_string()
        } else {
            failures.join("; ")
        }))
    }

    fn spawn(
        codec: CodecDescriptor,
        cfg: EncoderConfig,
        opts: SessionOpts,
        encoder: Box<dyn ChunkEncoder>,
    ) -> FramecapResult<Self> {
        let (tx, rx) = mpsc::sync_channel::<EncoderMessage>(opts.channel_capacity.max(1));
        let worker = std::thread::Builder::new()
            .name("framecap-encoder".into())
            .spawn(move || encoder_thread_main(rx, encoder))
            .map_err(|e| anyhow::anyhow!("failed to spawn encoder thread: {e}"))?;

        tracing::info!(%codec, dims = %cfg.dims, fps = %cfg.fps, "encoder session started");
        Ok(Self {
            codec,
            cfg,
            opts,
            tx: Some(tx),
            worker: Some(worker),
            frames_sent: 0,
            last_ts: None,
        })
    }

    /// Codec the session settled on.
    pub fn codec(&self) -> &CodecDescriptor {
        &self.codec
    }

    /// Session geometry and rate.
    pub fn config(&self) -> &EncoderConfig {
        &self.cfg
    }

    /// Frames handed to the encoder so far.
    pub fn frames_ingested(&self) -> u64 {
        self.frames_sent
    }

    /// Hand one frame to the encoder. Blocks while the channel is full.
    ///
    /// Frames must match the session size and arrive with non-decreasing timestamps.
    pub fn ingest(&mut self, timestamp_secs: f64, frame: FrameRGBA) -> FramecapResult<()> {
        if frame.dimensions() != self.cfg.dims {
            return Err(FramecapError::validation(format!(
                "frame size {} does not match session size {}",
                frame.dimensions(),
                self.cfg.dims
            )));
        }
        if let Some(last) = self.last_ts
            && timestamp_secs < last
        {
            return Err(FramecapError::validation(format!(
                "out-of-order frame: {timestamp_secs:.3}s after {last:.3}s"
            )));
        }

        let Some(tx) = self.tx.as_ref() else {
            return Err(FramecapError::flush("encoder session is already stopped"));
        };
        if tx
            .send(EncoderMessage::Frame {
                timestamp_secs,
                frame,
            })
            .is_err()
        {
            return Err(self.worker_failure());
        }

        self.frames_sent += 1;
        self.last_ts = Some(timestamp_secs);
        Ok(())
    }

    /// Close the feed, wait for the final flush and return the ordered stream.
    ///
    /// Any encoder failure is reported as [`FramecapError::EncodeFlushFailed`]; partial output
    /// is discarded.
    pub fn stop(mut self) -> FramecapResult<EncodedStream> {
        if !self.opts.settle.is_zero() {
            std::thread::sleep(self.opts.settle);
        }
        drop(self.tx.take());

        let worker = self
            .worker
            .take()
            .ok_or_else(|| FramecapError::flush("encoder session is already stopped"))?;
        let out = worker
            .join()
            .map_err(|_| FramecapError::flush("encoder thread panicked"))?
            .map_err(as_flush_failure)?;

        if out.frames != self.frames_sent {
            return Err(FramecapError::flush(format!(
                "encoder consumed {} of {} frames",
                out.frames, self.frames_sent
            )));
        }
        if let Some((i, c)) = out
            .chunks
            .iter()
            .enumerate()
            .find(|(i, c)| c.seq != *i as u64)
        {
            return Err(FramecapError::flush(format!(
                "chunk sequence gap at {i} (found {})",
                c.seq
            )));
        }

        tracing::info!(
            codec = %self.codec,
            frames = out.frames,
            chunks = out.chunks.len(),
            "encoder session stopped"
        );
        Ok(EncodedStream {
            codec: self.codec.clone(),
            config: self.cfg,
            chunks: out.chunks,
            frames: out.frames,
        })
    }

    fn worker_failure(&mut self) -> FramecapError {
        drop(self.tx.take());
        match self.worker.take().map(JoinHandle::join) {
            Some(Ok(Err(e))) => as_flush_failure(e),
            Some(Err(_)) => FramecapError::flush("encoder thread panicked"),
            _ => FramecapError::flush("encoder thread is not accepting frames"),
        }
    }
}

impl Drop for EncoderSession {
    fn drop(&mut self) {
        drop(self.tx.take());
        if let Some(worker) = self.worker.take() {
            tracing::debug!(codec = %self.codec, "discarding unfinished encoder session");
            let _ = worker.join();
        }
    }
}

fn as_flush_failure(e: FramecapError) -> FramecapError {
    match e {
        FramecapError::EncodeFlushFailed(_) => e,
        other => FramecapError::flush(other.to_string()),
    }
}

fn encoder_thread_main(
    rx: mpsc::Receiver<EncoderMessage>,
    mut encoder: Box<dyn ChunkEncoder>,
) -> FramecapResult<EncoderOutput> {
    let mut out = EncoderOutput::default();
    let mut last_ts = 0.0;

    while let Ok(msg) = rx.recv() {
        match msg {
            EncoderMessage::Frame {
                timestamp_secs,
                frame,
            } => {
                let fragments = encoder.encode_frame(timestamp_secs, &frame)?;
                out.append(timestamp_secs, fragments);
                out.frames += 1;
                last_ts = timestamp_secs;
            }
        }
    }

    let tail = encoder.finish()?;
    out.append(last_ts, tail);
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/session.rs"]
mod tests;
