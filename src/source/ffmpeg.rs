use std::path::PathBuf;

use crate::foundation::error::FramecapResult;
use crate::source::decoder::{DecodeService, Decoder, SourceInput};

/// Decode service backed by the system `ffprobe` / `ffmpeg` binaries.
///
/// Input bytes are spooled to a temp file that lives as long as the decoder. Each seek runs one
/// `ffmpeg` process on a worker thread that decodes a single RGBA frame at the target time; an
/// abandoned seek kills that process.
#[derive(Clone, Debug)]
pub struct FfmpegDecodeService {
    /// `ffmpeg` executable.
    pub ffmpeg: PathBuf,
    /// `ffprobe` executable.
    pub ffprobe: PathBuf,
}

impl Default for FfmpegDecodeService {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

#[cfg(feature = "media-ffmpeg")]
impl DecodeService for FfmpegDecodeService {
    fn open(&self, input: &SourceInput) -> FramecapResult<Box<dyn Decoder>> {
        let tmp = crate::foundation::tools::TempFileGuard::write("framecap_src", &input.bytes)?;
        let path = tmp
            .path()
            .map(std::path::Path::to_path_buf)
            .ok_or_else(|| anyhow::anyhow!("temp file path missing (unexpected)"))?;
        let probed = imp::probe(&self.ffprobe, &path, &input.name)?;
        Ok(Box::new(imp::FfmpegDecoder::new(
            self.ffmpeg.clone(),
            path,
            tmp,
            probed,
        )))
    }
}

#[cfg(not(feature = "media-ffmpeg"))]
impl DecodeService for FfmpegDecodeService {
    fn open(&self, input: &SourceInput) -> FramecapResult<Box<dyn Decoder>> {
        Err(crate::foundation::error::FramecapError::unsupported(format!(
            "decoding '{}' requires the 'media-ffmpeg' feature",
            input.name
        )))
    }
}

#[cfg(feature = "media-ffmpeg")]
mod imp {
    use std::io::Read;
    use std::path::{Path, PathBuf};
    use std::process::{Command, Stdio};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread::JoinHandle;
    use std::time::Duration;

    use crate::foundation::error::{FramecapError, FramecapResult};
    use crate::foundation::tools::TempFileGuard;
    use crate::raster::frame::FrameRGBA;
    use crate::source::decoder::{Decoder, MediaInfo, SeekSignal};

    const POLL_INTERVAL: Duration = Duration::from_millis(5);
    const DEFAULT_FRAME_STEP_SECS: f64 = 1.0 / 30.0;

    pub(super) struct Probed {
        info: MediaInfo,
        frame_step_secs: f64,
    }

    pub(super) fn probe(ffprobe: &Path, path: &Path, name: &str) -> FramecapResult<Probed> {
        #[derive(serde::Deserialize)]
        struct ProbeStream {
            codec_type: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
            duration: Option<String>,
            avg_frame_rate: Option<String>,
        }
        #[derive(serde::Deserialize)]
        struct ProbeFormat {
            duration: Option<String>,
        }
        #[derive(serde::Deserialize)]
        struct ProbeOut {
            #[serde(default)]
            streams: Vec<ProbeStream>,
            format: Option<ProbeFormat>,
        }

        let out = Command::new(ffprobe)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .output()
            .map_err(|e| anyhow::anyhow!("failed to run ffprobe (is it on PATH?): {e}"))?;
        if !out.status.success() {
            return Err(FramecapError::unsupported(format!(
                "ffprobe rejected '{name}': {}",
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
            .map_err(|e| FramecapError::unsupported(format!("ffprobe json parse failed: {e}")))?;
        let video = parsed
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| FramecapError::unsupported(format!("'{name}' has no video stream")))?;
        let width = video
            .width
            .ok_or_else(|| FramecapError::unsupported("missing video width from ffprobe"))?;
        let height = video
            .height
            .ok_or_else(|| FramecapError::unsupported("missing video height from ffprobe"))?;
        let duration_secs = video
            .duration
            .as_deref()
            .or(parsed.format.as_ref().and_then(|f| f.duration.as_deref()))
            .and_then(|d| d.trim().parse::<f64>().ok())
            .ok_or_else(|| FramecapError::unsupported(format!("'{name}' has no duration")))?;
        let frame_step_secs = video
            .avg_frame_rate
            .as_deref()
            .and_then(parse_rate)
            .map(|fps| 1.0 / fps)
            .unwrap_or(DEFAULT_FRAME_STEP_SECS);

        Ok(Probed {
            info: MediaInfo {
                width,
                height,
                duration_secs,
            },
            frame_step_secs,
        })
    }

    fn parse_rate(s: &str) -> Option<f64> {
        let (num, den) = s.split_once('/').unwrap_or((s, "1"));
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        (num > 0.0 && den > 0.0).then(|| num / den)
    }

    struct PendingSeek {
        cancel: Arc<AtomicBool>,
        handle: JoinHandle<()>,
    }

    pub(super) struct FfmpegDecoder {
        ffmpeg: PathBuf,
        path: PathBuf,
        probed: Probed,
        pending: Option<PendingSeek>,
        // Dropped after `pending` is joined (see `Drop`).
        _tmp: TempFileGuard,
    }

    impl FfmpegDecoder {
        pub(super) fn new(
            ffmpeg: PathBuf,
            path: PathBuf,
            tmp: TempFileGuard,
            probed: Probed,
        ) -> Self {
            Self {
                ffmpeg,
                path,
                probed,
                pending: None,
                _tmp: tmp,
            }
        }
    }

    impl Decoder for FfmpegDecoder {
        fn info(&self) -> MediaInfo {
            self.probed.info
        }

        fn request_seek(&mut self, signal: SeekSignal) {
            self.abandon_seek();

            // A seek exactly at the end of the stream decodes nothing; aim at the last frame.
            let last_frame_at =
                (self.probed.info.duration_secs - self.probed.frame_step_secs).max(0.0);
            let job = SeekJob {
                ffmpeg: self.ffmpeg.clone(),
                path: self.path.clone(),
                width: self.probed.info.width,
                height: self.probed.info.height,
                at_secs: signal.target_secs().min(last_frame_at),
                cancel: Arc::new(AtomicBool::new(false)),
            };
            let cancel = job.cancel.clone();

            let spawned = std::thread::Builder::new()
                .name("framecap-ffmpeg-seek".into())
                .spawn(move || match job.run() {
                    Ok(frame) => signal.complete(frame),
                    Err(e) => signal.fail(e.to_string()),
                });
            match spawned {
                Ok(handle) => self.pending = Some(PendingSeek { cancel, handle }),
                // The signal was dropped with the closure; the waiter sees an interrupted seek.
                Err(e) => tracing::warn!("failed to spawn ffmpeg seek thread: {e}"),
            }
        }

        fn abandon_seek(&mut self) {
            if let Some(p) = self.pending.take() {
                p.cancel.store(true, Ordering::Relaxed);
                if p.handle.join().is_err() {
                    tracing::warn!("ffmpeg seek thread panicked");
                }
            }
        }
    }

    impl Drop for FfmpegDecoder {
        fn drop(&mut self) {
            self.abandon_seek();
        }
    }

    struct SeekJob {
        ffmpeg: PathBuf,
        path: PathBuf,
        width: u32,
        height: u32,
        at_secs: f64,
        cancel: Arc<AtomicBool>,
    }

    impl SeekJob {
        fn run(self) -> FramecapResult<FrameRGBA> {
            let mut child = Command::new(&self.ffmpeg)
                .args(["-v", "error", "-ss", &format!("{:.6}", self.at_secs)])
                .arg("-noautorotate")
                .arg("-i")
                .arg(&self.path)
                .args(["-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .map_err(|e| anyhow::anyhow!("failed to spawn ffmpeg for seek: {e}"))?;

            let mut stdout = child
                .stdout
                .take()
                .ok_or_else(|| anyhow::anyhow!("failed to open ffmpeg stdout (unexpected)"))?;
            let mut stderr = child
                .stderr
                .take()
                .ok_or_else(|| anyhow::anyhow!("failed to open ffmpeg stderr (unexpected)"))?;
            let out_drain = std::thread::spawn(move || {
                let mut bytes = Vec::new();
                stdout.read_to_end(&mut bytes).map(|_| bytes)
            });
            let err_drain = std::thread::spawn(move || {
                let mut bytes = Vec::new();
                stderr.read_to_end(&mut bytes).map(|_| bytes)
            });

            let status = loop {
                if self.cancel.load(Ordering::Relaxed) {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = out_drain.join();
                    let _ = err_drain.join();
                    return Err(FramecapError::decode("seek abandoned"));
                }
                match child.try_wait() {
                    Ok(Some(status)) => break status,
                    Ok(None) => std::thread::sleep(POLL_INTERVAL),
                    Err(e) => {
                        return Err(FramecapError::decode(format!(
                            "failed to wait for ffmpeg: {e}"
                        )));
                    }
                }
            };

            let stdout_bytes = out_drain
                .join()
                .map_err(|_| anyhow::anyhow!("ffmpeg stdout drain thread panicked"))?
                .map_err(|e| anyhow::anyhow!("ffmpeg stdout read failed: {e}"))?;
            let stderr_bytes = err_drain
                .join()
                .map_err(|_| anyhow::anyhow!("ffmpeg stderr drain thread panicked"))?
                .unwrap_or_default();

            if !status.success() {
                return Err(FramecapError::decode(format!(
                    "ffmpeg exited with status {status}: {}",
                    String::from_utf8_lossy(&stderr_bytes).trim()
                )));
            }

            let expected = self.width as usize * self.height as usize * 4;
            if stdout_bytes.len() < expected {
                return Err(FramecapError::decode(format!(
                    "no frame decoded at {:.3}s (got {} bytes, expected {expected})",
                    self.at_secs,
                    stdout_bytes.len()
                )));
            }
            let mut data = stdout_bytes;
            data.truncate(expected);
            FrameRGBA::from_raw(self.width, self.height, data)
        }
    }

}
