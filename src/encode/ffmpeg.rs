use std::io::{Read, Write as _};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc;

use crate::encode::codec::{CodecDescriptor, Container};
use crate::encode::sink::{ChunkEncoder, EncoderConfig};
use crate::foundation::error::{FramecapError, FramecapResult};
use crate::foundation::math::mul_div255_u16;
use crate::foundation::tools::is_tool_on_path;
use crate::raster::frame::FrameRGBA;

const READ_BUF_BYTES: usize = 64 * 1024;

/// Encoder that spawns the system `ffmpeg`, streams raw frames to stdin and collects the
/// container bytes from stdout.
///
/// Output is written as a streamable container (`webm`, or fragmented `mp4`) so chunks can be
/// collected while encoding. Odd frame sizes are padded to even for `yuv420p`.
pub struct FfmpegEncoder {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_rx: mpsc::Receiver<Vec<u8>>,
    stdout_drain: Option<std::thread::JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: EncoderConfig,
}

impl FfmpegEncoder {
    /// Spawn `ffmpeg` for `codec`. Fails with [`FramecapError::CodecUnavailable`] when `ffmpeg`
    /// or the requested encoder is missing.
    pub fn spawn(ffmpeg: &Path, codec: &CodecDescriptor, cfg: &EncoderConfig) -> FramecapResult<Self> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(FramecapError::validation("fps must be non-zero"));
        }
        if cfg.dims.width == 0 || cfg.dims.height == 0 {
            return Err(FramecapError::validation(
                "ffmpeg encoder width/height must be non-zero",
            ));
        }
        let format_args: &[&str] = match codec.container {
            Container::Webm => &["-f", "webm"],
            Container::Mp4 => &["-movflags", "frag_keyframe+empty_moov", "-f", "mp4"],
            Container::Y4m => {
                return Err(FramecapError::codec_unavailable(
                    "y4m output is not produced through ffmpeg",
                ));
            }
        };

        let ffmpeg_str = ffmpeg.to_string_lossy();
        if !is_tool_on_path(&ffmpeg_str) {
            return Err(FramecapError::codec_unavailable(format!(
                "ffmpeg is required for {codec}, but '{ffmpeg_str}' was not found"
            )));
        }
        let encoder = codec.ffmpeg_encoder();
        if !is_encoder_available(ffmpeg, encoder) {
            return Err(FramecapError::codec_unavailable(format!(
                "ffmpeg has no '{encoder}' encoder"
            )));
        }

        let mut cmd = Command::new(ffmpeg);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Input: raw opaque RGBA8 frames at the session rate.
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.dims.width, cfg.dims.height),
            "-r",
            &format!("{}/{}", cfg.fps.num, cfg.fps.den),
            "-i",
            "pipe:0",
            "-an",
            "-vf",
            "pad=ceil(iw/2)*2:ceil(ih/2)*2",
            "-c:v",
            encoder,
            "-pix_fmt",
            "yuv420p",
        ]);
        cmd.args(format_args);
        cmd.arg("pipe:1");

        let mut child = cmd.spawn().map_err(|e| {
            FramecapError::codec_unavailable(format!("failed to spawn ffmpeg for {codec}: {e}"))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow::anyhow!("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow::anyhow!("failed to open ffmpeg stderr (unexpected)"))?;

        let (tx, stdout_rx) = mpsc::channel();
        let stdout_drain = std::thread::spawn(move || -> std::io::Result<()> {
            let mut buf = vec![0u8; READ_BUF_BYTES];
            loop {
                let n = stdout.read(&mut buf)?;
                if n == 0 || tx.send(buf[..n].to_vec()).is_err() {
                    return Ok(());
                }
            }
        });
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(%codec, encoder, dims = %cfg.dims, fps = %cfg.fps, "spawned ffmpeg encoder");
        Ok(Self {
            child: Some(child),
            stdin: Some(stdin),
            stdout_rx,
            stdout_drain: Some(stdout_drain),
            stderr_drain: Some(stderr_drain),
            scratch: vec![0u8; cfg.dims.rgba_len()],
            cfg: *cfg,
        })
    }

    fn drain_ready(&self) -> Vec<Vec<u8>> {
        self.stdout_rx.try_iter().collect()
    }
}

impl ChunkEncoder for FfmpegEncoder {
    fn encode_frame(
        &mut self,
        _timestamp_secs: f64,
        frame: &FrameRGBA,
    ) -> FramecapResult<Vec<Vec<u8>>> {
        if frame.dimensions() != self.cfg.dims {
            return Err(FramecapError::validation(format!(
                "frame size mismatch: got {}, expected {}",
                frame.dimensions(),
                self.cfg.dims
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(FramecapError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        flatten_over_black(&mut self.scratch, &frame.data);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(FramecapError::flush("ffmpeg encoder is already finalized"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            FramecapError::flush(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(self.drain_ready())
    }

    fn finish(&mut self) -> FramecapResult<Vec<Vec<u8>>> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| FramecapError::flush("ffmpeg encoder already finished"))?;

        let status = child
            .wait()
            .map_err(|e| FramecapError::flush(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| FramecapError::flush("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| FramecapError::flush(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        if let Some(handle) = self.stdout_drain.take() {
            handle
                .join()
                .map_err(|_| FramecapError::flush("ffmpeg stdout drain thread panicked"))?
                .map_err(|e| FramecapError::flush(format!("ffmpeg stdout read failed: {e}")))?;
        }

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(FramecapError::flush(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        Ok(self.drain_ready())
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Return `true` when `ffmpeg -h encoder=<name>` knows `name`.
pub fn is_encoder_available(ffmpeg: &Path, name: &str) -> bool {
    Command::new(ffmpeg)
        .args(["-hide_banner", "-h", &format!("encoder={name}")])
        .stderr(Stdio::null())
        .output()
        .map(|out| {
            out.status.success()
                && String::from_utf8_lossy(&out.stdout).contains(&format!("Encoder {name} "))
        })
        .unwrap_or(false)
}

fn flatten_over_black(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        d[0] = mul_div255_u16(u16::from(s[0]), a) as u8;
        d[1] = mul_div255_u16(u16::from(s[1]), a) as u8;
        d[2] = mul_div255_u16(u16::from(s[2]), a) as u8;
        d[3] = 255;
    }
}
