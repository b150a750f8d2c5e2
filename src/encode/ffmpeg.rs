use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{Receiver, channel};
use std::thread::JoinHandle;

use crate::encode::encoder::{CaptureEncoder, EncodedChunk, EncoderConfig, StreamKind};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::FrameRGBA;

const STDOUT_CHUNK_BYTES: usize = 64 * 1024;

/// MP4 encoder backed by the system `ffmpeg`.
///
/// Video is encoded live into fragmented MP4 read back from ffmpeg's stdout. Audio is spooled to
/// a temporary f32le file. [`CaptureEncoder::finish`] muxes both into one MP4 without re-encoding
/// the video.
#[derive(Default)]
pub struct FfmpegEncoder {
    session: Option<Session>,
}

struct Session {
    cfg: EncoderConfig,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout_rx: Receiver<Vec<u8>>,
    stdout_drain: Option<JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    audio: Option<BufWriter<File>>,
    audio_tmp: TempFileGuard,
    scratch: Vec<u8>,
    last_idx: Option<FrameIndex>,
}

impl std::fmt::Debug for FfmpegEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegEncoder")
            .field("active", &self.session.is_some())
            .finish()
    }
}

impl FfmpegEncoder {
    /// Create an idle encoder.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaptureEncoder for FfmpegEncoder {
    fn file_extension(&self) -> &'static str {
        "mp4"
    }

    fn begin(&mut self, cfg: &EncoderConfig) -> ReelResult<()> {
        cfg.validate()?;
        if self.session.is_some() {
            return Err(ReelError::encode("ffmpeg encoder session already started"));
        }
        if !is_ffmpeg_on_path() {
            return Err(ReelError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let audio_tmp = TempFileGuard(Some(temp_path("audio", "f32le")));
        let audio_file = File::create(audio_tmp.path()?)
            .map_err(|e| ReelError::encode(format!("create audio spool file: {e}")))?;

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args([
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-b:v",
            &format!("{}k", cfg.video_bitrate_kbps),
            "-movflags",
            "frag_keyframe+empty_moov+default_base_moof",
            "-f",
            "mp4",
            "pipe:1",
        ]);

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stderr (unexpected)"))?;

        let (tx, stdout_rx) = channel();
        let stdout_drain = std::thread::spawn(move || {
            let mut buf = vec![0u8; STDOUT_CHUNK_BYTES];
            loop {
                let n = stdout.read(&mut buf)?;
                if n == 0 {
                    return Ok(());
                }
                if tx.send(buf[..n].to_vec()).is_err() {
                    return Ok(());
                }
            }
        });
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(
            width = cfg.width,
            height = cfg.height,
            "ffmpeg encoder started"
        );
        self.session = Some(Session {
            scratch: vec![0u8; cfg.width as usize * cfg.height as usize * 4],
            cfg: cfg.clone(),
            child,
            stdin: Some(stdin),
            stdout_rx,
            stdout_drain: Some(stdout_drain),
            stderr_drain: Some(stderr_drain),
            audio: Some(BufWriter::new(audio_file)),
            audio_tmp,
            last_idx: None,
        });
        Ok(())
    }

    fn push_frame(&mut self, index: FrameIndex, frame: &FrameRGBA) -> ReelResult<()> {
        let s = self
            .session
            .as_mut()
            .ok_or_else(|| ReelError::encode("ffmpeg encoder not started"))?;
        if let Some(last) = s.last_idx
            && index.0 <= last.0
        {
            return Err(ReelError::encode(
                "ffmpeg encoder received out-of-order frame index",
            ));
        }
        s.last_idx = Some(index);

        if frame.width != s.cfg.width || frame.height != s.cfg.height {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, s.cfg.width, s.cfg.height
            )));
        }
        if frame.data.len() != s.scratch.len() {
            return Err(ReelError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        flatten_to_opaque_rgba8(
            &mut s.scratch,
            &frame.data,
            frame.premultiplied,
            s.cfg.bg_rgba,
        )?;

        let Some(stdin) = s.stdin.as_mut() else {
            return Err(ReelError::encode("ffmpeg encoder is already finalized"));
        };
        stdin
            .write_all(&s.scratch)
            .map_err(|e| ReelError::encode(format!("failed to write frame to ffmpeg stdin: {e}")))
    }

    fn push_audio(&mut self, interleaved: &[f32]) -> ReelResult<()> {
        let s = self
            .session
            .as_mut()
            .ok_or_else(|| ReelError::encode("ffmpeg encoder not started"))?;
        let w = s
            .audio
            .as_mut()
            .ok_or_else(|| ReelError::encode("audio spool is already closed"))?;
        for v in interleaved {
            w.write_all(&v.to_le_bytes())
                .map_err(|e| ReelError::encode(format!("write audio spool: {e}")))?;
        }
        Ok(())
    }

    fn drain_chunks(&mut self) -> Vec<EncodedChunk> {
        let Some(s) = self.session.as_mut() else {
            return Vec::new();
        };
        s.stdout_rx
            .try_iter()
            .map(|bytes| EncodedChunk {
                stream: StreamKind::Video,
                bytes,
            })
            .collect()
    }

    fn finish(&mut self, chunks: Vec<EncodedChunk>) -> ReelResult<Vec<u8>> {
        let mut s = self
            .session
            .take()
            .ok_or_else(|| ReelError::encode("ffmpeg encoder not started"))?;

        drop(s.stdin.take());
        let status = s
            .child
            .wait()
            .map_err(|e| ReelError::encode(format!("failed to wait for ffmpeg to finish: {e}")))?;
        join_stdout(&mut s)?;
        let stderr_bytes = join_stderr(&mut s)?;
        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(ReelError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        if let Some(mut w) = s.audio.take() {
            w.flush()
                .map_err(|e| ReelError::encode(format!("flush audio spool: {e}")))?;
        }

        let video_tmp = TempFileGuard(Some(temp_path("video", "mp4")));
        {
            let mut f = BufWriter::new(
                File::create(video_tmp.path()?)
                    .map_err(|e| ReelError::encode(format!("create video spool file: {e}")))?,
            );
            let trailing: Vec<Vec<u8>> = s.stdout_rx.try_iter().collect();
            let video = chunks
                .iter()
                .filter(|c| c.stream == StreamKind::Video)
                .map(|c| c.bytes.as_slice())
                .chain(trailing.iter().map(Vec::as_slice));
            for bytes in video {
                f.write_all(bytes)
                    .map_err(|e| ReelError::encode(format!("write video spool: {e}")))?;
            }
            f.flush()
                .map_err(|e| ReelError::encode(format!("flush video spool: {e}")))?;
        }

        let out_tmp = TempFileGuard(Some(temp_path("muxed", "mp4")));
        mux(
            &s.cfg,
            video_tmp.path()?,
            s.audio_tmp.path()?,
            out_tmp.path()?,
        )?;
        let bytes = std::fs::read(out_tmp.path()?)
            .map_err(|e| ReelError::encode(format!("read muxed output: {e}")))?;
        tracing::debug!(bytes = bytes.len(), "ffmpeg mux finished");
        Ok(bytes)
    }

    fn abort(&mut self) {
        if let Some(mut s) = self.session.take() {
            drop(s.stdin.take());
            let _ = s.child.kill();
            let _ = s.child.wait();
            let _ = join_stdout(&mut s);
            let _ = join_stderr(&mut s);
            tracing::debug!("ffmpeg encoder aborted");
        }
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        self.abort();
    }
}

fn join_stdout(s: &mut Session) -> ReelResult<()> {
    match s.stdout_drain.take() {
        Some(handle) => handle
            .join()
            .map_err(|_| ReelError::encode("ffmpeg stdout drain thread panicked"))?
            .map_err(|e| ReelError::encode(format!("ffmpeg stdout read failed: {e}"))),
        None => Ok(()),
    }
}

fn join_stderr(s: &mut Session) -> ReelResult<Vec<u8>> {
    match s.stderr_drain.take() {
        Some(handle) => handle
            .join()
            .map_err(|_| ReelError::encode("ffmpeg stderr drain thread panicked"))?
            .map_err(|e| ReelError::encode(format!("ffmpeg stderr read failed: {e}"))),
        None => Ok(Vec::new()),
    }
}

fn mux(cfg: &EncoderConfig, video: &Path, audio: &Path, out: &Path) -> ReelResult<()> {
    let output = Command::new("ffmpeg")
        .args(["-y", "-loglevel", "error", "-i"])
        .arg(video)
        .args([
            "-f",
            "f32le",
            "-ar",
            &cfg.sample_rate.to_string(),
            "-ac",
            &cfg.channels.to_string(),
            "-i",
        ])
        .arg(audio)
        .args([
            "-c:v",
            "copy",
            "-c:a",
            "aac",
            "-b:a",
            &format!("{}k", cfg.audio_bitrate_kbps),
            "-movflags",
            "+faststart",
            "-f",
            "mp4",
        ])
        .arg(out)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .output()
        .map_err(|e| ReelError::encode(format!("failed to spawn ffmpeg for muxing: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ReelError::encode(format!(
            "ffmpeg mux exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // rawvideo input takes its rate from `-r` placed before `-i`.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

fn temp_path(kind: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "reel_capture_{kind}_{}_{}.{ext}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ))
}

/// Flatten RGBA8 over `bg_rgba` into opaque RGBA8 (ffmpeg has no notion of premultiplied input).
pub(crate) fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    src_is_premul: bool,
    bg_rgba: [u8; 4],
) -> ReelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::validation(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg = [
        u16::from(bg_rgba[0]),
        u16::from(bg_rgba[1]),
        u16::from(bg_rgba[2]),
    ];
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            let fg = if src_is_premul {
                u16::from(s[c])
            } else {
                mul_div255_u16(u16::from(s[c]), a)
            };
            d[c] = (fg + mul_div255_u16(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Deletes the file it points to when dropped.
struct TempFileGuard(Option<PathBuf>);

impl TempFileGuard {
    fn path(&self) -> ReelResult<&Path> {
        self.0
            .as_deref()
            .ok_or_else(|| ReelError::encode("temporary file path missing"))
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
