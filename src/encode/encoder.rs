use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::FrameRGBA;

/// Stream parameters fixed for one capture session.
#[derive(Clone, Debug, PartialEq)]
pub struct EncoderConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Output frame rate.
    pub fps: Fps,
    /// Audio sample rate.
    pub sample_rate: u32,
    /// Interleaved audio channel count.
    pub channels: u16,
    /// Target video bitrate in kbit/s.
    pub video_bitrate_kbps: u32,
    /// Target audio bitrate in kbit/s.
    pub audio_bitrate_kbps: u32,
    /// Color used to flatten alpha (straight RGBA8).
    pub bg_rgba: [u8; 4],
}

impl EncoderConfig {
    /// Reject parameters no backend can encode.
    pub fn validate(&self) -> ReelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::validation(
                "encoder width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "encoder width/height must be even (required for yuv420p output)",
            ));
        }
        if self.sample_rate == 0 || self.channels == 0 {
            return Err(ReelError::validation(
                "encoder audio sample_rate/channels must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Which elementary stream a chunk belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    /// Encoded video.
    Video,
    /// Encoded audio.
    Audio,
}

/// A piece of encoded output buffered by the capture session until finalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedChunk {
    /// Stream the bytes belong to.
    pub stream: StreamKind,
    /// Encoded bytes.
    pub bytes: Vec<u8>,
}

/// Encoder backend consumed by the capture pipeline.
///
/// Frames and audio arrive in presentation order. Encoded output is pulled with
/// [`CaptureEncoder::drain_chunks`]; the session hands every drained chunk back to
/// [`CaptureEncoder::finish`], which assembles the final artifact.
pub trait CaptureEncoder: Send {
    /// File extension of the finished artifact.
    fn file_extension(&self) -> &'static str;

    /// Start a session. Fails without side effects when the backend is unavailable.
    fn begin(&mut self, cfg: &EncoderConfig) -> ReelResult<()>;

    /// Encode one frame.
    fn push_frame(&mut self, index: FrameIndex, frame: &FrameRGBA) -> ReelResult<()>;

    /// Append interleaved f32 audio.
    fn push_audio(&mut self, interleaved: &[f32]) -> ReelResult<()>;

    /// Encoded output produced since the last call.
    fn drain_chunks(&mut self) -> Vec<EncodedChunk>;

    /// Flush, then assemble `chunks` plus any trailing output into one artifact.
    fn finish(&mut self, chunks: Vec<EncodedChunk>) -> ReelResult<Vec<u8>>;

    /// Abandon the session and release every resource. Never fails.
    fn abort(&mut self);
}

const MAGIC: &[u8; 4] = b"REEL";
const VERSION: u8 = 1;
const TAG_VIDEO: u8 = b'V';
const TAG_AUDIO: u8 = b'A';
const TAG_END: u8 = b'E';

/// Summary decoded from an [`InMemoryEncoder`] artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerSummary {
    /// Frame width.
    pub width: u32,
    /// Frame height.
    pub height: u32,
    /// Frame rate.
    pub fps: Fps,
    /// Audio sample rate.
    pub sample_rate: u32,
    /// Audio channels.
    pub channels: u16,
    /// xxh3 of each frame's pixel data, in order.
    pub frame_hashes: Vec<u64>,
    /// Total interleaved audio samples.
    pub audio_samples: u64,
}

impl ContainerSummary {
    /// Number of frames.
    pub fn frames(&self) -> u64 {
        self.frame_hashes.len() as u64
    }

    /// Audio frames (samples per channel).
    pub fn audio_frames(&self) -> u64 {
        self.audio_samples / u64::from(self.channels.max(1))
    }
}

/// Deterministic container encoder for tests and debugging.
///
/// Frames are recorded as content hashes, audio as raw little-endian f32. The artifact is
/// byte-identical across runs given identical input.
#[derive(Debug, Default)]
pub struct InMemoryEncoder {
    cfg: Option<EncoderConfig>,
    pending: Vec<EncodedChunk>,
    frames: u64,
    last_idx: Option<FrameIndex>,
    fail_after_frames: Option<u64>,
    fail_on_begin: bool,
}

impl InMemoryEncoder {
    /// Create an encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoder whose `push_frame` fails once `frames` frames were accepted.
    pub fn failing_after(frames: u64) -> Self {
        Self {
            fail_after_frames: Some(frames),
            ..Self::default()
        }
    }

    /// Encoder whose `begin` fails.
    pub fn failing_on_begin() -> Self {
        Self {
            fail_on_begin: true,
            ..Self::default()
        }
    }

    /// Return `true` between `begin` and `finish`/`abort`.
    pub fn is_active(&self) -> bool {
        self.cfg.is_some()
    }

    /// Decode an artifact produced by this encoder.
    pub fn summarize(bytes: &[u8]) -> ReelResult<ContainerSummary> {
        let mut r = Reader { bytes, pos: 0 };
        if r.take(4)? != MAGIC {
            return Err(ReelError::decode("not a reel container"));
        }
        if r.u8()? != VERSION {
            return Err(ReelError::decode("unsupported reel container version"));
        }
        let width = r.u32()?;
        let height = r.u32()?;
        let fps = Fps::new(r.u32()?, r.u32()?)?;
        let sample_rate = r.u32()?;
        let channels = r.u16()?;

        let mut frame_hashes = Vec::new();
        let mut audio_samples = 0u64;
        loop {
            match r.u8()? {
                TAG_VIDEO => {
                    let _index = r.u64()?;
                    frame_hashes.push(r.u64()?);
                }
                TAG_AUDIO => {
                    let n = r.u32()?;
                    r.take(n as usize * 4)?;
                    audio_samples += u64::from(n);
                }
                TAG_END => {
                    let frames = r.u64()?;
                    let samples = r.u64()?;
                    if frames != frame_hashes.len() as u64 || samples != audio_samples {
                        return Err(ReelError::decode("reel container trailer mismatch"));
                    }
                    break;
                }
                other => {
                    return Err(ReelError::decode(format!(
                        "unknown reel container tag {other:#04x}"
                    )));
                }
            }
        }

        Ok(ContainerSummary {
            width,
            height,
            fps,
            sample_rate,
            channels,
            frame_hashes,
            audio_samples,
        })
    }
}

impl CaptureEncoder for InMemoryEncoder {
    fn file_extension(&self) -> &'static str {
        "reel"
    }

    fn begin(&mut self, cfg: &EncoderConfig) -> ReelResult<()> {
        cfg.validate()?;
        if self.fail_on_begin {
            return Err(ReelError::encode("encoder unavailable"));
        }
        if self.cfg.is_some() {
            return Err(ReelError::encode("encoder session already started"));
        }
        self.cfg = Some(cfg.clone());
        self.pending.clear();
        self.frames = 0;
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, index: FrameIndex, frame: &FrameRGBA) -> ReelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ReelError::encode("encoder not started"))?;
        if let Some(limit) = self.fail_after_frames
            && self.frames >= limit
        {
            return Err(ReelError::encode(format!(
                "simulated encoder failure after {limit} frames"
            )));
        }
        if let Some(last) = self.last_idx
            && index.0 <= last.0
        {
            return Err(ReelError::encode(
                "encoder received out-of-order frame index",
            ));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.last_idx = Some(index);
        self.frames += 1;

        let mut bytes = Vec::with_capacity(17);
        bytes.push(TAG_VIDEO);
        bytes.extend_from_slice(&index.0.to_le_bytes());
        bytes.extend_from_slice(&xxhash_rust::xxh3::xxh3_64(&frame.data).to_le_bytes());
        self.pending.push(EncodedChunk {
            stream: StreamKind::Video,
            bytes,
        });
        Ok(())
    }

    fn push_audio(&mut self, interleaved: &[f32]) -> ReelResult<()> {
        if self.cfg.is_none() {
            return Err(ReelError::encode("encoder not started"));
        }
        if interleaved.is_empty() {
            return Ok(());
        }
        let n: u32 = interleaved
            .len()
            .try_into()
            .map_err(|_| ReelError::encode("audio block too large"))?;
        let mut bytes = Vec::with_capacity(5 + interleaved.len() * 4);
        bytes.push(TAG_AUDIO);
        bytes.extend_from_slice(&n.to_le_bytes());
        for s in interleaved {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        self.pending.push(EncodedChunk {
            stream: StreamKind::Audio,
            bytes,
        });
        Ok(())
    }

    fn drain_chunks(&mut self) -> Vec<EncodedChunk> {
        std::mem::take(&mut self.pending)
    }

    fn finish(&mut self, chunks: Vec<EncodedChunk>) -> ReelResult<Vec<u8>> {
        let cfg = self
            .cfg
            .take()
            .ok_or_else(|| ReelError::encode("encoder not started"))?;
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.push(VERSION);
        out.extend_from_slice(&cfg.width.to_le_bytes());
        out.extend_from_slice(&cfg.height.to_le_bytes());
        out.extend_from_slice(&cfg.fps.num.to_le_bytes());
        out.extend_from_slice(&cfg.fps.den.to_le_bytes());
        out.extend_from_slice(&cfg.sample_rate.to_le_bytes());
        out.extend_from_slice(&cfg.channels.to_le_bytes());

        let mut audio_samples = 0u64;
        for c in chunks.iter().chain(self.pending.iter()) {
            if c.stream == StreamKind::Audio {
                audio_samples += (c.bytes.len() as u64 - 5) / 4;
            }
            out.extend_from_slice(&c.bytes);
        }
        self.pending.clear();

        out.push(TAG_END);
        out.extend_from_slice(&self.frames.to_le_bytes());
        out.extend_from_slice(&audio_samples.to_le_bytes());
        Ok(out)
    }

    fn abort(&mut self) {
        self.cfg = None;
        self.pending.clear();
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> ReelResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|e| *e <= self.bytes.len())
            .ok_or_else(|| ReelError::decode("truncated reel container"))?;
        let s = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(s)
    }

    fn u8(&mut self) -> ReelResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> ReelResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> ReelResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> ReelResult<u64> {
        let b = self.take(8)?;
        let mut a = [0u8; 8];
        a.copy_from_slice(b);
        Ok(u64::from_le_bytes(a))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/encoder.rs"]
mod tests;
