use std::sync::Arc;

use crate::foundation::error::{ReelError, ReelResult};

/// Stable scene identifier assigned by the producer.
#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct SceneId(pub String);

impl SceneId {
    /// Build an id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Visual motion applied to the scene image over the scene's duration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MotionDirective {
    /// Scale 1.0 -> 1.15.
    #[default]
    ZoomIn,
    /// Scale 1.15 -> 1.0.
    ZoomOut,
    /// Hold scale 1.1, drift left.
    PanLeft,
    /// Hold scale 1.1, drift right.
    PanRight,
}

impl MotionDirective {
    /// Parse the producer's directive tags (`zoom-in`, `zoom_in`, `zoomIn`, ...).
    pub fn parse(s: &str) -> ReelResult<Self> {
        let norm: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match norm.as_str() {
            "zoomin" => Ok(Self::ZoomIn),
            "zoomout" => Ok(Self::ZoomOut),
            "panleft" => Ok(Self::PanLeft),
            "panright" => Ok(Self::PanRight),
            _ => Err(ReelError::validation(format!(
                "unknown motion directive '{s}'"
            ))),
        }
    }
}

/// Sample encoding of a raw PCM narration payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PcmFormat {
    /// Signed 16-bit little-endian.
    #[default]
    S16Le,
    /// 32-bit float little-endian.
    F32Le,
}

impl PcmFormat {
    /// Bytes per single-channel sample.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::S16Le => 2,
            Self::F32Le => 4,
        }
    }
}

/// Raw interleaved PCM narration as delivered by the speech producer.
#[derive(Clone, Debug, PartialEq)]
pub struct NarrationAudio {
    /// Source sample rate in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    /// Sample encoding.
    pub format: PcmFormat,
    /// Raw sample bytes.
    pub bytes: Arc<Vec<u8>>,
}

impl NarrationAudio {
    /// TTS engines commonly emit 24 kHz mono s16le.
    pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

    /// Wrap 24 kHz mono s16le bytes.
    pub fn s16le_mono(bytes: Vec<u8>) -> Self {
        Self {
            sample_rate: Self::DEFAULT_SAMPLE_RATE,
            channels: 1,
            format: PcmFormat::S16Le,
            bytes: Arc::new(bytes),
        }
    }

    /// Build an s16le payload from float samples (mono). Useful for synthetic narration.
    pub fn from_mono_f32(samples: &[f32], sample_rate: u32) -> Self {
        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        Self {
            sample_rate,
            channels: 1,
            format: PcmFormat::S16Le,
            bytes: Arc::new(bytes),
        }
    }

    /// Nominal duration implied by the payload length, in seconds.
    pub fn nominal_duration_secs(&self) -> f64 {
        let frame_bytes = self.format.bytes_per_sample() * usize::from(self.channels.max(1));
        if self.sample_rate == 0 || frame_bytes == 0 {
            return 0.0;
        }
        (self.bytes.len() / frame_bytes) as f64 / f64::from(self.sample_rate)
    }
}

/// Encoded still image (PNG, JPEG, ...).
#[derive(Clone, Debug, PartialEq)]
pub struct ImagePayload {
    /// Encoded bytes.
    pub bytes: Arc<Vec<u8>>,
}

impl ImagePayload {
    /// Wrap encoded image bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(bytes),
        }
    }

    /// Content key used by renderer caches.
    pub fn content_key(&self) -> u64 {
        xxhash_rust::xxh3::xxh3_64(&self.bytes)
    }
}

/// One narration + image + caption unit.
///
/// Payload fields are `None` while the producer is still generating them; a scene without
/// narration is still playable and is held for the configured fallback duration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    /// Stable identifier.
    pub id: SceneId,
    /// Narration PCM, absent while pending.
    pub narration: Option<NarrationAudio>,
    /// Still image, absent while pending.
    pub image: Option<ImagePayload>,
    /// Caption text; `*...*` marks emphasized words.
    pub caption: String,
    /// Image motion.
    pub motion: MotionDirective,
    /// Producer is still generating the image (advisory).
    pub image_generating: bool,
    /// Producer is still generating narration (advisory).
    pub audio_generating: bool,
}

impl Scene {
    /// Create a scene with caption and motion but no payloads yet.
    pub fn new(id: impl Into<String>, caption: impl Into<String>, motion: MotionDirective) -> Self {
        Self {
            id: SceneId::new(id),
            caption: caption.into(),
            motion,
            ..Self::default()
        }
    }

    /// Builder-style narration setter.
    pub fn with_narration(mut self, narration: NarrationAudio) -> Self {
        self.narration = Some(narration);
        self.audio_generating = false;
        self
    }

    /// Builder-style image setter.
    pub fn with_image(mut self, image: ImagePayload) -> Self {
        self.image = Some(image);
        self.image_generating = false;
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
