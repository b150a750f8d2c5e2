use crate::foundation::core::{Canvas, Fps, Orientation};
use crate::foundation::error::{ReelError, ReelResult};
use crate::visual::caption::CaptionMode;

/// Engine configuration accepted from the surrounding application.
///
/// Every field has a default so partial JSON documents are valid.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    /// Target orientation; determines frame dimensions.
    pub orientation: Orientation,
    /// Explicit frame size overriding the orientation's canvas (thumbnails, tests).
    pub canvas_override: Option<Canvas>,
    /// Caption layout policy for this run.
    pub caption_mode: CaptionMode,
    /// Hold time for scenes without narration, in seconds.
    pub fallback_duration_secs: f64,
    /// Narration voice identity. Opaque here; forwarded to the scene producer.
    pub voice: Option<String>,
    /// Base name used for suggested output filenames.
    pub title: Option<String>,
    /// Capture/encode settings.
    pub capture: CaptureConfig,
    /// Audio graph settings.
    pub audio: AudioConfig,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Portrait,
            canvas_override: None,
            caption_mode: CaptionMode::Kinetic,
            fallback_duration_secs: 3.0,
            voice: None,
            title: None,
            capture: CaptureConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

/// Capture and encoder settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Frame rate numerator.
    pub fps_num: u32,
    /// Frame rate denominator.
    pub fps_den: u32,
    /// Target video bitrate in kbit/s.
    pub video_bitrate_kbps: u32,
    /// Target audio bitrate in kbit/s.
    pub audio_bitrate_kbps: u32,
    /// Background color behind the image (RGBA8, straight alpha).
    pub background_rgba: [u8; 4],
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fps_num: 30,
            fps_den: 1,
            video_bitrate_kbps: 5_000,
            audio_bitrate_kbps: 192,
            background_rgba: [12, 12, 16, 255],
        }
    }
}

/// Audio graph settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Processing/output sample rate in Hz.
    pub sample_rate: u32,
    /// Per-scene narration gain.
    pub narration_gain: f32,
    /// Background bed gain while no narration plays.
    pub bed_rest_gain: f32,
    /// Background bed gain floor while narration plays.
    pub bed_duck_gain: f32,
    /// Time constant of the duck-down transition, in seconds.
    pub duck_attack_secs: f64,
    /// Time constant of the ramp back to rest, in seconds.
    pub duck_release_secs: f64,
    /// Whether the transition sweep and accent blip are triggered per scene.
    pub effects_enabled: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            narration_gain: 1.0,
            bed_rest_gain: 0.12,
            bed_duck_gain: 0.035,
            duck_attack_secs: 0.08,
            duck_release_secs: 0.6,
            effects_enabled: true,
        }
    }
}

impl ReelConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(s: &str) -> ReelResult<Self> {
        let cfg: Self =
            serde_json::from_str(s).map_err(|e| ReelError::serde(format!("config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> ReelResult<()> {
        if !self.fallback_duration_secs.is_finite() || self.fallback_duration_secs <= 0.0 {
            return Err(ReelError::validation(
                "fallback_duration_secs must be finite and > 0",
            ));
        }
        self.fps()?;
        Canvas::new(self.canvas().width, self.canvas().height)?;

        let a = &self.audio;
        if a.sample_rate == 0 {
            return Err(ReelError::validation("audio sample_rate must be non-zero"));
        }
        for (name, g) in [
            ("narration_gain", a.narration_gain),
            ("bed_rest_gain", a.bed_rest_gain),
            ("bed_duck_gain", a.bed_duck_gain),
        ] {
            if !(0.0..=1.0).contains(&g) {
                return Err(ReelError::validation(format!(
                    "audio {name} must be within [0, 1]"
                )));
            }
        }
        if !(a.duck_attack_secs > 0.0 && a.duck_release_secs > 0.0) {
            return Err(ReelError::validation(
                "duck time constants must be > 0 seconds",
            ));
        }
        if self.capture.video_bitrate_kbps == 0 || self.capture.audio_bitrate_kbps == 0 {
            return Err(ReelError::validation("capture bitrates must be non-zero"));
        }
        Ok(())
    }

    /// Capture frame rate.
    pub fn fps(&self) -> ReelResult<Fps> {
        Fps::new(self.capture.fps_num, self.capture.fps_den)
    }

    /// Target frame dimensions: the override if set, otherwise derived from the orientation.
    pub fn canvas(&self) -> Canvas {
        self.canvas_override
            .unwrap_or_else(|| self.orientation.canvas())
    }

    /// Suggested output filename (without directory) for an artifact with extension `ext`.
    pub fn suggested_filename(&self, ext: &str) -> String {
        let slug = self
            .title
            .as_deref()
            .map(slugify)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "reel".to_string());
        format!("{slug}-{}.{ext}", self.orientation.tag())
    }
}

fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
