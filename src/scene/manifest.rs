use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::list::SceneList;
use crate::scene::model::{ImagePayload, MotionDirective, NarrationAudio, PcmFormat, Scene};

/// On-disk description of a scene list. Asset paths are relative to the manifest file.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SceneManifest {
    /// Scenes in presentation order.
    pub scenes: Vec<SceneEntry>,
}

/// One scene in a [`SceneManifest`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SceneEntry {
    /// Stable scene id.
    pub id: String,
    /// Caption text with optional `*emphasis*` markup.
    #[serde(default)]
    pub caption: String,
    /// Motion tag (`zoom-in`, `zoom-out`, `pan-left`, `pan-right`).
    #[serde(default)]
    pub motion: MotionDirective,
    /// Raw PCM narration file.
    #[serde(default)]
    pub narration: Option<NarrationEntry>,
    /// Encoded image file.
    #[serde(default)]
    pub image: Option<String>,
}

/// Raw PCM narration file reference.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct NarrationEntry {
    /// Relative path to raw PCM bytes.
    pub path: String,
    /// Sample rate in Hz.
    #[serde(default = "default_narration_rate")]
    pub sample_rate: u32,
    /// Interleaved channel count.
    #[serde(default = "default_channels")]
    pub channels: u16,
    /// Sample encoding.
    #[serde(default)]
    pub format: PcmFormat,
}

fn default_narration_rate() -> u32 {
    NarrationAudio::DEFAULT_SAMPLE_RATE
}

fn default_channels() -> u16 {
    1
}

impl SceneManifest {
    /// Parse a manifest from JSON text.
    pub fn from_json(s: &str) -> ReelResult<Self> {
        serde_json::from_str(s).map_err(|e| ReelError::serde(format!("scene manifest json: {e}")))
    }

    /// Read and parse a manifest file.
    pub fn read(path: &Path) -> ReelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read scene manifest '{}'", path.display()))?;
        Self::from_json(&text)
    }

    /// Load every referenced asset relative to `root` and build a [`SceneList`].
    ///
    /// Missing files are errors here; pending assets are expressed by omitting the entry.
    pub fn load(&self, root: &Path) -> ReelResult<SceneList> {
        let mut scenes = Vec::with_capacity(self.scenes.len());
        for entry in &self.scenes {
            let mut scene = Scene::new(entry.id.clone(), entry.caption.clone(), entry.motion);
            if let Some(n) = &entry.narration {
                let bytes = read_asset(root, &n.path)?;
                scene.narration = Some(NarrationAudio {
                    sample_rate: n.sample_rate,
                    channels: n.channels,
                    format: n.format,
                    bytes: bytes.into(),
                });
            }
            if let Some(img) = &entry.image {
                scene.image = Some(ImagePayload::new(read_asset(root, img)?));
            }
            scenes.push(scene);
        }
        Ok(SceneList::new(scenes))
    }
}

fn read_asset(root: &Path, rel: &str) -> ReelResult<Vec<u8>> {
    let norm = normalize_rel_path(rel)?;
    let p: PathBuf = root.join(Path::new(&norm));
    std::fs::read(&p)
        .map_err(|e| ReelError::validation(format!("failed to read asset '{}': {e}", p.display())))
}

/// Normalize and validate manifest-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> ReelResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ReelError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(ReelError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ReelError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(ReelError::validation("asset path must contain a file name"));
    }
    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/manifest.rs"]
mod tests;
