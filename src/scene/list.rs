use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::model::{ImagePayload, NarrationAudio, Scene};

#[derive(Debug, Default)]
struct Inner {
    scenes: RwLock<Vec<Scene>>,
    version: AtomicU64,
}

/// Ordered scene sequence owned by the upstream producer.
///
/// Cloning the handle shares the same list. Readers take cheap per-scene snapshots (payloads are
/// reference counted) and never hold on to a scene across transitions: consumers address scenes
/// by index only, so producer edits and reorders are picked up on the next read.
#[derive(Clone, Debug, Default)]
pub struct SceneList {
    inner: Arc<Inner>,
}

impl SceneList {
    /// Create a list from initial scenes.
    pub fn new(scenes: Vec<Scene>) -> Self {
        Self {
            inner: Arc::new(Inner {
                scenes: RwLock::new(scenes),
                version: AtomicU64::new(0),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Scene>> {
        self.inner
            .scenes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Scene>> {
        self.inner
            .scenes
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn bump(&self) {
        self.inner.version.fetch_add(1, Ordering::AcqRel);
    }

    /// Monotonic edit counter; increments on every producer mutation.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// Number of scenes.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Return `true` when the list has no scenes.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Clamp an index into `[0, len)`. Empty lists clamp to 0.
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.len().saturating_sub(1))
    }

    /// Snapshot of the scene at `index`, if present.
    pub fn get(&self, index: usize) -> Option<Scene> {
        self.read().get(index).cloned()
    }

    /// Snapshot of the narration payload at `index`, if present.
    pub fn narration(&self, index: usize) -> Option<NarrationAudio> {
        self.read().get(index).and_then(|s| s.narration.clone())
    }

    /// Snapshot of every scene, in order.
    pub fn snapshot(&self) -> Vec<Scene> {
        self.read().clone()
    }

    /// Append a scene.
    pub fn push(&self, scene: Scene) {
        self.write().push(scene);
        self.bump();
    }

    /// Mutate the scene at `index` in place.
    pub fn update(&self, index: usize, f: impl FnOnce(&mut Scene)) -> ReelResult<()> {
        {
            let mut scenes = self.write();
            let len = scenes.len();
            let scene = scenes.get_mut(index).ok_or_else(|| {
                ReelError::validation(format!("scene index {index} out of bounds (len {len})"))
            })?;
            f(scene);
        }
        self.bump();
        Ok(())
    }

    /// Producer delivered narration for `index`.
    pub fn set_narration(&self, index: usize, narration: NarrationAudio) -> ReelResult<()> {
        self.update(index, |s| {
            s.narration = Some(narration);
            s.audio_generating = false;
        })
    }

    /// Producer delivered an image for `index`.
    pub fn set_image(&self, index: usize, image: ImagePayload) -> ReelResult<()> {
        self.update(index, |s| {
            s.image = Some(image);
            s.image_generating = false;
        })
    }

    /// Move the scene at `from` so it ends up at `to`.
    pub fn reorder(&self, from: usize, to: usize) -> ReelResult<()> {
        {
            let mut scenes = self.write();
            let len = scenes.len();
            if from >= len || to >= len {
                return Err(ReelError::validation(format!(
                    "reorder {from} -> {to} out of bounds (len {len})"
                )));
            }
            let scene = scenes.remove(from);
            scenes.insert(to, scene);
        }
        self.bump();
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/list.rs"]
mod tests;
