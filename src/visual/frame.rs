use crate::foundation::core::Canvas;
use crate::foundation::error::ReelResult;
use crate::scene::model::{ImagePayload, MotionDirective, Scene, SceneId};
use crate::visual::caption::{
    CaptionLayout, CaptionMode, FixedAdvance, TextMeasure, compute_caption_layout_with,
};
use crate::visual::transform::{MotionTransform, compute_transform};

/// Progress shown for narration-less scenes during capture, where no audio clock drives motion.
pub const FALLBACK_CAPTURE_PROGRESS: f64 = 0.5;

/// What the backend should draw for a scene's image slot.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageSlot {
    /// Encoded image bytes are available.
    Ready(ImagePayload),
    /// No image yet; the producer is still generating it.
    Generating,
    /// No image and none expected.
    Missing,
}

impl ImageSlot {
    /// Return `true` when the backend must draw a placeholder.
    pub fn is_placeholder(&self) -> bool {
        !matches!(self, Self::Ready(_))
    }
}

/// Everything a backend needs to draw one tick of one scene.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualFrame {
    /// Scene being drawn.
    pub scene_id: SceneId,
    /// Target dimensions.
    pub canvas: Canvas,
    /// Scene progress in `[0, 1]`.
    pub progress: f64,
    /// Motion directive of the scene.
    pub motion: MotionDirective,
    /// Image pan/zoom at `progress`.
    pub transform: MotionTransform,
    /// Image source or placeholder reason.
    pub image: ImageSlot,
    /// Narration still being generated (advisory).
    pub audio_generating: bool,
    /// Caption geometry.
    pub caption: CaptionLayout,
}

/// `elapsed / duration`, clamped to `[0, 1]`. A non-positive duration yields 0.
pub fn scene_progress(elapsed: f64, duration: f64) -> f64 {
    if !duration.is_finite() || duration <= 0.0 || !elapsed.is_finite() {
        return 0.0;
    }
    (elapsed / duration).clamp(0.0, 1.0)
}

/// Sample the visuals of `scene` at `elapsed` seconds into a scene lasting `duration` seconds.
///
/// Captions are measured with the fixed metric.
pub fn sample_frame(
    scene: &Scene,
    elapsed: f64,
    duration: f64,
    canvas: Canvas,
    mode: CaptionMode,
) -> VisualFrame {
    sample_frame_with(scene, elapsed, duration, canvas, mode, &FixedAdvance)
}

/// [`sample_frame`] with caption widths taken from `measure`.
pub fn sample_frame_with(
    scene: &Scene,
    elapsed: f64,
    duration: f64,
    canvas: Canvas,
    mode: CaptionMode,
    measure: &dyn TextMeasure,
) -> VisualFrame {
    let progress = scene_progress(elapsed, duration);
    let image = match &scene.image {
        Some(img) => ImageSlot::Ready(img.clone()),
        None if scene.image_generating => ImageSlot::Generating,
        None => ImageSlot::Missing,
    };
    VisualFrame {
        scene_id: scene.id.clone(),
        canvas,
        progress,
        motion: scene.motion,
        transform: compute_transform(scene.motion, progress),
        image,
        audio_generating: scene.audio_generating,
        caption: compute_caption_layout_with(
            &scene.caption,
            mode,
            canvas.width,
            canvas.height,
            measure,
        ),
    }
}

/// Interactive presentation backend (a UI surface, a preview window, a test recorder).
pub trait Compositor {
    /// Show `frame`.
    fn present(&mut self, frame: &VisualFrame) -> ReelResult<()>;
}

/// Compositor that keeps every presented frame.
#[derive(Clone, Debug, Default)]
pub struct RecordingCompositor {
    /// Presented frames in order.
    pub frames: Vec<VisualFrame>,
}

impl Compositor for RecordingCompositor {
    fn present(&mut self, frame: &VisualFrame) -> ReelResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/visual/frame.rs"]
mod tests;
