use crate::foundation::core::Canvas;
use crate::foundation::math::lerp;
use crate::scene::model::MotionDirective;

/// Scale at the start of a zoom-in (and end of a zoom-out).
pub const ZOOM_MIN: f64 = 1.0;
/// Scale at the end of a zoom-in (and start of a zoom-out).
pub const ZOOM_MAX: f64 = 1.15;
/// Constant scale held during pans.
pub const PAN_SCALE: f64 = 1.1;
/// Horizontal pan travel, in per-mille of canvas width.
pub const PAN_TRAVEL: f64 = 30.0;

/// Image motion parameters at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionTransform {
    /// Uniform scale about the canvas center.
    pub scale: f64,
    /// Horizontal offset in per-mille of canvas width (positive moves right).
    pub translate_x: f64,
}

impl MotionTransform {
    /// No motion.
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translate_x: 0.0,
    };

    /// Horizontal offset in pixels for `canvas`.
    pub fn translate_px(&self, canvas: Canvas) -> f64 {
        self.translate_x * f64::from(canvas.width) / 1000.0
    }

    /// Canvas-space affine: scale about the center, then translate.
    pub fn to_affine(&self, canvas: Canvas) -> kurbo::Affine {
        let cx = f64::from(canvas.width) * 0.5;
        let cy = f64::from(canvas.height) * 0.5;
        kurbo::Affine::translate((cx + self.translate_px(canvas), cy))
            * kurbo::Affine::scale(self.scale)
            * kurbo::Affine::translate((-cx, -cy))
    }
}

/// Pan/zoom parameters for `motion` at `progress` (clamped to `[0, 1]`).
///
/// Piecewise linear: zoom-in 1.0 -> 1.15, zoom-out 1.15 -> 1.0, pans hold 1.1 and travel
/// 0 -> -30 (left) or 0 -> +30 (right).
pub fn compute_transform(motion: MotionDirective, progress: f64) -> MotionTransform {
    let p = if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    };
    match motion {
        MotionDirective::ZoomIn => MotionTransform {
            scale: lerp(ZOOM_MIN, ZOOM_MAX, p),
            translate_x: 0.0,
        },
        MotionDirective::ZoomOut => MotionTransform {
            scale: lerp(ZOOM_MAX, ZOOM_MIN, p),
            translate_x: 0.0,
        },
        MotionDirective::PanLeft => MotionTransform {
            scale: PAN_SCALE,
            translate_x: -PAN_TRAVEL * p,
        },
        MotionDirective::PanRight => MotionTransform {
            scale: PAN_SCALE,
            translate_x: PAN_TRAVEL * p,
        },
    }
}

#[cfg(test)]
#[path = "../../tests/unit/visual/transform.rs"]
mod tests;
