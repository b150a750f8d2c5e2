//! Time-driven visuals shared by every rendering backend.
//!
//! Everything here is a pure function of (scene, elapsed, duration, canvas, caption mode). The
//! interactive [`frame::Compositor`] path and the offline frame renderer both go through
//! [`frame::sample_frame`], so motion and layout cannot diverge between them.

/// Caption markup parsing and layout.
pub mod caption;
/// Per-tick frame description and the compositor seam.
pub mod frame;
/// Pan/zoom motion.
pub mod transform;
