//! Offline capture: drives the player in capture mode and feeds an encoder frame by frame.

/// Capture session state machine.
pub mod pipeline;
