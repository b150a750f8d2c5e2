//! Encoder backends for capture sessions.

/// Encoder trait, chunk types and the in-memory container.
pub mod encoder;
/// System `ffmpeg` MP4 encoder.
pub mod ffmpeg;
