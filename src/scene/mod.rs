//! Scene data supplied by the upstream producer.
//!
//! The engine never owns scenes: it reads them by index from a shared [`SceneList`] that the
//! producer may mutate at any time.

/// JSON manifest loader for scene lists stored on disk.
pub mod manifest;
/// Shared, externally-mutated scene list.
pub mod list;
/// Scene payload types.
pub mod model;
