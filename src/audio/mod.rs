//! Audio graph: narration paths, background bed, ducking and synthesized effects.
//!
//! All timing is expressed on the sample clock owned by [`graph::AudioGraph`]. Nothing here reads
//! wall-clock time, so a capture run renders exactly what a preview run plays.

/// Decoded mono sample buffers and PCM decoding.
pub mod buffer;
/// Background drone bed.
pub(crate) mod bed;
/// Filters and oscillators.
pub(crate) mod dsp;
/// Procedurally generated transition sweep and accent blip.
pub(crate) mod effects;
/// Graph manager and processing context.
pub mod graph;
/// Scheduled parameter automation.
pub mod param;
/// Declarative signal path specs and their runtime state.
pub mod path;
/// Output sinks.
pub mod sink;
