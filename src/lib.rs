//! Reel is a scene playback and recording engine for narrated slideshows.
//!
//! A [`SceneList`] fed by an upstream producer is played back as one timeline: per-scene
//! narration over a ducked background bed, pan/zoom motion and captions sampled from the audio
//! clock. The same timeline can be captured offline into a single audio+video artifact.
//!
//! - Build a [`Player`] over a [`SceneList`] and drive it with [`Player::pump`]
//! - Sample visuals with [`Player::visual_frame`] or render them with a [`FrameRenderer`]
//! - Record with a [`CapturePipeline`] into any [`CaptureEncoder`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Audio graph: narration paths, ducking and effects on a sample clock.
pub mod audio;
/// Offline capture sessions.
pub mod capture;
/// Engine configuration.
pub mod config;
/// Encoder backends.
pub mod encode;
/// Preload cache, sequencer and player facade.
pub mod playback;
/// CPU frame rendering.
pub mod render;
/// Producer-facing scene model.
pub mod scene;
/// Backend-agnostic motion and caption layout.
pub mod visual;

pub use crate::foundation::core::{
    Canvas, Fps, FrameIndex, Orientation, Rgba8Premul, frame_to_sample, secs_to_samples,
};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::audio::graph::{AudioEvent, AudioGraph, GraphStats, NarrationHandle};
pub use crate::audio::sink::{AudioSink, MemorySink, NullSink};
pub use crate::capture::pipeline::{CaptureArtifact, CapturePipeline, CaptureState, CaptureStep};
pub use crate::config::{AudioConfig, CaptureConfig, ReelConfig};
pub use crate::encode::encoder::{
    CaptureEncoder, ContainerSummary, EncodedChunk, EncoderConfig, InMemoryEncoder, StreamKind,
};
pub use crate::encode::ffmpeg::{FfmpegEncoder, is_ffmpeg_on_path};
pub use crate::playback::player::{Player, PlayerEvent};
pub use crate::playback::preload::{PreloadCache, PreloadStats};
pub use crate::playback::sequencer::{PlaybackMode, PlaybackStatus};
pub use crate::render::FrameRGBA;
pub use crate::render::cpu::FrameRenderer;
pub use crate::render::text::CaptionFont;
pub use crate::scene::list::SceneList;
pub use crate::scene::manifest::SceneManifest;
pub use crate::scene::model::{
    ImagePayload, MotionDirective, NarrationAudio, PcmFormat, Scene, SceneId,
};
pub use crate::visual::caption::{CaptionMode, FixedAdvance, TextMeasure};
pub use crate::visual::frame::{Compositor, ImageSlot, RecordingCompositor, VisualFrame};
pub use crate::visual::transform::{MotionTransform, compute_transform};
