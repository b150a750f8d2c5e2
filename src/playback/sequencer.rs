use crate::audio::graph::{AudioGraph, NarrationHandle};
use crate::audio::path::PathId;
use crate::foundation::core::secs_to_samples;
use crate::playback::preload::PreloadCache;
use crate::scene::list::SceneList;

/// Play/pause/ended status reported to the surrounding application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlaybackStatus {
    /// Not playing; the index is kept.
    #[default]
    Stopped,
    /// A scene is active and time advances.
    Playing,
    /// The last scene finished.
    Ended,
}

/// Who drives the sequencer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlaybackMode {
    /// Interactive playback; preloads the next scene and wraps to 0 at the end.
    #[default]
    Preview,
    /// Offline recording; the end of the last scene finalizes the capture.
    Capture,
}

/// Time base of the active scene on the audio clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SceneTiming {
    /// The scene's narration path is playing.
    Narrated(NarrationHandle),
    /// No playable narration; the scene is held until `deadline_sample`.
    Fallback {
        /// Clock position at scene start.
        start_sample: u64,
        /// Clock position at which the scene auto-advances.
        deadline_sample: u64,
        /// Hold duration in seconds.
        duration: f64,
    },
}

impl SceneTiming {
    /// Clock position at which the scene started.
    pub fn start_sample(&self) -> u64 {
        match self {
            Self::Narrated(h) => h.start_sample,
            Self::Fallback { start_sample, .. } => *start_sample,
        }
    }

    /// Scene duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        match self {
            Self::Narrated(h) => h.duration,
            Self::Fallback { duration, .. } => *duration,
        }
    }

    /// Return `true` for narration-less holds.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// The scene currently entered by the sequencer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveScene {
    /// Scene index at entry.
    pub index: usize,
    /// Generation stamped at entry; later completions carrying another value are stale.
    pub generation: u64,
    /// Audio-clock time base.
    pub timing: SceneTiming,
}

/// Something that may advance the sequencer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// A narration path reported its end.
    NarrationEnded(PathId),
    /// The fallback hold for the scene entered at `generation` elapsed.
    FallbackElapsed {
        /// Generation of the scene the timer was armed for.
        generation: u64,
    },
}

/// Result of applying a trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencerOutput {
    /// Nothing changed (including stale triggers).
    None,
    /// Moved to the next scene.
    Advanced {
        /// Previous index.
        from: usize,
        /// New index.
        to: usize,
    },
    /// The last scene finished.
    Ended,
}

/// Collaborators the sequencer drives on every transition.
pub struct SequencerIo<'a> {
    /// Externally owned scenes, read by index.
    pub scenes: &'a SceneList,
    /// Audio graph manager.
    pub graph: &'a mut AudioGraph,
    /// Next-scene narration cache.
    pub preload: &'a mut PreloadCache,
}

/// Playback state machine. Holds an index into the scene list, never a scene.
#[derive(Clone, Debug)]
pub struct Sequencer {
    index: usize,
    status: PlaybackStatus,
    mode: PlaybackMode,
    generation: u64,
    active: Option<ActiveScene>,
    fallback_secs: f64,
    fallback_fired: bool,
}

impl Sequencer {
    /// Create a stopped sequencer at index 0.
    pub fn new(fallback_secs: f64, mode: PlaybackMode) -> Self {
        Self {
            index: 0,
            status: PlaybackStatus::Stopped,
            mode,
            generation: 0,
            active: None,
            fallback_secs,
            fallback_fired: false,
        }
    }

    /// Current index as last set; callers clamp against the live list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current status.
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// Current mode.
    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// Switch mode. Only takes effect between runs; ignored while playing.
    pub fn set_mode(&mut self, mode: PlaybackMode) -> bool {
        if self.status == PlaybackStatus::Playing {
            return false;
        }
        self.mode = mode;
        true
    }

    /// Bumped on every scene entry and cancellation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Entered scene, while playing.
    pub fn active(&self) -> Option<ActiveScene> {
        self.active
    }

    /// Hold duration for narration-less scenes.
    pub fn fallback_secs(&self) -> f64 {
        self.fallback_secs
    }

    /// Armed fallback deadline (clock samples), until it fires.
    pub fn fallback_deadline(&self) -> Option<u64> {
        match self.active?.timing {
            SceneTiming::Fallback {
                deadline_sample, ..
            } if !self.fallback_fired => Some(deadline_sample),
            _ => None,
        }
    }

    /// Fire the fallback timer once the clock reached its deadline.
    pub fn take_expired_fallback(&mut self, position: u64) -> Option<Trigger> {
        let deadline = self.fallback_deadline()?;
        if position < deadline {
            return None;
        }
        self.fallback_fired = true;
        Some(Trigger::FallbackElapsed {
            generation: self.generation,
        })
    }

    /// `Stopped|Ended --start--> Playing` at the current index.
    ///
    /// Returns `false` when already playing or the list is empty.
    pub fn start(&mut self, io: &mut SequencerIo<'_>) -> bool {
        if self.status == PlaybackStatus::Playing || io.scenes.is_empty() {
            return false;
        }
        self.status = PlaybackStatus::Playing;
        self.enter(io);
        true
    }

    /// `Playing --pause--> Stopped`; silences narration and suspends the clock.
    pub fn pause(&mut self, io: &mut SequencerIo<'_>) -> bool {
        if self.status != PlaybackStatus::Playing {
            return false;
        }
        self.cancel(io);
        self.status = PlaybackStatus::Stopped;
        io.graph.suspend();
        true
    }

    /// Stop from any state, keeping the index. The clock keeps running.
    pub fn stop(&mut self, io: &mut SequencerIo<'_>) {
        self.cancel(io);
        io.preload.invalidate();
        self.status = PlaybackStatus::Stopped;
    }

    /// Jump to `index` (clamped). Keeps playing when playing, otherwise lands `Stopped`.
    pub fn seek(&mut self, index: usize, io: &mut SequencerIo<'_>) {
        self.cancel(io);
        io.preload.invalidate();
        self.index = io.scenes.clamp_index(index);
        if self.status == PlaybackStatus::Playing && !io.scenes.is_empty() {
            self.enter(io);
        } else {
            self.status = PlaybackStatus::Stopped;
        }
        tracing::debug!(index = self.index, status = ?self.status, "seek");
    }

    /// Apply a trigger, ignoring it when it belongs to a scene that is no longer active.
    pub fn handle(&mut self, trigger: Trigger, io: &mut SequencerIo<'_>) -> SequencerOutput {
        if self.status != PlaybackStatus::Playing {
            return SequencerOutput::None;
        }
        let Some(active) = self.active else {
            return SequencerOutput::None;
        };
        let current = match (trigger, active.timing) {
            (Trigger::NarrationEnded(path), SceneTiming::Narrated(h)) => path == h.path,
            (Trigger::FallbackElapsed { generation }, SceneTiming::Fallback { .. }) => {
                generation == active.generation
            }
            _ => false,
        };
        if !current {
            tracing::debug!(?trigger, index = active.index, "stale trigger ignored");
            return SequencerOutput::None;
        }
        self.advance(io)
    }

    fn advance(&mut self, io: &mut SequencerIo<'_>) -> SequencerOutput {
        let from = io.scenes.clamp_index(self.index);
        if from + 1 < io.scenes.len() {
            self.index = from + 1;
            self.enter(io);
            tracing::debug!(from, to = self.index, "scene advanced");
            return SequencerOutput::Advanced {
                from,
                to: self.index,
            };
        }

        self.cancel(io);
        self.status = PlaybackStatus::Ended;
        if self.mode == PlaybackMode::Preview {
            self.index = 0;
        }
        tracing::debug!(mode = ?self.mode, "playback ended");
        SequencerOutput::Ended
    }

    fn cancel(&mut self, io: &mut SequencerIo<'_>) {
        io.graph.stop_narration();
        self.active = None;
        self.fallback_fired = false;
        self.generation += 1;
    }

    fn enter(&mut self, io: &mut SequencerIo<'_>) {
        self.generation += 1;
        self.fallback_fired = false;
        let index = io.scenes.clamp_index(self.index);
        self.index = index;

        io.graph.ensure_graph();
        let narration = io.scenes.narration(index);
        let cached = match (self.mode, narration.as_ref()) {
            (PlaybackMode::Preview, Some(payload)) => io.preload.take_matching(index, payload),
            _ => None,
        };
        let sinks = io.graph.default_sinks();
        let timing = match io.graph.play_narration(narration.as_ref(), cached, sinks) {
            Some(handle) => SceneTiming::Narrated(handle),
            None => {
                let start_sample = io.graph.position();
                let hold = secs_to_samples(self.fallback_secs, io.graph.sample_rate());
                tracing::debug!(index, hold_secs = self.fallback_secs, "fallback hold armed");
                SceneTiming::Fallback {
                    start_sample,
                    deadline_sample: start_sample + hold,
                    duration: self.fallback_secs,
                }
            }
        };
        self.active = Some(ActiveScene {
            index,
            generation: self.generation,
            timing,
        });

        if self.mode == PlaybackMode::Preview && index + 1 < io.scenes.len() {
            let next = io.scenes.narration(index + 1);
            io.preload.preload(index + 1, next.as_ref());
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/sequencer.rs"]
mod tests;
