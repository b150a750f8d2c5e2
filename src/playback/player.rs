use std::sync::Arc;

use smallvec::SmallVec;

use crate::audio::graph::{AudioEvent, AudioGraph, GraphStats};
use crate::audio::sink::{AudioSink, NullSink};
use crate::config::ReelConfig;
use crate::foundation::core::Canvas;
use crate::foundation::error::ReelResult;
use crate::playback::preload::{PreloadCache, PreloadStats};
use crate::playback::sequencer::{
    ActiveScene, PlaybackMode, PlaybackStatus, Sequencer, SequencerIo, SequencerOutput, Trigger,
};
use crate::scene::list::SceneList;
use crate::visual::caption::{FixedAdvance, TextMeasure};
use crate::visual::frame::{Compositor, FALLBACK_CAPTURE_PROGRESS, VisualFrame, sample_frame_with};

/// Notifications for the surrounding application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The active index changed (for UI highlighting).
    SceneChanged {
        /// New active index.
        index: usize,
    },
    /// Play/pause/ended status changed.
    StatusChanged(PlaybackStatus),
}

/// Playback engine facade: one timeline, one mutator.
///
/// The audio clock inside [`AudioGraph`] is the only time source. Callers advance it with
/// [`Player::pump`]; visuals are sampled from it with [`Player::visual_frame`].
#[derive(Debug)]
pub struct Player {
    cfg: ReelConfig,
    canvas: Canvas,
    scenes: SceneList,
    graph: AudioGraph,
    preload: PreloadCache,
    sequencer: Sequencer,
    events: Vec<PlayerEvent>,
    caption_measure: Option<Arc<dyn TextMeasure>>,
}

impl Player {
    /// Create a stopped player at index 0 writing speaker output to `speakers`.
    pub fn new(
        cfg: ReelConfig,
        scenes: SceneList,
        speakers: Box<dyn AudioSink>,
    ) -> ReelResult<Self> {
        cfg.validate()?;
        let canvas = cfg.canvas();
        let graph = AudioGraph::new(cfg.audio.clone(), speakers);
        let preload = PreloadCache::new(cfg.audio.sample_rate, None)?;
        let sequencer = Sequencer::new(cfg.fallback_duration_secs, PlaybackMode::Preview);
        Ok(Self {
            cfg,
            canvas,
            scenes,
            graph,
            preload,
            sequencer,
            events: Vec::new(),
            caption_measure: None,
        })
    }

    /// Create a player without speaker output.
    pub fn headless(cfg: ReelConfig, scenes: SceneList) -> ReelResult<Self> {
        Self::new(cfg, scenes, Box::new(NullSink))
    }

    /// Configuration in effect.
    pub fn config(&self) -> &ReelConfig {
        &self.cfg
    }

    /// Target frame dimensions.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Shared scene list handle.
    pub fn scenes(&self) -> &SceneList {
        &self.scenes
    }

    /// Active index, clamped against the live list.
    pub fn index(&self) -> usize {
        self.scenes.clamp_index(self.sequencer.index())
    }

    /// Play/pause/ended status.
    pub fn status(&self) -> PlaybackStatus {
        self.sequencer.status()
    }

    /// Current mode.
    pub fn mode(&self) -> PlaybackMode {
        self.sequencer.mode()
    }

    /// Entered scene and its time base, while playing.
    pub fn active(&self) -> Option<ActiveScene> {
        self.sequencer.active()
    }

    /// Audio clock position in samples.
    pub fn position(&self) -> u64 {
        self.graph.position()
    }

    /// Processing sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.graph.sample_rate()
    }

    /// Audio graph counters.
    pub fn graph_stats(&self) -> GraphStats {
        self.graph.stats()
    }

    /// Preload counters.
    pub fn preload_stats(&self) -> PreloadStats {
        self.preload.stats()
    }

    pub(crate) fn graph_mut(&mut self) -> &mut AudioGraph {
        &mut self.graph
    }

    pub(crate) fn set_mode(&mut self, mode: PlaybackMode) -> bool {
        self.sequencer.set_mode(mode)
    }

    fn io(&mut self) -> (&mut Sequencer, SequencerIo<'_>) {
        (
            &mut self.sequencer,
            SequencerIo {
                scenes: &self.scenes,
                graph: &mut self.graph,
                preload: &mut self.preload,
            },
        )
    }

    fn note_status(&mut self, before: PlaybackStatus, index_before: usize) {
        let status = self.sequencer.status();
        if status == PlaybackStatus::Playing && self.sequencer.index() != index_before {
            self.events.push(PlayerEvent::SceneChanged {
                index: self.sequencer.index(),
            });
        }
        if status != before {
            self.events.push(PlayerEvent::StatusChanged(status));
        }
    }

    /// Start (or resume) playback at the current index.
    #[tracing::instrument(skip(self), fields(index = self.sequencer.index()))]
    pub fn start(&mut self) -> bool {
        let before = self.sequencer.status();
        let (seq, mut io) = self.io();
        let started = seq.start(&mut io);
        if started {
            self.events.push(PlayerEvent::SceneChanged {
                index: self.sequencer.index(),
            });
        }
        self.note_status(before, self.sequencer.index());
        started
    }

    /// Pause: silence narration and stop the clock.
    pub fn pause(&mut self) -> bool {
        let before = self.sequencer.status();
        let (seq, mut io) = self.io();
        let paused = seq.pause(&mut io);
        self.note_status(before, self.sequencer.index());
        paused
    }

    /// Stop from any state, keeping the index.
    pub fn stop(&mut self) {
        let before = self.sequencer.status();
        let (seq, mut io) = self.io();
        seq.stop(&mut io);
        self.note_status(before, self.sequencer.index());
    }

    /// Jump to `index` (clamped); keeps playing if playing.
    pub fn seek(&mut self, index: usize) {
        let before = self.sequencer.status();
        let index_before = self.sequencer.index();
        let (seq, mut io) = self.io();
        seq.seek(index, &mut io);
        if self.sequencer.index() != index_before || before == PlaybackStatus::Playing {
            self.events.push(PlayerEvent::SceneChanged {
                index: self.sequencer.index(),
            });
        }
        self.note_status(before, self.sequencer.index());
    }

    /// Tear down playback and the audio context.
    pub fn shutdown(&mut self) {
        self.stop();
        self.graph.shutdown();
    }

    /// Take pending notifications.
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance the audio clock by `frames` samples, applying every transition that falls due.
    ///
    /// Rendering is split at narration ends and fallback deadlines. In preview the next scene
    /// starts at the exact sample the previous one ended; in capture transitions are applied
    /// after the whole block, so scenes start on frame boundaries.
    pub fn pump(&mut self, frames: usize) -> ReelResult<()> {
        let mut remaining = frames as u64;
        let mut deferred: SmallVec<[Trigger; 2]> = SmallVec::new();
        while remaining > 0 && self.graph.is_running() {
            let pos = self.graph.position();
            let boundary = [self.graph.next_boundary(), self.sequencer.fallback_deadline()]
                .into_iter()
                .flatten()
                .filter(|b| *b > pos)
                .min();
            let chunk = boundary.map_or(remaining, |b| (b - pos).min(remaining));
            self.graph.render(chunk as usize)?;
            remaining -= chunk;

            let triggers = self.collect_triggers();
            match self.sequencer.mode() {
                PlaybackMode::Preview => {
                    for t in triggers {
                        self.apply_trigger(t);
                    }
                }
                PlaybackMode::Capture => deferred.extend(triggers),
            }
        }
        for t in deferred {
            self.apply_trigger(t);
        }
        self.preload.poll();
        Ok(())
    }

    fn collect_triggers(&mut self) -> SmallVec<[Trigger; 2]> {
        let mut out = SmallVec::new();
        while let Some(ev) = self.graph.poll_event() {
            match ev {
                AudioEvent::NarrationEnded { path, .. } => out.push(Trigger::NarrationEnded(path)),
            }
        }
        if let Some(t) = self.sequencer.take_expired_fallback(self.graph.position()) {
            out.push(t);
        }
        out
    }

    fn apply_trigger(&mut self, trigger: Trigger) {
        let before = self.sequencer.status();
        let (seq, mut io) = self.io();
        match seq.handle(trigger, &mut io) {
            SequencerOutput::None => {}
            SequencerOutput::Advanced { to, .. } => {
                self.events.push(PlayerEvent::SceneChanged { index: to });
            }
            SequencerOutput::Ended => {
                if self.sequencer.mode() == PlaybackMode::Preview {
                    self.events.push(PlayerEvent::SceneChanged { index: 0 });
                }
                self.events
                    .push(PlayerEvent::StatusChanged(PlaybackStatus::Ended));
                return;
            }
        }
        if self.sequencer.status() != before {
            self.events
                .push(PlayerEvent::StatusChanged(self.sequencer.status()));
        }
    }

    /// Elapsed and total seconds of the active scene on the audio clock.
    pub fn scene_clock(&self) -> Option<(f64, f64)> {
        let active = self.sequencer.active()?;
        let elapsed = self
            .graph
            .position()
            .saturating_sub(active.timing.start_sample()) as f64
            / f64::from(self.graph.sample_rate());
        Some((elapsed, active.timing.duration_secs()))
    }

    /// Measure captions with `measure` (typically the compositor's caption face).
    ///
    /// `None` restores the fixed metric.
    pub fn set_caption_measure(&mut self, measure: Option<Arc<dyn TextMeasure>>) {
        self.caption_measure = measure;
    }

    /// Visuals for the current instant.
    ///
    /// While stopped the current scene is shown at its first frame. `None` for an empty list.
    pub fn visual_frame(&self) -> Option<VisualFrame> {
        match &self.caption_measure {
            Some(m) => self.visual_frame_with(m.as_ref()),
            None => self.visual_frame_with(&FixedAdvance),
        }
    }

    /// [`visual_frame`](Self::visual_frame) with captions measured by `measure`.
    pub fn visual_frame_with(&self, measure: &dyn TextMeasure) -> Option<VisualFrame> {
        let index = self.index();
        let scene = self.scenes.get(index)?;
        let mode = self.cfg.caption_mode;
        let Some(active) = self.sequencer.active() else {
            return Some(sample_frame_with(
                &scene,
                0.0,
                1.0,
                self.canvas,
                mode,
                measure,
            ));
        };
        let (mut elapsed, duration) = self.scene_clock()?;
        if self.sequencer.mode() == PlaybackMode::Capture && active.timing.is_fallback() {
            elapsed = duration * FALLBACK_CAPTURE_PROGRESS;
        }
        Some(sample_frame_with(
            &scene,
            elapsed,
            duration,
            self.canvas,
            mode,
            measure,
        ))
    }

    /// Sample the current visuals and hand them to `compositor`.
    pub fn present(&self, compositor: &mut dyn Compositor) -> ReelResult<()> {
        match self.visual_frame() {
            Some(frame) => compositor.present(&frame),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/player.rs"]
mod tests;
