use std::collections::VecDeque;

use smallvec::smallvec;

use crate::audio::bed::BedPath;
use crate::audio::buffer::{AudioBuffer, decode_narration};
use crate::audio::effects::{BLIP_OFFSET_SECS, SWEEP_OFFSET_SECS, accent_blip, transition_sweep};
use crate::audio::param::AudioParam;
use crate::audio::path::{
    FilterSpec, OUTPUT_CHANNELS, PathId, PathSpec, SignalPath, SinkSet, SourceSpec,
};
use crate::audio::sink::{AudioSink, NullSink};
use crate::config::AudioConfig;
use crate::foundation::core::secs_to_samples;
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::model::NarrationAudio;

/// Narration low-shelf corner frequency.
const NARRATION_SHELF_HZ: f64 = 180.0;
/// Narration low-shelf boost.
const NARRATION_SHELF_DB: f64 = 4.0;

/// Notification emitted by the graph while rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioEvent {
    /// The narration path `path` played its last sample at `at_sample`.
    NarrationEnded {
        /// Path that ended.
        path: PathId,
        /// Clock position (samples) of the end.
        at_sample: u64,
    },
}

/// Handle for a started narration path; carries the time base visuals need.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NarrationHandle {
    /// Path identifier used to match end events.
    pub path: PathId,
    /// Start position on the audio clock, in samples.
    pub start_sample: u64,
    /// Start time on the audio clock, in seconds.
    pub start_time: f64,
    /// Buffer length in samples.
    pub len_samples: u64,
    /// Buffer duration in seconds.
    pub duration: f64,
}

impl NarrationHandle {
    /// Clock position right after the last narration sample.
    pub fn end_sample(&self) -> u64 {
        self.start_sample + self.len_samples
    }
}

/// Counters for graph lifecycle and narration bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Processing contexts created.
    pub contexts_created: u64,
    /// Background bed paths created.
    pub bed_paths_created: u64,
    /// Suspended contexts resumed.
    pub resumes: u64,
    /// Narration paths started.
    pub narrations_started: u64,
    /// Narration paths severed (explicitly or by the next start).
    pub narrations_stopped: u64,
    /// Largest number of narration paths alive at once.
    pub max_concurrent_narrations: u64,
    /// Synthesized effect voices started.
    pub effects_triggered: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ContextState {
    Running,
    Suspended,
}

#[derive(Debug)]
struct ActiveNarration {
    path: SignalPath,
    end_reported: bool,
}

#[derive(Debug)]
struct AudioContext {
    sample_rate: u32,
    position: u64,
    state: ContextState,
    bed: BedPath,
    narration: Option<ActiveNarration>,
    effects: Vec<(PathId, SignalPath)>,
    capture: Option<Vec<f32>>,
    events: VecDeque<AudioEvent>,
    speakers_scratch: Vec<f32>,
    capture_scratch: Vec<f32>,
}

impl AudioContext {
    fn now(&self) -> f64 {
        self.position as f64 / f64::from(self.sample_rate)
    }
}

/// Owner of the audio processing context and every signal path in it.
///
/// The context and its background bed are created lazily by [`AudioGraph::ensure_graph`] and
/// live until [`AudioGraph::shutdown`]. At most one narration path exists at a time: starting a
/// new one severs the previous path (and its effect voices) first.
pub struct AudioGraph {
    cfg: AudioConfig,
    ctx: Option<AudioContext>,
    speakers: Box<dyn AudioSink>,
    stats: GraphStats,
    next_path_id: u64,
}

impl std::fmt::Debug for AudioGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioGraph")
            .field("cfg", &self.cfg)
            .field("ctx", &self.ctx.as_ref().map(|c| (c.position, c.state)))
            .field("stats", &self.stats)
            .finish()
    }
}

impl AudioGraph {
    /// Create a graph manager that writes speaker output into `speakers`.
    pub fn new(cfg: AudioConfig, speakers: Box<dyn AudioSink>) -> Self {
        Self {
            cfg,
            ctx: None,
            speakers,
            stats: GraphStats::default(),
            next_path_id: 1,
        }
    }

    /// Create a headless graph manager.
    pub fn headless(cfg: AudioConfig) -> Self {
        Self::new(cfg, Box::new(NullSink))
    }

    /// Create the context and background bed if absent, resume it if suspended.
    ///
    /// Idempotent; safe to call before every scene transition.
    pub fn ensure_graph(&mut self) {
        match &mut self.ctx {
            Some(ctx) => {
                if ctx.state == ContextState::Suspended {
                    ctx.state = ContextState::Running;
                    self.stats.resumes += 1;
                    tracing::debug!(position = ctx.position, "audio context resumed");
                }
            }
            None => {
                let sample_rate = self.cfg.sample_rate;
                self.ctx = Some(AudioContext {
                    sample_rate,
                    position: 0,
                    state: ContextState::Running,
                    bed: BedPath::new(sample_rate, self.cfg.bed_rest_gain),
                    narration: None,
                    effects: Vec::new(),
                    capture: None,
                    events: VecDeque::new(),
                    speakers_scratch: Vec::new(),
                    capture_scratch: Vec::new(),
                });
                self.stats.contexts_created += 1;
                self.stats.bed_paths_created += 1;
                tracing::debug!(sample_rate, "audio context created");
            }
        }
    }

    /// Stop the clock. Rendering produces nothing until the next [`AudioGraph::ensure_graph`].
    pub fn suspend(&mut self) {
        if let Some(ctx) = &mut self.ctx {
            ctx.state = ContextState::Suspended;
        }
    }

    /// Tear down the context, bed, and every path. The next `ensure_graph` starts fresh at 0.
    pub fn shutdown(&mut self) {
        if self.ctx.is_some() {
            self.stop_narration();
            self.ctx = None;
            tracing::debug!("audio context shut down");
        }
    }

    /// Return `true` once a context exists and is running.
    pub fn is_running(&self) -> bool {
        self.ctx
            .as_ref()
            .is_some_and(|c| c.state == ContextState::Running)
    }

    /// Processing sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.ctx
            .as_ref()
            .map(|c| c.sample_rate)
            .unwrap_or(self.cfg.sample_rate)
    }

    /// Audio clock position in samples (0 before the context exists).
    pub fn position(&self) -> u64 {
        self.ctx.as_ref().map(|c| c.position).unwrap_or(0)
    }

    /// Audio clock time in seconds.
    pub fn current_time(&self) -> f64 {
        self.ctx.as_ref().map(AudioContext::now).unwrap_or(0.0)
    }

    /// Lifecycle counters.
    pub fn stats(&self) -> GraphStats {
        self.stats
    }

    /// Sinks a newly started path should feed: speakers, plus the capture tap when attached.
    pub fn default_sinks(&self) -> SinkSet {
        match self.ctx.as_ref().and_then(|c| c.capture.as_ref()) {
            Some(_) => SinkSet::SPEAKERS_AND_CAPTURE,
            None => SinkSet::SPEAKERS,
        }
    }

    /// Current background bed gain (for meters and tests).
    pub fn bed_gain(&self) -> Option<f32> {
        self.ctx.as_ref().map(|c| c.bed.gain.value_at(c.now()))
    }

    /// Bed gain at an arbitrary clock time, following the current schedule.
    pub fn bed_gain_at(&self, time: f64) -> Option<f32> {
        self.ctx.as_ref().map(|c| c.bed.gain.value_at(time))
    }

    /// Currently playing narration path, if any and not yet ended.
    pub fn active_narration(&self) -> Option<PathId> {
        self.ctx
            .as_ref()
            .and_then(|c| c.narration.as_ref())
            .filter(|n| !n.end_reported)
            .map(|n| n.path.id)
    }

    fn alloc_path_id(&mut self) -> PathId {
        let id = PathId(self.next_path_id);
        self.next_path_id += 1;
        id
    }

    /// Start narration for one scene.
    ///
    /// Severs any previous narration path, then builds source -> low-shelf boost -> gain -> sinks
    /// at the current clock time. `cached` must have been decoded from `narration`; it is used
    /// when it is at the context rate, otherwise the payload is decoded here.
    ///
    /// Returns `None` when there is nothing playable (no payload, decode failure, or an empty
    /// buffer); the caller then falls back to a fixed-duration hold.
    pub fn play_narration(
        &mut self,
        narration: Option<&NarrationAudio>,
        cached: Option<AudioBuffer>,
        sinks: SinkSet,
    ) -> Option<NarrationHandle> {
        self.ensure_graph();
        self.stop_narration();

        let payload = narration?;
        let sample_rate = self.sample_rate();
        let buffer = match cached.filter(|b| b.sample_rate == sample_rate) {
            Some(buf) => buf,
            None => match decode_narration(payload, sample_rate) {
                Ok(buf) => buf,
                Err(err) => {
                    tracing::warn!(%err, "narration decode failed; holding scene instead");
                    return None;
                }
            },
        };
        if buffer.is_empty() {
            return None;
        }

        let id = self.alloc_path_id();
        let sweep_id = self.alloc_path_id();
        let blip_id = self.alloc_path_id();
        let cfg = self.cfg.clone();
        let ctx = self.ctx.as_mut()?;

        let start_sample = ctx.position;
        let start_time = ctx.now();
        let spec = PathSpec {
            source: SourceSpec::Buffer(buffer),
            filters: smallvec![FilterSpec::LowShelf {
                freq_hz: NARRATION_SHELF_HZ,
                gain_db: NARRATION_SHELF_DB,
            }],
            gain: AudioParam::new(cfg.narration_gain),
            sinks,
        };
        let path = SignalPath::build(id, spec, start_sample, sample_rate);
        let duration = path.duration_secs();
        let len_samples = path.len_samples;

        // Duck under the narration, release when it ends.
        ctx.bed.gain.cancel_and_hold(start_time);
        ctx.bed
            .gain
            .set_target_at_time(cfg.bed_duck_gain, start_time, cfg.duck_attack_secs);
        ctx.bed.gain.set_target_at_time(
            cfg.bed_rest_gain,
            start_time + duration,
            cfg.duck_release_secs,
        );

        if cfg.effects_enabled {
            let sweep_start = start_sample + secs_to_samples(SWEEP_OFFSET_SECS, sample_rate);
            let blip_start = start_sample + secs_to_samples(BLIP_OFFSET_SECS, sample_rate);
            ctx.effects.push((
                id,
                SignalPath::build(
                    sweep_id,
                    transition_sweep(id.0 as u32, sinks),
                    sweep_start,
                    sample_rate,
                ),
            ));
            ctx.effects.push((
                id,
                SignalPath::build(blip_id, accent_blip(sinks), blip_start, sample_rate),
            ));
            self.stats.effects_triggered += 2;
        }

        ctx.narration = Some(ActiveNarration {
            path,
            end_reported: false,
        });
        self.stats.narrations_started += 1;
        self.stats.max_concurrent_narrations = self.stats.max_concurrent_narrations.max(1);
        tracing::debug!(path = id.0, start_sample, duration, "narration started");

        Some(NarrationHandle {
            path: id,
            start_sample,
            start_time,
            len_samples,
            duration,
        })
    }

    /// Sever the current narration path and its effect voices.
    ///
    /// Best-effort: stopping when nothing is playing, or stopping a path that already ended, is
    /// not an error. Returns `true` when a path was removed.
    pub fn stop_narration(&mut self) -> bool {
        let release = self.cfg.duck_release_secs;
        let rest = self.cfg.bed_rest_gain;
        let Some(ctx) = self.ctx.as_mut() else {
            return false;
        };
        let Some(active) = ctx.narration.take() else {
            return false;
        };
        let now = ctx.now();
        if !active.path.finished_by(ctx.position) {
            ctx.bed.gain.cancel_and_hold(now);
            ctx.bed.gain.set_target_at_time(rest, now, release);
        }
        let owner = active.path.id;
        ctx.effects.retain(|(o, _)| *o != owner);
        self.stats.narrations_stopped += 1;
        tracing::debug!(path = owner.0, "narration stopped");
        true
    }

    /// Clock position of the next sample-accurate event (the active narration's end).
    pub fn next_boundary(&self) -> Option<u64> {
        let ctx = self.ctx.as_ref()?;
        let n = ctx.narration.as_ref()?;
        (!n.end_reported).then(|| n.path.end_sample())
    }

    /// Pop the oldest pending event.
    pub fn poll_event(&mut self) -> Option<AudioEvent> {
        self.ctx.as_mut()?.events.pop_front()
    }

    /// Attach the recording tap. Fails when no context exists or a tap is already attached.
    pub fn attach_capture_sink(&mut self) -> ReelResult<()> {
        let ctx = self
            .ctx
            .as_mut()
            .ok_or_else(|| ReelError::capture("audio context is not initialized"))?;
        if ctx.capture.is_some() {
            return Err(ReelError::capture("capture sink is already attached"));
        }
        ctx.capture = Some(Vec::new());
        Ok(())
    }

    /// Detach the recording tap, returning samples not yet drained.
    pub fn detach_capture_sink(&mut self) -> Vec<f32> {
        self.ctx
            .as_mut()
            .and_then(|c| c.capture.take())
            .unwrap_or_default()
    }

    /// Take captured interleaved stereo samples rendered since the last drain.
    pub fn drain_capture(&mut self) -> Vec<f32> {
        self.ctx
            .as_mut()
            .and_then(|c| c.capture.as_mut())
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Render `frames` samples, advancing the clock.
    ///
    /// A suspended or absent context renders nothing and does not advance.
    pub fn render(&mut self, frames: usize) -> ReelResult<()> {
        let Some(ctx) = self.ctx.as_mut() else {
            return Ok(());
        };
        if ctx.state != ContextState::Running || frames == 0 {
            return Ok(());
        }

        let block_start = ctx.position;
        let n = frames * OUTPUT_CHANNELS;
        ctx.speakers_scratch.clear();
        ctx.speakers_scratch.resize(n, 0.0);
        let capturing = ctx.capture.is_some();
        ctx.capture_scratch.clear();
        if capturing {
            ctx.capture_scratch.resize(n, 0.0);
        }

        {
            let AudioContext {
                bed,
                narration,
                effects,
                speakers_scratch,
                capture_scratch,
                ..
            } = &mut *ctx;
            bed.render_into(
                block_start,
                speakers_scratch,
                capturing.then_some(capture_scratch.as_mut_slice()),
            );
            if let Some(active) = narration.as_mut() {
                active.path.render_into(
                    block_start,
                    speakers_scratch,
                    capturing.then_some(capture_scratch.as_mut_slice()),
                );
            }
            for (_, fx) in effects.iter_mut() {
                fx.render_into(
                    block_start,
                    speakers_scratch,
                    capturing.then_some(capture_scratch.as_mut_slice()),
                );
            }
        }

        for s in ctx.speakers_scratch.iter_mut() {
            *s = s.clamp(-1.0, 1.0);
        }
        ctx.position += frames as u64;
        let position = ctx.position;
        ctx.effects.retain(|(_, fx)| !fx.finished_by(position));

        if let Some(n) = ctx.narration.as_mut()
            && !n.end_reported
            && n.path.finished_by(position)
        {
            n.end_reported = true;
            ctx.events.push_back(AudioEvent::NarrationEnded {
                path: n.path.id,
                at_sample: n.path.end_sample(),
            });
            tracing::debug!(path = n.path.id.0, "narration ended");
        }

        if let Some(tap) = ctx.capture.as_mut() {
            tap.extend(ctx.capture_scratch.iter().map(|s| s.clamp(-1.0, 1.0)));
        }
        self.speakers.write(&ctx.speakers_scratch, ctx.sample_rate)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/graph.rs"]
mod tests;
