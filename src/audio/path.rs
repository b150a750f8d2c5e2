use std::sync::Arc;

use smallvec::SmallVec;

use crate::audio::buffer::AudioBuffer;
use crate::audio::dsp::{Biquad, BiquadCoeffs, SineSweep};
use crate::audio::param::AudioParam;
use crate::foundation::core::secs_to_samples;
use crate::foundation::math::{XorShift32, exp_lerp};

/// Output channel count of every rendered block (interleaved stereo).
pub const OUTPUT_CHANNELS: usize = 2;

/// Identifier of one built signal path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathId(pub u64);

/// Which outputs a path feeds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SinkSet {
    /// Audible output.
    pub speakers: bool,
    /// Recording tap used by a capture session.
    pub capture: bool,
}

impl SinkSet {
    /// Speakers only.
    pub const SPEAKERS: Self = Self {
        speakers: true,
        capture: false,
    };

    /// Speakers plus the recording tap.
    pub const SPEAKERS_AND_CAPTURE: Self = Self {
        speakers: true,
        capture: true,
    };
}

/// Signal source of a path.
#[derive(Clone, Debug)]
pub enum SourceSpec {
    /// Decoded sample buffer (narration).
    Buffer(AudioBuffer),
    /// Deterministic white noise buffer.
    Noise {
        /// PRNG seed.
        seed: u32,
        /// Buffer length in seconds.
        duration_secs: f64,
    },
    /// Sine with an exponential frequency glide.
    Sine {
        /// Frequency at start.
        start_hz: f64,
        /// Frequency after `ramp_secs`.
        end_hz: f64,
        /// Glide duration.
        ramp_secs: f64,
        /// Total duration in seconds.
        duration_secs: f64,
    },
}

/// One stage of a path's fixed filter chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterSpec {
    /// Low-frequency boost.
    LowShelf {
        /// Corner frequency.
        freq_hz: f64,
        /// Boost in dB.
        gain_db: f64,
    },
    /// Low pass whose cutoff sweeps exponentially from `start_hz` to `end_hz`.
    LowPass {
        /// Cutoff at path start.
        start_hz: f64,
        /// Cutoff after `sweep_secs`.
        end_hz: f64,
        /// Sweep duration (0 for a static filter).
        sweep_secs: f64,
        /// Resonance.
        q: f64,
    },
}

/// Declarative description of a per-scene signal path: source, filter chain, gain, sinks.
///
/// A path is built once per scene and dropped at the transition; no connection outlives it.
#[derive(Clone, Debug)]
pub struct PathSpec {
    /// Signal source.
    pub source: SourceSpec,
    /// Filters applied in order.
    pub filters: SmallVec<[FilterSpec; 2]>,
    /// Gain automation; times are seconds relative to path start.
    pub gain: AudioParam,
    /// Outputs fed by this path.
    pub sinks: SinkSet,
}

#[derive(Clone, Debug)]
enum SourceState {
    Samples(Arc<Vec<f32>>),
    Sine(SineSweep),
}

#[derive(Clone, Debug)]
struct FilterState {
    biquad: Biquad,
    sweep: Option<(f64, f64, f64, f64)>,
}

const SWEEP_UPDATE_INTERVAL: u64 = 32;

/// Runtime state of a started path.
#[derive(Clone, Debug)]
pub(crate) struct SignalPath {
    pub(crate) id: PathId,
    pub(crate) start_sample: u64,
    pub(crate) len_samples: u64,
    pub(crate) sinks: SinkSet,
    sample_rate: u32,
    source: SourceState,
    filters: Vec<FilterState>,
    gain: AudioParam,
}

impl SignalPath {
    pub(crate) fn build(id: PathId, spec: PathSpec, start_sample: u64, sample_rate: u32) -> Self {
        let (source, len_samples) = match spec.source {
            SourceSpec::Buffer(buf) => {
                let len = buf.samples.len() as u64;
                (SourceState::Samples(buf.samples), len)
            }
            SourceSpec::Noise {
                seed,
                duration_secs,
            } => {
                let len = secs_to_samples(duration_secs, sample_rate);
                let mut rng = XorShift32::new(seed);
                let noise: Vec<f32> = (0..len).map(|_| rng.next_bipolar()).collect();
                (SourceState::Samples(Arc::new(noise)), len)
            }
            SourceSpec::Sine {
                start_hz,
                end_hz,
                ramp_secs,
                duration_secs,
            } => (
                SourceState::Sine(SineSweep::new(start_hz, end_hz, ramp_secs)),
                secs_to_samples(duration_secs, sample_rate),
            ),
        };

        let filters = spec
            .filters
            .iter()
            .map(|f| match *f {
                FilterSpec::LowShelf { freq_hz, gain_db } => FilterState {
                    biquad: Biquad::new(BiquadCoeffs::low_shelf(sample_rate, freq_hz, gain_db)),
                    sweep: None,
                },
                FilterSpec::LowPass {
                    start_hz,
                    end_hz,
                    sweep_secs,
                    q,
                } => FilterState {
                    biquad: Biquad::new(BiquadCoeffs::low_pass(sample_rate, start_hz, q)),
                    sweep: (sweep_secs > 0.0).then_some((start_hz, end_hz, sweep_secs, q)),
                },
            })
            .collect();

        Self {
            id,
            start_sample,
            len_samples,
            sinks: spec.sinks,
            sample_rate,
            source,
            filters,
            gain: spec.gain,
        }
    }

    /// First sample after the path's last output sample.
    pub(crate) fn end_sample(&self) -> u64 {
        self.start_sample + self.len_samples
    }

    pub(crate) fn duration_secs(&self) -> f64 {
        self.len_samples as f64 / f64::from(self.sample_rate)
    }

    /// Return `true` once the clock has passed the last sample.
    pub(crate) fn finished_by(&self, clock: u64) -> bool {
        clock >= self.end_sample()
    }

    /// Mix this path into stereo interleaved `speakers`/`capture` blocks starting at `block_start`.
    pub(crate) fn render_into(
        &mut self,
        block_start: u64,
        speakers: &mut [f32],
        mut capture: Option<&mut [f32]>,
    ) {
        let frames = speakers.len() / OUTPUT_CHANNELS;
        let sr = f64::from(self.sample_rate);
        for i in 0..frames {
            let abs = block_start + i as u64;
            if abs < self.start_sample {
                continue;
            }
            let rel = abs - self.start_sample;
            if rel >= self.len_samples {
                break;
            }
            let t = rel as f64 / sr;

            let mut x = match &mut self.source {
                SourceState::Samples(s) => s[rel as usize],
                SourceState::Sine(osc) => osc.next(t, self.sample_rate),
            };
            for f in &mut self.filters {
                if let Some((start_hz, end_hz, sweep_secs, q)) = f.sweep
                    && rel % SWEEP_UPDATE_INTERVAL == 0
                {
                    let cutoff = exp_lerp(start_hz, end_hz, t / sweep_secs);
                    f.biquad
                        .set_coeffs(BiquadCoeffs::low_pass(self.sample_rate, cutoff, q));
                }
                x = f.biquad.process(x);
            }
            let y = x * self.gain.value_at(t);

            let o = i * OUTPUT_CHANNELS;
            if self.sinks.speakers {
                speakers[o] += y;
                speakers[o + 1] += y;
            }
            if self.sinks.capture
                && let Some(cap) = capture.as_deref_mut()
            {
                cap[o] += y;
                cap[o + 1] += y;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/path.rs"]
mod tests;
