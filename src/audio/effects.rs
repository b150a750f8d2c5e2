use smallvec::smallvec;

use crate::audio::param::AudioParam;
use crate::audio::path::{FilterSpec, PathSpec, SinkSet, SourceSpec};

/// Offset of the transition sweep after narration start, in seconds.
pub(crate) const SWEEP_OFFSET_SECS: f64 = 0.0;
/// Offset of the accent blip after narration start, in seconds.
pub(crate) const BLIP_OFFSET_SECS: f64 = 0.18;

const SWEEP_SECS: f64 = 0.6;
const SWEEP_PEAK_GAIN: f32 = 0.07;
const BLIP_SECS: f64 = 0.35;
const BLIP_PEAK_GAIN: f32 = 0.1;

/// Filtered-noise "whoosh": noise through a low pass swept upward, faded in and out.
pub(crate) fn transition_sweep(seed: u32, sinks: SinkSet) -> PathSpec {
    let mut gain = AudioParam::new(0.0);
    gain.set_target_at_time(SWEEP_PEAK_GAIN, 0.0, 0.06);
    gain.set_target_at_time(0.0, SWEEP_SECS * 0.55, 0.08);
    PathSpec {
        source: SourceSpec::Noise {
            seed,
            duration_secs: SWEEP_SECS,
        },
        filters: smallvec![FilterSpec::LowPass {
            start_hz: 250.0,
            end_hz: 6_000.0,
            sweep_secs: SWEEP_SECS,
            q: 1.2,
        }],
        gain,
        sinks,
    }
}

/// Decaying tone: sine gliding down an octave under an exponential decay.
pub(crate) fn accent_blip(sinks: SinkSet) -> PathSpec {
    let mut gain = AudioParam::new(BLIP_PEAK_GAIN);
    gain.set_target_at_time(0.0, 0.0, BLIP_SECS / 6.0);
    PathSpec {
        source: SourceSpec::Sine {
            start_hz: 1_320.0,
            end_hz: 660.0,
            ramp_secs: 0.12,
            duration_secs: BLIP_SECS,
        },
        filters: smallvec![],
        gain,
        sinks,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/effects.rs"]
mod tests;
