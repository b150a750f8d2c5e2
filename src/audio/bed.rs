use crate::audio::dsp::{Biquad, BiquadCoeffs, SineSweep};
use crate::audio::param::AudioParam;
use crate::audio::path::OUTPUT_CHANNELS;

/// Partials of the drone: (frequency Hz, relative level).
const PARTIALS: [(f64, f32); 3] = [(55.0, 0.5), (82.41, 0.3), (110.3, 0.2)];
const BED_LOWPASS_HZ: f64 = 420.0;

/// Continuous background drone feeding the mix bus through its own gain node.
///
/// The bed lives as long as the processing context. Its gain is the ducking target; gain times
/// are absolute seconds on the context clock.
#[derive(Debug)]
pub(crate) struct BedPath {
    oscillators: Vec<(SineSweep, f32)>,
    filter: Biquad,
    pub(crate) gain: AudioParam,
    sample_rate: u32,
}

impl BedPath {
    pub(crate) fn new(sample_rate: u32, rest_gain: f32) -> Self {
        Self {
            oscillators: PARTIALS
                .iter()
                .map(|&(hz, level)| (SineSweep::new(hz, hz, 0.0), level))
                .collect(),
            filter: Biquad::new(BiquadCoeffs::low_pass(sample_rate, BED_LOWPASS_HZ, 0.707)),
            gain: AudioParam::new(rest_gain),
            sample_rate,
        }
    }

    pub(crate) fn render_into(
        &mut self,
        block_start: u64,
        speakers: &mut [f32],
        mut capture: Option<&mut [f32]>,
    ) {
        let frames = speakers.len() / OUTPUT_CHANNELS;
        let sr = f64::from(self.sample_rate);
        for i in 0..frames {
            let t = (block_start + i as u64) as f64 / sr;
            let mut x = 0.0f32;
            for (osc, level) in &mut self.oscillators {
                x += osc.next(t, self.sample_rate) * *level;
            }
            let y = self.filter.process(x) * self.gain.value_at(t);
            let o = i * OUTPUT_CHANNELS;
            speakers[o] += y;
            speakers[o + 1] += y;
            if let Some(cap) = capture.as_deref_mut() {
                cap[o] += y;
                cap[o + 1] += y;
            }
        }
    }
}
