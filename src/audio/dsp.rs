use std::f64::consts::PI;

use crate::foundation::math::{db_to_gain, exp_lerp};

/// Normalized biquad coefficients (a0 == 1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    /// RBJ cookbook low shelf with shelf slope 1.
    pub(crate) fn low_shelf(sample_rate: u32, freq_hz: f64, gain_db: f64) -> Self {
        let a = db_to_gain(gain_db).sqrt();
        let w0 = 2.0 * PI * clamp_freq(freq_hz, sample_rate) / f64::from(sample_rate);
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / 2.0 * 2f64.sqrt();
        let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;

        let b0 = a * ((a + 1.0) - (a - 1.0) * cos + two_sqrt_a_alpha);
        let b1 = 2.0 * a * ((a - 1.0) - (a + 1.0) * cos);
        let b2 = a * ((a + 1.0) - (a - 1.0) * cos - two_sqrt_a_alpha);
        let a0 = (a + 1.0) + (a - 1.0) * cos + two_sqrt_a_alpha;
        let a1 = -2.0 * ((a - 1.0) + (a + 1.0) * cos);
        let a2 = (a + 1.0) + (a - 1.0) * cos - two_sqrt_a_alpha;
        Self::normalized(b0, b1, b2, a0, a1, a2)
    }

    /// RBJ cookbook second-order low pass.
    pub(crate) fn low_pass(sample_rate: u32, freq_hz: f64, q: f64) -> Self {
        let w0 = 2.0 * PI * clamp_freq(freq_hz, sample_rate) / f64::from(sample_rate);
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * q.max(1e-3));

        let b1 = 1.0 - cos;
        let b0 = b1 / 2.0;
        let b2 = b0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos;
        let a2 = 1.0 - alpha;
        Self::normalized(b0, b1, b2, a0, a1, a2)
    }

    fn normalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

fn clamp_freq(freq_hz: f64, sample_rate: u32) -> f64 {
    freq_hz.clamp(10.0, f64::from(sample_rate) * 0.45)
}

/// Transposed direct form II biquad state.
#[derive(Clone, Debug)]
pub(crate) struct Biquad {
    c: BiquadCoeffs,
    z1: f64,
    z2: f64,
}

impl Biquad {
    pub(crate) fn new(c: BiquadCoeffs) -> Self {
        Self {
            c,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Swap coefficients without resetting state (used for sweeps).
    pub(crate) fn set_coeffs(&mut self, c: BiquadCoeffs) {
        self.c = c;
    }

    pub(crate) fn process(&mut self, x: f32) -> f32 {
        let x = f64::from(x);
        let y = self.c.b0 * x + self.z1;
        self.z1 = self.c.b1 * x - self.c.a1 * y + self.z2;
        self.z2 = self.c.b2 * x - self.c.a2 * y;
        y as f32
    }
}

/// Sine oscillator whose frequency glides exponentially from `start_hz` to `end_hz`.
#[derive(Clone, Debug)]
pub(crate) struct SineSweep {
    start_hz: f64,
    end_hz: f64,
    ramp_secs: f64,
    phase: f64,
}

impl SineSweep {
    pub(crate) fn new(start_hz: f64, end_hz: f64, ramp_secs: f64) -> Self {
        Self {
            start_hz,
            end_hz,
            ramp_secs,
            phase: 0.0,
        }
    }

    /// Instantaneous frequency at `t` seconds after start.
    pub(crate) fn freq_at(&self, t: f64) -> f64 {
        if self.ramp_secs <= 0.0 {
            return self.end_hz;
        }
        exp_lerp(self.start_hz, self.end_hz, t / self.ramp_secs)
    }

    /// Next sample; `t` is the time of this sample since start.
    pub(crate) fn next(&mut self, t: f64, sample_rate: u32) -> f32 {
        let out = (self.phase * 2.0 * PI).sin() as f32;
        self.phase = (self.phase + self.freq_at(t) / f64::from(sample_rate)).fract();
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/dsp.rs"]
mod tests;
