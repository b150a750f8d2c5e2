pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Convert decibels to a linear amplitude factor.
pub(crate) fn db_to_gain(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Linear interpolation between `a` and `b`.
pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Exponential interpolation between two positive values (`a` at `t=0`, `b` at `t=1`).
pub(crate) fn exp_lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (b / a).powf(t.clamp(0.0, 1.0))
}

/// Deterministic xorshift32 generator; noise must be identical between preview and capture runs.
#[derive(Clone, Copy, Debug)]
pub(crate) struct XorShift32(u32);

impl XorShift32 {
    pub(crate) fn new(seed: u32) -> Self {
        Self(if seed == 0 { 0x9E37_79B9 } else { seed })
    }

    pub(crate) fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    /// Uniform sample in `[-1, 1]`.
    pub(crate) fn next_bipolar(&mut self) -> f32 {
        (self.next_u32() as f64 / f64::from(u32::MAX) * 2.0 - 1.0) as f32
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
