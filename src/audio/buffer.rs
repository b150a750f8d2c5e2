use std::sync::Arc;

use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::model::{NarrationAudio, PcmFormat};

/// Decoded mono audio at the graph's sample rate.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Mono samples in `[-1, 1]`.
    pub samples: Arc<Vec<f32>>,
}

impl AudioBuffer {
    /// Wrap mono samples.
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples: Arc::new(samples),
        }
    }

    /// Length in samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Return `true` when the buffer has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Decode raw PCM narration into a mono buffer at `target_rate`.
///
/// Multi-channel input is averaged down to mono; rate conversion is linear interpolation.
pub fn decode_narration(payload: &NarrationAudio, target_rate: u32) -> ReelResult<AudioBuffer> {
    if target_rate == 0 {
        return Err(ReelError::validation(
            "decode target sample rate must be > 0",
        ));
    }
    if payload.sample_rate == 0 {
        return Err(ReelError::decode("narration sample_rate must be > 0"));
    }
    if payload.channels == 0 {
        return Err(ReelError::decode("narration channel count must be > 0"));
    }
    let channels = usize::from(payload.channels);
    let frame_bytes = payload.format.bytes_per_sample() * channels;
    let bytes = payload.bytes.as_slice();
    if bytes.is_empty() {
        return Err(ReelError::decode("narration payload is empty"));
    }
    if !bytes.len().is_multiple_of(frame_bytes) {
        return Err(ReelError::decode(format!(
            "narration byte length {} is not aligned to {frame_bytes}-byte frames",
            bytes.len()
        )));
    }

    let mut mono = Vec::with_capacity(bytes.len() / frame_bytes);
    for frame in bytes.chunks_exact(frame_bytes) {
        let mut acc = 0.0f32;
        for ch in frame.chunks_exact(payload.format.bytes_per_sample()) {
            acc += match payload.format {
                PcmFormat::S16Le => f32::from(i16::from_le_bytes([ch[0], ch[1]])) / 32768.0,
                PcmFormat::F32Le => f32::from_le_bytes([ch[0], ch[1], ch[2], ch[3]]),
            };
        }
        let v = acc / channels as f32;
        if !v.is_finite() {
            return Err(ReelError::decode("narration contains non-finite samples"));
        }
        mono.push(v.clamp(-1.0, 1.0));
    }

    let samples = if payload.sample_rate == target_rate {
        mono
    } else {
        resample_linear(&mono, payload.sample_rate, target_rate)
    };
    Ok(AudioBuffer::new(target_rate, samples))
}

fn resample_linear(src: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
    if src.is_empty() {
        return Vec::new();
    }
    let out_len = ((src.len() as u128 * u128::from(dst_rate) + u128::from(src_rate) / 2)
        / u128::from(src_rate)) as usize;
    let step = f64::from(src_rate) / f64::from(dst_rate);
    let last = src.len() - 1;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 * step;
        let i0 = (pos.floor() as usize).min(last);
        let i1 = (i0 + 1).min(last);
        let frac = (pos - i0 as f64) as f32;
        let v0 = src[i0];
        let v1 = src[i1];
        out.push(v0 + (v1 - v0) * frac);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/audio/buffer.rs"]
mod tests;
