use std::sync::{Arc, Mutex};

use crate::foundation::error::ReelResult;

/// Destination for rendered speaker output (interleaved stereo `f32`).
///
/// Device output lives outside this crate; hosts implement this trait over their audio backend.
pub trait AudioSink: Send {
    /// Consume one rendered block.
    fn write(&mut self, interleaved: &[f32], sample_rate: u32) -> ReelResult<()>;
}

/// Sink that discards everything (headless runs).
#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn write(&mut self, _interleaved: &[f32], _sample_rate: u32) -> ReelResult<()> {
        Ok(())
    }
}

/// Sink that appends samples to a shared buffer for inspection.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    samples: Arc<Mutex<Vec<f32>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn samples(&self) -> Vec<f32> {
        self.samples
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl AudioSink for MemorySink {
    fn write(&mut self, interleaved: &[f32], _sample_rate: u32) -> ReelResult<()> {
        let mut guard = self
            .samples
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.extend_from_slice(interleaved);
        Ok(())
    }
}
