/// One scheduled automation event. Times are seconds on the owning clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamEvent {
    /// Jump to `value` at `time`.
    SetValue {
        /// Event time.
        time: f64,
        /// New value.
        value: f32,
    },
    /// Approach `target` exponentially from `time` with time constant `tau`.
    SetTarget {
        /// Event time.
        time: f64,
        /// Asymptotic target.
        target: f32,
        /// Time constant in seconds (> 0).
        tau: f64,
    },
}

impl ParamEvent {
    fn time(&self) -> f64 {
        match *self {
            Self::SetValue { time, .. } | Self::SetTarget { time, .. } => time,
        }
    }

    /// Value at `t >= self.time()` given the value the parameter had when the event began.
    fn eval(&self, start_value: f32, t: f64) -> f32 {
        match *self {
            Self::SetValue { value, .. } => value,
            Self::SetTarget {
                time, target, tau, ..
            } => {
                let k = (-(t - time).max(0.0) / tau).exp() as f32;
                target + (start_value - target) * k
            }
        }
    }
}

/// A gain-like parameter with scheduled, click-free transitions.
///
/// Events are kept sorted by time. Evaluation walks the schedule from the base value, so results
/// depend only on the schedule and the query time.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioParam {
    base: f32,
    events: Vec<ParamEvent>,
}

impl AudioParam {
    /// Create a parameter resting at `value`.
    pub fn new(value: f32) -> Self {
        Self {
            base: value,
            events: Vec::new(),
        }
    }

    /// Number of pending events (after the last `cancel_and_hold`).
    pub fn scheduled_len(&self) -> usize {
        self.events.len()
    }

    fn insert(&mut self, ev: ParamEvent) {
        let at = self
            .events
            .iter()
            .position(|e| e.time() > ev.time())
            .unwrap_or(self.events.len());
        self.events.insert(at, ev);
    }

    /// Schedule an immediate jump.
    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(ParamEvent::SetValue { time, value });
    }

    /// Schedule a smoothed approach toward `target`. Non-positive `tau` degrades to a jump.
    pub fn set_target_at_time(&mut self, target: f32, time: f64, tau: f64) {
        if tau <= 0.0 || !tau.is_finite() {
            self.set_value_at_time(target, time);
            return;
        }
        self.insert(ParamEvent::SetTarget { time, target, tau });
    }

    /// Freeze the curve at `time`: drop every event and restart from the value it had there.
    ///
    /// Queries before `time` are not meaningful afterwards; the render clock only moves forward.
    pub fn cancel_and_hold(&mut self, time: f64) {
        let v = self.value_at(time);
        self.events.clear();
        self.base = v;
    }

    /// Parameter value at `t`.
    pub fn value_at(&self, t: f64) -> f32 {
        let mut value = self.base;
        let mut active: Option<(ParamEvent, f32)> = None;
        for ev in &self.events {
            if ev.time() > t {
                break;
            }
            if let Some((prev, start)) = active {
                value = prev.eval(start, ev.time());
            }
            active = Some((*ev, value));
        }
        match active {
            Some((ev, start)) => ev.eval(start, t),
            None => value,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/param.rs"]
mod tests;
