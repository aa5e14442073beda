//! Rolling statistics for per-stage diagnostics
//!
//! Every pipeline stage keeps its own [`RunningAverage`] of its hot-path
//! duration and reports it at coarse intervals. Diagnostics only - nothing
//! reads these for flow control.

use std::collections::VecDeque;
use std::time::Duration;

/// Windowed running average over the last N datapoints.
#[derive(Debug, Clone)]
pub struct RunningAverage {
    window: usize,
    samples: VecDeque<f64>,
    sum: f64,
}

impl Default for RunningAverage {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RunningAverage {
    pub fn new(window: usize) -> Self {
        RunningAverage {
            window: window.max(1),
            samples: VecDeque::with_capacity(window.max(1)),
            sum: 0.0,
        }
    }

    pub fn add_datapoint(&mut self, value: f64) {
        if self.samples.len() == self.window {
            if let Some(old) = self.samples.pop_front() {
                self.sum -= old;
            }
        }
        self.samples.push_back(value);
        self.sum += value;
    }

    /// Mean of the current window; 0.0 when empty.
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.sum / self.samples.len() as f64
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Convenience for duration-valued statistics.
impl RunningAverage {
    pub fn add_duration(&mut self, value: Duration) {
        self.add_datapoint(value.as_secs_f64());
    }

    /// Average expressed as frames per second (0.0 when unknown).
    pub fn as_fps(&self) -> f64 {
        let avg = self.average();
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }
}
