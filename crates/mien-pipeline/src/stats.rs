//! Shared pipeline diagnostics
//!
//! Each stage feeds its own rolling average; the control surface reads a
//! snapshot. Diagnostics never participate in flow control.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use mien_core::RunningAverage;

/// Rolling statistics shared between the pipeline loops and the control
/// surface.
#[derive(Debug, Default)]
pub struct PipelineStats {
    /// Render duration per frame (animator loop)
    pub render: Mutex<RunningAverage>,
    /// Encode duration per frame, wait excluded (encoder loop)
    pub encode: Mutex<RunningAverage>,
    /// Time the encoder spent waiting on delivery confirmation
    pub delivery_wait: Mutex<RunningAverage>,
    pub frames_rendered: AtomicU64,
    pub frames_encoded: AtomicU64,
}

/// Point-in-time copy of the pipeline statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsSnapshot {
    pub render_avg_secs: f64,
    pub render_fps_available: f64,
    pub encode_avg_secs: f64,
    pub encode_fps_available: f64,
    pub delivery_wait_avg_secs: f64,
    pub frames_rendered: u64,
    pub frames_encoded: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let render = self.render.lock();
        let encode = self.encode.lock();
        let wait = self.delivery_wait.lock();
        StatsSnapshot {
            render_avg_secs: render.average(),
            render_fps_available: render.as_fps(),
            encode_avg_secs: encode.average(),
            encode_fps_available: encode.as_fps(),
            delivery_wait_avg_secs: wait.average(),
            frames_rendered: self.frames_rendered.load(Ordering::Relaxed),
            frames_encoded: self.frames_encoded.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_snapshot_reflects_datapoints() {
        let stats = PipelineStats::new();
        stats.render.lock().add_duration(Duration::from_millis(20));
        stats.frames_rendered.store(3, Ordering::Relaxed);

        let snap = stats.snapshot();
        assert!((snap.render_avg_secs - 0.02).abs() < 1e-9);
        assert!((snap.render_fps_available - 50.0).abs() < 0.1);
        assert_eq!(snap.frames_rendered, 3);
        assert_eq!(snap.frames_encoded, 0);
    }
}
