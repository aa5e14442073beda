//! MIEN Pipeline - the three-stage concurrent frame pipeline
//!
//! Render, encode, and send run on independent clocks; each stage holds at
//! most one slot of output and is paced only by its downstream neighbor:
//!
//! - the animator publishes a raw frame and then waits for the encoder to
//!   consume it (the single-slot mailbox),
//! - the encoder publishes an encoded frame and then waits for the
//!   delivery mark to confirm it was sent at least once,
//! - senders (one per client, owned by the server crate) emit the latest
//!   encoded frame on their own schedule and update the delivery mark.
//!
//! Startup self-arranges: the encoder idles until the first raw frame, the
//! senders idle until the first encoded frame. Steady state keeps frame
//! N on the wire while N+1 encodes and N+2 renders.

pub mod animator;
pub mod encoder;
pub mod slot;
pub mod stats;

pub use encoder::{encode_png, FrameReceiver};
pub use slot::FrameSlot;
pub use stats::{PipelineStats, StatsSnapshot};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use mien_core::{DeliveryMark, MienResult, SharedControls, SourceImage};
use mien_pose::PoseDriver;
use mien_render::{PostEffect, Poser};

/// Pipeline timing. Defaults are the production values.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Animator and encoder tick cap (10 ms = at most 100 Hz per loop)
    pub tick_interval: Duration,
    /// Poll increment while the encoder waits on delivery confirmation
    pub delivery_poll: Duration,
    /// How often each loop logs its rolling statistics
    pub report_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            tick_interval: Duration::from_millis(10),
            delivery_poll: Duration::from_millis(1),
            report_interval: Duration::from_secs(5),
        }
    }
}

/// A running pipeline: owns the animator and encoder threads.
///
/// Dropping the handle (or calling [`stop`](Pipeline::stop)) signals both
/// loops and joins them, animator first - the encoder may still be
/// draining a frame the animator produced.
pub struct Pipeline {
    animator: Option<JoinHandle<()>>,
    encoder: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    frames: FrameReceiver,
    delivery: Arc<DeliveryMark>,
    stats: Arc<PipelineStats>,
    controls: Arc<SharedControls>,
}

impl Pipeline {
    /// Spawn the animator and encoder loops.
    pub fn start(
        poser: Box<dyn Poser>,
        effect: Box<dyn PostEffect>,
        driver: PoseDriver,
        controls: Arc<SharedControls>,
        source: Option<SourceImage>,
        config: PipelineConfig,
    ) -> MienResult<Pipeline> {
        let slot = Arc::new(FrameSlot::new());
        let delivery = Arc::new(DeliveryMark::new());
        let stats = Arc::new(PipelineStats::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let (publisher, frames) = watch::channel(None);

        let animator = animator::spawn_animator(
            poser,
            effect,
            driver,
            Arc::clone(&controls),
            Arc::clone(&slot),
            Arc::clone(&stats),
            Arc::clone(&shutdown),
            config.clone(),
            source,
        )?;

        let encoder = match encoder::spawn_encoder(
            slot,
            Arc::clone(&delivery),
            publisher,
            Arc::clone(&stats),
            Arc::clone(&shutdown),
            config,
        ) {
            Ok(handle) => handle,
            Err(e) => {
                shutdown.store(true, Ordering::SeqCst);
                let _ = animator.join();
                return Err(e);
            }
        };

        info!("pipeline started");
        Ok(Pipeline {
            animator: Some(animator),
            encoder: Some(encoder),
            shutdown,
            frames,
            delivery,
            stats,
            controls,
        })
    }

    /// Subscribe to encoded-frame publications. Each client sender clones
    /// its own receiver.
    pub fn frames(&self) -> FrameReceiver {
        self.frames.clone()
    }

    pub fn delivery(&self) -> Arc<DeliveryMark> {
        Arc::clone(&self.delivery)
    }

    pub fn stats(&self) -> Arc<PipelineStats> {
        Arc::clone(&self.stats)
    }

    pub fn controls(&self) -> Arc<SharedControls> {
        Arc::clone(&self.controls)
    }

    /// True until stop() has been observed by the loops.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Signal both loops and join them.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        if self.animator.is_none() && self.encoder.is_none() {
            return;
        }
        self.shutdown.store(true, Ordering::SeqCst);
        // Animator joined before encoder: the encoder may depend on a
        // frame the animator has in flight, never the other way around.
        if let Some(handle) = self.animator.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.encoder.take() {
            let _ = handle.join();
        }
        info!("pipeline stopped");
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use mien_core::EncodedFrame;
    use mien_pose::{DriverConfig, EmotionRegistry};
    use mien_render::{placeholder, IdentityPoser, NoopPostEffect};

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    fn fast_config() -> PipelineConfig {
        PipelineConfig {
            tick_interval: Duration::from_millis(1),
            delivery_poll: Duration::from_millis(1),
            report_interval: Duration::from_secs(60),
        }
    }

    fn start_pipeline(controls: Arc<SharedControls>) -> Pipeline {
        let driver = PoseDriver::new(EmotionRegistry::builtin(), DriverConfig::default());
        Pipeline::start(
            Box::new(IdentityPoser::new(8)),
            Box::new(NoopPostEffect),
            driver,
            controls,
            Some(placeholder(8)),
            fast_config(),
        )
        .expect("pipeline starts")
    }

    fn wait_for_generation(frames: &FrameReceiver, at_least: u64) -> Arc<EncodedFrame> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(frame) = frames.borrow().clone() {
                if frame.generation >= at_least {
                    return frame;
                }
            }
            assert!(
                Instant::now() < deadline,
                "no frame with generation >= {at_least} within 5s"
            );
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_first_frame_flows_through() {
        let pipeline = start_pipeline(Arc::new(SharedControls::new()));
        let frames = pipeline.frames();

        let frame = wait_for_generation(&frames, 1);
        assert_eq!(frame.generation, 1);
        assert_eq!(&frame.bytes[..8], &PNG_MAGIC);

        pipeline.stop();
    }

    #[test]
    fn test_encoder_holds_until_delivery_confirmed() {
        let pipeline = start_pipeline(Arc::new(SharedControls::new()));
        let frames = pipeline.frames();
        let delivery = pipeline.delivery();

        wait_for_generation(&frames, 1);

        // Nothing was ever delivered: generation 1 must stay published and
        // the producer must stall on the single slot right behind it.
        std::thread::sleep(Duration::from_millis(150));
        let frame = frames.borrow().clone().unwrap();
        assert_eq!(frame.generation, 1);
        let rendered = pipeline.stats().snapshot().frames_rendered;
        assert!(rendered <= 3, "producer ran ahead: {rendered} frames");

        // Confirming delivery releases exactly the next frame.
        delivery.mark(1);
        let frame = wait_for_generation(&frames, 2);
        assert_eq!(frame.generation, 2);

        delivery.mark(2);
        wait_for_generation(&frames, 3);

        pipeline.stop();
    }

    #[test]
    fn test_generations_strictly_increase() {
        let pipeline = start_pipeline(Arc::new(SharedControls::new()));
        let frames = pipeline.frames();
        let delivery = pipeline.delivery();

        let mut last = 0u64;
        for _ in 0..5 {
            let frame = wait_for_generation(&frames, last + 1);
            assert!(frame.generation > last);
            last = frame.generation;
            delivery.mark(last);
        }

        pipeline.stop();
    }

    #[test]
    fn test_paused_pipeline_renders_nothing() {
        let controls = Arc::new(SharedControls::new());
        controls.pause();
        let pipeline = start_pipeline(Arc::clone(&controls));

        std::thread::sleep(Duration::from_millis(100));
        assert!(pipeline.frames().borrow().is_none());
        assert_eq!(pipeline.stats().snapshot().frames_rendered, 0);

        // Resuming brings the feed up.
        controls.resume();
        wait_for_generation(&pipeline.frames(), 1);

        pipeline.stop();
    }

    #[test]
    fn test_stop_interrupts_blocked_encoder() {
        let pipeline = start_pipeline(Arc::new(SharedControls::new()));
        wait_for_generation(&pipeline.frames(), 1);

        // The encoder is now (or soon will be) blocked waiting for a
        // delivery that never comes; stop() must still return.
        std::thread::sleep(Duration::from_millis(50));
        pipeline.stop();
    }

    #[test]
    fn test_reload_swaps_source_image() {
        let controls = Arc::new(SharedControls::new());
        let pipeline = start_pipeline(Arc::clone(&controls));
        let frames = pipeline.frames();
        let delivery = pipeline.delivery();

        let first = wait_for_generation(&frames, 1);
        delivery.mark(first.generation);

        // Stage a visibly different (opaque white) source.
        controls.stage_reload(SourceImage::flat(8, 8, [255, 255, 255, 255]));
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let frame = wait_for_generation(&frames, delivery.latest() + 1);
            delivery.mark(frame.generation);
            if !controls.reload_pending() {
                break;
            }
            assert!(Instant::now() < deadline, "reload never consumed");
        }

        pipeline.stop();
    }
}
