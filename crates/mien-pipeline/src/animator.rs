//! The animator loop - the pipeline's producer stage
//!
//! A dedicated OS thread ticking at the configured cap (the poser is
//! CPU/GPU-bound and must not sit on the async runtime). Each tick either
//! skips (paused, no source, backpressured), swaps in a freshly staged
//! source image, or renders one frame and publishes it into the slot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use tracing::{debug, error, info};

use mien_core::{MienError, MienResult, RawFrame, SharedControls, SourceImage};
use mien_pose::PoseDriver;
use mien_render::{linear_to_srgb_bytes, PostEffect, Poser};

use crate::{FrameSlot, PipelineConfig, PipelineStats};

pub(crate) struct AnimatorLoop {
    pub poser: Box<dyn Poser>,
    pub effect: Box<dyn PostEffect>,
    pub driver: PoseDriver,
    pub controls: Arc<SharedControls>,
    pub slot: Arc<FrameSlot>,
    pub stats: Arc<PipelineStats>,
    pub shutdown: Arc<AtomicBool>,
    pub config: PipelineConfig,
    pub source: Option<SourceImage>,
    next_generation: u64,
    last_report: Option<Instant>,
}

pub(crate) fn spawn_animator(
    poser: Box<dyn Poser>,
    effect: Box<dyn PostEffect>,
    driver: PoseDriver,
    controls: Arc<SharedControls>,
    slot: Arc<FrameSlot>,
    stats: Arc<PipelineStats>,
    shutdown: Arc<AtomicBool>,
    config: PipelineConfig,
    source: Option<SourceImage>,
) -> MienResult<JoinHandle<()>> {
    let mut animator = AnimatorLoop {
        poser,
        effect,
        driver,
        controls,
        slot,
        stats,
        shutdown,
        config,
        source,
        next_generation: 1,
        last_report: None,
    };
    std::thread::Builder::new()
        .name("mien-animator".to_string())
        .spawn(move || animator.run())
        .map_err(|e| MienError::Spawn(e.to_string()))
}

impl AnimatorLoop {
    fn run(&mut self) {
        info!("animator loop started");
        while !self.shutdown.load(Ordering::SeqCst) {
            if let Err(e) = self.render_tick() {
                // Fatal by design: a persistently broken renderer would
                // otherwise spam an error per tick forever.
                error!(error = %e, "render failed; stopping animator loop");
                break;
            }
            std::thread::sleep(self.config.tick_interval);
        }
        info!("animator loop stopped");
    }

    /// One render tick. Does nothing if the animation is paused, no source
    /// image is loaded, or the previous frame has not been consumed yet.
    fn render_tick(&mut self) -> MienResult<()> {
        if self.controls.is_paused() {
            return Ok(());
        }

        // Never race ahead of the encoder.
        if self.slot.is_occupied() {
            return Ok(());
        }

        // The swap is exclusive by ownership: the source lives on this
        // thread, and staging already ran under the control surface's
        // pause.
        if let Some(image) = self.controls.take_reload() {
            debug!(
                width = image.width,
                height = image.height,
                "swapping in new source image"
            );
            self.source = Some(image);
        }
        let Some(source) = self.source.as_ref() else {
            return Ok(());
        };

        let render_start = Instant::now();
        let pose = self.driver.tick(
            &self.controls.emotion(),
            self.controls.is_talking(),
            render_start,
        );

        let mut image = self.poser.pose(source, &pose)?;
        self.effect.render_into(&mut image);
        let pixels = linear_to_srgb_bytes(&image);

        let frame = RawFrame {
            width: image.width,
            height: image.height,
            pixels,
            generation: self.next_generation,
        };
        self.next_generation += 1;

        // Render time only - the publish below is not part of it.
        self.stats
            .render
            .lock()
            .add_duration(render_start.elapsed());
        self.stats
            .frames_rendered
            .fetch_add(1, Ordering::Relaxed);

        self.slot.publish(frame);
        self.report(render_start);
        Ok(())
    }

    fn report(&mut self, now: Instant) {
        let due = self
            .last_report
            .map_or(true, |at| now.duration_since(at) > self.config.report_interval);
        if !due {
            return;
        }
        let render = self.stats.render.lock();
        info!(
            "render: {:.1}ms [{:.1} FPS available]",
            render.average() * 1000.0,
            render.as_fps()
        );
        self.last_report = Some(now);
    }
}
