//! The encoder loop - raw frames to wire bytes
//!
//! Runs on its own OS thread with its own clock. Consuming the slot is the
//! only work done under the shared lock; compression happens outside it.
//! Before publishing, the loop waits until the previous encoded frame has
//! been sent at least once (the DeliveryMark) - this is what stops the
//! pipeline from producing more frames than the network actually delivers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{error, info};

use mien_core::{DeliveryMark, EncodedFrame, Generation, MienError, MienResult, RawFrame};

use crate::{FrameSlot, PipelineConfig, PipelineStats};

/// Published encoded frames: replace-only, single writer, many readers.
pub type FrameReceiver = watch::Receiver<Option<Arc<EncodedFrame>>>;
pub(crate) type FramePublisher = watch::Sender<Option<Arc<EncodedFrame>>>;

/// Compress one raw frame to PNG.
///
/// Fastest compression, no filtering: the stream favors latency over
/// bandwidth, exactly like the original feed.
pub fn encode_png(frame: &RawFrame) -> MienResult<Vec<u8>> {
    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, frame.width, frame.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);
        encoder.set_filter(png::FilterType::NoFilter);
        let mut writer = encoder
            .write_header()
            .map_err(|e| MienError::Encode(e.to_string()))?;
        writer
            .write_image_data(&frame.pixels)
            .map_err(|e| MienError::Encode(e.to_string()))?;
    }
    Ok(bytes)
}

pub(crate) struct EncoderLoop {
    pub slot: Arc<FrameSlot>,
    pub delivery: Arc<DeliveryMark>,
    pub publisher: FramePublisher,
    pub stats: Arc<PipelineStats>,
    pub shutdown: Arc<AtomicBool>,
    pub config: PipelineConfig,
    last_published: Option<Generation>,
    last_report: Option<Instant>,
}

pub(crate) fn spawn_encoder(
    slot: Arc<FrameSlot>,
    delivery: Arc<DeliveryMark>,
    publisher: FramePublisher,
    stats: Arc<PipelineStats>,
    shutdown: Arc<AtomicBool>,
    config: PipelineConfig,
) -> MienResult<JoinHandle<()>> {
    let mut encoder = EncoderLoop {
        slot,
        delivery,
        publisher,
        stats,
        shutdown,
        config,
        last_published: None,
        last_report: None,
    };
    std::thread::Builder::new()
        .name("mien-encoder".to_string())
        .spawn(move || encoder.run())
        .map_err(|e| MienError::Spawn(e.to_string()))
}

impl EncoderLoop {
    fn run(&mut self) {
        info!("encoder loop started");
        while !self.shutdown.load(Ordering::SeqCst) {
            if let Err(e) = self.encode_tick() {
                // Same fail-fast contract as the animator.
                error!(error = %e, "encode failed; stopping encoder loop");
                break;
            }
            std::thread::sleep(self.config.tick_interval);
        }
        info!("encoder loop stopped");
    }

    fn encode_tick(&mut self) -> MienResult<()> {
        // Check-and-clear under the lock, nothing else; this immediately
        // unblocks the producer.
        let Some(frame) = self.slot.consume() else {
            return Ok(());
        };

        let encode_start = Instant::now();
        let bytes = encode_png(&frame)?;
        let encode_elapsed = encode_start.elapsed();

        // Do not overwrite an encoded frame that has never been sent.
        let wait_start = Instant::now();
        if let Some(previous) = self.last_published {
            while self.delivery.latest() != previous {
                if self.shutdown.load(Ordering::SeqCst) {
                    return Ok(());
                }
                std::thread::sleep(self.config.delivery_poll);
            }
        }
        let wait_elapsed = wait_start.elapsed();

        let generation = frame.generation;
        self.publisher
            .send_replace(Some(Arc::new(EncodedFrame { bytes, generation })));
        self.last_published = Some(generation);

        self.stats.encode.lock().add_duration(encode_elapsed);
        self.stats.delivery_wait.lock().add_duration(wait_elapsed);
        self.stats.frames_encoded.fetch_add(1, Ordering::Relaxed);

        self.report(Instant::now());
        Ok(())
    }

    fn report(&mut self, now: Instant) {
        let due = self
            .last_report
            .map_or(true, |at| now.duration_since(at) > self.config.report_interval);
        if !due {
            return;
        }
        let encode = self.stats.encode.lock();
        let wait = self.stats.delivery_wait.lock();
        info!(
            "encode: {:.1}ms [{:.1} FPS available]; send sync wait {:.1}ms",
            encode.average() * 1000.0,
            encode.as_fps(),
            wait.average() * 1000.0
        );
        self.last_report = Some(now);
    }
}
