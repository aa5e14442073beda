//! Frame types and the delivery mark
//!
//! Frames carry a generation id: a monotonically increasing counter marking
//! production order. Identity is always compared by generation, never by
//! buffer address.

use std::sync::atomic::{AtomicU64, Ordering};

/// Generation id of a frame. Strictly increasing, starting at 1; 0 means
/// "no frame yet" wherever a generation is stored in an atomic.
pub type Generation = u64;

/// One rendered animation frame: 8-bit sRGB RGBA pixels plus the generation
/// it was produced under. Owned by the producer until handed off; after the
/// handoff only the encoder touches the buffer.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// `height * width * 4` bytes, row-major RGBA
    pub pixels: Vec<u8>,
    pub generation: Generation,
}

/// One compressed frame ready for the wire. Immutable once published.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// PNG bytes
    pub bytes: Vec<u8>,
    /// Generation of the raw frame these bytes encode
    pub generation: Generation,
}

/// Generation of the most recent encoded frame confirmed sent to at least
/// one client.
///
/// Single value, many writers (one per client loop), one reader (the
/// encoder). Used only for rate-matching, never for content correctness.
#[derive(Debug, Default)]
pub struct DeliveryMark(AtomicU64);

impl DeliveryMark {
    pub fn new() -> Self {
        DeliveryMark(AtomicU64::new(0))
    }

    /// Record that `generation` has been sent at least once.
    pub fn mark(&self, generation: Generation) {
        self.0.store(generation, Ordering::Release);
    }

    /// Latest delivered generation (0 if nothing was ever sent).
    pub fn latest(&self) -> Generation {
        self.0.load(Ordering::Acquire)
    }
}
