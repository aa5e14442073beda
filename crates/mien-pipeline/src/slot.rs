//! The single-slot handoff between the render and encode stages
//!
//! At most one unconsumed frame exists at a time: freshness over
//! completeness. `Option<RawFrame>` under one mutex IS the compound
//! (buffer, unconsumed-flag) state the producer and encoder must observe
//! together - the two can never be seen out of step.

use parking_lot::Mutex;

use mien_core::RawFrame;

/// One-frame mailbox from producer to encoder.
///
/// The producer is the only writer of `Some`, the encoder the only writer
/// of `None`; both transitions happen under the same lock.
#[derive(Debug, Default)]
pub struct FrameSlot {
    slot: Mutex<Option<RawFrame>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        FrameSlot {
            slot: Mutex::new(None),
        }
    }

    /// True if a published frame has not been consumed yet. The producer
    /// skips its tick while this holds (backpressure).
    pub fn is_occupied(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Publish a frame. The producer only calls this after observing an
    /// empty slot, and nothing but the encoder can empty it, so the slot
    /// is still empty here.
    pub fn publish(&self, frame: RawFrame) {
        let mut slot = self.slot.lock();
        debug_assert!(slot.is_none(), "published over an unconsumed frame");
        *slot = Some(frame);
    }

    /// Take the pending frame, clearing the slot. This is the only work
    /// the encoder does while holding the lock; clearing immediately
    /// unblocks the producer.
    pub fn consume(&self) -> Option<RawFrame> {
        self.slot.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(generation: u64) -> RawFrame {
        RawFrame {
            width: 1,
            height: 1,
            pixels: vec![0, 0, 0, 255],
            generation,
        }
    }

    #[test]
    fn test_starts_empty() {
        let slot = FrameSlot::new();
        assert!(!slot.is_occupied());
        assert!(slot.consume().is_none());
    }

    #[test]
    fn test_publish_then_consume() {
        let slot = FrameSlot::new();
        slot.publish(frame(1));
        assert!(slot.is_occupied());

        let taken = slot.consume().unwrap();
        assert_eq!(taken.generation, 1);
        assert!(!slot.is_occupied());
        assert!(slot.consume().is_none());
    }
}
