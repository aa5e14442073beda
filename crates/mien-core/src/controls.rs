//! Shared control state between the control surface and the animator
//!
//! One explicit structure instead of ambient globals. Reader/writer roles:
//!
//! | field    | writers                      | readers            |
//! |----------|------------------------------|--------------------|
//! | paused   | control surface, image reload| animator loop      |
//! | talking  | control surface              | pose driver        |
//! | emotion  | control surface              | pose driver        |
//! | reload   | control surface (stage)      | animator (consume) |
//!
//! The struct is passed by `Arc` to each loop.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::SourceImage;

/// Shared mutable control state for one character feed.
#[derive(Debug)]
pub struct SharedControls {
    paused: AtomicBool,
    talking: AtomicBool,
    emotion: RwLock<String>,
    reload: Mutex<Option<SourceImage>>,
}

impl Default for SharedControls {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedControls {
    /// Running, silent, neutral, nothing staged.
    pub fn new() -> Self {
        SharedControls {
            paused: AtomicBool::new(false),
            talking: AtomicBool::new(false),
            emotion: RwLock::new("neutral".to_string()),
            reload: Mutex::new(None),
        }
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn start_talking(&self) {
        self.talking.store(true, Ordering::SeqCst);
    }

    pub fn stop_talking(&self) {
        self.talking.store(false, Ordering::SeqCst);
    }

    pub fn is_talking(&self) -> bool {
        self.talking.load(Ordering::SeqCst)
    }

    pub fn set_emotion(&self, name: impl Into<String>) {
        *self.emotion.write() = name.into();
    }

    pub fn emotion(&self) -> String {
        self.emotion.read().clone()
    }

    /// Stage a new source image for the animator to swap in on its next
    /// tick. Replaces any image staged earlier but not yet consumed.
    pub fn stage_reload(&self, image: SourceImage) {
        *self.reload.lock() = Some(image);
    }

    /// Take the staged image, if any. Called only by the animator.
    pub fn take_reload(&self) -> Option<SourceImage> {
        self.reload.lock().take()
    }

    pub fn reload_pending(&self) -> bool {
        self.reload.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let ctl = SharedControls::new();
        assert!(!ctl.is_paused());
        assert!(!ctl.is_talking());
        assert_eq!(ctl.emotion(), "neutral");
        assert!(!ctl.reload_pending());
    }

    #[test]
    fn test_toggles() {
        let ctl = SharedControls::new();
        ctl.pause();
        assert!(ctl.is_paused());
        ctl.resume();
        assert!(!ctl.is_paused());

        ctl.start_talking();
        assert!(ctl.is_talking());
        ctl.stop_talking();
        assert!(!ctl.is_talking());
    }

    #[test]
    fn test_reload_staging_is_consume_once() {
        let ctl = SharedControls::new();
        ctl.stage_reload(SourceImage::flat(2, 2, [0, 0, 0, 255]));
        assert!(ctl.reload_pending());
        assert!(ctl.take_reload().is_some());
        assert!(ctl.take_reload().is_none());
    }
}
