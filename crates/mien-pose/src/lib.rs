//! MIEN Pose - the procedural pose-animation state machine
//!
//! Given the current pose, the active emotion, and wall-clock time, produce
//! the next pose vector. Everything here is history-free where it can be:
//! the integrator needs only current and target, sway caches one target
//! pose, blink keeps one refractory timestamp, breathing keeps one epoch.
//! No driver accumulates per-tick history, so state stays bounded over
//! arbitrarily long sessions.

pub mod driver;
pub mod preset;

pub use driver::*;
pub use preset::*;
