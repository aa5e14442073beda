//! MIEN Core - shared types for the animation pipeline
//!
//! Everything the three pipeline stages exchange lives here: the morph
//! channel table, pose vectors, frame buffers with generation ids, the
//! shared control state, and the rolling statistics used by every stage's
//! diagnostics.

pub mod controls;
pub mod error;
pub mod frame;
pub mod image;
pub mod morph;
pub mod pose;
pub mod stats;

pub use controls::*;
pub use error::*;
pub use frame::*;
pub use image::*;
pub use morph::*;
pub use pose::*;
pub use stats::*;
