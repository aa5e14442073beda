//! MIEN Render - the boundary to the posing model
//!
//! The neural renderer and the post-effects stage are external
//! collaborators; this crate pins down their contracts and everything that
//! crosses them: source-image loading, the linear-light output encoding,
//! and the conversion back to display color space.

pub mod color;
pub mod effects;
pub mod poser;
pub mod source;

pub use color::*;
pub use effects::*;
pub use poser::*;
pub use source::*;
