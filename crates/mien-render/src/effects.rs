//! Post-effects boundary
//!
//! A post-effect is a purely visual in-place transform on the poser's
//! output. The pipeline depends on no state inside it.

use mien_core::LinearImage;

/// Pixel-space transform applied between the poser and color conversion.
pub trait PostEffect: Send {
    /// Transform `image` in place.
    fn render_into(&mut self, image: &mut LinearImage);
}

/// The default: no transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPostEffect;

impl PostEffect for NoopPostEffect {
    fn render_into(&mut self, _image: &mut LinearImage) {}
}
