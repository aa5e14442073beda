//! The posing model boundary
//!
//! The real renderer is a neural model that deforms a source character
//! image to match a pose vector. The pipeline only relies on the contract
//! captured here: a pure function from (source image, pose) to a
//! linear-light RGBA image of a fixed size.

use mien_core::{LinearImage, MienError, MienResult, PoseVector, SourceImage};

use crate::srgb_to_linear;

/// A pose-to-image renderer.
///
/// Treated as deterministic for a fixed (source, pose) pair. Output is
/// linear-light RGBA in [0, 1] with straight alpha.
pub trait Poser: Send {
    /// Side length of the square source image the model expects.
    fn image_size(&self) -> u32;

    /// Render the character in `source` holding `pose`.
    fn pose(&self, source: &SourceImage, pose: &PoseVector) -> MienResult<LinearImage>;
}

/// Model-free stand-in: returns the source image unchanged (converted to
/// the poser's linear output encoding), ignoring the pose.
///
/// Keeps the whole pipeline exercisable - including tests and deployments
/// where the neural model is not installed.
#[derive(Debug, Clone)]
pub struct IdentityPoser {
    size: u32,
}

impl Default for IdentityPoser {
    fn default() -> Self {
        Self::new(512)
    }
}

impl IdentityPoser {
    pub fn new(size: u32) -> Self {
        IdentityPoser { size }
    }
}

impl Poser for IdentityPoser {
    fn image_size(&self) -> u32 {
        self.size
    }

    fn pose(&self, source: &SourceImage, _pose: &PoseVector) -> MienResult<LinearImage> {
        let expected = (source.width as usize) * (source.height as usize) * 4;
        if source.pixels.len() != expected {
            return Err(MienError::BufferSizeMismatch {
                expected,
                actual: source.pixels.len(),
            });
        }

        let mut out = LinearImage::zeroed(source.width, source.height);
        for (dst, src) in out.pixels.chunks_exact_mut(4).zip(source.pixels.chunks_exact(4)) {
            for c in 0..3 {
                dst[c] = srgb_to_linear(src[c] as f32 / 255.0);
            }
            dst[3] = src[3] as f32 / 255.0;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_poser_preserves_shape_and_alpha() {
        let source = SourceImage::flat(4, 4, [255, 0, 0, 128]);
        let poser = IdentityPoser::new(4);
        let out = poser.pose(&source, &PoseVector::neutral()).unwrap();
        assert_eq!((out.width, out.height), (4, 4));
        assert!((out.pixels[0] - 1.0).abs() < 1e-6);
        assert!((out.pixels[1]).abs() < 1e-6);
        assert!((out.pixels[3] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_identity_poser_rejects_malformed_buffer() {
        let source = SourceImage {
            width: 4,
            height: 4,
            pixels: vec![0u8; 10],
        };
        let poser = IdentityPoser::new(4);
        assert!(poser.pose(&source, &PoseVector::neutral()).is_err());
    }
}
