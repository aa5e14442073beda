//! Image buffers exchanged with the posing model
//!
//! Two pixel layouts cross the render boundary: the 8-bit sRGB RGBA source
//! character image fed INTO the poser, and the floating-point linear-light
//! RGBA image coming OUT of it. Both are plain row-major `h x w x 4`
//! buffers.

/// 8-bit RGBA character image (sRGB, straight alpha).
///
/// This is the source the poser deforms. Replaced wholesale on reload,
/// never mutated in place.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub width: u32,
    pub height: u32,
    /// `height * width * 4` bytes, row-major RGBA
    pub pixels: Vec<u8>,
}

impl SourceImage {
    /// Create from raw RGBA bytes. Returns None on a size mismatch.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(SourceImage {
            width,
            height,
            pixels,
        })
    }

    /// Flat single-color image, used as the built-in placeholder when no
    /// character has been loaded or a load fails.
    pub fn flat(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = (width as usize) * (height as usize);
        let mut pixels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        SourceImage {
            width,
            height,
            pixels,
        }
    }
}

/// Floating-point linear-light RGBA image, values nominally in [0, 1].
///
/// The poser's output encoding. Post-effects mutate it in place; the
/// producer then gamma-encodes and quantizes it into a [`crate::RawFrame`].
#[derive(Debug, Clone)]
pub struct LinearImage {
    pub width: u32,
    pub height: u32,
    /// `height * width * 4` floats, row-major RGBA
    pub pixels: Vec<f32>,
}

impl LinearImage {
    /// Zero-filled (fully transparent black) image
    pub fn zeroed(width: u32, height: u32) -> Self {
        LinearImage {
            width,
            height,
            pixels: vec![0.0; (width as usize) * (height as usize) * 4],
        }
    }

    /// Number of pixels
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(SourceImage::from_rgba(2, 2, vec![0u8; 16]).is_some());
        assert!(SourceImage::from_rgba(2, 2, vec![0u8; 15]).is_none());
    }

    #[test]
    fn test_flat_fills_color() {
        let img = SourceImage::flat(2, 1, [1, 2, 3, 4]);
        assert_eq!(img.pixels, vec![1, 2, 3, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn test_zeroed_dimensions() {
        let img = LinearImage::zeroed(3, 2);
        assert_eq!(img.pixel_count(), 6);
        assert_eq!(img.pixels.len(), 24);
    }
}
