//! Color space conversion between the poser and the wire
//!
//! The posing model works in linear light; PNG and browsers expect sRGB.
//! Conversion applies to the color channels only - transparency carries
//! through untouched.

use mien_core::LinearImage;

/// sRGB transfer function for one linear-light value in [0, 1].
pub fn linear_to_srgb(x: f32) -> f32 {
    if x <= 0.003_130_805 {
        12.92 * x
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

/// Inverse transfer function: one sRGB value in [0, 1] to linear light.
pub fn srgb_to_linear(x: f32) -> f32 {
    if x <= 0.040_45 {
        x / 12.92
    } else {
        ((x + 0.055) / 1.055).powf(2.4)
    }
}

/// Gamma-encode a linear-light RGBA image and quantize it to 8-bit,
/// preserving the alpha channel. Output is `h * w * 4` sRGB bytes.
pub fn linear_to_srgb_bytes(image: &LinearImage) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(image.pixels.len());
    for rgba in image.pixels.chunks_exact(4) {
        for channel in &rgba[0..3] {
            bytes.push(quantize(linear_to_srgb(*channel)));
        }
        bytes.push(quantize(rgba[3]));
    }
    bytes
}

fn quantize(x: f32) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_round_trip() {
        for i in 0..=100 {
            let x = i as f32 / 100.0;
            let back = srgb_to_linear(linear_to_srgb(x));
            assert!((back - x).abs() < 1e-4, "{x} -> {back}");
        }
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(linear_to_srgb(0.0), 0.0);
        assert!((linear_to_srgb(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_alpha_passes_through() {
        let mut image = LinearImage::zeroed(1, 1);
        image.pixels.copy_from_slice(&[0.5, 0.5, 0.5, 0.25]);
        let bytes = linear_to_srgb_bytes(&image);
        assert_eq!(bytes[3], 63);
        // Gamma encoding brightens mid-gray.
        assert!(bytes[0] > 128);
    }

    #[test]
    fn test_quantize_clamps() {
        let mut image = LinearImage::zeroed(1, 1);
        image.pixels.copy_from_slice(&[2.0, -1.0, 1.0, 1.0]);
        let bytes = linear_to_srgb_bytes(&image);
        assert_eq!(bytes[0], 255);
        assert_eq!(bytes[1], 0);
        assert_eq!(bytes[3], 255);
    }
}
