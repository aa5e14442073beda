//! Source character images
//!
//! Characters arrive as PNG uploads (or a configured file) and must be
//! 8-bit RGBA - the posing model needs the alpha channel. Anything that
//! fails to decode falls back to the built-in placeholder so the feed keeps
//! running.

use std::io::Cursor;
use std::path::Path;

use tracing::warn;

use mien_core::{MienError, MienResult, SourceImage};

/// Decode a PNG into a source image. Requires 8-bit RGBA.
pub fn decode_png(bytes: &[u8]) -> MienResult<SourceImage> {
    let decoder = png::Decoder::new(Cursor::new(bytes));
    let mut reader = decoder
        .read_info()
        .map_err(|e| MienError::ImageDecode(e.to_string()))?;

    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| MienError::ImageDecode(e.to_string()))?;

    if info.color_type != png::ColorType::Rgba || info.bit_depth != png::BitDepth::Eight {
        return Err(MienError::UnsupportedPixelFormat(format!(
            "{:?}/{:?}",
            info.color_type, info.bit_depth
        )));
    }

    buf.truncate(info.buffer_size());
    SourceImage::from_rgba(info.width, info.height, buf).ok_or(MienError::BufferSizeMismatch {
        expected: (info.width as usize) * (info.height as usize) * 4,
        actual: 0,
    })
}

/// The built-in placeholder: a blank, fully transparent canvas at the
/// poser's expected size. Shown until a character is loaded.
pub fn placeholder(size: u32) -> SourceImage {
    SourceImage::flat(size, size, [0, 0, 0, 0])
}

/// Load a character from `path`, falling back to the placeholder (with a
/// warning) when the path is absent, unreadable, or not 8-bit RGBA PNG.
pub fn load_or_placeholder(path: Option<&Path>, size: u32) -> SourceImage {
    let Some(path) = path else {
        return placeholder(size);
    };
    match std::fs::read(path) {
        Ok(bytes) => match decode_png(&bytes) {
            Ok(image) => image,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "character image unusable; using placeholder");
                placeholder(size)
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "character image unreadable; using placeholder");
            placeholder(size)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_rgba_png(width: u32, height: u32, pixels: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut bytes, width, height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(pixels).unwrap();
        }
        bytes
    }

    #[test]
    fn test_decode_round_trip() {
        let pixels = vec![10u8, 20, 30, 40, 50, 60, 70, 80];
        let bytes = encode_rgba_png(2, 1, &pixels);
        let image = decode_png(&bytes).unwrap();
        assert_eq!((image.width, image.height), (2, 1));
        assert_eq!(image.pixels, pixels);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_png(b"definitely not a png").is_err());
    }

    #[test]
    fn test_decode_rejects_non_rgba() {
        let mut bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut bytes, 2, 1);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[1, 2, 3, 4, 5, 6]).unwrap();
        }
        assert!(matches!(
            decode_png(&bytes),
            Err(MienError::UnsupportedPixelFormat(_))
        ));
    }

    #[test]
    fn test_placeholder_is_transparent() {
        let image = placeholder(8);
        assert_eq!((image.width, image.height), (8, 8));
        assert!(image.pixels.chunks_exact(4).all(|px| px[3] == 0));
    }

    #[test]
    fn test_missing_path_falls_back() {
        let image = load_or_placeholder(Some(Path::new("/no/such/file.png")), 4);
        assert_eq!((image.width, image.height), (4, 4));
    }
}
