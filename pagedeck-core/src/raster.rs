//! Pixel-level helpers: rotation, scaling and encoding

use crate::error::Result;
use crate::rotation::RotationAngle;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Decode any supported raster format.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Rotate clockwise about the center; 90 and 270 swap width and height.
pub fn rotate(image: DynamicImage, angle: RotationAngle) -> DynamicImage {
    match angle {
        RotationAngle::None => image,
        RotationAngle::Clockwise90 => image.rotate90(),
        RotationAngle::Rotate180 => image.rotate180(),
        RotationAngle::Clockwise270 => image.rotate270(),
    }
}

/// Resize by a uniform factor. Dimensions are rounded and never drop to zero.
pub fn scale(image: DynamicImage, factor: f32) -> DynamicImage {
    if (factor - 1.0).abs() < f32::EPSILON {
        return image;
    }
    let width = ((image.width() as f32 * factor).round() as u32).max(1);
    let height = ((image.height() as f32 * factor).round() as u32).max(1);
    image.resize_exact(width, height, FilterType::Triangle)
}

/// Drop the alpha channel by compositing onto white.
pub fn flatten(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u16 * a as u16 + 255 * (255 - a as u16)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Encode as baseline JPEG; `quality` is in `0.0..=1.0`.
pub fn encode_jpeg(image: &DynamicImage, quality: f32) -> Result<Vec<u8>> {
    let quality = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
    let rgb = flatten(image);

    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder.encode_image(&rgb)?;
    Ok(bytes)
}

/// Encode losslessly as PNG.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{jpeg_bytes, png_bytes};
    use image::{GenericImageView, Rgba, RgbaImage};

    #[test]
    fn test_rotate_swaps_dimensions() {
        let image = DynamicImage::new_rgb8(40, 10);
        assert_eq!(rotate(image.clone(), RotationAngle::None).dimensions(), (40, 10));
        assert_eq!(rotate(image.clone(), RotationAngle::Clockwise90).dimensions(), (10, 40));
        assert_eq!(rotate(image.clone(), RotationAngle::Rotate180).dimensions(), (40, 10));
        assert_eq!(rotate(image, RotationAngle::Clockwise270).dimensions(), (10, 40));
    }

    #[test]
    fn test_rotate_clockwise_moves_top_left_to_top_right() {
        let mut buffer = RgbImage::new(3, 2);
        buffer.put_pixel(0, 0, Rgb([255, 0, 0]));

        let rotated = rotate(DynamicImage::ImageRgb8(buffer), RotationAngle::Clockwise90).to_rgb8();
        assert_eq!(rotated.get_pixel(1, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_scale() {
        let image = DynamicImage::new_rgb8(100, 50);
        assert_eq!(scale(image.clone(), 1.5).dimensions(), (150, 75));
        assert_eq!(scale(image.clone(), 0.8).dimensions(), (80, 40));
        assert_eq!(scale(image, 0.001).dimensions(), (1, 1));
    }

    #[test]
    fn test_flatten_composites_on_white() {
        let transparent = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0]));
        let flat = flatten(&DynamicImage::ImageRgba8(transparent));
        assert_eq!(flat.get_pixel(0, 0), &Rgb([255, 255, 255]));

        let opaque = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 255]));
        let flat = flatten(&DynamicImage::ImageRgba8(opaque));
        assert_eq!(flat.get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_encode_jpeg_and_png() {
        let image = decode(&png_bytes(16, 8, true)).unwrap();

        let jpeg = encode_jpeg(&image, 0.7).unwrap();
        assert!(jpeg.starts_with(&[0xFF, 0xD8, 0xFF]));
        assert_eq!(decode(&jpeg).unwrap().dimensions(), (16, 8));

        let png = encode_png(&image).unwrap();
        assert!(png.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_lower_quality_is_smaller() {
        let image = decode(&jpeg_bytes(64, 64)).unwrap();
        let high = encode_jpeg(&image, 0.9).unwrap();
        let low = encode_jpeg(&image, 0.1).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_decode_garbage() {
        assert!(decode(b"not an image").is_err());
    }
}
