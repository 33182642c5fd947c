//! Image fixtures

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("encoding to memory cannot fail");
    bytes
}

/// A gradient JPEG
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

/// A PNG, optionally semi-transparent
pub fn png_bytes(width: u32, height: u32, transparent: bool) -> Vec<u8> {
    let alpha = if transparent { 96 } else { 255 };
    let img = RgbaImage::from_fn(width, height, |x, _| Rgba([200, (x % 256) as u8, 40, alpha]));
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}
