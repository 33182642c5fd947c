//! Embedding raster images as PDF image XObjects

use crate::compression::flate_stream;
use crate::error::{PageDeckError, Result};
use crate::pdf::{self, PdfBuilder};
use crate::raster;
use image::DynamicImage;
use lopdf::{Dictionary, Object, ObjectId, Stream};

/// An image XObject written into an output document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EmbeddedImage {
    pub id: ObjectId,
    pub width: u32,
    pub height: u32,
}

/// Where an image is drawn on its page, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Placement {
    /// Scale uniformly to fit `fit` of the page and center.
    pub fn fit_centered(image_w: u32, image_h: u32, page_w: f32, page_h: f32, fit: f32) -> Self {
        let (image_w, image_h) = (image_w as f32, image_h as f32);
        let scale = (page_w / image_w).min(page_h / image_h) * fit;
        let (width, height) = (image_w * scale, image_h * scale);
        Self {
            x: (page_w - width) / 2.0,
            y: (page_h - height) / 2.0,
            width,
            height,
        }
    }

    /// Cover the whole page.
    pub fn full_page(page_w: f32, page_h: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: page_w,
            height: page_h,
        }
    }
}

pub(crate) fn is_jpeg(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xFF, 0xD8, 0xFF])
}

/// Embed an image file. JPEG data passes through untouched; anything else is
/// decoded and re-encoded as a Flate stream.
pub(crate) fn embed_image(builder: &mut PdfBuilder, bytes: &[u8]) -> Result<EmbeddedImage> {
    if is_jpeg(bytes) {
        embed_jpeg(builder, bytes)
    } else {
        embed_raster(builder, &raster::decode(bytes)?)
    }
}

pub(crate) fn embed_jpeg(builder: &mut PdfBuilder, bytes: &[u8]) -> Result<EmbeddedImage> {
    let frame = JpegFrame::parse(bytes)?;

    let mut dict = image_dictionary(frame.width, frame.height);
    match frame.components {
        1 => dict.set("ColorSpace", "DeviceGray"),
        3 => dict.set("ColorSpace", "DeviceRGB"),
        4 => {
            dict.set("ColorSpace", "DeviceCMYK");
            // Adobe writes CMYK JPEGs inverted.
            dict.set(
                "Decode",
                [1, 0, 1, 0, 1, 0, 1, 0]
                    .iter()
                    .map(|v| Object::Integer(*v))
                    .collect::<Vec<_>>(),
            );
        }
        other => {
            return Err(PageDeckError::UnsupportedImage(format!(
                "JPEG with {other} color components"
            )))
        }
    }
    dict.set("Filter", "DCTDecode");

    let mut stream = Stream::new(dict, bytes.to_vec());
    stream.allows_compression = false;
    let id = builder.doc.add_object(Object::Stream(stream));

    Ok(EmbeddedImage {
        id,
        width: frame.width,
        height: frame.height,
    })
}

pub(crate) fn embed_raster(builder: &mut PdfBuilder, image: &DynamicImage) -> Result<EmbeddedImage> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for px in rgba.pixels() {
        rgb.extend_from_slice(&px.0[..3]);
        alpha.push(px.0[3]);
    }

    let mut dict = image_dictionary(width, height);
    dict.set("ColorSpace", "DeviceRGB");

    if alpha.iter().any(|a| *a < 255) {
        let mut smask = image_dictionary(width, height);
        smask.set("ColorSpace", "DeviceGray");
        let smask_id = builder.doc.add_object(flate_stream(smask, &alpha)?);
        dict.set("SMask", Object::Reference(smask_id));
    }

    let id = builder.doc.add_object(flate_stream(dict, &rgb)?);

    Ok(EmbeddedImage { id, width, height })
}

/// Append a page of `page_w` x `page_h` points that draws `image` at `placement`.
pub(crate) fn add_image_page(
    builder: &mut PdfBuilder,
    image: EmbeddedImage,
    page_w: f32,
    page_h: f32,
    placement: Placement,
) -> ObjectId {
    let mut xobjects = Dictionary::new();
    xobjects.set("Im0", Object::Reference(image.id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let content = format!(
        "q\n{:.4} 0 0 {:.4} {:.4} {:.4} cm\n/Im0 Do\nQ\n",
        placement.width, placement.height, placement.x, placement.y
    );
    let content_id = builder
        .doc
        .add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let mut page = Dictionary::new();
    page.set("MediaBox", pdf::rect(page_w, page_h));
    page.set("Resources", Object::Dictionary(resources));
    page.set("Contents", Object::Reference(content_id));
    builder.add_page(page)
}

fn image_dictionary(width: u32, height: u32) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", "XObject");
    dict.set("Subtype", "Image");
    dict.set("Width", width as i64);
    dict.set("Height", height as i64);
    dict.set("BitsPerComponent", 8);
    dict
}

/// Dimensions and component count from a JPEG start-of-frame segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct JpegFrame {
    pub width: u32,
    pub height: u32,
    pub components: u8,
}

impl JpegFrame {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let invalid = |reason: &str| PageDeckError::UnsupportedImage(format!("invalid JPEG: {reason}"));

        if !is_jpeg(bytes) {
            return Err(invalid("missing SOI marker"));
        }

        let mut pos = 2;
        while pos + 4 <= bytes.len() {
            if bytes[pos] != 0xFF {
                return Err(invalid("expected marker"));
            }
            let marker = bytes[pos + 1];
            // Fill bytes
            if marker == 0xFF {
                pos += 1;
                continue;
            }
            // Standalone markers carry no length
            if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
                pos += 2;
                continue;
            }

            let length = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
            if length < 2 {
                return Err(invalid("bad segment length"));
            }

            let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
            if is_sof {
                let segment = bytes
                    .get(pos + 4..pos + 2 + length)
                    .filter(|segment| segment.len() >= 6)
                    .ok_or_else(|| invalid("truncated frame header"))?;
                let height = u16::from_be_bytes([segment[1], segment[2]]) as u32;
                let width = u16::from_be_bytes([segment[3], segment[4]]) as u32;
                if width == 0 || height == 0 {
                    return Err(invalid("zero-sized frame"));
                }
                return Ok(Self {
                    width,
                    height,
                    components: segment[5],
                });
            }
            if marker == 0xDA {
                break;
            }
            pos += 2 + length;
        }

        Err(invalid("no frame header before scan data"))
    }
}
