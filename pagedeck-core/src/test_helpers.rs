//! Fixtures shared by the unit tests

use crate::page::SourceFile;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Cursor;

/// A PDF whose pages have the given sizes in points.
pub fn pdf_with_sizes(sizes: &[(f32, f32)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for (i, (width, height)) in sizes.iter().enumerate() {
        let content = format!("BT /F1 24 Tf 72 72 Td (Page {}) Tj ET", i + 1);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(*width), Object::Real(*height)],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// A US Letter PDF with `count` pages.
pub fn pdf_with_pages(count: usize) -> Vec<u8> {
    pdf_with_sizes(&vec![(612.0, 792.0); count])
}

/// A one-page PDF whose MediaBox and Rotate live on the Pages node only.
pub fn pdf_with_tree_attributes(media_box: [f32; 4], rotate: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(dictionary! {}, b"0 0 m 10 10 l S".to_vec()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Kids" => vec![Object::Reference(page_id)],
            "MediaBox" => media_box.iter().map(|v| Object::Real(*v)).collect::<Vec<_>>(),
            "Rotate" => rotate,
            "Resources" => dictionary! {},
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 7) as u8, (y * 5) as u8, 128]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    bytes
}

pub fn png_bytes(width: u32, height: u32, transparent: bool) -> Vec<u8> {
    let alpha = if transparent { 96 } else { 255 };
    let img = RgbaImage::from_fn(width, height, |x, _| Rgba([200, (x * 3) as u8, 40, alpha]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn pdf_source(name: &str, pages: usize) -> SourceFile {
    SourceFile::new(name, "application/pdf", pdf_with_pages(pages))
}

pub fn jpeg_source(name: &str, width: u32, height: u32) -> SourceFile {
    SourceFile::new(name, "image/jpeg", jpeg_bytes(width, height))
}

pub fn png_source(name: &str, width: u32, height: u32) -> SourceFile {
    SourceFile::new(name, "image/png", png_bytes(width, height, true))
}
