//! Fixture Generators
//!
//! Utilities for generating the PDFs and images the pipeline consumes.

pub mod images;
pub mod invalid_pdfs;
pub mod test_pdf_builder;

pub use images::{jpeg_bytes, png_bytes};
pub use test_pdf_builder::{PdfVersion, TestPdfBuilder};

use pagedeck::SourceFile;

/// A PDF source file with `pages` Letter pages
pub fn pdf_source(name: &str, pages: usize) -> SourceFile {
    SourceFile::new(name, "application/pdf", TestPdfBuilder::letter_pages(pages).build())
}

/// A JPEG source file
pub fn jpeg_source(name: &str, width: u32, height: u32) -> SourceFile {
    SourceFile::new(name, "image/jpeg", jpeg_bytes(width, height))
}

/// A PNG source file with an alpha channel
pub fn png_source(name: &str, width: u32, height: u32) -> SourceFile {
    SourceFile::new(name, "image/png", png_bytes(width, height, true))
}
