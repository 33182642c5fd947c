//! Invalid PDF Generators
//!
//! Deliberately broken inputs for error handling tests.

use super::TestPdfBuilder;

/// A valid document cut off halfway
pub fn truncated_pdf() -> Vec<u8> {
    let mut bytes = TestPdfBuilder::letter_pages(2).build();
    bytes.truncate(bytes.len() / 2);
    bytes
}

/// Bytes with no PDF header at all
pub fn not_a_pdf() -> Vec<u8> {
    b"This is a plain text file pretending to be a PDF.\n".to_vec()
}

/// A header followed by garbage
pub fn header_only() -> Vec<u8> {
    b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\ngarbage garbage\n".to_vec()
}
