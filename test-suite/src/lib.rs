//! Test Suite for pagedeck
//!
//! Fixture generators and output validators shared by the end-to-end
//! pipeline scenarios and the property-based tests.

pub mod generators;
pub mod validators;

pub use generators::{jpeg_source, pdf_source, png_source, TestPdfBuilder};
pub use validators::{ArchiveValidator, DocumentValidator, PageSummary, ValidationError};

/// Common test utilities
pub mod utils {
    use pagedeck::{BlankRasterizer, DocumentSession, PipelineConfig};

    /// Session that renders blank pages, so no pdfium library is needed
    pub fn blank_session() -> DocumentSession {
        DocumentSession::new(PipelineConfig::default(), Box::new(BlankRasterizer))
    }

    /// Same, with a custom configuration
    pub fn blank_session_with(config: PipelineConfig) -> DocumentSession {
        DocumentSession::new(config, Box::new(BlankRasterizer))
    }

    /// Create a temporary directory for test outputs
    pub fn create_test_output_dir() -> anyhow::Result<tempfile::TempDir> {
        Ok(tempfile::tempdir()?)
    }
}
