//! Output Validators
//!
//! Inspect what the pipeline produced: merged and compressed documents and
//! exported archives.

pub mod archive_validator;
pub mod document_validator;

pub use archive_validator::{ArchiveEntry, ArchiveValidator};
pub use document_validator::{DocumentValidator, PageSummary};

/// Problems found while validating an output
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;
