use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageDeckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid PDF structure: {0}")]
    InvalidStructure(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Page index {0} out of bounds (document has {1} pages)")]
    PageIndexOutOfBounds(usize, usize),

    #[error("Invalid rotation angle: {0} (must be 0, 90, 180, or 270)")]
    InvalidRotation(i64),

    #[error("No pages to process")]
    NoPagesToProcess,

    #[error("Compression service returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Nothing to download: {0}")]
    MissingArtifact(&'static str),
}

pub type Result<T> = std::result::Result<T, PageDeckError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_error_display() {
        let error = PageDeckError::InvalidStructure("missing Pages root".to_string());
        assert_eq!(error.to_string(), "Invalid PDF structure: missing Pages root");

        let error = PageDeckError::InvalidRotation(45);
        assert_eq!(
            error.to_string(),
            "Invalid rotation angle: 45 (must be 0, 90, 180, or 270)"
        );

        let error = PageDeckError::Remote {
            status: 500,
            message: "PDF processing failed".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Compression service returned 500: PDF processing failed"
        );
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = IoError::new(ErrorKind::NotFound, "file not found");
        let error = PageDeckError::from(io_error);

        match error {
            PageDeckError::Io(ref err) => assert_eq!(err.kind(), ErrorKind::NotFound),
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_error_from_json_error() {
        let json_error = serde_json::from_str::<Vec<String>>("{oops").unwrap_err();
        let error = PageDeckError::from(json_error);
        assert!(matches!(error, PageDeckError::Json(_)));
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PageDeckError>();
    }
}
