//! Page records and the files they come from

use crate::error::Result;
use crate::resources::ObjectUrl;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Stable page identifier, unique within a session and unchanged by reorders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    /// Generate a fresh `page-<uuid>` identifier.
    pub fn generate() -> Self {
        PageId(format!("page-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(value: &str) -> Self {
        PageId(value.to_string())
    }
}

impl From<String> for PageId {
    fn from(value: String) -> Self {
        PageId(value)
    }
}

/// What a page is backed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// One page of a PDF file
    Pdf,
    /// A whole raster image file
    Image,
}

impl SourceKind {
    /// Classify a MIME type. Anything that is neither a PDF nor an image is unsupported.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        let mime_type = mime_type.trim().to_ascii_lowercase();
        if mime_type == "application/pdf" {
            Some(SourceKind::Pdf)
        } else if mime_type.starts_with("image/") {
            Some(SourceKind::Image)
        } else {
            None
        }
    }
}

/// An uploaded file, shared by every page extracted from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub mime_type: String,
    pub data: Arc<[u8]>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream");
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, mime_type, data))
    }

    pub fn kind(&self) -> Option<SourceKind> {
        SourceKind::from_mime(&self.mime_type)
    }

    /// File name without its last extension.
    pub fn stem(&self) -> &str {
        match self.name.rfind('.') {
            Some(0) | None => &self.name,
            Some(idx) => &self.name[..idx],
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Thumbnail shown for a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// A rendered PDF page, encoded as PNG
    Rendered { width: u32, height: u32, png: Vec<u8> },
    /// An image page displayed straight from its bytes
    Object(ObjectUrl),
}

impl Preview {
    pub fn object_url(&self) -> Option<&ObjectUrl> {
        match self {
            Preview::Object(url) => Some(url),
            Preview::Rendered { .. } => None,
        }
    }
}

/// One page of the working document
#[derive(Debug, Clone)]
pub struct Page {
    pub id: PageId,
    pub source: Arc<SourceFile>,
    pub kind: SourceKind,
    /// Zero-based index into the source PDF; always 0 for images.
    pub page_index: usize,
    pub preview: Preview,
}

impl Page {
    pub fn is_pdf(&self) -> bool {
        self.kind == SourceKind::Pdf
    }

    pub fn is_image(&self) -> bool {
        self.kind == SourceKind::Image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_page_id_format_and_uniqueness() {
        let a = PageId::generate();
        let b = PageId::generate();
        assert!(a.as_str().starts_with("page-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_source_kind_from_mime() {
        assert_eq!(SourceKind::from_mime("application/pdf"), Some(SourceKind::Pdf));
        assert_eq!(SourceKind::from_mime("image/jpeg"), Some(SourceKind::Image));
        assert_eq!(SourceKind::from_mime("IMAGE/PNG"), Some(SourceKind::Image));
        assert_eq!(SourceKind::from_mime("text/plain"), None);
        assert_eq!(SourceKind::from_mime(""), None);
    }

    #[test]
    fn test_source_file_stem() {
        let file = SourceFile::new("report.final.pdf", "application/pdf", Vec::new());
        assert_eq!(file.stem(), "report.final");

        let file = SourceFile::new("README", "text/plain", Vec::new());
        assert_eq!(file.stem(), "README");

        let file = SourceFile::new(".hidden", "text/plain", Vec::new());
        assert_eq!(file.stem(), ".hidden");
    }

    #[test]
    fn test_source_file_from_path_guesses_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.jpg");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"\xFF\xD8\xFF")
            .unwrap();

        let file = SourceFile::from_path(&path).unwrap();
        assert_eq!(file.name, "scan.jpg");
        assert_eq!(file.mime_type, "image/jpeg");
        assert_eq!(file.kind(), Some(SourceKind::Image));
        assert_eq!(file.len(), 3);
    }

    #[test]
    fn test_source_file_from_missing_path() {
        assert!(SourceFile::from_path("/definitely/not/here.pdf").is_err());
    }
}
