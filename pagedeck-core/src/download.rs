//! Where finished artifacts go

use crate::error::Result;
use crate::resources::Blob;
use std::path::{Path, PathBuf};
use tracing::info;

/// Receives a finished artifact.
pub trait DownloadSink {
    fn deliver(&mut self, file_name: &str, blob: &Blob) -> Result<()>;
}

/// Writes each artifact into a directory under its suggested name.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            written: Vec::new(),
        }
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&mut self, file_name: &str, blob: &Blob) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, &blob.data)?;
        info!("Wrote {} ({} bytes)", path.display(), blob.len());
        self.written.push(path);
        Ok(())
    }
}

/// Writes the artifact to a fixed path, ignoring the suggested name.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DownloadSink for FileSink {
    fn deliver(&mut self, _file_name: &str, blob: &Blob) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, &blob.data)?;
        info!("Wrote {} ({} bytes)", self.path.display(), blob.len());
        Ok(())
    }
}

/// Keeps artifacts in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub downloads: Vec<(String, Blob)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&(String, Blob)> {
        self.downloads.last()
    }
}

impl DownloadSink for MemorySink {
    fn deliver(&mut self, file_name: &str, blob: &Blob) -> Result<()> {
        self.downloads.push((file_name.to_string(), blob.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_sink() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path().join("out"));
        sink.deliver("merged.pdf", &Blob::new("application/pdf", b"%PDF".to_vec()))
            .unwrap();

        let path = dir.path().join("out").join("merged.pdf");
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF");
        assert_eq!(sink.written(), &[path]);
    }

    #[test]
    fn test_file_sink_ignores_suggested_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.zip");
        FileSink::new(&path)
            .deliver("pdf_pages_as_png.zip", &Blob::new("application/zip", vec![1u8, 2]))
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2]);
    }
}
