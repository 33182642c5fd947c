//! Archive Validator
//!
//! Reads back exported ZIP archives.

use super::ValidationResult;
use image::GenericImageView;
use std::io::{Cursor, Read};

/// One decoded archive entry
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: image::ImageFormat,
}

pub struct ArchiveValidator;

impl ArchiveValidator {
    /// Entry names in archive order
    pub fn entry_names(data: &[u8]) -> ValidationResult<Vec<String>> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
        let mut names = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            names.push(archive.by_index(index)?.name().to_string());
        }
        Ok(names)
    }

    /// Decode every entry as an image
    pub fn entries(data: &[u8]) -> ValidationResult<Vec<ArchiveEntry>> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
        let mut entries = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;

            let format = image::guess_format(&bytes)?;
            let (width, height) = image::load_from_memory(&bytes)?.dimensions();
            entries.push(ArchiveEntry {
                name: file.name().to_string(),
                width,
                height,
                format,
            });
        }
        Ok(entries)
    }
}
