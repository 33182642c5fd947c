//! Exporting pages as images packed into a ZIP archive

use crate::error::{PageDeckError, Result};
use crate::page::Page;
use crate::progress::{item_percent, report, ProgressCallback};
use crate::raster;
use crate::render::PageRasterizer;
use crate::rotation::RotationMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Cursor, Write};
use std::str::FromStr;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const JPEG_QUALITY: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Jpg,
    Png,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Jpg => "jpg",
            ExportFormat::Png => "png",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Jpg => "image/jpeg",
            ExportFormat::Png => "image/png",
        }
    }

    /// Name of the archive holding an export in this format.
    pub fn archive_name(self) -> String {
        format!("pdf_pages_as_{}.zip", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = PageDeckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(ExportFormat::Jpg),
            "png" => Ok(ExportFormat::Png),
            other => Err(PageDeckError::Config(format!(
                "unknown export format '{other}' (expected jpg or png)"
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A finished export
#[derive(Debug, Clone)]
pub struct ExportArchive {
    pub file_name: String,
    pub format: ExportFormat,
    /// Entry names in page order
    pub entries: Vec<String>,
    pub data: Vec<u8>,
}

/// `page-01.jpg` style entry name. Numbers are padded to two digits, or
/// wider when the export has more than 99 pages.
pub fn entry_name(index: usize, total: usize, format: ExportFormat) -> String {
    let width = total.to_string().len().max(2);
    format!("page-{:0width$}.{}", index + 1, format.extension())
}

/// Renders each page with its rotation baked into the pixels.
pub struct ImageExporter<'a> {
    rasterizer: &'a dyn PageRasterizer,
    scale: f32,
}

impl<'a> ImageExporter<'a> {
    /// `scale` applies to PDF pages; image pages keep their native size.
    pub fn new(rasterizer: &'a dyn PageRasterizer, scale: f32) -> Self {
        Self { rasterizer, scale }
    }

    pub fn export(
        &self,
        pages: &[Page],
        rotations: &RotationMap,
        format: ExportFormat,
        progress: &dyn ProgressCallback,
    ) -> Result<ExportArchive> {
        report(progress, 0.0, "Starting export");
        if pages.is_empty() {
            return Err(PageDeckError::NoPagesToProcess);
        }

        report(progress, 5.0, "Preparing pages");
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        // Entries are already compressed images.
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        report(progress, 10.0, "Rendering pages");
        let total = pages.len();
        let mut entries = Vec::with_capacity(total);
        for (i, page) in pages.iter().enumerate() {
            report(
                progress,
                item_percent(i, total),
                format!("Rendering page {}/{}", i + 1, total),
            );

            let bytes = self.render(page, rotations, format)?;
            let name = entry_name(i, total, format);
            debug!("{}: {} bytes", name, bytes.len());

            zip.start_file(name.as_str(), options)?;
            zip.write_all(&bytes)?;
            entries.push(name);
        }

        report(progress, 90.0, "Building archive");
        let data = zip.finish()?.into_inner();

        report(progress, 95.0, "Preparing download");
        let archive = ExportArchive {
            file_name: format.archive_name(),
            format,
            entries,
            data,
        };
        report(progress, 100.0, "Export complete");
        info!(
            "Exported {} pages as {} ({} bytes)",
            total,
            format,
            archive.data.len()
        );
        Ok(archive)
    }

    fn render(&self, page: &Page, rotations: &RotationMap, format: ExportFormat) -> Result<Vec<u8>> {
        let image = if page.is_pdf() {
            self.rasterizer
                .render_page(&page.source.data, page.page_index, self.scale)?
        } else {
            raster::decode(&page.source.data)?
        };
        let image = raster::rotate(image, rotations.get(&page.id));

        match format {
            ExportFormat::Jpg => raster::encode_jpeg(&image, JPEG_QUALITY),
            ExportFormat::Png => raster::encode_png(&image),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{PageId, Preview, SourceFile};
    use crate::progress::NoProgress;
    use crate::render::BlankRasterizer;
    use crate::rotation::RotationAngle;
    use crate::test_helpers::{pdf_source, png_source};
    use image::GenericImageView;
    use pretty_assertions::assert_eq;
    use std::io::Read;
    use std::sync::Arc;

    fn pages_of(source: SourceFile, count: usize) -> Vec<Page> {
        let source = Arc::new(source);
        (0..count)
            .map(|page_index| Page {
                id: PageId::generate(),
                source: Arc::clone(&source),
                kind: source.kind().unwrap(),
                page_index,
                preview: Preview::Rendered {
                    width: 1,
                    height: 1,
                    png: Vec::new(),
                },
            })
            .collect()
    }

    fn read_entry(data: &[u8], name: &str) -> Vec<u8> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_entry_names() {
        assert_eq!(entry_name(0, 3, ExportFormat::Jpg), "page-01.jpg");
        assert_eq!(entry_name(9, 12, ExportFormat::Png), "page-10.png");
        assert_eq!(entry_name(4, 120, ExportFormat::Png), "page-005.png");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JPEG".parse::<ExportFormat>().unwrap(), ExportFormat::Jpg);
        assert_eq!("png".parse::<ExportFormat>().unwrap(), ExportFormat::Png);
        assert!("gif".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Jpg.archive_name(), "pdf_pages_as_jpg.zip");
    }

    #[test]
    fn test_export_png_archive() {
        let mut pages = pages_of(pdf_source("a.pdf", 2), 2);
        pages.extend(pages_of(png_source("logo.png", 30, 10), 1));

        let mut rotations = RotationMap::new();
        rotations.set(pages[2].id.clone(), RotationAngle::Clockwise90);

        let archive = ImageExporter::new(&BlankRasterizer, 2.0)
            .export(&pages, &rotations, ExportFormat::Png, &NoProgress)
            .unwrap();

        assert_eq!(archive.file_name, "pdf_pages_as_png.zip");
        assert_eq!(archive.entries, vec!["page-01.png", "page-02.png", "page-03.png"]);

        let first = image::load_from_memory(&read_entry(&archive.data, "page-01.png")).unwrap();
        assert_eq!(first.dimensions(), (1224, 1584));

        // Native image size, rotated.
        let third = image::load_from_memory(&read_entry(&archive.data, "page-03.png")).unwrap();
        assert_eq!(third.dimensions(), (10, 30));
    }

    #[test]
    fn test_export_jpg_rotates_pdf_pages() {
        let pages = pages_of(pdf_source("a.pdf", 1), 1);
        let mut rotations = RotationMap::new();
        rotations.set(pages[0].id.clone(), RotationAngle::Clockwise270);

        let archive = ImageExporter::new(&BlankRasterizer, 1.0)
            .export(&pages, &rotations, ExportFormat::Jpg, &NoProgress)
            .unwrap();

        let bytes = read_entry(&archive.data, "page-01.jpg");
        assert!(bytes.starts_with(&[0xFF, 0xD8]));
        assert_eq!(image::load_from_memory(&bytes).unwrap().dimensions(), (792, 612));
    }

    #[test]
    fn test_export_nothing() {
        assert!(ImageExporter::new(&BlankRasterizer, 2.0)
            .export(&[], &RotationMap::new(), ExportFormat::Png, &NoProgress)
            .is_err());
    }
}
