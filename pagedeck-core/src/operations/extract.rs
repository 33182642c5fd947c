//! Turning uploaded files into pages

use crate::error::Result;
use crate::page::{Page, PageId, Preview, SourceFile, SourceKind};
use crate::progress::{report, ProgressCallback};
use crate::raster;
use crate::render::PageRasterizer;
use crate::resources::{Blob, ObjectUrlRegistry};
use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one extraction batch
#[derive(Debug, Default)]
pub struct Extraction {
    /// New pages, in file order then source page order
    pub pages: Vec<Page>,
    /// Names of files skipped for an unsupported MIME type
    pub skipped: Vec<String>,
}

/// Splits PDFs into pages and wraps images as single pages.
pub struct PageExtractor<'a> {
    rasterizer: &'a dyn PageRasterizer,
    preview_scale: f32,
}

impl<'a> PageExtractor<'a> {
    pub fn new(rasterizer: &'a dyn PageRasterizer, preview_scale: f32) -> Self {
        Self {
            rasterizer,
            preview_scale,
        }
    }

    /// Extract every file of a batch.
    ///
    /// Unsupported files are skipped. Any PDF that cannot be opened or
    /// rendered fails the whole batch; object URLs already issued for the
    /// batch are revoked before the error is returned.
    pub fn extract(
        &self,
        files: Vec<SourceFile>,
        urls: &mut ObjectUrlRegistry,
        progress: &dyn ProgressCallback,
    ) -> Result<Extraction> {
        let mut extraction = Extraction::default();
        let total = files.len();

        for (i, file) in files.into_iter().enumerate() {
            report(
                progress,
                i as f64 / total as f64 * 100.0,
                format!("Processing file {}/{}: {}", i + 1, total, file.name),
            );

            if let Err(e) = self.extract_file(file, urls, &mut extraction) {
                let revoked = extraction
                    .pages
                    .iter()
                    .filter_map(|page| page.preview.object_url())
                    .filter(|url| urls.revoke(url))
                    .count();
                warn!("Extraction failed, discarded batch ({} previews revoked): {}", revoked, e);
                return Err(e);
            }
        }

        report(
            progress,
            100.0,
            format!("Loaded {} pages", extraction.pages.len()),
        );
        info!(
            "Extracted {} pages from {} files ({} skipped)",
            extraction.pages.len(),
            total,
            extraction.skipped.len()
        );
        Ok(extraction)
    }

    fn extract_file(
        &self,
        file: SourceFile,
        urls: &mut ObjectUrlRegistry,
        extraction: &mut Extraction,
    ) -> Result<()> {
        let Some(kind) = file.kind() else {
            debug!("Skipping {} with unsupported type {}", file.name, file.mime_type);
            extraction.skipped.push(file.name);
            return Ok(());
        };

        let source = Arc::new(file);
        match kind {
            SourceKind::Pdf => {
                let renders = self
                    .rasterizer
                    .render_document(&source.data, self.preview_scale)?;
                debug!("{}: {} pages", source.name, renders.len());

                for (page_index, image) in renders.into_iter().enumerate() {
                    extraction.pages.push(Page {
                        id: PageId::generate(),
                        source: Arc::clone(&source),
                        kind,
                        page_index,
                        preview: Preview::Rendered {
                            width: image.width(),
                            height: image.height(),
                            png: raster::encode_png(&image)?,
                        },
                    });
                }
            }
            SourceKind::Image => {
                let url = urls.create(Blob::new(
                    source.mime_type.clone(),
                    Arc::clone(&source.data),
                ));
                extraction.pages.push(Page {
                    id: PageId::generate(),
                    source,
                    kind,
                    page_index: 0,
                    preview: Preview::Object(url),
                });
            }
        }
        Ok(())
    }
}

/// Default output name: first file's stem plus a timestamp.
pub fn output_name_for(file: &SourceFile, now: DateTime<Local>) -> String {
    format!("{}_{}", file.stem(), now.format("%Y-%m-%d_%H-%M-%S"))
}
