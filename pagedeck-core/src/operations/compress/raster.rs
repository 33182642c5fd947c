use super::{CompressionInput, CompressionPreset, CompressionStrategy};
use crate::error::{PageDeckError, Result};
use crate::operations::embed::{add_image_page, embed_jpeg, Placement};
use crate::page::{Page, SourceFile};
use crate::pdf::{self, PdfBuilder};
use crate::progress::{item_percent, report, ProgressCallback};
use crate::raster;
use crate::render::PageRasterizer;
use crate::rotation::RotationAngle;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Rebuilds the document from JPEG renders of each page.
///
/// Every output page is exactly the size of its raster. Image pages are
/// rotated in pixels; PDF pages keep their rotation as `/Rotate` metadata.
/// Renders already carry the source page's own `/Rotate`, so the written
/// value is relative to it and the page displays exactly as it does in the
/// merged document.
pub struct RasterCompression<'a> {
    rasterizer: &'a dyn PageRasterizer,
    preset: CompressionPreset,
}

impl<'a> RasterCompression<'a> {
    pub fn new(rasterizer: &'a dyn PageRasterizer, preset: CompressionPreset) -> Self {
        Self { rasterizer, preset }
    }
}

impl CompressionStrategy for RasterCompression<'_> {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn compress(&self, input: &CompressionInput<'_>, progress: &dyn ProgressCallback) -> Result<Vec<u8>> {
        let pages = input.pages;
        if pages.is_empty() {
            return Err(PageDeckError::NoPagesToProcess);
        }

        let scale = self.preset.scale();
        let quality = self.preset.jpeg_quality();
        report(progress, 0.0, format!("Compressing ({} preset)", self.preset));

        let mut builder = PdfBuilder::new();
        let mut intrinsic = IntrinsicRotations::default();
        let total = pages.len();
        for (i, page) in pages.iter().enumerate() {
            report(
                progress,
                item_percent(i, total),
                format!("Compressing page {}/{}", i + 1, total),
            );

            let rotation = input.rotations.get(&page.id);
            let image = if page.is_pdf() {
                self.rasterizer.render_page(&page.source.data, page.page_index, scale)?
            } else {
                let decoded = raster::scale(raster::decode(&page.source.data)?, scale);
                raster::rotate(decoded, rotation)
            };

            let jpeg = raster::encode_jpeg(&image, quality)?;
            let embedded = embed_jpeg(&mut builder, &jpeg)?;
            let (width, height) = (embedded.width as f32, embedded.height as f32);
            let page_id = add_image_page(
                &mut builder,
                embedded,
                width,
                height,
                Placement::full_page(width, height),
            );

            if page.is_pdf() {
                let baked = intrinsic.of(page)?;
                let displayed = if rotation.is_none() { baked } else { rotation };
                let remaining = displayed.combine(baked.inverse());
                if !remaining.is_none() {
                    pdf::set_rotation(&mut builder.doc, page_id, remaining)?;
                }
            }
            debug!("Page {} -> {}x{} JPEG, {} bytes", i + 1, width, height, jpeg.len());
        }

        report(progress, 95.0, "Writing document");
        let bytes = builder.finish()?;
        report(progress, 100.0, "Compression complete");
        info!("Raster compression produced {} bytes", bytes.len());
        Ok(bytes)
    }
}

/// The `/Rotate` each source page carries, read once per source file.
#[derive(Default)]
struct IntrinsicRotations {
    by_source: HashMap<*const SourceFile, Vec<RotationAngle>>,
}

impl IntrinsicRotations {
    fn of(&mut self, page: &Page) -> Result<RotationAngle> {
        let key = Arc::as_ptr(&page.source);
        if !self.by_source.contains_key(&key) {
            let doc = pdf::load(&page.source.data)?;
            let angles = doc
                .get_pages()
                .values()
                .map(|id| pdf::intrinsic_rotation(&doc, *id))
                .collect();
            self.by_source.insert(key, angles);
        }
        let angles = &self.by_source[&key];
        angles
            .get(page.page_index)
            .copied()
            .ok_or(PageDeckError::PageIndexOutOfBounds(page.page_index, angles.len()))
    }
}
