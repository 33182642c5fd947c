//! Assembling the ordered pages into one PDF

use super::embed::{add_image_page, embed_image, Placement};
use crate::config::{PageSize, PipelineConfig};
use crate::error::{PageDeckError, Result};
use crate::page::{Page, SourceFile, SourceKind};
use crate::pdf::{self, PdfBuilder, INHERITABLE_KEYS};
use crate::progress::{item_percent, report, ProgressCallback};
use crate::rotation::RotationMap;
use lopdf::{Dictionary, Document, ObjectId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// A source PDF opened once per merge, with its object id mapping.
struct OpenedSource {
    doc: Document,
    copied: HashMap<ObjectId, ObjectId>,
}

/// Builds the output document from pages in order.
///
/// PDF pages are copied with their resources. Image pages are placed on a
/// fixed-size page, scaled to fit and centered. A non-zero rotation is
/// written as the page's `/Rotate`; page content is never transformed.
#[derive(Debug, Clone, Copy)]
pub struct DocumentAssembler {
    page_size: PageSize,
    image_fit: f32,
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl DocumentAssembler {
    pub fn new(page_size: PageSize, image_fit: f32) -> Self {
        Self {
            page_size,
            image_fit,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.page_size, config.image_fit)
    }

    pub fn assemble(
        &self,
        pages: &[Page],
        rotations: &RotationMap,
        progress: &dyn ProgressCallback,
    ) -> Result<Vec<u8>> {
        report(progress, 0.0, "Starting merge");
        if pages.is_empty() {
            return Err(PageDeckError::NoPagesToProcess);
        }

        report(progress, 10.0, "Preparing document");
        let mut builder = PdfBuilder::new();
        let mut sources: HashMap<*const SourceFile, OpenedSource> = HashMap::new();
        let total = pages.len();

        for (i, page) in pages.iter().enumerate() {
            report(
                progress,
                item_percent(i, total),
                format!("Adding page {}/{}", i + 1, total),
            );

            let page_id = match page.kind {
                SourceKind::Pdf => {
                    let source = match sources.entry(Arc::as_ptr(&page.source)) {
                        Entry::Occupied(entry) => entry.into_mut(),
                        Entry::Vacant(entry) => entry.insert(OpenedSource {
                            doc: pdf::load(&page.source.data)?,
                            copied: HashMap::new(),
                        }),
                    };
                    copy_page(&mut builder, source, page.page_index)?
                }
                SourceKind::Image => self.add_image(&mut builder, &page.source.data)?,
            };

            let rotation = rotations.get(&page.id);
            if !rotation.is_none() {
                pdf::set_rotation(&mut builder.doc, page_id, rotation)?;
            }
            debug!(
                "Added {} (source {} page {}, rotation {})",
                page.id,
                page.source.name,
                page.page_index + 1,
                rotation.to_degrees()
            );
        }

        report(progress, 85.0, "Writing document");
        let bytes = builder.finish()?;

        report(progress, 100.0, "Merge complete");
        info!("Merged {} pages ({} bytes)", total, bytes.len());
        Ok(bytes)
    }

    fn add_image(&self, builder: &mut PdfBuilder, bytes: &[u8]) -> Result<ObjectId> {
        let image = embed_image(builder, bytes)?;
        let PageSize { width, height } = self.page_size;
        let placement = Placement::fit_centered(image.width, image.height, width, height, self.image_fit);
        Ok(add_image_page(builder, image, width, height, placement))
    }
}

/// Copy one page of an opened source, resolving inherited attributes.
fn copy_page(builder: &mut PdfBuilder, source: &mut OpenedSource, page_index: usize) -> Result<ObjectId> {
    let OpenedSource { doc, copied } = source;
    let doc: &Document = doc;
    let page_id = pdf::page_object_id(doc, page_index)?;
    let page = doc.get_dictionary(page_id)?;

    let mut new_page = Dictionary::new();
    for (key, value) in page.iter() {
        if matches!(key.as_slice(), b"Parent" | b"Type") {
            continue;
        }
        new_page.set(
            key.clone(),
            pdf::copy_object_deep(&mut builder.doc, doc, value, copied)?,
        );
    }

    for key in INHERITABLE_KEYS {
        if new_page.has(key) {
            continue;
        }
        if let Some(value) = pdf::inherited_attribute(doc, page_id, key) {
            new_page.set(key.to_vec(), pdf::copy_object_deep(&mut builder.doc, doc, &value, copied)?);
        }
    }

    Ok(builder.add_page(new_page))
}
