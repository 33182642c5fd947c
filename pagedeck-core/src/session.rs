//! The working document: pages, their order, rotations and artifacts
//!
//! A [`DocumentSession`] owns everything a user builds up between loading
//! files and downloading results. Operations run sequentially; each stage
//! borrows what it needs from the session.

use crate::config::PipelineConfig;
use crate::download::DownloadSink;
use crate::error::{PageDeckError, Result};
use crate::operations::compress::{strategy_from_config, CompressionInput, CompressionReport};
use crate::operations::export::{ExportFormat, ImageExporter};
use crate::operations::extract::{output_name_for, PageExtractor};
use crate::operations::links::{process_or_keep, DocumentPostProcessor, PostProcessRequest};
use crate::operations::merge::DocumentAssembler;
use crate::page::{Page, PageId, SourceFile};
use crate::progress::{report, NoProgress, ProgressCallback};
use crate::render::{default_rasterizer, PageRasterizer};
use crate::resources::{Blob, ObjectUrl, ObjectUrlRegistry};
use crate::rotation::{RotateDirection, RotationAngle, RotationMap};
use crate::usage::{Operation, UsageRecorder};
use chrono::Local;
use std::sync::Arc;
use tracing::{debug, info, warn};

const PDF_MIME: &str = "application/pdf";
const ZIP_MIME: &str = "application/zip";
const DEFAULT_OUTPUT_NAME: &str = "merged";

/// Keys the page grid reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    Other(String),
}

/// The merged document currently on offer
#[derive(Debug, Clone)]
pub struct MergedArtifact {
    pub url: ObjectUrl,
    pub size_bytes: usize,
    revision: u64,
}

/// The compressed document currently on offer
#[derive(Debug, Clone)]
pub struct CompressedArtifact {
    pub url: ObjectUrl,
    pub report: CompressionReport,
    /// Name of the strategy that produced it
    pub strategy: &'static str,
}

/// What an image export delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub file_name: String,
    pub entries: Vec<String>,
    pub size_bytes: usize,
}

pub struct DocumentSession {
    config: PipelineConfig,
    rasterizer: Box<dyn PageRasterizer>,
    pages: Vec<Page>,
    rotations: RotationMap,
    selected: Option<PageId>,
    urls: ObjectUrlRegistry,
    merged: Option<MergedArtifact>,
    compressed: Option<CompressedArtifact>,
    output_name: Option<String>,
    /// Bumped on every change to pages, order or rotations.
    revision: u64,
    usage: Option<Box<dyn UsageRecorder>>,
    post_processor: Option<Box<dyn DocumentPostProcessor>>,
}

impl DocumentSession {
    pub fn new(config: PipelineConfig, rasterizer: Box<dyn PageRasterizer>) -> Self {
        Self {
            config,
            rasterizer,
            pages: Vec::new(),
            rotations: RotationMap::new(),
            selected: None,
            urls: ObjectUrlRegistry::new(),
            merged: None,
            compressed: None,
            output_name: None,
            revision: 0,
            usage: None,
            post_processor: None,
        }
    }

    /// Session using the best available rasterizer.
    pub fn with_default_rasterizer(config: PipelineConfig) -> Self {
        Self::new(config, default_rasterizer())
    }

    pub fn set_usage_recorder(&mut self, recorder: Box<dyn UsageRecorder>) {
        self.usage = Some(recorder);
    }

    /// Run `processor` over every merged and compressed document. Its
    /// failures keep the unprocessed document.
    pub fn set_post_processor(&mut self, processor: Box<dyn DocumentPostProcessor>) {
        self.post_processor = Some(processor);
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Pages in their current order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, id: &PageId) -> Option<&Page> {
        self.pages.iter().find(|page| &page.id == id)
    }

    pub fn page_order(&self) -> Vec<PageId> {
        self.pages.iter().map(|page| page.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn rotations(&self) -> &RotationMap {
        &self.rotations
    }

    pub fn rotation(&self, id: &PageId) -> RotationAngle {
        self.rotations.get(id)
    }

    pub fn selected(&self) -> Option<&PageId> {
        self.selected.as_ref()
    }

    pub fn object_urls(&self) -> &ObjectUrlRegistry {
        &self.urls
    }

    pub fn output_name(&self) -> &str {
        self.output_name.as_deref().unwrap_or(DEFAULT_OUTPUT_NAME)
    }

    pub fn set_output_name(&mut self, name: impl Into<String>) {
        self.output_name = Some(name.into());
    }

    pub fn merged(&self) -> Option<&MergedArtifact> {
        self.merged.as_ref()
    }

    pub fn compressed(&self) -> Option<&CompressedArtifact> {
        self.compressed.as_ref()
    }

    /// Whether the merged artifact reflects the current pages and rotations.
    pub fn merged_is_current(&self) -> bool {
        self.merged
            .as_ref()
            .is_some_and(|merged| merged.revision == self.revision)
    }

    /// Resolve an object URL issued by this session.
    pub fn resolve(&self, url: &ObjectUrl) -> Option<&Blob> {
        self.urls.resolve(url)
    }

    // --- Ingest ---------------------------------------------------------------

    /// Append the pages of newly selected files and return how many were added.
    pub fn add_files(&mut self, files: Vec<SourceFile>, progress: &dyn ProgressCallback) -> Result<usize> {
        let suggested = files.first().map(|file| output_name_for(file, Local::now()));
        let extraction = PageExtractor::new(self.rasterizer.as_ref(), self.config.preview_scale)
            .extract(files, &mut self.urls, progress)?;

        if self.output_name.is_none() {
            self.output_name = suggested;
        }
        let added = extraction.pages.len();
        if added > 0 {
            self.pages.extend(extraction.pages);
            self.touch();
        }
        Ok(added)
    }

    // --- Order, rotation, selection --------------------------------------------

    fn index_of(&self, id: &PageId) -> Result<usize> {
        self.pages
            .iter()
            .position(|page| &page.id == id)
            .ok_or_else(|| PageDeckError::PageNotFound(id.to_string()))
    }

    /// Move the page at `from` so it ends up at index `to`.
    pub fn move_page(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.pages.len();
        if from >= len {
            return Err(PageDeckError::PageIndexOutOfBounds(from, len));
        }
        if to >= len {
            return Err(PageDeckError::PageIndexOutOfBounds(to, len));
        }
        if from != to {
            let page = self.pages.remove(from);
            self.pages.insert(to, page);
            self.touch();
            debug!("Moved page {} -> {}", from + 1, to + 1);
        }
        Ok(())
    }

    /// Drag-and-drop: move `from_id` to the position currently held by `to_id`.
    pub fn reorder(&mut self, from_id: &PageId, to_id: &PageId) -> Result<()> {
        let from = self.index_of(from_id)?;
        let to = self.index_of(to_id)?;
        self.move_page(from, to)
    }

    pub fn rotate(&mut self, id: &PageId, direction: RotateDirection) -> Result<RotationAngle> {
        self.index_of(id)?;
        let angle = self.rotations.rotate(id, direction);
        self.touch();
        debug!("Rotated {} to {}", id, angle.to_degrees());
        Ok(angle)
    }

    /// Rotate the selected page. Without a selection this does nothing.
    pub fn rotate_selected(&mut self, direction: RotateDirection) -> Option<RotationAngle> {
        let id = self.selected.clone()?;
        self.rotate(&id, direction).ok()
    }

    /// Toggle selection of a page. Returns whether the page is now selected.
    pub fn select(&mut self, id: &PageId) -> Result<bool> {
        self.index_of(id)?;
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
            Ok(false)
        } else {
            self.selected = Some(id.clone());
            Ok(true)
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Remove a page together with its rotation and preview URL.
    pub fn delete(&mut self, id: &PageId) -> bool {
        let Ok(index) = self.index_of(id) else {
            return false;
        };

        let page = self.pages.remove(index);
        self.rotations.remove(id);
        if let Some(url) = page.preview.object_url() {
            self.urls.revoke(url);
        }
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        self.touch();
        debug!("Deleted {}", id);
        true
    }

    /// Delete and Backspace remove the selected page.
    pub fn handle_key(&mut self, key: &Key) -> bool {
        match key {
            Key::Delete | Key::Backspace => match self.selected.clone() {
                Some(id) => self.delete(&id),
                None => false,
            },
            Key::Other(_) => false,
        }
    }

    /// Drop every page, rotation and artifact and revoke all URLs.
    pub fn reset(&mut self) {
        let revoked = self.urls.revoke_all();
        self.pages.clear();
        self.rotations.clear();
        self.selected = None;
        self.merged = None;
        self.compressed = None;
        self.output_name = None;
        self.touch();
        info!("Session reset ({} object URLs revoked)", revoked);
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    // --- Merge / compress / export -------------------------------------------

    pub fn merge(&mut self, progress: &dyn ProgressCallback) -> Result<&MergedArtifact> {
        self.assemble_merged(progress)?;
        self.record_usage(Operation::Merge);
        self.merged
            .as_ref()
            .ok_or(PageDeckError::MissingArtifact("merged document"))
    }

    /// Build and store the merged document without counting it as a merge.
    fn assemble_merged(&mut self, progress: &dyn ProgressCallback) -> Result<()> {
        let bytes = DocumentAssembler::from_config(&self.config).assemble(
            &self.pages,
            &self.rotations,
            progress,
        )?;
        let bytes = self.post_process(bytes, false);
        let size_bytes = bytes.len();
        let url = self.urls.create(Blob::new(PDF_MIME, bytes));

        if let Some(old) = self.merged.take() {
            self.urls.revoke(&old.url);
        }
        self.merged = Some(MergedArtifact {
            url,
            size_bytes,
            revision: self.revision,
        });
        Ok(())
    }

    fn post_process(&self, bytes: Vec<u8>, compress: bool) -> Vec<u8> {
        match &self.post_processor {
            Some(processor) => {
                let request = PostProcessRequest {
                    compress,
                    preset: self.config.compression.preset,
                    rotations: &self.rotations,
                };
                process_or_keep(processor.as_ref(), bytes, &request)
            }
            None => bytes,
        }
    }

    /// Merged bytes for the current state, merging first when needed.
    fn current_merged_bytes(&mut self) -> Result<Arc<[u8]>> {
        if !self.merged_is_current() {
            self.assemble_merged(&NoProgress)?;
        }
        self.merged
            .as_ref()
            .and_then(|merged| self.urls.resolve(&merged.url))
            .map(|blob| Arc::clone(&blob.data))
            .ok_or(PageDeckError::MissingArtifact("merged document"))
    }

    /// Compress with the configured strategy.
    ///
    /// A failure leaves the merged document and any earlier compressed
    /// document in place.
    pub fn compress(&mut self, progress: &dyn ProgressCallback) -> Result<&CompressedArtifact> {
        if self.pages.is_empty() {
            return Err(PageDeckError::NoPagesToProcess);
        }
        report(progress, 0.0, "Preparing document");
        let merged = self.current_merged_bytes()?;

        let (strategy_name, bytes) = {
            let strategy = strategy_from_config(&self.config, self.rasterizer.as_ref())?;
            let input = CompressionInput {
                pages: &self.pages,
                rotations: &self.rotations,
                merged: &merged,
            };
            (strategy.name(), strategy.compress(&input, progress)?)
        };
        let bytes = self.post_process(bytes, true);

        let report = CompressionReport::new(merged.len(), bytes.len());
        info!("Compressed with {} strategy: {}", strategy_name, report);
        let url = self.urls.create(Blob::new(PDF_MIME, bytes));

        if let Some(old) = self.compressed.take() {
            self.urls.revoke(&old.url);
        }
        self.record_usage(Operation::Compress);
        Ok(self.compressed.insert(CompressedArtifact {
            url,
            report,
            strategy: strategy_name,
        }))
    }

    /// Export every page as an image and hand the archive to `sink`.
    ///
    /// The archive's object URL is revoked as soon as the sink returns.
    pub fn export_images(
        &mut self,
        format: ExportFormat,
        sink: &mut dyn DownloadSink,
        progress: &dyn ProgressCallback,
    ) -> Result<ExportSummary> {
        let archive = ImageExporter::new(self.rasterizer.as_ref(), self.config.export_scale)
            .export(&self.pages, &self.rotations, format, progress)?;

        let size_bytes = archive.data.len();
        let url = self.urls.create(Blob::new(ZIP_MIME, archive.data));
        let delivered = match self.urls.resolve(&url) {
            Some(blob) => sink.deliver(&archive.file_name, blob),
            None => Err(PageDeckError::MissingArtifact("export archive")),
        };
        self.urls.revoke(&url);
        delivered?;

        self.record_usage(Operation::Export);
        Ok(ExportSummary {
            file_name: archive.file_name,
            entries: archive.entries,
            size_bytes,
        })
    }

    pub fn download_merged(&self, sink: &mut dyn DownloadSink) -> Result<()> {
        let merged = self
            .merged
            .as_ref()
            .ok_or(PageDeckError::MissingArtifact("merged document"))?;
        self.deliver(&merged.url, &format!("{}.pdf", self.output_name()), sink)
    }

    pub fn download_compressed(&self, sink: &mut dyn DownloadSink) -> Result<()> {
        let compressed = self
            .compressed
            .as_ref()
            .ok_or(PageDeckError::MissingArtifact("compressed document"))?;
        self.deliver(
            &compressed.url,
            &format!("{}_compressed.pdf", self.output_name()),
            sink,
        )
    }

    fn deliver(&self, url: &ObjectUrl, file_name: &str, sink: &mut dyn DownloadSink) -> Result<()> {
        let blob = self
            .urls
            .resolve(url)
            .ok_or(PageDeckError::MissingArtifact("revoked artifact"))?;
        sink.deliver(file_name, blob)
    }

    /// Release the merged and compressed documents.
    pub fn clear_artifacts(&mut self) {
        if let Some(merged) = self.merged.take() {
            self.urls.revoke(&merged.url);
        }
        if let Some(compressed) = self.compressed.take() {
            self.urls.revoke(&compressed.url);
        }
    }

    fn record_usage(&self, operation: Operation) {
        if let Some(recorder) = &self.usage {
            if let Err(e) = recorder.record(operation) {
                warn!("Failed to record {} usage: {}", operation, e);
            }
        }
    }
}

impl Drop for DocumentSession {
    fn drop(&mut self) {
        self.urls.revoke_all();
    }
}
