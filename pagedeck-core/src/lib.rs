//! # pagedeck
//!
//! Compose a single PDF out of PDF documents and images: extract every page,
//! reorder, rotate and delete them, then merge, compress or export the
//! result as images.
//!
//! ## Features
//!
//! - **Page extraction**: PDF pages and standalone images become uniform page entries with previews
//! - **Page state**: drag-and-drop reordering, quarter-turn rotation, selection and deletion
//! - **Merge**: pages are deep-copied into a fresh document; images are placed on A4 pages
//! - **Compression**: local raster presets or a remote Ghostscript service
//! - **Image export**: every page rendered to JPG or PNG and packed into a ZIP archive
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagedeck::{
//!     DirectorySink, DocumentSession, NoProgress, PipelineConfig, RotateDirection, SourceFile,
//! };
//!
//! # fn main() -> pagedeck::Result<()> {
//! let mut session = DocumentSession::with_default_rasterizer(PipelineConfig::from_env()?);
//! session.add_files(
//!     vec![
//!         SourceFile::from_path("report.pdf")?,
//!         SourceFile::from_path("scan.jpg")?,
//!     ],
//!     &NoProgress,
//! )?;
//!
//! // Put the scan first and turn it upright
//! let order = session.page_order();
//! let scan = order.last().cloned().unwrap();
//! session.reorder(&scan, &order[0])?;
//! session.rotate(&scan, RotateDirection::Right)?;
//!
//! session.merge(&NoProgress)?;
//! let report = session.compress(&NoProgress)?.report;
//! println!("{report}");
//!
//! let mut sink = DirectorySink::new("out");
//! session.download_merged(&mut sink)?;
//! session.download_compressed(&mut sink)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Progress reporting
//!
//! Long operations take a [`ProgressCallback`]; any `Fn(&ProgressUpdate)`
//! closure works:
//!
//! ```rust,no_run
//! use pagedeck::{DocumentSession, PipelineConfig, ProgressUpdate};
//!
//! # fn main() -> pagedeck::Result<()> {
//! let mut session = DocumentSession::with_default_rasterizer(PipelineConfig::default());
//! let progress = |update: &ProgressUpdate| println!("{:>3.0}% {}", update.percent, update.message);
//! session.merge(&progress)?;
//! # Ok(())
//! # }
//! ```

pub(crate) mod compression;
pub mod config;
pub mod download;
pub mod error;
pub mod operations;
pub mod page;
pub(crate) mod pdf;
pub mod progress;
pub mod raster;
pub mod render;
pub mod resources;
pub mod rotation;
pub mod session;
pub mod usage;

#[cfg(test)]
mod test_helpers;

pub use config::{CompressionConfig, PageSize, PipelineConfig};
pub use download::{DirectorySink, DownloadSink, FileSink, MemorySink};
pub use error::{PageDeckError, Result};
pub use page::{Page, PageId, Preview, SourceFile, SourceKind};
pub use pdf::page_count;
pub use progress::{NoProgress, ProgressBar, ProgressCallback, ProgressUpdate};
pub use render::{default_rasterizer, BlankRasterizer, PageRasterizer};
pub use resources::{Blob, ObjectUrl, ObjectUrlRegistry};
pub use rotation::{RotateDirection, RotationAngle, RotationMap};
pub use session::{CompressedArtifact, DocumentSession, ExportSummary, Key, MergedArtifact};
pub use usage::{HttpUsageRecorder, Operation, UsageRecorder};

// Re-export operations
pub use operations::{
    apply_rotations, apply_rotations_json, CompressionPreset, CompressionReport,
    CompressionStrategy, DocumentAssembler, DocumentPostProcessor, ExportFormat, HyperlinkService,
    ImageExporter, PageExtractor, PostProcessRequest, StrategyKind,
};

/// Current version of pagedeck
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
