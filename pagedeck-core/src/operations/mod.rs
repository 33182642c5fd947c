//! Page operations
//!
//! The stages of the composition pipeline: extracting pages from source
//! files, assembling them into one document, compressing it, re-applying
//! rotations to an externally produced document, exporting pages as
//! images, and optional link post-processing.

pub mod compress;
pub(crate) mod embed;
pub mod export;
pub mod extract;
pub mod links;
pub mod merge;
pub mod rotate;

pub use compress::{
    strategy_from_config, CompressionInput, CompressionPreset, CompressionReport,
    CompressionStrategy, RasterCompression, RemoteCompression, StrategyKind,
};
pub use export::{entry_name, ExportArchive, ExportFormat, ImageExporter};
pub use extract::{output_name_for, Extraction, PageExtractor};
pub use links::{process_or_keep, DocumentPostProcessor, HyperlinkService, PostProcessRequest};
pub use merge::DocumentAssembler;
pub use rotate::{apply_rotations, apply_rotations_json};
