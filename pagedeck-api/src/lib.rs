//! # pagedeck-api
//!
//! HTTP compression endpoint for pagedeck. Uploaded PDFs are run through an
//! external compressor (Ghostscript by default) and page rotations are
//! re-applied to the result.

mod api;
pub mod config;
mod error;
mod ghostscript;

pub use api::{app, app_with_config, compress_handler, health_check, CompressionInfo};
pub use config::{GhostscriptConfig, GhostscriptProfile, ServerConfig};
pub use error::{AppError, CompressError, ConfigError, ErrorResponse};
