//! Pipeline configuration
//!
//! Defaults mirror the web application: previews at scale 1, exports at
//! scale 2, image pages on A4 at 90% fit, medium raster compression.

use crate::error::{PageDeckError, Result};
use crate::operations::compress::{CompressionPreset, StrategyKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const ENV_STRATEGY: &str = "PAGEDECK_COMPRESSION_STRATEGY";
pub const ENV_PRESET: &str = "PAGEDECK_COMPRESSION_PRESET";
pub const ENV_ENDPOINT: &str = "PAGEDECK_COMPRESS_ENDPOINT";
pub const ENV_USAGE_URL: &str = "PAGEDECK_USAGE_URL";
pub const ENV_HYPERLINK_URL: &str = "PAGEDECK_HYPERLINK_URL";

/// Page size in PDF points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// ISO A4 portrait
    pub const A4: PageSize = PageSize {
        width: 595.0,
        height: 842.0,
    };
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::A4
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Which strategy `DocumentSession::compress` uses
    pub strategy: StrategyKind,
    /// Resolution/quality preset for the raster strategy
    pub preset: CompressionPreset,
    /// URL of the compression endpoint for the server strategy
    pub endpoint: String,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Raster,
            preset: CompressionPreset::Medium,
            endpoint: "http://127.0.0.1:3000/api/compress".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Render scale for PDF page previews
    pub preview_scale: f32,
    /// Render scale for PDF pages during image export
    pub export_scale: f32,
    /// Size of the pages generated for image sources during merge
    pub page_size: PageSize,
    /// Fraction of the page an embedded image may fill
    pub image_fit: f32,
    pub compression: CompressionConfig,
    /// Endpoint notified after each successful merge, compress or export
    pub usage_url: Option<String>,
    /// Link-processing endpoint run over merged and compressed documents
    pub hyperlink_url: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            preview_scale: 1.0,
            export_scale: 2.0,
            page_size: PageSize::A4,
            image_fit: 0.9,
            compression: CompressionConfig::default(),
            usage_url: None,
            hyperlink_url: None,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file. Missing keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        debug!("Loaded pipeline config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup (the environment in production).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_STRATEGY) {
            self.compression.strategy = value.parse()?;
        }
        if let Some(value) = lookup(ENV_PRESET) {
            self.compression.preset = value.parse()?;
        }
        if let Some(value) = lookup(ENV_ENDPOINT) {
            self.compression.endpoint = value;
        }
        if let Some(value) = lookup(ENV_USAGE_URL) {
            self.usage_url = Some(value).filter(|url| !url.is_empty());
        }
        if let Some(value) = lookup(ENV_HYPERLINK_URL) {
            self.hyperlink_url = Some(value).filter(|url| !url.is_empty());
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.preview_scale > 0.0) || !(self.export_scale > 0.0) {
            return Err(PageDeckError::Config(
                "render scales must be positive".to_string(),
            ));
        }
        if !(self.image_fit > 0.0 && self.image_fit <= 1.0) {
            return Err(PageDeckError::Config(format!(
                "image_fit must be in (0, 1], got {}",
                self.image_fit
            )));
        }
        if !(self.page_size.width > 0.0 && self.page_size.height > 0.0) {
            return Err(PageDeckError::Config("page size must be positive".to_string()));
        }
        Ok(())
    }
}
