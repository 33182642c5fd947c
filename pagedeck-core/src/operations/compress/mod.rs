//! Compression strategies
//!
//! Two interchangeable ways of shrinking a document:
//!
//! - [`RasterCompression`] re-renders every page at a preset resolution and
//!   JPEG quality and rebuilds the document from those rasters.
//! - [`RemoteCompression`] posts the merged document to the compression
//!   endpoint, which runs an external tool and re-applies rotations.

mod raster;
mod remote;

pub use raster::RasterCompression;
pub use remote::RemoteCompression;

use crate::config::PipelineConfig;
use crate::error::{PageDeckError, Result};
use crate::page::Page;
use crate::progress::ProgressCallback;
use crate::render::PageRasterizer;
use crate::rotation::RotationMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Resolution and JPEG quality used by raster compression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionPreset {
    High,
    #[default]
    Medium,
    Low,
}

impl CompressionPreset {
    /// Render scale relative to the page size in points.
    pub fn scale(self) -> f32 {
        match self {
            CompressionPreset::High => 1.5,
            CompressionPreset::Medium => 1.0,
            CompressionPreset::Low => 0.8,
        }
    }

    /// Compression level as the link service expects it: 1 (light) to 3 (strong).
    pub fn level(self) -> u8 {
        match self {
            CompressionPreset::High => 1,
            CompressionPreset::Medium => 2,
            CompressionPreset::Low => 3,
        }
    }

    /// JPEG quality in `0.0..=1.0`.
    pub fn jpeg_quality(self) -> f32 {
        match self {
            CompressionPreset::High => 0.9,
            CompressionPreset::Medium => 0.7,
            CompressionPreset::Low => 0.5,
        }
    }
}

impl FromStr for CompressionPreset {
    type Err = PageDeckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(CompressionPreset::High),
            "medium" => Ok(CompressionPreset::Medium),
            "low" => Ok(CompressionPreset::Low),
            other => Err(PageDeckError::Config(format!(
                "unknown compression preset '{other}' (expected high, medium or low)"
            ))),
        }
    }
}

impl fmt::Display for CompressionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompressionPreset::High => "high",
            CompressionPreset::Medium => "medium",
            CompressionPreset::Low => "low",
        })
    }
}

/// Which compression strategy to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Re-render pages locally
    #[default]
    Raster,
    /// Send the merged document to the compression endpoint
    Server,
}

impl FromStr for StrategyKind {
    type Err = PageDeckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "raster" | "client" => Ok(StrategyKind::Raster),
            "server" | "remote" => Ok(StrategyKind::Server),
            other => Err(PageDeckError::Config(format!(
                "unknown compression strategy '{other}' (expected raster or server)"
            ))),
        }
    }
}

/// Everything a strategy may need about the current document.
pub struct CompressionInput<'a> {
    /// Pages in output order
    pub pages: &'a [Page],
    pub rotations: &'a RotationMap,
    /// The merged document built from `pages` and `rotations`
    pub merged: &'a [u8],
}

pub trait CompressionStrategy {
    fn name(&self) -> &'static str;

    fn compress(&self, input: &CompressionInput<'_>, progress: &dyn ProgressCallback) -> Result<Vec<u8>>;
}

/// Size accounting for a compression run.
///
/// Sizes are reported in MiB rounded to two decimals and the reduction is
/// computed from those rounded values, so the three numbers shown to a user
/// always agree with each other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompressionReport {
    pub original_bytes: usize,
    pub compressed_bytes: usize,
    pub original_mb: f64,
    pub compressed_mb: f64,
}

impl CompressionReport {
    pub fn new(original_bytes: usize, compressed_bytes: usize) -> Self {
        Self {
            original_bytes,
            compressed_bytes,
            original_mb: to_mb(original_bytes),
            compressed_mb: to_mb(compressed_bytes),
        }
    }

    /// `(1 - compressed / original) * 100`; negative when the output grew.
    pub fn reduction_percent(&self) -> f64 {
        if self.original_mb == 0.0 {
            return 0.0;
        }
        (1.0 - self.compressed_mb / self.original_mb) * 100.0
    }
}

impl fmt::Display for CompressionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} MB -> {:.2} MB ({:.1}% reduction)",
            self.original_mb,
            self.compressed_mb,
            self.reduction_percent()
        )
    }
}

fn to_mb(bytes: usize) -> f64 {
    (bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0
}

/// Build the strategy named by the configuration.
pub fn strategy_from_config<'a>(
    config: &PipelineConfig,
    rasterizer: &'a dyn PageRasterizer,
) -> Result<Box<dyn CompressionStrategy + 'a>> {
    Ok(match config.compression.strategy {
        StrategyKind::Raster => Box::new(RasterCompression::new(rasterizer, config.compression.preset)),
        StrategyKind::Server => Box::new(RemoteCompression::new(&config.compression.endpoint)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::BlankRasterizer;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_presets() {
        assert_eq!(CompressionPreset::High.scale(), 1.5);
        assert_eq!(CompressionPreset::High.jpeg_quality(), 0.9);
        assert_eq!(CompressionPreset::Medium.scale(), 1.0);
        assert_eq!(CompressionPreset::Medium.jpeg_quality(), 0.7);
        assert_eq!(CompressionPreset::Low.scale(), 0.8);
        assert_eq!(CompressionPreset::Low.jpeg_quality(), 0.5);
        assert_eq!(CompressionPreset::Low.level(), 3);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("LOW".parse::<CompressionPreset>().unwrap(), CompressionPreset::Low);
        assert!("tiny".parse::<CompressionPreset>().is_err());
        assert_eq!("server".parse::<StrategyKind>().unwrap(), StrategyKind::Server);
        assert_eq!("raster".parse::<StrategyKind>().unwrap(), StrategyKind::Raster);
        assert!("cloud".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_report_rounds_to_two_decimals() {
        let report = CompressionReport::new(5_347_737, 1_048_576);
        assert_eq!(report.original_mb, 5.1);
        assert_eq!(report.compressed_mb, 1.0);
    }

    #[test]
    fn test_reduction_uses_reported_values() {
        let report = CompressionReport::new(4 * 1024 * 1024, 1024 * 1024);
        assert_eq!(report.reduction_percent(), 75.0);

        // 1.004 MiB and 0.996 MiB both report as 1.00, so no reduction is shown.
        let report = CompressionReport::new(1_052_770, 1_044_381);
        assert_eq!(report.original_mb, 1.0);
        assert_eq!(report.compressed_mb, 1.0);
        assert_eq!(report.reduction_percent(), 0.0);
    }

    #[test]
    fn test_reduction_can_be_negative() {
        let report = CompressionReport::new(1024 * 1024, 2 * 1024 * 1024);
        assert_eq!(report.reduction_percent(), -100.0);
    }

    #[test]
    fn test_reduction_of_tiny_input() {
        let report = CompressionReport::new(1000, 10);
        assert_eq!(report.original_mb, 0.0);
        assert_eq!(report.reduction_percent(), 0.0);
    }

    #[test]
    fn test_report_display() {
        let report = CompressionReport::new(2 * 1024 * 1024, 512 * 1024);
        assert_eq!(report.to_string(), "2.00 MB -> 0.50 MB (75.0% reduction)");
    }

    #[test]
    fn test_strategy_from_config() {
        let mut config = PipelineConfig::default();
        let rasterizer = BlankRasterizer;
        assert_eq!(strategy_from_config(&config, &rasterizer).unwrap().name(), "raster");

        config.compression.strategy = StrategyKind::Server;
        assert_eq!(strategy_from_config(&config, &rasterizer).unwrap().name(), "server");
    }
}
