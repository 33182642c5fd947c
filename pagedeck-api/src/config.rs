//! Server configuration read from the environment

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_BIND: &str = "PAGEDECK_BIND";
pub const ENV_GS_PATH: &str = "PAGEDECK_GS_PATH";
pub const ENV_GS_TIMEOUT_SECS: &str = "PAGEDECK_GS_TIMEOUT_SECS";
pub const ENV_TEMP_DIR: &str = "PAGEDECK_TEMP_DIR";
pub const ENV_MAX_UPLOAD_MB: &str = "PAGEDECK_MAX_UPLOAD_MB";

const DEFAULT_BIND: &str = "0.0.0.0:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 180;
const DEFAULT_MAX_UPLOAD_MB: usize = 200;
const MB: usize = 1024 * 1024;

/// Flags tuned to one kind of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GhostscriptProfile {
    /// Large inputs: `/ebook` at 150 dpi with font optimization
    Large,
    /// Small inputs: `/screen` at 96 dpi with strong JPEG recompression
    Small,
    /// Everything in between: `/ebook` at 150 dpi
    Balanced,
    /// Retry for inputs the first pass grew: no image resampling
    Preserve,
}

impl GhostscriptProfile {
    pub fn args(self) -> &'static [&'static str] {
        match self {
            GhostscriptProfile::Large => &[
                "-dPDFSETTINGS=/ebook",
                "-dDownsampleColorImages=true",
                "-dColorImageResolution=150",
                "-dDownsampleGrayImages=true",
                "-dGrayImageResolution=150",
                "-dAutoFilterColorImages=true",
                "-dAutoFilterGrayImages=true",
                "-dOptimize=true",
                "-dCompressFonts=true",
                "-dEmbedAllFonts=true",
                "-dSubsetFonts=true",
            ],
            GhostscriptProfile::Small => &[
                "-dPDFSETTINGS=/screen",
                "-dDownsampleColorImages=true",
                "-dColorImageResolution=96",
                "-dDownsampleGrayImages=true",
                "-dGrayImageResolution=96",
                "-dAutoFilterColorImages=false",
                "-dAutoFilterGrayImages=false",
                "-dColorImageFilter=/DCTEncode",
                "-dGrayImageFilter=/DCTEncode",
                "-dColorImageDict=<</QFactor 0.5>>",
                "-dGrayImageDict=<</QFactor 0.5>>",
                "-dOptimize=true",
            ],
            GhostscriptProfile::Balanced => &[
                "-dPDFSETTINGS=/ebook",
                "-dDownsampleColorImages=true",
                "-dColorImageResolution=150",
                "-dDownsampleGrayImages=true",
                "-dGrayImageResolution=150",
                "-dAutoFilterColorImages=true",
                "-dAutoFilterGrayImages=true",
                "-dOptimize=true",
                "-dDetectDuplicateImages=true",
            ],
            GhostscriptProfile::Preserve => &[
                "-dOptimize=true",
                "-dCompressFonts=true",
                "-dEmbedAllFonts=true",
                "-dSubsetFonts=true",
                "-dDownsampleColorImages=false",
                "-dDownsampleGrayImages=false",
                "-dAutoFilterColorImages=false",
                "-dAutoFilterGrayImages=false",
                "-dPreserveAnnots=true",
                "-dPreserveMarkedContent=true",
            ],
        }
    }
}

/// The external compressor invocation:
/// `program args... <profile args...> -sOutputFile=<out> <in>`
#[derive(Debug, Clone)]
pub struct GhostscriptConfig {
    pub program: PathBuf,
    /// Flags passed on every run, before the profile's own
    pub args: Vec<String>,
    pub timeout: Duration,
    /// Inputs above this size use [`GhostscriptProfile::Large`]
    pub large_input_bytes: usize,
    /// Inputs below this size use [`GhostscriptProfile::Small`]
    pub small_input_bytes: usize,
}

impl GhostscriptConfig {
    pub fn profile_for(&self, input_len: usize) -> GhostscriptProfile {
        if input_len > self.large_input_bytes {
            GhostscriptProfile::Large
        } else if input_len < self.small_input_bytes {
            GhostscriptProfile::Small
        } else {
            GhostscriptProfile::Balanced
        }
    }
}

impl Default for GhostscriptConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("gs"),
            args: [
                "-sDEVICE=pdfwrite",
                "-dCompatibilityLevel=1.4",
                "-dNOPAUSE",
                "-dQUIET",
                "-dBATCH",
                "-dSAFER",
            ]
            .iter()
            .map(|arg| arg.to_string())
            .collect(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            large_input_bytes: 50 * MB,
            small_input_bytes: 5 * MB,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub ghostscript: GhostscriptConfig,
    /// Where uploads and tool output are staged; the system temp dir when unset
    pub temp_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            ghostscript: GhostscriptConfig::default(),
            temp_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * MB,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by the `PAGEDECK_*` variable names.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = lookup(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        self.bind_addr = parse(ENV_BIND, &bind)?;

        if let Some(program) = lookup(ENV_GS_PATH) {
            self.ghostscript.program = PathBuf::from(program);
        }
        if let Some(secs) = lookup(ENV_GS_TIMEOUT_SECS) {
            self.ghostscript.timeout = Duration::from_secs(parse(ENV_GS_TIMEOUT_SECS, &secs)?);
        }
        if let Some(dir) = lookup(ENV_TEMP_DIR) {
            self.temp_dir = Some(PathBuf::from(dir));
        }
        if let Some(mb) = lookup(ENV_MAX_UPLOAD_MB) {
            let parsed: usize = parse(ENV_MAX_UPLOAD_MB, &mb)?;
            self.max_upload_bytes = parsed.checked_mul(MB).ok_or(ConfigError::Invalid {
                key: ENV_MAX_UPLOAD_MB,
                value: mb,
            })?;
        }
        Ok(self)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
