//! Running the external PDF compressor

use crate::config::{GhostscriptConfig, GhostscriptProfile};
use crate::error::CompressError;
use std::path::Path;
use std::process::Stdio;
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::{Builder, NamedTempFile};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Staged file whose name starts with `<stem>_<nanos>_`; removed on drop.
fn staged_file(dir: &Path, stem: &str) -> Result<NamedTempFile, CompressError> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    std::fs::create_dir_all(dir)?;
    Ok(Builder::new()
        .prefix(&format!("{stem}_{nanos}_"))
        .suffix(".pdf")
        .tempfile_in(dir)?)
}

fn to_mb(bytes: usize) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// What a compression request produced.
#[derive(Debug)]
pub struct Compressed {
    pub bytes: Vec<u8>,
    /// The profile whose output was kept; `None` when the input came back unchanged
    pub profile: Option<GhostscriptProfile>,
}

/// Compress `input`, choosing the profile by input size.
///
/// When the first pass does not shrink the document it is retried with
/// [`GhostscriptProfile::Preserve`]. When that fails too, or does not
/// shrink it either, the input is returned unchanged. A failing first pass
/// is an error.
pub async fn compress(
    config: &GhostscriptConfig,
    temp_dir: &Path,
    input: &[u8],
) -> Result<Compressed, CompressError> {
    let profile = config.profile_for(input.len());
    let first = run(config, profile, temp_dir, input).await?;
    if first.len() < input.len() {
        log_reduction(profile, input.len(), first.len());
        return Ok(Compressed {
            bytes: first,
            profile: Some(profile),
        });
    }

    warn!(
        "{:?} profile did not shrink the document ({} -> {} bytes), retrying",
        profile,
        input.len(),
        first.len()
    );
    let retry = GhostscriptProfile::Preserve;
    match run(config, retry, temp_dir, input).await {
        Ok(bytes) if bytes.len() < input.len() => {
            log_reduction(retry, input.len(), bytes.len());
            Ok(Compressed {
                bytes,
                profile: Some(retry),
            })
        }
        Ok(bytes) => {
            warn!("Retry did not shrink the document either ({} bytes), keeping the input", bytes.len());
            Ok(Compressed {
                bytes: input.to_vec(),
                profile: None,
            })
        }
        Err(e) => {
            warn!("Retry failed, keeping the input: {}", e);
            Ok(Compressed {
                bytes: input.to_vec(),
                profile: None,
            })
        }
    }
}

fn log_reduction(profile: GhostscriptProfile, before: usize, after: usize) {
    let reduction = if before == 0 {
        0.0
    } else {
        (1.0 - after as f64 / before as f64) * 100.0
    };
    info!(
        "Compressed {:.2} MB -> {:.2} MB ({:.1}% reduction, {:?} profile)",
        to_mb(before),
        to_mb(after),
        reduction,
        profile
    );
}

/// One run of the tool. Both staged files are removed when this returns,
/// whatever the outcome. The child is killed if it outlives the timeout.
async fn run(
    config: &GhostscriptConfig,
    profile: GhostscriptProfile,
    temp_dir: &Path,
    input: &[u8],
) -> Result<Vec<u8>, CompressError> {
    let input_file = staged_file(temp_dir, "input")?;
    let output_file = staged_file(temp_dir, "compressed")?;
    tokio::fs::write(input_file.path(), input).await?;
    debug!(
        "Staged upload at {} ({:.2} MB, {:?} profile)",
        input_file.path().display(),
        to_mb(input.len()),
        profile
    );

    let mut command = Command::new(&config.program);
    command
        .args(&config.args)
        .args(profile.args())
        .arg(format!("-sOutputFile={}", output_file.path().display()))
        .arg(input_file.path())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let program = config.program.display().to_string();
    let output = match tokio::time::timeout(config.timeout, command.output()).await {
        Ok(result) => result.map_err(|source| CompressError::Spawn {
            program: program.clone(),
            source,
        })?,
        Err(_) => {
            warn!("{} timed out after {:?}", program, config.timeout);
            return Err(CompressError::Timeout(config.timeout.as_secs()));
        }
    };

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !output.status.success() {
        return Err(CompressError::Failed {
            status: output.status.to_string(),
            stderr,
        });
    }
    if !stderr.is_empty() {
        debug!("{} stderr: {}", program, stderr);
    }

    let compressed = tokio::fs::read(output_file.path()).await?;
    if compressed.is_empty() {
        return Err(CompressError::EmptyOutput);
    }
    Ok(compressed)
}
