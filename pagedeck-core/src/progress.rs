//! Progress reporting for long-running operations
//!
//! Operations report coarse milestones (percent plus a short message). The
//! per-page stretch of an operation is mapped onto `10..90` so every
//! operation shares the same overall shape.

/// A single progress milestone
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Progress percentage (0.0 - 100.0)
    pub percent: f64,
    /// What the operation is doing right now
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(percent: f64, message: impl Into<String>) -> Self {
        Self {
            percent: percent.clamp(0.0, 100.0),
            message: message.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.percent >= 100.0
    }
}

/// Trait for progress callbacks
pub trait ProgressCallback {
    /// Called when progress is updated
    fn on_progress(&self, update: &ProgressUpdate);
}

/// Implementation of ProgressCallback for closures
impl<F> ProgressCallback for F
where
    F: Fn(&ProgressUpdate),
{
    fn on_progress(&self, update: &ProgressUpdate) {
        self(update)
    }
}

/// Callback that drops every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_progress(&self, _update: &ProgressUpdate) {}
}

/// Report a milestone.
pub(crate) fn report(progress: &dyn ProgressCallback, percent: f64, message: impl Into<String>) {
    progress.on_progress(&ProgressUpdate::new(percent, message));
}

/// Percentage for item `index` of `total` within the per-item stretch `10 + i/n * 80`.
pub fn item_percent(index: usize, total: usize) -> f64 {
    if total == 0 {
        return 90.0;
    }
    10.0 + (index as f64 / total as f64) * 80.0
}

/// Progress bar renderer for terminal output
pub struct ProgressBar {
    width: usize,
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self { width: 30 }
    }
}

impl ProgressBar {
    /// Create a new progress bar
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    /// Render the progress bar
    pub fn render(&self, update: &ProgressUpdate) -> String {
        let filled = ((update.percent / 100.0) * self.width as f64) as usize;
        let empty = self.width.saturating_sub(filled);

        format!(
            "[{}{}] {:>3.0}% {}",
            "=".repeat(filled),
            " ".repeat(empty),
            update.percent,
            update.message
        )
    }
}
