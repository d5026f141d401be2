//! Progress reporting utilities using indicatif.
//!
//! The scan engine only talks to the [`ProgressCallback`] trait. [`Progress`]
//! is the terminal implementation: a spinner while the total is unknown and
//! a bar once it is.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress callback for the scan phases.
///
/// Implement this trait to receive progress updates during a scan.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ("walking", "hashing", "verifying")
    /// * `total` - Total number of items to process, `0` if unknown
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called once for each file after it was processed, successfully or not.
    ///
    /// # Arguments
    ///
    /// * `current` - Number of files processed so far (1-based)
    /// * `path` - Path that was processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    active: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupscan::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            active: Mutex::new(None),
            quiet,
        }
    }

    /// Check if drawing is disabled.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn with_active(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.active.lock() {
            if let Some(ref pb) = *guard {
                f(pb);
            }
        }
    }
}

fn phase_label(phase: &str) -> &str {
    match phase {
        "walking" => "Walking directory",
        "hashing" => "Hashing",
        "verifying" => "Verifying",
        other => other,
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = if total == 0 {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            let pb = self.multi.add(ProgressBar::new(total as u64));
            pb.set_style(Self::bar_style());
            pb
        };
        pb.set_message(phase_label(phase).to_string());

        if let Ok(mut active) = self.active.lock() {
            if let Some(previous) = active.replace(pb) {
                previous.finish_and_clear();
            }
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }

        let display = truncate_path(path, 30);
        self.with_active(|pb| {
            // Parallel workers may report out of order
            if current as u64 > pb.position() {
                pb.set_position(current as u64);
            }
            pb.set_message(display);
        });
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        if let Ok(mut active) = self.active.lock() {
            if let Some(pb) = active.take() {
                pb.finish_with_message(format!("{} complete", phase_label(phase)));
            }
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.with_active(|pb| pb.set_message(message.to_string()));
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len >= max_len {
        let tail: String = file_name.chars().skip(name_len + 3 - max_len).collect();
        return format!("...{}", tail);
    }

    format!(".../{}", file_name)
}
