//! Scan progress reporting.
//!
//! The scanner and hasher accept an optional [`ScanObserver`]. Notifications
//! are fire-and-forget: they return nothing and cannot influence which files
//! are grouped together. [`Progress`] is the terminal implementation, backed
//! by an indicatif spinner, with an optional verbose mode that prints one
//! line per directory and per checksum.

use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use yansi::Paint;

/// Observer for scan events.
///
/// Every method has an empty default so implementors only override what
/// they display. Implementations must be cheap; hashing may call them from
/// several threads at once.
pub trait ScanObserver: Send + Sync {
    /// Called when the walker starts listing a directory.
    fn on_enter_directory(&self, _dir: &Path) {}

    /// Called once for every size bucket holding two or more files.
    fn on_potential_duplicates(&self, _size: u64, _paths: &[PathBuf]) {}

    /// Called before a file is hashed.
    fn on_hash_start(&self, _file: &Path) {}

    /// Called after a file's checksum was computed.
    fn on_hash_computed(&self, _file: &Path, _checksum: &str) {}
}

/// Terminal progress reporter.
pub struct Progress {
    bar: ProgressBar,
    verbose: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    /// * `verbose` - If true, print a line per directory and per checksum
    ///   instead of only updating the spinner.
    ///
    /// # Examples
    ///
    /// ```
    /// use dedupe::progress::Progress;
    ///
    /// let progress = Progress::new(true, false);
    /// progress.finish();
    /// ```
    #[must_use]
    pub fn new(quiet: bool, verbose: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        Self { bar, verbose }
    }

    /// Clear the spinner.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ScanObserver for Progress {
    fn on_enter_directory(&self, dir: &Path) {
        if self.verbose {
            self.bar.println(format!(
                "  > {} {}",
                "Checking contents in directory:".green(),
                dir.display().cyan()
            ));
        }
        self.bar
            .set_message(format!("Scanning {}", truncate_path(dir, 60)));
    }

    fn on_potential_duplicates(&self, size: u64, paths: &[PathBuf]) {
        log::debug!("{} files share size {} bytes", paths.len(), size);
    }

    fn on_hash_start(&self, file: &Path) {
        self.bar
            .set_message(format!("Hashing {}", truncate_path(file, 60)));
    }

    fn on_hash_computed(&self, file: &Path, checksum: &str) {
        if self.verbose {
            self.bar.println(format!(
                "  > {} {}  {}",
                "Calculated hash of file:".green(),
                file.display().cyan(),
                checksum.red().bold()
            ));
        }
    }
}

/// Shorten a path for display, keeping its tail.
fn truncate_path(path: &Path, max_len: usize) -> String {
    let s = path.to_string_lossy();
    let count = s.chars().count();
    if count <= max_len {
        return s.into_owned();
    }
    let tail: String = s.chars().skip(count - (max_len - 3)).collect();
    format!("...{tail}")
}
