//! Saving and loading reports.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::duplicates::DupeReport;

/// Errors reading or writing a saved report.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The file could not be read.
    #[error("Failed to read report file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not a valid report.
    #[error("Failed to parse report file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The report could not be encoded.
    #[error("Failed to serialize report for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The file could not be written.
    #[error("Failed to write report file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Distinguishes concurrent saves within one process.
static SAVE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Sibling path used while a save is in progress. Unique per call, so a
/// shutdown hook and the main thread never share one.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report.json".to_string());
    let seq = SAVE_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{name}.tmp-{}-{seq}", std::process::id()))
}

impl DupeReport {
    /// Serialize the report as JSON.
    ///
    /// # Errors
    ///
    /// Fails only for paths that are not valid UTF-8.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save the report to `path`.
    ///
    /// The JSON is written to a sibling temporary file which is then renamed
    /// over `path`, so an interrupted save leaves any previous file intact.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Serialize`] or [`SessionError::Write`].
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let json = self.to_json().map_err(|e| SessionError::Serialize {
            path: path.to_path_buf(),
            source: e,
        })?;

        let temp = temp_path(path);
        let write_err = |e: io::Error| SessionError::Write {
            path: path.to_path_buf(),
            source: e,
        };

        let result = (|| {
            let mut file = File::create(&temp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&temp, path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&temp);
            return Err(write_err(e));
        }

        log::info!(
            "Saved {} remaining groups to {}",
            self.group_count(),
            path.display()
        );
        Ok(())
    }

    /// Load a report saved by [`DupeReport::save`].
    ///
    /// The file is only read, never modified. Listed paths that no longer
    /// exist are reported with a warning and kept; resolution prunes them.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Read`] or [`SessionError::Parse`].
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let content = fs::read_to_string(path).map_err(|e| SessionError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let report: Self = serde_json::from_str(&content).map_err(|e| SessionError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        for file in report.dupes.values().flatten() {
            if fs::symlink_metadata(file).is_err() {
                log::warn!(
                    "File referenced in report no longer exists: {}",
                    file.display()
                );
            }
        }

        log::info!(
            "Loaded {} groups and {} errors from {}",
            report.group_count(),
            report.errors.len(),
            path.display()
        );
        Ok(report)
    }
}
