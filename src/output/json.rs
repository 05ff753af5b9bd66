//! JSON output formatter for duplicate reports.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     { "checksum": "abc123...", "files": ["/path/a.txt", "/path/b.txt"] }
//!   ],
//!   "errors": ["Permission denied: /path/secret"],
//!   "summary": {
//!     "total_files": 100,
//!     "total_size": 1048576,
//!     "duplicate_groups": 5,
//!     "duplicate_files": 10,
//!     "reclaimable_space": 51200,
//!     "scan_duration_ms": 1234,
//!     "exit_code": 0,
//!     "exit_code_name": "DD000"
//!   }
//! }
//! ```
//!
//! `summary` is `null` for a report loaded from disk.

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::duplicates::{DupeReport, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// Hex checksum shared by every file
    pub checksum: String,
    /// Paths of the duplicate files
    pub files: Vec<String>,
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Total number of files scanned
    pub total_files: usize,
    /// Total size of all scanned files in bytes
    pub total_size: u64,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding one per group)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates (bytes)
    pub reclaimable_space: u64,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DD000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Duplicate groups, ordered by checksum
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Recoverable errors
    pub errors: Vec<String>,
    /// Scan statistics, absent for loaded reports
    pub summary: Option<JsonSummary>,
}

impl JsonOutput {
    /// Create JSON output from a report and, for fresh scans, its summary.
    ///
    /// # Example
    ///
    /// ```
    /// use dedupe::duplicates::DupeReport;
    /// use dedupe::output::json::JsonOutput;
    /// use std::path::PathBuf;
    ///
    /// let mut report = DupeReport::default();
    /// report.dupes.insert("h".into(), vec![PathBuf::from("/a"), PathBuf::from("/b")]);
    ///
    /// let output = JsonOutput::new(&report, None);
    /// assert_eq!(output.duplicates.len(), 1);
    /// assert!(output.to_json().unwrap().starts_with('{'));
    /// ```
    #[must_use]
    pub fn new(report: &DupeReport, summary: Option<&ScanSummary>) -> Self {
        Self {
            duplicates: report
                .dupes
                .iter()
                .map(|(checksum, files)| JsonDuplicateGroup {
                    checksum: checksum.clone(),
                    files: files.iter().map(|p| path_string(p)).collect(),
                })
                .collect(),
            errors: report.errors.clone(),
            summary: summary.map(|s| JsonSummary::from_scan_summary(s, ExitCode::Success)),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
