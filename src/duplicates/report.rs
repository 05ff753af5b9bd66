//! The duplicate report.
//!
//! A [`DupeReport`] is what a scan produces and what a resolution session
//! consumes. It is also the unit that gets saved to disk and reloaded to
//! resume a session later, so its serialized form is kept to exactly two
//! fields: `dupes` and `errors`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Duplicate groups keyed by checksum, plus the recoverable errors collected
/// while producing them.
///
/// Every group holds at least two paths when produced by a scan. A report
/// loaded from disk is taken as-is; stale entries are pruned when the group
/// is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DupeReport {
    /// Checksum → paths with that content
    #[serde(default)]
    pub dupes: BTreeMap<String, Vec<PathBuf>>,
    /// Human-readable descriptions of recoverable errors
    #[serde(default)]
    pub errors: Vec<String>,
}

impl DupeReport {
    /// Create a report from groups and errors.
    #[must_use]
    pub fn new(dupes: BTreeMap<String, Vec<PathBuf>>, errors: Vec<String>) -> Self {
        Self { dupes, errors }
    }

    /// True when no duplicate groups remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dupes.is_empty()
    }

    /// Number of duplicate groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.dupes.len()
    }

    /// Number of redundant copies across all groups (each group minus one).
    #[must_use]
    pub fn duplicate_file_count(&self) -> usize {
        self.dupes
            .values()
            .map(|paths| paths.len().saturating_sub(1))
            .sum()
    }

    /// Remove a group, returning its paths if it was present.
    pub fn remove(&mut self, checksum: &str) -> Option<Vec<PathBuf>> {
        self.dupes.remove(checksum)
    }

    /// Record a recoverable error.
    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Compare two reports ignoring path order inside groups.
    ///
    /// # Example
    ///
    /// ```
    /// use dedupe::duplicates::DupeReport;
    /// use std::path::PathBuf;
    ///
    /// let mut a = DupeReport::default();
    /// a.dupes.insert("h".into(), vec![PathBuf::from("/x"), PathBuf::from("/y")]);
    /// let mut b = DupeReport::default();
    /// b.dupes.insert("h".into(), vec![PathBuf::from("/y"), PathBuf::from("/x")]);
    ///
    /// assert!(a.same_membership(&b));
    /// ```
    #[must_use]
    pub fn same_membership(&self, other: &Self) -> bool {
        fn members(report: &DupeReport) -> BTreeMap<&str, BTreeSet<&PathBuf>> {
            report
                .dupes
                .iter()
                .map(|(checksum, paths)| (checksum.as_str(), paths.iter().collect()))
                .collect()
        }

        self.errors == other.errors && members(self) == members(other)
    }
}
