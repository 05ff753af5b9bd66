//! Size buckets and checksum grouping.
//!
//! # Overview
//!
//! Files with different sizes cannot have identical content, so the first
//! step groups every discovered file by its exact byte length. Only buckets
//! holding two or more files are passed on to hashing. After hashing, files
//! are regrouped by checksum and any group that ended up with a single
//! member is dropped.
//!
//! # Example
//!
//! ```
//! use dedupe::scanner::FileEntry;
//! use dedupe::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/file1.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file2.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file3.txt"), 2048),
//! ];
//!
//! let (buckets, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(buckets.len(), 1);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::scanner::FileEntry;

/// Statistics from size grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of distinct file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in buckets of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton buckets)
    pub eliminated_unique: usize,
    /// Number of zero-length files seen
    pub empty_files: usize,
    /// Number of size buckets with 2+ files
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by size.
///
/// Zero-length files are bucketed like any other size, so identical empty
/// files end up reported as duplicates.
///
/// # Returns
///
/// A tuple of:
/// - `HashMap<u64, Vec<FileEntry>>` - Files grouped by size (only buckets with 2+ files)
/// - `GroupingStats` - Statistics about the grouping operation
///
/// # Example
///
/// ```
/// use dedupe::scanner::FileEntry;
/// use dedupe::duplicates::group_by_size;
/// use std::path::PathBuf;
///
/// let files = vec![
///     FileEntry::new(PathBuf::from("/a.txt"), 100),
///     FileEntry::new(PathBuf::from("/b.txt"), 100),
///     FileEntry::new(PathBuf::from("/c.txt"), 200),
/// ];
///
/// let (buckets, stats) = group_by_size(files);
///
/// assert!(buckets.contains_key(&100));
/// assert_eq!(buckets[&100].len(), 2);
/// assert_eq!(stats.eliminated_unique, 1);
/// ```
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileEntry>,
) -> (HashMap<u64, Vec<FileEntry>>, GroupingStats) {
    let mut all_groups: HashMap<u64, Vec<FileEntry>> = HashMap::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;
        if file.size == 0 {
            stats.empty_files += 1;
        }
        all_groups.entry(file.size).or_default().push(file);
    }

    stats.unique_sizes = all_groups.len();

    let filtered_groups: HashMap<u64, Vec<FileEntry>> = all_groups
        .into_iter()
        .filter(|(size, files)| {
            if files.len() == 1 {
                stats.eliminated_unique += 1;
                log::trace!(
                    "Eliminated unique size {}: {}",
                    size,
                    files[0].path.display()
                );
                false
            } else {
                stats.potential_duplicates += files.len();
                stats.duplicate_groups += 1;
                log::debug!(
                    "Size bucket {} bytes: {} potential duplicates",
                    size,
                    files.len()
                );
                true
            }
        })
        .collect();

    log::info!(
        "Size grouping complete: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (filtered_groups, stats)
}

/// Group hashed files by checksum.
///
/// Groups with fewer than two members are dropped and the paths inside each
/// surviving group are sorted, so the result does not depend on the order
/// in which hashes completed.
///
/// # Example
///
/// ```
/// use dedupe::duplicates::group_by_checksum;
/// use std::path::PathBuf;
///
/// let hashed = vec![
///     (PathBuf::from("/b"), "aa".to_string()),
///     (PathBuf::from("/a"), "aa".to_string()),
///     (PathBuf::from("/c"), "bb".to_string()),
/// ];
///
/// let groups = group_by_checksum(hashed);
/// assert_eq!(groups.len(), 1);
/// assert_eq!(groups["aa"], vec![PathBuf::from("/a"), PathBuf::from("/b")]);
/// ```
#[must_use]
pub fn group_by_checksum(
    hashed: impl IntoIterator<Item = (PathBuf, String)>,
) -> BTreeMap<String, Vec<PathBuf>> {
    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for (path, checksum) in hashed {
        groups.entry(checksum).or_default().push(path);
    }

    groups.retain(|checksum, paths| {
        if paths.len() < 2 {
            log::trace!("Dropping singleton checksum group {}", checksum);
            return false;
        }
        paths.sort();
        paths.dedup();
        paths.len() >= 2
    });

    groups
}
