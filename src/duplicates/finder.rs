//! Duplicate finder.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Walk**: list regular files under the root (see [`crate::scanner::walker`])
//! 2. **Size grouping**: bucket files by exact size (see [`crate::duplicates::groups`])
//! 3. **Hashing**: checksum every member of each bucket holding 2+ files
//! 4. **Grouping**: regroup by checksum and drop singletons
//!
//! Problems with individual files or directories never abort the pipeline;
//! they are collected into [`DupeReport::errors`] and [`ScanSummary::scan_errors`].
//!
//! # Example
//!
//! ```no_run
//! use dedupe::duplicates::{DuplicateFinder, FinderConfig};
//! use dedupe::scanner::HashMode;
//! use std::path::Path;
//!
//! let config = FinderConfig::default()
//!     .with_algorithm(HashMode::Md5)
//!     .with_recursive(true);
//! let finder = DuplicateFinder::new(config);
//!
//! let (report, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//! println!("{} groups, {} reclaimable", report.group_count(), summary.reclaimable_display());
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::groups::{group_by_checksum, group_by_size};
use super::DupeReport;
use crate::progress::ScanObserver;
use crate::scanner::{FileEntry, HashError, HashMode, Hasher, ScanError, Walker, WalkerConfig};

/// Default number of hashing threads.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Checksum algorithm.
    pub algorithm: HashMode,
    /// Directory walking options.
    pub walker_config: WalkerConfig,
    /// Number of I/O threads for parallel hashing.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional observer for progress notifications.
    pub observer: Option<Arc<dyn ScanObserver>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("algorithm", &self.algorithm)
            .field("walker_config", &self.walker_config)
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("observer", &self.observer.as_ref().map(|_| "<observer>"))
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            algorithm: HashMode::default(),
            walker_config: WalkerConfig::default(),
            io_threads: DEFAULT_IO_THREADS,
            shutdown_flag: None,
            observer: None,
        }
    }
}

impl FinderConfig {
    /// Set the checksum algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashMode) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Descend into subdirectories.
    #[must_use]
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.walker_config.recursive = recursive;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the number of I/O threads (at least one).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Total number of regular files discovered
    pub total_files: usize,
    /// Total size of all discovered files in bytes
    pub total_size: u64,
    /// Number of files skipped because no other file had the same size
    pub eliminated_by_size: usize,
    /// Number of files successfully hashed
    pub hashed_files: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of redundant copies (excluding one per group)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Recoverable errors encountered during the scan
    pub scan_errors: Vec<ScanError>,
}

impl ScanSummary {
    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        format_size(self.reclaimable_space)
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        format_size(self.total_size)
    }
}

/// Format a byte size with binary units via bytesize.
fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Fatal errors of a duplicate scan.
///
/// Per-file and per-directory problems are not represented here; they end
/// up in the report instead.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The provided path could not be inspected or listed.
    #[error("Unable to read {path}: {source}")]
    Unreadable {
        /// The scan root
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Statistics from the hashing step.
#[derive(Debug, Default)]
pub struct HashStats {
    /// Files submitted for hashing
    pub input_files: usize,
    /// Files hashed successfully
    pub hashed_files: usize,
    /// Files that could not be hashed
    pub errors: Vec<HashError>,
    /// Whether hashing stopped early on shutdown
    pub interrupted: bool,
}

/// Hash every file of the given size buckets and group them by checksum.
///
/// Hashing runs on a dedicated pool of `io_threads` threads. A file that
/// fails to hash is left out of its group and its error recorded; a group
/// reduced to one member by such failures is dropped.
#[must_use]
pub fn hash_buckets(
    buckets: &HashMap<u64, Vec<FileEntry>>,
    hasher: &Hasher,
    config: &FinderConfig,
) -> (BTreeMap<String, Vec<PathBuf>>, HashStats) {
    let candidates: Vec<&Path> = buckets
        .values()
        .flat_map(|files| files.iter().map(|f| f.path.as_path()))
        .collect();
    let mut stats = HashStats {
        input_files: candidates.len(),
        ..Default::default()
    };

    if candidates.is_empty() {
        log::debug!("No files to hash");
        return (BTreeMap::new(), stats);
    }

    log::info!(
        "Hashing {} candidate files with {}",
        candidates.len(),
        hasher.mode()
    );

    let hash_one = |path: &Path| -> Option<(PathBuf, Result<String, HashError>)> {
        if config.is_shutdown_requested() {
            return None;
        }
        Some((path.to_path_buf(), hasher.hash(path)))
    };

    let results: Vec<_> = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.io_threads.max(1))
        .build()
    {
        Ok(pool) => pool.install(|| {
            candidates
                .par_iter()
                .filter_map(|&path| hash_one(path))
                .collect()
        }),
        Err(e) => {
            log::warn!("Failed to create hashing thread pool ({}), hashing sequentially", e);
            candidates.iter().filter_map(|&path| hash_one(path)).collect()
        }
    };

    if config.is_shutdown_requested() {
        stats.interrupted = true;
        log::info!("Hashing interrupted by shutdown signal");
    }

    let mut hashed = Vec::with_capacity(results.len());
    for (path, result) in results {
        match result {
            Ok(checksum) => {
                stats.hashed_files += 1;
                hashed.push((path, checksum));
            }
            Err(e) => {
                log::warn!("{}", e);
                stats.errors.push(e);
            }
        }
    }

    (group_by_checksum(hashed), stats)
}

/// Duplicate finder that runs the detection pipeline.
///
/// # Example
///
/// ```no_run
/// use dedupe::duplicates::DuplicateFinder;
/// use std::path::Path;
///
/// let finder = DuplicateFinder::with_defaults();
/// match finder.find_duplicates(Path::new(".")) {
///     Ok((report, summary)) => {
///         println!("Found {} duplicate groups", report.group_count());
///         println!("Can reclaim {} bytes", summary.reclaimable_space);
///     }
///     Err(e) => eprintln!("Scan failed: {}", e),
/// }
/// ```
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new(config.algorithm);
        if let Some(ref observer) = config.observer {
            hasher = hasher.with_observer(observer.clone());
        }
        Self { config, hasher }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files under `path`.
    ///
    /// # Returns
    ///
    /// A tuple of:
    /// - [`DupeReport`] - Duplicate groups plus recoverable error descriptions
    /// - [`ScanSummary`] - Statistics about the scan
    ///
    /// # Errors
    ///
    /// Returns [`FinderError`] if:
    /// - The path does not exist
    /// - The path is not a directory
    /// - The path cannot be inspected or its listing cannot be opened
    /// - The scan is interrupted by shutdown signal
    pub fn find_duplicates(&self, path: &Path) -> Result<(DupeReport, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        check_root(path)?;

        log::info!("Starting duplicate scan of {}", path.display());

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let mut walker = Walker::new(path, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }
        if let Some(ref observer) = self.config.observer {
            walker = walker.with_observer(observer.clone());
        }

        let (files, walk_errors) = walker.collect();
        let mut errors: Vec<String> = walk_errors.iter().map(ToString::to_string).collect();
        summary.scan_errors = walk_errors;

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let (buckets, size_stats) = group_by_size(files);
        summary.total_files = size_stats.total_files;
        summary.total_size = size_stats.total_size;
        summary.eliminated_by_size = size_stats.eliminated_unique;

        if let Some(ref observer) = self.config.observer {
            let mut sizes: Vec<u64> = buckets.keys().copied().collect();
            sizes.sort_unstable();
            for size in sizes {
                let paths: Vec<PathBuf> = buckets[&size].iter().map(|f| f.path.clone()).collect();
                observer.on_potential_duplicates(size, &paths);
            }
        }

        let (dupes, hash_stats) = hash_buckets(&buckets, &self.hasher, &self.config);
        if hash_stats.interrupted {
            return Err(FinderError::Interrupted);
        }

        summary.hashed_files = hash_stats.hashed_files;
        errors.extend(hash_stats.errors.iter().map(ToString::to_string));
        summary
            .scan_errors
            .extend(hash_stats.errors.into_iter().map(ScanError::from));

        let sizes: HashMap<&Path, u64> = buckets
            .values()
            .flatten()
            .map(|f| (f.path.as_path(), f.size))
            .collect();
        for paths in dupes.values() {
            let size = paths
                .first()
                .and_then(|p| sizes.get(p.as_path()))
                .copied()
                .unwrap_or(0);
            let copies = paths.len().saturating_sub(1);
            summary.duplicate_files += copies;
            summary.reclaimable_space += size * copies as u64;
        }
        summary.duplicate_groups = dupes.len();
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} groups, {} duplicates, {} reclaimable ({} errors) in {:.2?}",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display(),
            errors.len(),
            summary.scan_duration
        );

        Ok((DupeReport::new(dupes, errors), summary))
    }
}

/// Validate the scan root: it must exist, be a directory, and be listable.
fn check_root(path: &Path) -> Result<(), FinderError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => FinderError::PathNotFound(path.to_path_buf()),
        _ => FinderError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    if !metadata.is_dir() {
        return Err(FinderError::NotADirectory(path.to_path_buf()));
    }

    fs::read_dir(path).map_err(|e| FinderError::Unreadable {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[derive(Default)]
    struct Recorder {
        buckets: Mutex<Vec<(u64, usize)>>,
        hashed: Mutex<Vec<PathBuf>>,
    }

    impl ScanObserver for Recorder {
        fn on_potential_duplicates(&self, size: u64, paths: &[PathBuf]) {
            self.buckets.lock().unwrap().push((size, paths.len()));
        }

        fn on_hash_computed(&self, file: &Path, _checksum: &str) {
            self.hashed.lock().unwrap().push(file.to_path_buf());
        }
    }

    #[test]
    fn test_finder_config_builders() {
        let flag = Arc::new(AtomicBool::new(false));
        let config = FinderConfig::default()
            .with_algorithm(HashMode::Md5)
            .with_recursive(true)
            .with_io_threads(0)
            .with_shutdown_flag(flag);

        assert_eq!(config.algorithm, HashMode::Md5);
        assert!(config.walker_config.recursive);
        assert_eq!(config.io_threads, 1);
        assert!(config.shutdown_flag.is_some());
        assert!(format!("{config:?}").contains("FinderConfig"));
    }

    #[test]
    fn test_same_size_different_content_separates() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.txt", b"X");
        let b = write(dir.path(), "b.txt", b"X");
        write(dir.path(), "c.txt", b"Y");

        let (report, summary) = DuplicateFinder::with_defaults()
            .find_duplicates(dir.path())
            .unwrap();

        assert_eq!(report.group_count(), 1);
        let group = report.dupes.values().next().unwrap();
        assert_eq!(group, &vec![a, b]);
        assert_eq!(summary.hashed_files, 3);
        assert_eq!(summary.duplicate_files, 1);
        assert_eq!(summary.reclaimable_space, 1);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_unique_size_is_never_hashed() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", b"same");
        write(dir.path(), "b.txt", b"same");
        let lonely = write(dir.path(), "lonely.txt", b"a different length");
        let recorder = Arc::new(Recorder::default());

        let finder = DuplicateFinder::new(FinderConfig::default().with_observer(recorder.clone()));
        let (report, summary) = finder.find_duplicates(dir.path()).unwrap();

        assert_eq!(report.group_count(), 1);
        assert_eq!(summary.eliminated_by_size, 1);
        assert!(!recorder.hashed.lock().unwrap().contains(&lonely));
        assert_eq!(*recorder.buckets.lock().unwrap(), vec![(4, 2)]);
    }

    #[test]
    fn test_empty_files_are_duplicates() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "e1", b"");
        write(dir.path(), "e2", b"");

        let (report, summary) = DuplicateFinder::with_defaults()
            .find_duplicates(dir.path())
            .unwrap();

        assert_eq!(report.group_count(), 1);
        assert!(report
            .dupes
            .contains_key("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"));
        assert_eq!(summary.reclaimable_space, 0);
    }

    #[test]
    fn test_non_recursive_ignores_subdirectories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "root.txt", b"content");
        write(dir.path(), "sub/copy.txt", b"content");

        let finder = DuplicateFinder::with_defaults();
        let (report, _) = finder.find_duplicates(dir.path()).unwrap();
        assert!(report.is_empty());

        let finder = DuplicateFinder::new(FinderConfig::default().with_recursive(true));
        let (report, _) = finder.find_duplicates(dir.path()).unwrap();
        assert_eq!(report.group_count(), 1);
    }

    #[test]
    fn test_md5_keys() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a", b"abc");
        write(dir.path(), "b", b"abc");

        let finder = DuplicateFinder::new(FinderConfig::default().with_algorithm(HashMode::Md5));
        let (report, _) = finder.find_duplicates(dir.path()).unwrap();

        assert!(report
            .dupes
            .contains_key("900150983cd24fb0d6963f7d28e17f72"));
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = DuplicateFinder::with_defaults().find_duplicates(&dir.path().join("nope"));
        assert!(matches!(result, Err(FinderError::PathNotFound(_))));
    }

    #[test]
    fn test_file_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "file.txt", b"x");
        let result = DuplicateFinder::with_defaults().find_duplicates(&file);
        assert!(matches!(result, Err(FinderError::NotADirectory(_))));
    }

    #[test]
    fn test_shutdown_before_scan() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a", b"1");
        let flag = Arc::new(AtomicBool::new(true));

        let finder = DuplicateFinder::new(FinderConfig::default().with_shutdown_flag(flag));
        assert!(matches!(
            finder.find_duplicates(dir.path()),
            Err(FinderError::Interrupted)
        ));
    }

    #[test]
    fn test_hash_buckets_skips_failed_files() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a", b"zz");
        let b = write(dir.path(), "b", b"zz");
        let missing = dir.path().join("gone");

        let mut buckets = HashMap::new();
        buckets.insert(
            2,
            vec![
                FileEntry::new(a, 2),
                FileEntry::new(b, 2),
                FileEntry::new(missing.clone(), 2),
            ],
        );

        let (groups, stats) =
            hash_buckets(&buckets, &Hasher::default(), &FinderConfig::default());

        assert_eq!(groups.len(), 1);
        assert_eq!(stats.input_files, 3);
        assert_eq!(stats.hashed_files, 2);
        assert_eq!(stats.errors.len(), 1);
        assert_eq!(stats.errors[0].path(), missing.as_path());
    }

    #[test]
    fn test_hash_buckets_drops_group_reduced_to_one() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a", b"zz");

        let mut buckets = HashMap::new();
        buckets.insert(
            2,
            vec![FileEntry::new(a, 2), FileEntry::new(dir.path().join("gone"), 2)],
        );

        let (groups, stats) =
            hash_buckets(&buckets, &Hasher::default(), &FinderConfig::default());
        assert!(groups.is_empty());
        assert_eq!(stats.errors.len(), 1);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert!(format_size(2048).contains('K'));
        assert!(format_size(3 * 1024 * 1024).contains('M'));
    }
}
