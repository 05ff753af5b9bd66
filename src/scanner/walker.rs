//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory
//! tree and collecting the size of every regular file for duplicate
//! detection.
//!
//! # Behavior
//!
//! - Non-recursive by default: only the root's direct children are listed
//! - Symbolic links and special files are skipped, never followed
//! - A directory that cannot be listed yields one [`ScanError`] and the walk
//!   carries on with its siblings
//! - Entries are visited in file-name order
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use dedupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::new(true));
//! let (files, errors) = walker.collect();
//! println!("{} files, {} errors", files.len(), errors.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::WalkDir;

use super::{FileEntry, ScanError, WalkerConfig};
use crate::progress::ScanObserver;

/// Directory walker for file discovery.
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional observer told about each listed directory
    observer: Option<Arc<dyn ScanObserver>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("observer", &self.observer.as_ref().map(|_| "<observer>"))
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given root path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
            observer: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the observer notified when entering each directory.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Deepest level whose directories are listed.
    fn max_depth(&self) -> usize {
        if self.config.recursive {
            usize::MAX
        } else {
            1
        }
    }

    /// Walk the directory tree and yield regular files.
    ///
    /// Errors for individual entries are yielded as [`ScanError`] values
    /// rather than stopping iteration.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let max_depth = self.max_depth();

        WalkDir::new(&self.root)
            .follow_links(false)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    let file_type = entry.file_type();

                    if file_type.is_dir() {
                        // Directories at max depth are seen but never listed
                        if entry.depth() < max_depth {
                            log::trace!("Entering directory: {}", entry.path().display());
                            if let Some(ref observer) = self.observer {
                                observer.on_enter_directory(entry.path());
                            }
                        }
                        return None;
                    }

                    if file_type.is_symlink() {
                        log::trace!("Skipping symlink: {}", entry.path().display());
                        return None;
                    }

                    if !file_type.is_file() {
                        log::trace!("Skipping special file: {}", entry.path().display());
                        return None;
                    }

                    match entry.metadata() {
                        Ok(metadata) => Some(Ok(FileEntry::new(entry.into_path(), metadata.len()))),
                        Err(e) => Some(Err(self.convert_error(e))),
                    }
                }
                Err(e) => Some(Err(self.convert_error(e))),
            })
    }

    /// Walk the tree and split the results into files and errors.
    #[must_use]
    pub fn collect(&self) -> (Vec<FileEntry>, Vec<ScanError>) {
        let mut files = Vec::new();
        let mut errors = Vec::new();
        for result in self.walk() {
            match result {
                Ok(file) => files.push(file),
                Err(e) => errors.push(e),
            }
        }
        (files, errors)
    }

    /// Convert a walkdir error, keeping the offending path.
    fn convert_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        log::warn!("Error reading contents of {}: {}", path.display(), error);

        match error.into_io_error() {
            Some(io_error) => ScanError::from_io(&path, io_error),
            None => ScanError::Io {
                path,
                source: std::io::Error::other("filesystem loop detected"),
            },
        }
    }
}
