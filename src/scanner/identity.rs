//! File identity independent of the path used to reach a file.
//!
//! Two paths name the same file when they resolve to the same directory
//! entry target: `a`, `./a` and `sub/../a`, or the same file seen through
//! a bind mount. Such aliases are not duplicates of each other.
//!
//! # Platform Support
//!
//! - **Unix**: (device_id, inode) of the entry itself, without following a
//!   final symlink
//! - **Other**: the canonical path

use std::fs;
use std::io;
use std::path::Path;
#[cfg(not(unix))]
use std::path::PathBuf;

/// Identity key of a file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId {
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
    #[cfg(not(unix))]
    canonical: PathBuf,
}

impl FileId {
    /// Identity of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if `path` cannot be inspected.
    #[cfg(unix)]
    pub fn of(path: &Path) -> io::Result<Self> {
        use std::os::unix::fs::MetadataExt;
        let metadata = fs::symlink_metadata(path)?;
        Ok(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    /// Identity of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if `path` cannot be inspected.
    #[cfg(not(unix))]
    pub fn of(path: &Path) -> io::Result<Self> {
        Ok(Self {
            canonical: fs::canonicalize(path)?,
        })
    }
}

/// True when both paths reach the same file. False if either cannot be
/// inspected.
#[must_use]
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (FileId::of(a), FileId::of(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
