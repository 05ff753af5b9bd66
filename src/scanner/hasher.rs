//! Streaming file hasher.
//!
//! # Overview
//! This module provides the [`Hasher`] struct for computing hex-encoded
//! checksums of file contents. Content is streamed through a fixed-size
//! buffer, so memory use does not depend on file size.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::HashError;
use crate::progress::ScanObserver;

/// Read buffer size for streaming hashes (64KB).
pub const BUFFER_SIZE: usize = 64 * 1024;

/// Checksum algorithm used to compare file contents.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashMode {
    /// MD5 (fast, 128-bit)
    Md5,
    /// SHA-256 (default)
    #[default]
    Sha256,
}

impl HashMode {
    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
        }
    }

    /// Length of a hex digest produced by this mode.
    #[must_use]
    pub fn hex_len(self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha256 => 64,
        }
    }
}

impl fmt::Display for HashMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            other => Err(format!("Unknown hash algorithm: '{other}'")),
        }
    }
}

/// File hasher for a single [`HashMode`].
///
/// Cheap to share across threads; an optional observer is told before and
/// after each file is hashed.
#[derive(Clone, Default)]
pub struct Hasher {
    mode: HashMode,
    observer: Option<Arc<dyn ScanObserver>>,
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hasher")
            .field("mode", &self.mode)
            .field("observer", &self.observer.as_ref().map(|_| "<observer>"))
            .finish()
    }
}

impl Hasher {
    /// Create a hasher for the given mode.
    #[must_use]
    pub fn new(mode: HashMode) -> Self {
        Self {
            mode,
            observer: None,
        }
    }

    /// Attach an observer notified around each hash.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The configured algorithm.
    #[must_use]
    pub fn mode(&self) -> HashMode {
        self.mode
    }

    /// Compute the hex-encoded checksum of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] tagged with `path` if the file cannot be opened
    /// or read.
    pub fn hash(&self, path: &Path) -> Result<String, HashError> {
        if let Some(ref observer) = self.observer {
            observer.on_hash_start(path);
        }

        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let checksum = self
            .hash_reader(file)
            .map_err(|e| HashError::from_io(path, e))?;

        log::trace!("{} {}: {}", self.mode, path.display(), checksum);

        if let Some(ref observer) = self.observer {
            observer.on_hash_computed(path, &checksum);
        }
        Ok(checksum)
    }

    /// Compute the hex-encoded checksum of everything `reader` yields.
    ///
    /// # Errors
    ///
    /// Propagates read errors other than `Interrupted`.
    pub fn hash_reader<R: Read>(&self, reader: R) -> io::Result<String> {
        match self.mode {
            HashMode::Md5 => digest_reader::<Md5, R>(reader),
            HashMode::Sha256 => digest_reader::<Sha256, R>(reader),
        }
    }
}

fn digest_reader<D, R>(mut reader: R) -> io::Result<String>
where
    D: Digest,
    R: Read,
    sha2::digest::Output<D>: fmt::LowerHex,
{
    let mut digest = D::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => digest.update(&buffer[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(format!("{:x}", digest.finalize()))
}
