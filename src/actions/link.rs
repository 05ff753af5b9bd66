//! Replace duplicate files with symbolic links.
//!
//! A link is first created under a temporary sibling name and then renamed
//! over the duplicate. If anything fails the duplicate is left untouched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::scanner::same_file;

/// Error type for link replacement.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The file to replace does not exist.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// The file to replace is the link target itself, possibly under
    /// another path.
    #[error("refusing to link {0} to itself")]
    SameFile(PathBuf),

    /// An absolute path could not be determined.
    #[error("unable to resolve {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The temporary link could not be created.
    #[error("unable to create link for {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The temporary link could not be moved over the file.
    #[error("unable to replace {path} with a link: {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LinkError {
    /// The file that was meant to be replaced.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::SameFile(p)
            | Self::Resolve { path: p, .. }
            | Self::Create { path: p, .. }
            | Self::Replace { path: p, .. } => p,
        }
    }
}

/// A completed link replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkResult {
    /// Absolute path of the replaced file, now a link.
    pub path: PathBuf,
    /// Absolute path the link points to.
    pub target: PathBuf,
}

fn absolute(path: &Path) -> Result<PathBuf, LinkError> {
    std::path::absolute(path).map_err(|e| LinkError::Resolve {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Sibling path used while the link is being created.
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.dedupe-link-{}", std::process::id()))
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// Replace `path` with a symbolic link to the absolute path of `target`.
///
/// # Errors
///
/// Returns [`LinkError`] if `path` is missing, is `target` itself, or the
/// link cannot be created or moved into place. `path` is unchanged on error.
pub fn replace_with_symlink(path: &Path, target: &Path) -> Result<LinkResult, LinkError> {
    let target = absolute(target)?;
    let path = absolute(path)?;

    fs::symlink_metadata(&path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LinkError::NotFound(path.clone()),
        _ => LinkError::Resolve {
            path: path.clone(),
            source: e,
        },
    })?;

    // Aliases such as `sub/../a` or a bind mount reach the target itself
    if path == target || same_file(&path, &target) {
        return Err(LinkError::SameFile(path));
    }

    let temp = temp_sibling(&path);
    // Leftover from an earlier failed attempt
    let _ = fs::remove_file(&temp);

    create_symlink(&target, &temp).map_err(|e| LinkError::Create {
        path: path.clone(),
        source: e,
    })?;

    if let Err(e) = fs::rename(&temp, &path) {
        let _ = fs::remove_file(&temp);
        return Err(LinkError::Replace { path, source: e });
    }

    log::info!("Linked {} -> {}", path.display(), target.display());
    Ok(LinkResult { path, target })
}
