//! File actions module.
//!
//! This module provides functionality for:
//! - Permanent deletion, or deletion via the system trash
//! - Replacing a duplicate with a symbolic link to the kept copy
//!
//! ```no_run
//! use dedupe::actions::{delete_file, replace_with_symlink, DeleteMode};
//! use std::path::Path;
//!
//! let _ = delete_file(Path::new("/tmp/copy.txt"), DeleteMode::Trash);
//! let _ = replace_with_symlink(Path::new("/tmp/other.txt"), Path::new("/tmp/kept.txt"));
//! ```

pub mod delete;
pub mod link;

// Re-export commonly used types
pub use delete::{
    delete_file, delete_to_trash, permanent_delete, DeleteError, DeleteMode, DeleteResult,
};
pub use link::{replace_with_symlink, LinkError, LinkResult};
