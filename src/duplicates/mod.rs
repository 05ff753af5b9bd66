//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file bucketing
//! - Checksum grouping of same-size files
//! - The [`DupeReport`] handed to resolution and persistence

pub mod finder;
pub mod groups;
pub mod report;

pub use finder::{
    hash_buckets, DuplicateFinder, FinderConfig, FinderError, HashStats, ScanSummary,
    DEFAULT_IO_THREADS,
};
pub use groups::{group_by_checksum, group_by_size, GroupingStats};
pub use report::DupeReport;
