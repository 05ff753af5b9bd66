//! Command-line interface definitions for dedupe.
//!
//! # Example
//!
//! ```bash
//! # List duplicate groups under a directory tree
//! dedupe -r ~/Downloads
//!
//! # Keep one file per group, showing what would be deleted
//! dedupe -r -o -d ~/Downloads
//!
//! # Interactive session that can be resumed after Ctrl+C
//! dedupe -r -o -s progress.json ~/Downloads
//! dedupe -o -l progress.json
//!
//! # Machine-readable report
//! dedupe -r --output json ~/Downloads
//! ```

use clap::Parser;
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;
use crate::scanner::HashMode;

/// Duplicate file finder with interactive, resumable resolution.
///
/// Files are grouped by size first; only same-size files are hashed. Each
/// group of identical files can be listed, trimmed to one copy, or replaced
/// with links to the copy that is kept.
#[derive(Debug, Parser)]
#[command(name = "dedupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan for duplicates
    #[arg(
        value_name = "PATH",
        required_unless_present = "load_from",
        conflicts_with = "load_from"
    )]
    pub path: Option<PathBuf>,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Checksum algorithm used to compare file contents
    #[arg(short, long, value_enum, value_name = "ALGORITHM")]
    pub algorithm: Option<HashMode>,

    /// Ask which file to keep for each group of duplicates
    #[arg(short = 'o', long)]
    pub keep_one: bool,

    /// Show what would be deleted or linked without touching any file
    #[arg(short, long)]
    pub dry_run: bool,

    /// Save the groups left unresolved to this file
    ///
    /// Written when the session ends or is interrupted. Defaults to the
    /// --load-from file when resuming.
    #[arg(short, long, value_name = "FILE")]
    pub save_to: Option<PathBuf>,

    /// Resume from a saved report instead of scanning
    #[arg(short, long, value_name = "FILE")]
    pub load_from: Option<PathBuf>,

    /// Move deleted files to the system trash
    #[arg(long)]
    pub trash: bool,

    /// Number of I/O threads for hashing (default: 4)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Output format (text is interactive with --keep-one, json only reports)
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Read configuration from this file instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    ///
    /// Any -v also prints every directory entered and every checksum.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

impl Cli {
    /// Where unresolved groups are saved, if anywhere.
    #[must_use]
    pub fn save_target(&self) -> Option<&Path> {
        self.save_to.as_deref().or(self.load_from.as_deref())
    }
}
