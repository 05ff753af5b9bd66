//! Output formatters for duplicate reports.
//!
//! This module provides two output formats:
//! - Text for interactive terminal use
//! - JSON for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use dedupe::duplicates::DuplicateFinder;
//! use dedupe::output::json::JsonOutput;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (report, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! // Output as JSON to stdout
//! let output = JsonOutput::new(&report, Some(&summary));
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

pub use json::JsonOutput;
pub use text::TextReporter;

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text, interactive when keeping one file per group
    #[default]
    Text,
    /// JSON output for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
