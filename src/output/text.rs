//! Human-readable terminal output.
//!
//! [`TextReporter`] prints the error list, each duplicate group as it is
//! resolved, and a closing summary. It implements
//! [`SessionObserver`](crate::resolution::SessionObserver) so the
//! resolution session drives it directly.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use yansi::Paint;

use crate::duplicates::{DupeReport, ScanSummary};
use crate::resolution::{ActionRecord, SessionObserver, SessionSummary};

/// Writes session progress as plain text.
pub struct TextReporter<W: Write> {
    out: W,
    list_files: bool,
}

impl<W: Write> TextReporter<W> {
    /// Create a reporter.
    ///
    /// With `list_files` set, each group's files are listed under its
    /// checksum. Interactive mode leaves listing to the prompt.
    pub fn new(out: W, list_files: bool) -> Self {
        Self { out, list_files }
    }

    /// Consume the reporter and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print the recoverable errors and the duplicates heading.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn print_header(&mut self, report: &DupeReport) -> io::Result<()> {
        if report.errors.is_empty() {
            writeln!(self.out, "No errors.")?;
        } else {
            writeln!(self.out, "{}", "Errors:".red().bold())?;
            for error in &report.errors {
                writeln!(self.out, "  - {error}")?;
            }
        }
        writeln!(self.out)?;

        if report.is_empty() {
            writeln!(self.out, "No duplicates.")?;
        } else {
            writeln!(self.out, "{}", "Duplicates:".bold())?;
        }
        self.out.flush()
    }

    /// Print statistics for a fresh scan.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn print_scan_summary(&mut self, summary: &ScanSummary) -> io::Result<()> {
        writeln!(
            self.out,
            "Scanned {} files ({}) in {:.2}s; {} hashed, {} duplicate groups, {} reclaimable",
            summary.total_files,
            summary.total_size_display(),
            summary.scan_duration.as_secs_f64(),
            summary.hashed_files,
            summary.duplicate_groups,
            summary.reclaimable_display().green(),
        )
    }

    /// Print the outcome of a session.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn print_session_summary(
        &mut self,
        summary: &SessionSummary,
        dry_run: bool,
    ) -> io::Result<()> {
        if summary.files_deleted == 0 && summary.files_linked == 0 && summary.failures == 0 {
            return self.out.flush();
        }
        let verb = if dry_run { "would be " } else { "" };
        writeln!(self.out)?;
        writeln!(
            self.out,
            "{} files {verb}deleted, {} files {verb}linked, {} failures",
            summary.files_deleted, summary.files_linked, summary.failures,
        )?;
        self.out.flush()
    }

    fn emit(&mut self, args: std::fmt::Arguments<'_>) {
        if let Err(e) = self.out.write_fmt(args).and_then(|()| self.out.flush()) {
            log::warn!("Failed to write output: {e}");
        }
    }
}

impl<W: Write> SessionObserver for TextReporter<W> {
    fn on_group(&mut self, items_left: usize, checksum: &str, files: &[PathBuf]) {
        self.emit(format_args!("\nItems left: {items_left}\n"));
        self.emit(format_args!("Checksum: {}\n", checksum.cyan()));
        if self.list_files {
            for file in files {
                self.emit(format_args!("  {}\n", file.display()));
            }
        }
    }

    fn on_missing(&mut self, path: &Path) {
        self.emit(format_args!(
            "  {} {}\n",
            "(missing)".yellow(),
            path.display()
        ));
    }

    fn on_alias(&mut self, path: &Path, original: &Path) {
        self.emit(format_args!(
            "  {} {} = {}\n",
            "(same file)".yellow(),
            path.display(),
            original.display()
        ));
    }

    fn on_action(&mut self, action: &ActionRecord) {
        match action {
            ActionRecord::Deleted(path) => {
                self.emit(format_args!("  {} {}\n", "(deleted)".red(), path.display()));
            }
            ActionRecord::WouldDelete(path) => {
                self.emit(format_args!("  {} {}\n", "(to delete)".yellow(), path.display()));
            }
            ActionRecord::DeleteFailed { path, error } => {
                self.emit(format_args!(
                    "  {} {}\n    {error}\n",
                    "Unable to delete file".red().bold(),
                    path.display()
                ));
            }
            ActionRecord::Linked { path, target } => {
                self.emit(format_args!(
                    "  {} {} -> {}\n",
                    "(linked)".green(),
                    path.display(),
                    target.display()
                ));
            }
            ActionRecord::WouldLink { path, target } => {
                self.emit(format_args!(
                    "  {} {} -> {}\n",
                    "(to link)".yellow(),
                    path.display(),
                    target.display()
                ));
            }
            ActionRecord::LinkFailed { path, error } => {
                self.emit(format_args!(
                    "  {} {}\n    {error}\n",
                    "Unable to link file".red().bold(),
                    path.display()
                ));
            }
        }
    }
}
