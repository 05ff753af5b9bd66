//! dedupe - duplicate file finder
//!
//! Finds files with identical content under a directory by grouping on size
//! and hashing only same-size candidates, then resolves each group of
//! duplicates interactively: keep every copy, delete all of them, keep one,
//! or keep one and replace the others with links to it. Unresolved groups
//! can be saved and the session resumed later without rescanning.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod resolution;
pub mod scanner;
pub mod session;
pub mod signal;

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::{DupeReport, DuplicateFinder, FinderConfig, ScanSummary};
use crate::error::ExitCode;
use crate::output::{JsonOutput, OutputFormat, TextReporter};
use crate::progress::Progress;
use crate::resolution::{
    ConsoleDecider, DecisionError, DecisionProvider, ResolutionSession, ResolutionState,
    SessionObserver, SessionOptions, SessionSummary,
};
use crate::signal::{ShutdownHandler, ShutdownHooks};

/// How a resolution run ended.
#[derive(Debug)]
pub struct RunOutcome {
    /// Session totals, or `None` when input ended before every group was decided.
    pub summary: Option<SessionSummary>,
    /// Groups left unresolved.
    pub remaining: DupeReport,
}

/// Run the application with parsed arguments.
///
/// # Errors
///
/// Returns an error for fatal failures: bad configuration, an invalid scan
/// root, an unreadable report, an interrupted scan or a failed save.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    if cli.no_color {
        yansi::disable();
    }
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_cli(&cli);
    log::debug!("Effective configuration: {:?}", config);

    let handler =
        signal::install_handler(config.hook_timeout()).context("Failed to set up Ctrl+C")?;

    let chatty = !cli.quiet && cli.output == OutputFormat::Text;

    let (report, summary) = if let Some(load_from) = &cli.load_from {
        if chatty {
            println!("Loading report from {}", load_from.display());
        }
        let report = DupeReport::load(load_from).context("Unable to load report")?;
        (report, None)
    } else if let Some(path) = &cli.path {
        let progress = Arc::new(Progress::new(
            cli.quiet || cli.output == OutputFormat::Json,
            cli.verbose > 0,
        ));
        let (report, summary) = scan(path, &config, &handler, Arc::clone(&progress))?;
        (report, Some(summary))
    } else {
        anyhow::bail!("Either a directory or --load-from is required");
    };

    if cli.output == OutputFormat::Json {
        JsonOutput::new(&report, summary.as_ref()).write_to(io::stdout().lock())?;
        if let Some(target) = cli.save_target() {
            report.save(target).context("Unable to save report")?;
        }
        return Ok(ExitCode::Success);
    }

    let mut reporter = TextReporter::new(io::stdout(), !config.keep_one);
    if let (Some(summary), true) = (&summary, chatty) {
        reporter.print_scan_summary(summary)?;
    }
    reporter.print_header(&report)?;

    let options = config.session_options();
    let mut decider = ConsoleDecider::stdio();
    let outcome = run_resolution(
        report,
        options,
        cli.save_target(),
        handler.hooks(),
        &mut decider,
        &mut reporter,
    )?;

    match &outcome.summary {
        Some(summary) => reporter.print_session_summary(summary, options.dry_run)?,
        None => log::warn!(
            "Input closed with {} groups unresolved",
            outcome.remaining.group_count()
        ),
    }

    Ok(ExitCode::Success)
}

/// Scan `path` for duplicates with the configured options.
fn scan(
    path: &Path,
    config: &Config,
    handler: &ShutdownHandler,
    progress: Arc<Progress>,
) -> Result<(DupeReport, ScanSummary)> {
    let finder_config = FinderConfig::default()
        .with_algorithm(config.algorithm)
        .with_recursive(config.recursive)
        .with_io_threads(config.io_threads)
        .with_shutdown_flag(handler.get_flag())
        .with_observer(progress.clone());

    let result = DuplicateFinder::new(finder_config).find_duplicates(path);
    progress.finish();

    result.with_context(|| format!("Unable to find duplicates in {}", path.display()))
}

/// Resolve every group of `report`, saving what is left to `save_target`.
///
/// While the session runs, a shutdown hook is registered on `hooks`: on
/// interrupt it saves the groups not yet resolved, or reports how many are
/// left when there is no save target. The hooks are cleared when the
/// session ends, and the remaining groups (possibly none) are saved.
/// Input ending early is not an error; the unresolved groups are saved.
///
/// # Errors
///
/// Returns an error if the decision provider fails for a reason other than
/// closed input, or if the final save fails.
pub fn run_resolution<D: DecisionProvider + ?Sized>(
    report: DupeReport,
    options: SessionOptions,
    save_target: Option<&Path>,
    hooks: &ShutdownHooks,
    decider: &mut D,
    observer: &mut dyn SessionObserver,
) -> Result<RunOutcome> {
    let state = ResolutionState::new(report);
    register_save_hook(hooks, &state, save_target);

    let session = ResolutionSession::new(state.clone(), options);
    let result = session.run(decider, observer);
    hooks.clear();

    let remaining = state.snapshot();
    if let Some(target) = save_target {
        println!("Saving report to {}", target.display());
        remaining
            .save(target)
            .with_context(|| format!("Unable to save report to {}", target.display()))?;
    }

    let summary = match result {
        Ok(summary) => Some(summary),
        Err(DecisionError::InputClosed) => None,
        Err(e) => return Err(e).context("Resolution stopped"),
    };

    Ok(RunOutcome { summary, remaining })
}

fn register_save_hook(hooks: &ShutdownHooks, state: &ResolutionState, target: Option<&Path>) {
    let state = state.clone();
    match target {
        Some(target) => {
            let target = target.to_path_buf();
            hooks.register("save report", move || {
                eprintln!("Saving report to {}", target.display());
                state.snapshot().save(&target)?;
                Ok(())
            });
        }
        None => {
            hooks.register("report remaining groups", move || {
                eprintln!("{} groups left unresolved", state.len());
                Ok(())
            });
        }
    }
}
