//! Signal handling and shutdown hooks.
//!
//! This module provides centralized Ctrl+C handling. A [`ShutdownHandler`]
//! carries an `AtomicBool` flag shared with worker threads plus a
//! [`ShutdownHooks`] registry of cleanup actions.
//!
//! # Behavior on interrupt
//!
//! - The shutdown flag is set to `true`
//! - If cleanup hooks are registered (or this is a repeated interrupt), every
//!   hook is run concurrently, each under its own time budget, and the
//!   process exits with code 130
//! - Otherwise the process keeps running so a scan can notice the flag and
//!   stop on its own
//!
//! # Usage
//!
//! ```rust,no_run
//! use dedupe::signal::install_handler;
//! use std::time::Duration;
//!
//! let handler = install_handler(Duration::from_secs(5)).expect("Failed to install signal handler");
//! handler.hooks().register("say goodbye", || {
//!     println!("bye");
//!     Ok(())
//! });
//!
//! // Pass handler.get_flag() to DuplicateFinder, Walker, etc.
//! ```

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Exit code for SIGINT (Ctrl+C) interruption.
/// This follows Unix convention: 128 + signal number (SIGINT = 2).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Default time budget for each shutdown hook.
pub const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline handed to time-bounded hooks.
#[derive(Debug, Clone, Copy)]
pub struct HookContext {
    deadline: Instant,
}

impl HookContext {
    /// Create a context expiring after `budget`.
    #[must_use]
    pub fn new(budget: Duration) -> Self {
        Self {
            deadline: Instant::now() + budget,
        }
    }

    /// When the hook's budget runs out.
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// True once the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

type Hook = Box<dyn FnOnce(&HookContext) -> anyhow::Result<()> + Send>;

/// How a hook ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Returned `Ok` within its budget.
    Completed,
    /// Returned an error.
    Failed(String),
    /// Still running when its budget ran out.
    TimedOut,
    /// Panicked or could not be started.
    Aborted(String),
}

/// Result of one hook run by [`ShutdownHooks::invoke_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookReport {
    /// Name given at registration.
    pub name: String,
    /// How it ended.
    pub outcome: HookOutcome,
}

/// Registry of independent cleanup actions run on termination.
///
/// Clones share the same registry. Hooks do not depend on each other: they
/// run concurrently, in no particular order, and a failing or slow hook
/// does not affect the others.
#[derive(Clone, Default)]
pub struct ShutdownHooks {
    hooks: Arc<Mutex<Vec<(String, Hook)>>>,
}

impl std::fmt::Debug for ShutdownHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownHooks")
            .field("registered", &self.len())
            .finish()
    }
}

impl ShutdownHooks {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(String, Hook)>> {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a zero-argument hook.
    pub fn register<F>(&self, name: impl Into<String>, hook: F)
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        self.register_with_context(name, move |_ctx: &HookContext| hook());
    }

    /// Register a hook that receives its deadline.
    pub fn register_with_context<F>(&self, name: impl Into<String>, hook: F)
    where
        F: FnOnce(&HookContext) -> anyhow::Result<()> + Send + 'static,
    {
        let name = name.into();
        log::debug!("Shutdown hook registered: {}", name);
        self.lock().push((name, Box::new(hook)));
    }

    /// Number of registered hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no hooks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every registered hook without running it.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Run every registered hook concurrently and wait for each to finish or
    /// exceed `timeout`.
    ///
    /// Hooks are removed from the registry, so each runs at most once. A
    /// hook that times out is abandoned on its thread.
    pub fn invoke_all(&self, timeout: Duration) -> Vec<HookReport> {
        let hooks: Vec<(String, Hook)> = std::mem::take(&mut *self.lock());
        let ctx = HookContext::new(timeout);

        let pending: Vec<_> = hooks
            .into_iter()
            .map(|(name, hook)| {
                let (tx, rx) = mpsc::channel();
                let spawned = thread::Builder::new()
                    .name(format!("shutdown-hook-{name}"))
                    .spawn(move || {
                        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| hook(&ctx))) {
                            Ok(Ok(())) => HookOutcome::Completed,
                            Ok(Err(e)) => HookOutcome::Failed(format!("{e:#}")),
                            Err(_) => HookOutcome::Aborted("hook panicked".to_string()),
                        };
                        let _ = tx.send(outcome);
                    });
                (name, spawned.map(|_| rx))
            })
            .collect();

        pending
            .into_iter()
            .map(|(name, receiver)| {
                let outcome = match receiver {
                    Ok(rx) => match rx.recv_timeout(ctx.remaining()) {
                        Ok(outcome) => outcome,
                        Err(RecvTimeoutError::Timeout) => HookOutcome::TimedOut,
                        Err(RecvTimeoutError::Disconnected) => {
                            HookOutcome::Aborted("hook thread exited".to_string())
                        }
                    },
                    Err(e) => HookOutcome::Aborted(e.to_string()),
                };
                match &outcome {
                    HookOutcome::Completed => log::info!("Shutdown hook '{}' completed", name),
                    HookOutcome::TimedOut => {
                        log::warn!("Shutdown hook '{}' exceeded {:?}", name, timeout);
                    }
                    HookOutcome::Failed(e) | HookOutcome::Aborted(e) => {
                        log::warn!("Shutdown hook '{}' failed: {}", name, e);
                    }
                }
                HookReport { name, outcome }
            })
            .collect()
    }
}

/// Centralized shutdown handler for graceful application termination.
///
/// Clones share the flag, the hook registry and the hook timeout.
#[derive(Debug, Clone)]
pub struct ShutdownHandler {
    /// The shared atomic flag indicating shutdown was requested.
    flag: Arc<AtomicBool>,
    /// Cleanup actions run on interrupt.
    hooks: ShutdownHooks,
    /// Per-hook budget in milliseconds.
    hook_timeout_ms: Arc<AtomicU64>,
}

impl ShutdownHandler {
    /// Create a new shutdown handler with the flag initially set to `false`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            hooks: ShutdownHooks::new(),
            hook_timeout_ms: Arc::new(AtomicU64::new(DEFAULT_HOOK_TIMEOUT.as_millis() as u64)),
        }
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Manually request a shutdown.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Get a clone of the shutdown flag for passing to worker threads.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use dedupe::signal::ShutdownHandler;
    /// use dedupe::duplicates::FinderConfig;
    ///
    /// let handler = ShutdownHandler::new();
    /// let config = FinderConfig::default()
    ///     .with_shutdown_flag(handler.get_flag());
    /// ```
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// The cleanup hook registry.
    #[must_use]
    pub fn hooks(&self) -> &ShutdownHooks {
        &self.hooks
    }

    /// Set the per-hook time budget.
    pub fn set_hook_timeout(&self, timeout: Duration) {
        self.hook_timeout_ms
            .store(timeout.as_millis() as u64, Ordering::SeqCst);
    }

    /// The per-hook time budget.
    #[must_use]
    pub fn hook_timeout(&self) -> Duration {
        Duration::from_millis(self.hook_timeout_ms.load(Ordering::SeqCst))
    }

    /// Reset the flag and drop all hooks.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
        self.hooks.clear();
    }

    /// React to an interrupt. Returns true when the process should exit.
    ///
    /// Sets the flag. When hooks are registered, or the flag was already
    /// set by an earlier interrupt, runs all hooks first.
    pub fn handle_signal(&self) -> bool {
        let repeated = self.flag.swap(true, Ordering::SeqCst);
        log::info!("Shutdown signal received");

        if !repeated && self.hooks.is_empty() {
            return false;
        }

        self.hooks.invoke_all(self.hook_timeout());
        true
    }
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install a Ctrl+C handler, or reuse the one already installed.
///
/// A reused handler is reset: its flag is cleared and its hooks dropped, so
/// repeated calls (for example from tests running `run_app`) start clean.
///
/// # Errors
///
/// Returns [`SignalError`] if the OS handler cannot be installed and no
/// handler exists yet.
pub fn install_handler(hook_timeout: Duration) -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        handler.set_hook_timeout(hook_timeout);
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    handler.set_hook_timeout(hook_timeout);
    let signal_handler = handler.clone();

    let installed = ctrlc::set_handler(move || {
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Cleaning up...");
        let _ = std::io::stderr().flush();

        if signal_handler.handle_signal() {
            std::process::exit(EXIT_CODE_INTERRUPTED);
        }
    });

    match installed {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
            Ok(handler)
        }
        Err(e) => match GLOBAL_HANDLER.get() {
            Some(handler) => {
                handler.reset();
                handler.set_hook_timeout(hook_timeout);
                Ok(handler.clone())
            }
            None => Err(SignalError::InstallFailed(e)),
        },
    }
}
