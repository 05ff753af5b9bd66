use dedupe::duplicates::{DupeReport, DuplicateFinder};
use dedupe::resolution::{Choice, DecisionError, DecisionProvider, SessionOptions};
use dedupe::run_resolution;
use dedupe::signal::{HookOutcome, HookReport, ShutdownHandler, ShutdownHooks};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

/// Keeps every group until `interrupt_at`, then fires the hooks the way a
/// Ctrl+C would and stops.
struct InterruptingDecider {
    hooks: ShutdownHooks,
    interrupt_at: usize,
    calls: usize,
    reports: Vec<HookReport>,
}

impl DecisionProvider for InterruptingDecider {
    fn decide(&mut self, _checksum: &str, _files: &[PathBuf]) -> Result<Choice, DecisionError> {
        self.calls += 1;
        if self.calls == self.interrupt_at {
            self.reports = self.hooks.invoke_all(Duration::from_secs(5));
            return Err(DecisionError::InputClosed);
        }
        Ok(Choice::KeepAll)
    }
}

fn groups(dir: &Path, count: usize) -> DupeReport {
    for i in 0..count {
        let content = "q".repeat(i + 1);
        fs::write(dir.join(format!("{i}_a")), &content).unwrap();
        fs::write(dir.join(format!("{i}_b")), &content).unwrap();
    }
    DuplicateFinder::with_defaults().find_duplicates(dir).unwrap().0
}

#[test]
fn test_interrupt_saves_unresolved_groups() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    let report = groups(&data, 4);
    let saved = dir.path().join("saved.json");

    let hooks = ShutdownHooks::new();
    let mut decider = InterruptingDecider {
        hooks: hooks.clone(),
        interrupt_at: 3,
        calls: 0,
        reports: Vec::new(),
    };
    let options = SessionOptions {
        keep_one: true,
        ..SessionOptions::default()
    };

    run_resolution(report, options, Some(&saved), &hooks, &mut decider, &mut ()).unwrap();

    assert_eq!(decider.reports.len(), 1);
    assert_eq!(decider.reports[0].name, "save report");
    assert_eq!(decider.reports[0].outcome, HookOutcome::Completed);
    assert_eq!(DupeReport::load(&saved).unwrap().group_count(), 2);
}

#[test]
fn test_session_without_target_registers_a_reporting_hook() {
    let hooks = ShutdownHooks::new();
    let mut decider = InterruptingDecider {
        hooks: hooks.clone(),
        interrupt_at: 1,
        calls: 0,
        reports: Vec::new(),
    };
    let mut dupes = std::collections::BTreeMap::new();
    dupes.insert(
        "h".to_string(),
        vec![PathBuf::from("/nonexistent/a"), PathBuf::from("/nonexistent/b")],
    );
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "1").unwrap();
    fs::write(dir.path().join("b"), "1").unwrap();
    dupes.insert(
        "real".to_string(),
        vec![dir.path().join("a"), dir.path().join("b")],
    );

    let options = SessionOptions {
        keep_one: true,
        ..SessionOptions::default()
    };
    let outcome = run_resolution(
        DupeReport::new(dupes, Vec::new()),
        options,
        None,
        &hooks,
        &mut decider,
        &mut (),
    )
    .unwrap();

    // "h" is stale and resolved without asking; "real" was interrupted
    assert_eq!(decider.reports.len(), 1);
    assert_eq!(decider.reports[0].name, "report remaining groups");
    assert_eq!(outcome.remaining.group_count(), 1);
    assert!(outcome.remaining.dupes.contains_key("real"));
}

#[test]
fn test_hooks_run_concurrently_within_timeout() {
    let hooks = ShutdownHooks::new();
    let finished = Arc::new(AtomicUsize::new(0));

    for name in ["first", "second", "third"] {
        let finished = Arc::clone(&finished);
        hooks.register(name, move || {
            std::thread::sleep(Duration::from_millis(200));
            finished.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    }
    hooks.register("failing", || anyhow::bail!("disk full"));
    hooks.register("slow", || {
        std::thread::sleep(Duration::from_secs(3));
        Ok(())
    });

    let start = std::time::Instant::now();
    let reports = hooks.invoke_all(Duration::from_millis(1000));
    let elapsed = start.elapsed();

    assert!(elapsed < Duration::from_millis(2000));
    assert_eq!(finished.load(Ordering::SeqCst), 3);
    assert_eq!(reports.len(), 5);
    let outcome = |name: &str| {
        reports
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.outcome.clone())
            .unwrap()
    };
    assert_eq!(outcome("failing"), HookOutcome::Failed("disk full".to_string()));
    assert_eq!(outcome("slow"), HookOutcome::TimedOut);
    assert!(hooks.is_empty());
}

#[test]
fn test_first_signal_without_hooks_only_sets_flag() {
    let handler = ShutdownHandler::new();
    assert!(!handler.handle_signal());
    assert!(handler.is_shutdown_requested());

    // A repeated interrupt forces exit
    assert!(handler.handle_signal());
}

#[test]
fn test_signal_with_hooks_runs_them() {
    let handler = ShutdownHandler::new();
    let ran = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ran);
    handler.hooks().register("count", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    assert!(handler.handle_signal());
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}
