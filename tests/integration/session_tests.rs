use dedupe::duplicates::{DupeReport, DuplicateFinder};
use dedupe::resolution::{ConsoleDecider, ScriptedDecider, SessionOptions};
use dedupe::run_resolution;
use dedupe::signal::ShutdownHooks;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Five groups of two identical files, each group a different size.
fn five_groups(dir: &Path) -> DupeReport {
    for i in 0..5 {
        let content = "z".repeat(i + 1);
        fs::write(dir.join(format!("g{i}_a")), &content).unwrap();
        fs::write(dir.join(format!("g{i}_b")), &content).unwrap();
    }
    let (report, _) = DuplicateFinder::with_defaults().find_duplicates(dir).unwrap();
    assert_eq!(report.group_count(), 5);
    report
}

fn keep_one() -> SessionOptions {
    SessionOptions {
        keep_one: true,
        ..SessionOptions::default()
    }
}

fn console(input: &str) -> ConsoleDecider<Cursor<Vec<u8>>, Vec<u8>> {
    ConsoleDecider::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
}

#[test]
fn test_interrupted_session_resumes_from_saved_report() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    let report = five_groups(&data);
    let saved = dir.path().join("progress.json");
    let checksums: Vec<String> = report.dupes.keys().cloned().collect();

    // Input ends after three answers
    let hooks = ShutdownHooks::new();
    let outcome = run_resolution(
        report,
        keep_one(),
        Some(&saved),
        &hooks,
        &mut console("a\na\na\n"),
        &mut (),
    )
    .unwrap();

    assert!(outcome.summary.is_none());
    let on_disk = DupeReport::load(&saved).unwrap();
    assert_eq!(on_disk, outcome.remaining);
    assert_eq!(
        on_disk.dupes.keys().cloned().collect::<Vec<_>>(),
        checksums[3..].to_vec()
    );

    // Resume from the saved file, saving back to it
    let outcome = run_resolution(
        DupeReport::load(&saved).unwrap(),
        keep_one(),
        Some(&saved),
        &hooks,
        &mut console("a\na\n"),
        &mut (),
    )
    .unwrap();

    let summary = outcome.summary.unwrap();
    assert_eq!(summary.groups_resolved, 2);
    assert!(outcome.remaining.is_empty());
    assert!(DupeReport::load(&saved).unwrap().is_empty());
    assert!(hooks.is_empty());
}

#[test]
fn test_errors_survive_save_and_resume() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    let mut report = five_groups(&data);
    report.push_error("Permission denied: /somewhere");
    let saved = dir.path().join("progress.json");

    run_resolution(
        report,
        keep_one(),
        Some(&saved),
        &ShutdownHooks::new(),
        &mut console(""),
        &mut (),
    )
    .unwrap();

    let loaded = DupeReport::load(&saved).unwrap();
    assert_eq!(loaded.group_count(), 5);
    assert_eq!(loaded.errors, vec!["Permission denied: /somewhere".to_string()]);
}

#[test]
fn test_resumed_groups_with_deleted_files_are_stale() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    let report = five_groups(&data);
    let saved = dir.path().join("progress.json");
    report.save(&saved).unwrap();

    // Removed between runs
    for i in 0..5 {
        fs::remove_file(data.join(format!("g{i}_b"))).unwrap();
    }

    let mut decider = ScriptedDecider::default();
    let outcome = run_resolution(
        DupeReport::load(&saved).unwrap(),
        keep_one(),
        None,
        &ShutdownHooks::new(),
        &mut decider,
        &mut (),
    )
    .unwrap();

    let summary = outcome.summary.unwrap();
    assert_eq!(summary.stale, 5);
    assert!(decider.asked().is_empty());
    for i in 0..5 {
        assert!(data.join(format!("g{i}_a")).exists());
    }
}

#[test]
fn test_unreadable_report_is_an_error() {
    let dir = tempdir().unwrap();
    let saved = dir.path().join("broken.json");
    fs::write(&saved, "[1, 2, 3]").unwrap();

    assert!(DupeReport::load(&saved).is_err());
    assert!(DupeReport::load(&PathBuf::from("/no/such/report.json")).is_err());
}
