use dedupe::duplicates::{DupeReport, DuplicateFinder};
use dedupe::output::TextReporter;
use dedupe::resolution::{
    ActionRecord, Choice, ConsoleDecider, GroupOutcome, ResolutionSession, ResolutionState,
    ScriptedDecider, SessionOptions,
};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tempfile::tempdir;

fn three_copies(dir: &Path) -> DupeReport {
    for name in ["f1", "f2", "f3"] {
        fs::write(dir.join(name), "identical bytes").unwrap();
    }
    let (report, _) = DuplicateFinder::with_defaults().find_duplicates(dir).unwrap();
    assert_eq!(report.group_count(), 1);
    report
}

fn keep_one(dry_run: bool) -> SessionOptions {
    SessionOptions {
        keep_one: true,
        dry_run,
        ..SessionOptions::default()
    }
}

#[cfg(unix)]
#[test]
fn test_symlink_choice_links_others_to_kept_file() {
    let dir = tempdir().unwrap();
    let report = three_copies(dir.path());
    let state = ResolutionState::new(report);
    let session = ResolutionSession::new(state.clone(), keep_one(false));

    let mut decider = ScriptedDecider::new([Choice::Symlink(2)]);
    let summary = session.run(&mut decider, &mut ()).unwrap();

    let kept = dir.path().join("f2");
    let target = std::path::absolute(&kept).unwrap();
    assert!(fs::symlink_metadata(&kept).unwrap().file_type().is_file());
    for name in ["f1", "f3"] {
        let link = dir.path().join(name);
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&link).unwrap(), target);
        assert_eq!(fs::read_to_string(&link).unwrap(), "identical bytes");
    }

    assert_eq!(summary.linked, 1);
    assert_eq!(summary.files_linked, 2);
    assert!(state.is_empty());
}

#[test]
fn test_dry_run_describes_without_mutation() {
    let dir = tempdir().unwrap();
    let report = three_copies(dir.path());
    let checksum = report.dupes.keys().next().unwrap().clone();
    let files = report.dupes[&checksum].clone();

    let state = ResolutionState::new(report);
    let session = ResolutionSession::new(state.clone(), keep_one(true));
    let mut decider = ScriptedDecider::new([Choice::Symlink(2)]);
    let resolution = session
        .resolve_group(&checksum, files, &mut decider, &mut ())
        .unwrap();

    assert_eq!(resolution.outcome, GroupOutcome::Linked);
    assert!(resolution
        .actions
        .iter()
        .all(|a| matches!(a, ActionRecord::WouldLink { .. })));
    for name in ["f1", "f2", "f3"] {
        let meta = fs::symlink_metadata(dir.path().join(name)).unwrap();
        assert!(meta.file_type().is_file());
    }

    // The group still counts as resolved for the remaining state
    let mut decider = ScriptedDecider::new([Choice::Symlink(2)]);
    session.run(&mut decider, &mut ()).unwrap();
    assert!(state.is_empty());
}

#[test]
fn test_console_keep_choice_deletes_others() {
    let dir = tempdir().unwrap();
    let report = three_copies(dir.path());
    let session = ResolutionSession::new(ResolutionState::new(report), keep_one(false));

    // 7 is out of range, then keep the first file
    let mut decider = ConsoleDecider::new(Cursor::new(b"7\n1\n".to_vec()), Vec::new());
    let mut reporter = TextReporter::new(Vec::new(), false);
    let summary = session.run(&mut decider, &mut reporter).unwrap();

    assert!(dir.path().join("f1").exists());
    assert!(!dir.path().join("f2").exists());
    assert!(!dir.path().join("f3").exists());
    assert_eq!(summary.files_deleted, 2);

    let prompt = String::from_utf8(decider.into_output()).unwrap();
    assert!(prompt.contains("Which file would you like to keep?"));
    assert!(prompt.contains("7 is not between 1 and 3"));

    let printed = String::from_utf8(reporter.into_inner()).unwrap();
    assert!(printed.contains("Items left: 1"));
    assert!(printed.contains("(deleted)"));
}

#[test]
fn test_delete_all_choice() {
    let dir = tempdir().unwrap();
    let report = three_copies(dir.path());
    let session = ResolutionSession::new(ResolutionState::new(report), keep_one(false));

    let mut decider = ScriptedDecider::from_answers(["n"]);
    let summary = session.run(&mut decider, &mut ()).unwrap();

    assert_eq!(summary.deleted, 1);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_list_mode_never_asks_and_keeps_files() {
    let dir = tempdir().unwrap();
    let report = three_copies(dir.path());
    let state = ResolutionState::new(report);
    let session = ResolutionSession::new(state.clone(), SessionOptions::default());

    let mut decider = ScriptedDecider::default();
    let mut reporter = TextReporter::new(Vec::new(), true);
    let summary = session.run(&mut decider, &mut reporter).unwrap();

    assert_eq!(summary.kept_all, 1);
    assert!(decider.asked().is_empty());
    assert!(state.is_empty());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);

    let printed = String::from_utf8(reporter.into_inner()).unwrap();
    assert!(printed.contains(&dir.path().join("f3").display().to_string()));
}

#[test]
fn test_missing_file_is_pruned_before_acting() {
    let dir = tempdir().unwrap();
    let report = three_copies(dir.path());
    let mut decider = ScriptedDecider::new([Choice::Keep(1)]);
    let session = ResolutionSession::new(ResolutionState::new(report.clone()), keep_one(false));

    let checksum = report.dupes.keys().next().unwrap();
    let mut files = report.dupes[checksum].clone();
    files.push(dir.path().join("ghost"));

    let resolution = session
        .resolve_group(checksum, files, &mut decider, &mut ())
        .unwrap();

    assert_eq!(resolution.missing, vec![dir.path().join("ghost")]);
    assert_eq!(resolution.outcome, GroupOutcome::Deleted);
    assert_eq!(resolution.actions.len(), 2);
    assert!(dir.path().join("f1").exists());
}

#[test]
fn test_loaded_report_naming_one_file_twice_keeps_it() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("a");
    fs::write(&file, "only copy").unwrap();
    let saved = dir.path().join("report.json");

    let mut dupes = std::collections::BTreeMap::new();
    dupes.insert(
        "h".to_string(),
        vec![file.clone(), dir.path().join(".").join("a")],
    );
    DupeReport::new(dupes, Vec::new()).save(&saved).unwrap();

    let state = ResolutionState::new(DupeReport::load(&saved).unwrap());
    let session = ResolutionSession::new(state.clone(), keep_one(false));
    let mut decider = ScriptedDecider::new([Choice::Keep(1)]);
    let summary = session.run(&mut decider, &mut ()).unwrap();

    assert_eq!(summary.stale, 1);
    assert_eq!(summary.files_deleted, 0);
    assert!(decider.asked().is_empty());
    assert!(state.is_empty());
    assert_eq!(fs::read_to_string(&file).unwrap(), "only copy");
}
