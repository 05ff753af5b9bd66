use dedupe::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use dedupe::progress::ScanObserver;
use dedupe::scanner::HashMode;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

#[derive(Default)]
struct Recorder {
    dirs: Mutex<Vec<PathBuf>>,
    buckets: Mutex<Vec<u64>>,
    hashed: AtomicUsize,
}

impl ScanObserver for Recorder {
    fn on_enter_directory(&self, dir: &Path) {
        self.dirs.lock().unwrap().push(dir.to_path_buf());
    }

    fn on_potential_duplicates(&self, size: u64, _paths: &[PathBuf]) {
        self.buckets.lock().unwrap().push(size);
    }

    fn on_hash_computed(&self, _file: &Path, _checksum: &str) {
        self.hashed.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_same_size_unique_content_is_pruned() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "X").unwrap();
    fs::write(dir.path().join("b.txt"), "X").unwrap();
    fs::write(dir.path().join("c.txt"), "Y").unwrap();

    let (report, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.group_count(), 1);
    let group = report.dupes.values().next().unwrap();
    assert_eq!(
        group,
        &vec![dir.path().join("a.txt"), dir.path().join("b.txt")]
    );
    // c.txt shares the size bucket, so it is hashed too
    assert_eq!(summary.hashed_files, 3);
    assert!(report.errors.is_empty());
}

#[test]
fn test_non_recursive_ignores_subdirectories() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("root.txt"), "same content").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub/copy.txt"), "same content").unwrap();

    let finder = DuplicateFinder::new(FinderConfig::default().with_recursive(false));
    let (report, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(report.is_empty());
    assert_eq!(summary.total_files, 1);

    let finder = DuplicateFinder::new(FinderConfig::default().with_recursive(true));
    let (report, _) = finder.find_duplicates(dir.path()).unwrap();
    assert_eq!(report.group_count(), 1);
}

#[test]
fn test_observer_does_not_change_results() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("one"), "abc").unwrap();
    fs::write(dir.path().join("nested/two"), "abc").unwrap();
    fs::write(dir.path().join("nested/three"), "abcdef").unwrap();

    let plain = DuplicateFinder::new(FinderConfig::default().with_recursive(true))
        .find_duplicates(dir.path())
        .unwrap()
        .0;

    let recorder = Arc::new(Recorder::default());
    let observed = DuplicateFinder::new(
        FinderConfig::default()
            .with_recursive(true)
            .with_observer(recorder.clone()),
    )
    .find_duplicates(dir.path())
    .unwrap()
    .0;

    assert_eq!(plain, observed);
    assert_eq!(*recorder.buckets.lock().unwrap(), vec![3]);
    assert_eq!(recorder.hashed.load(Ordering::SeqCst), 2);

    let dirs = recorder.dirs.lock().unwrap();
    assert!(dirs.contains(&dir.path().to_path_buf()));
    assert!(dirs.contains(&dir.path().join("nested")));
}

#[test]
fn test_empty_files_are_duplicates() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("e1"), "").unwrap();
    fs::write(dir.path().join("e2"), "").unwrap();

    let (report, summary) = DuplicateFinder::new(FinderConfig::default().with_algorithm(HashMode::Md5))
        .find_duplicates(dir.path())
        .unwrap();

    assert!(report.dupes.contains_key("d41d8cd98f00b204e9800998ecf8427e"));
    assert_eq!(summary.reclaimable_space, 0);
    assert_eq!(summary.duplicate_files, 1);
}

#[test]
fn test_root_must_be_a_directory() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    fs::write(&file, "x").unwrap();

    let finder = DuplicateFinder::with_defaults();
    assert!(matches!(
        finder.find_duplicates(&file),
        Err(FinderError::NotADirectory(_))
    ));
    assert!(matches!(
        finder.find_duplicates(&dir.path().join("missing")),
        Err(FinderError::PathNotFound(_))
    ));
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_is_recoverable() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "dup").unwrap();
    fs::write(dir.path().join("b"), "dup").unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("c"), "dup").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can still list the directory
    let enforced = fs::read_dir(&locked).is_err();

    let finder = DuplicateFinder::new(FinderConfig::default().with_recursive(true));
    let result = finder.find_duplicates(dir.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let (report, summary) = result.unwrap();
    assert_eq!(report.group_count(), 1);
    if enforced {
        assert_eq!(report.errors.len(), 1);
        assert_eq!(summary.scan_errors.len(), 1);
        assert_eq!(report.dupes.values().next().unwrap().len(), 2);
    }
}

#[test]
fn test_io_thread_count_does_not_change_grouping() {
    let dir = tempdir().unwrap();
    for i in 0..12 {
        fs::write(dir.path().join(format!("f{i}")), format!("{}", i % 3)).unwrap();
    }

    let single = DuplicateFinder::new(FinderConfig::default().with_io_threads(1))
        .find_duplicates(dir.path())
        .unwrap()
        .0;
    let many = DuplicateFinder::new(FinderConfig::default().with_io_threads(8))
        .find_duplicates(dir.path())
        .unwrap()
        .0;

    assert_eq!(single.group_count(), 3);
    assert_eq!(single, many);
}
