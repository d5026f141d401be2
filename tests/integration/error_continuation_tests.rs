use dupscan::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use dupscan::progress::ProgressCallback;
use dupscan::scanner::{ScanError, SkipReason};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

/// Deletes a file as soon as the first file has been processed.
struct DeleteAfterFirst {
    victim: PathBuf,
    done: AtomicBool,
}

impl ProgressCallback for DeleteAfterFirst {
    fn on_phase_start(&self, _phase: &str, _total: usize) {}

    fn on_progress(&self, _current: usize, _path: &str) {
        if !self.done.swap(true, Ordering::SeqCst) {
            fs::remove_file(&self.victim).unwrap();
        }
    }

    fn on_phase_end(&self, _phase: &str) {}
}

#[test]
fn test_file_deleted_after_enumeration_is_skipped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"dup").unwrap();
    fs::write(dir.path().join("b"), b"dup").unwrap();
    fs::write(dir.path().join("c"), b"dup").unwrap();

    let callback = Arc::new(DeleteAfterFirst {
        victim: dir.path().join("c"),
        done: AtomicBool::new(false),
    });
    let config = FinderConfig::default().with_progress_callback(callback);

    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.processed_files, 2);
    assert_eq!(summary.scan_errors.len(), 1);
    assert!(matches!(summary.scan_errors[0], ScanError::NotFound(_)));
    assert_eq!(summary.scan_errors[0].reason(), SkipReason::NotFound);
    assert!(summary.scan_errors[0].path().ends_with("c"));
}

/// Removes a directory once the first file has been processed.
struct RemoveDirAfterFirst {
    victim: PathBuf,
    done: AtomicBool,
}

impl ProgressCallback for RemoveDirAfterFirst {
    fn on_phase_start(&self, _phase: &str, _total: usize) {}

    fn on_progress(&self, _current: usize, _path: &str) {
        if !self.done.swap(true, Ordering::SeqCst) {
            fs::remove_dir_all(&self.victim).unwrap();
        }
    }

    fn on_phase_end(&self, _phase: &str) {}
}

#[test]
fn test_directory_removed_during_walk() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"dup").unwrap();
    fs::write(dir.path().join("b"), b"dup").unwrap();
    let late = dir.path().join("zz_late");
    fs::create_dir(&late).unwrap();
    fs::write(late.join("inner"), b"dup").unwrap();
    fs::write(late.join("other"), b"dup").unwrap();

    let callback = Arc::new(RemoveDirAfterFirst {
        victim: late,
        done: AtomicBool::new(false),
    });
    let config = FinderConfig::default().with_progress_callback(callback);

    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    // Depending on when the directory was listed, its loss shows up as a
    // walk error or as files that vanished before hashing.
    assert_eq!(groups.len(), 1);
    let names: Vec<_> = groups[0].files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert!(!summary.scan_errors.is_empty());
    assert!(summary.scan_errors.iter().all(|e| matches!(
        e.reason(),
        SkipReason::UnreadableDirectory | SkipReason::NotFound
    )));
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_does_not_abort() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"dup").unwrap();
    fs::write(dir.path().join("b.txt"), b"dup").unwrap();

    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("inside.txt"), b"dup").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits do not stop root, so this only runs unprivileged.
    // test_directory_removed_during_walk covers the same path as root.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = DuplicateFinder::with_defaults().find_duplicates(dir.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let (groups, summary) = result.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert!(!summary.scan_errors.is_empty());
    assert!(summary
        .scan_errors
        .iter()
        .all(|e| e.reason() == SkipReason::UnreadableDirectory));
    assert!(summary
        .skipped_by_reason()
        .contains_key(&SkipReason::UnreadableDirectory));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_in_parallel_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    for name in ["a", "b", "c", "d"] {
        fs::write(dir.path().join(name), b"dup").unwrap();
    }
    let locked = dir.path().join("c");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Only meaningful without root privileges
    if fs::File::open(&locked).is_ok() {
        return;
    }

    let config = FinderConfig::default().with_io_threads(3);
    let result = DuplicateFinder::new(config).find_duplicates(dir.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    let (groups, summary) = result.unwrap();
    let names: Vec<_> = groups[0].files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "d"]);
    assert_eq!(summary.scan_errors.len(), 1);
    assert_eq!(summary.scan_errors[0].reason(), SkipReason::PermissionDenied);
}

/// Requests shutdown once a given number of files has been processed.
struct CancelAt {
    flag: Arc<AtomicBool>,
    at: usize,
    seen: Mutex<usize>,
}

impl ProgressCallback for CancelAt {
    fn on_phase_start(&self, _phase: &str, _total: usize) {}

    fn on_progress(&self, _current: usize, _path: &str) {
        let mut seen = self.seen.lock().unwrap();
        *seen += 1;
        if *seen == self.at {
            self.flag.store(true, Ordering::SeqCst);
        }
    }

    fn on_phase_end(&self, _phase: &str) {}
}

#[test]
fn test_interrupt_discards_partial_results() {
    let dir = tempdir().unwrap();
    for i in 0..10 {
        fs::write(dir.path().join(format!("f{}", i)), b"dup").unwrap();
    }

    for threads in [1, 4] {
        let flag = Arc::new(AtomicBool::new(false));
        let callback = Arc::new(CancelAt {
            flag: Arc::clone(&flag),
            at: 3,
            seen: Mutex::new(0),
        });
        let config = FinderConfig::default()
            .with_io_threads(threads)
            .with_shutdown_flag(flag)
            .with_progress_callback(callback);

        let result = DuplicateFinder::new(config).find_duplicates(dir.path());
        assert!(
            matches!(result, Err(FinderError::Interrupted)),
            "{} threads",
            threads
        );
    }
}
