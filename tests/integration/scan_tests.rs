use dupscan::duplicates::{DuplicateFinder, FinderConfig};
use dupscan::scanner::{HashAlgorithm, WalkerConfig};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_file(root: &Path, relative: &str, content: &[u8]) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(&path).unwrap().write_all(content).unwrap();
    path
}

fn member_names(finder: &DuplicateFinder, root: &Path) -> Vec<Vec<String>> {
    let (groups, _) = finder.find_duplicates(root).unwrap();
    groups
        .iter()
        .map(|g| g.files.iter().map(|f| f.name.clone()).collect())
        .collect()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
    assert!(summary.scan_errors.is_empty());
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.txt", b"content a");
    write_file(dir.path(), "b.txt", b"content b");
    write_file(dir.path(), "c.txt", b"content c");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.processed_files, 3);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_hello_world() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "A", b"hello");
    write_file(dir.path(), "B", b"hello");
    write_file(dir.path(), "C", b"world");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    let names: Vec<_> = groups[0].files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(groups[0].files[0].size, 5);
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_space, 5);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.txt", b"same");
    write_file(dir.path(), "subdir/b.txt", b"same");
    write_file(dir.path(), "subdir/deeper/c.txt", b"same");
    write_file(dir.path(), "subdir/deeper/d.txt", b"different");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 3);
    assert_eq!(summary.total_files, 4);
    assert!(groups[0].files.iter().all(|f| f.path.is_absolute()));
}

#[test]
fn test_scan_multiple_groups_in_discovery_order() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "1_first", b"beta");
    write_file(dir.path(), "2_second", b"alpha");
    write_file(dir.path(), "3_third", b"alpha");
    write_file(dir.path(), "4_fourth", b"beta");
    write_file(dir.path(), "5_fifth", b"gamma");

    let names = member_names(&DuplicateFinder::with_defaults(), dir.path());
    assert_eq!(
        names,
        vec![
            vec!["1_first".to_string(), "4_fourth".to_string()],
            vec!["2_second".to_string(), "3_third".to_string()],
        ]
    );
}

#[test]
fn test_scan_twice_is_identical() {
    let dir = tempdir().unwrap();
    for i in 0..12 {
        write_file(
            dir.path(),
            &format!("dir{}/file{}.bin", i % 3, i),
            format!("payload {}", i % 5).as_bytes(),
        );
    }

    let finder = DuplicateFinder::with_defaults();
    let (first, _) = finder.find_duplicates(dir.path()).unwrap();
    let (second, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_scan_same_size_different_content() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a", b"aaaa");
    write_file(dir.path(), "b", b"bbbb");

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert!(groups.is_empty());
}

#[test]
fn test_scan_large_files_across_chunks() {
    let dir = tempdir().unwrap();
    let mut big = vec![7u8; 100_000];
    write_file(dir.path(), "big1", &big);
    write_file(dir.path(), "big2", &big);
    big[99_999] = 8;
    write_file(dir.path(), "big3", &big);

    let config = FinderConfig::default().with_chunk_size(4096);
    let (groups, _) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    let names: Vec<_> = groups[0].files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["big1", "big2"]);
}

#[test]
fn test_scan_algorithms_agree() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "x1", b"xyz");
    write_file(dir.path(), "x2", b"xyz");
    write_file(dir.path(), "y1", b"abc");
    write_file(dir.path(), "y2", b"abc");

    let baseline = member_names(&DuplicateFinder::with_defaults(), dir.path());
    for algorithm in [HashAlgorithm::Sha256, HashAlgorithm::Md5] {
        let finder = DuplicateFinder::new(FinderConfig::default().with_algorithm(algorithm));
        assert_eq!(member_names(&finder, dir.path()), baseline);
    }
}

#[test]
fn test_scan_parallel_matches_sequential() {
    let dir = tempdir().unwrap();
    for i in 0..40 {
        write_file(
            dir.path(),
            &format!("d{}/f{:02}", i % 4, i),
            format!("content-{}", i % 7).as_bytes(),
        );
    }

    let sequential = member_names(&DuplicateFinder::with_defaults(), dir.path());
    for threads in [2, 4, 8] {
        let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(threads));
        assert_eq!(member_names(&finder, dir.path()), sequential, "{} threads", threads);
    }
}

#[test]
fn test_scan_skip_hidden() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "visible", b"dup");
    write_file(dir.path(), ".hidden", b"dup");
    write_file(dir.path(), ".git/objects/blob", b"dup");

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(groups[0].len(), 3);

    let config = FinderConfig::default().with_walker_config(WalkerConfig {
        skip_hidden: true,
        ..WalkerConfig::default()
    });
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();
    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[test]
fn test_scan_ignore_patterns() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "keep1.txt", b"dup");
    write_file(dir.path(), "keep2.txt", b"dup");
    write_file(dir.path(), "scratch.tmp", b"dup");
    write_file(dir.path(), "target/debug/out.txt", b"dup");

    let config = FinderConfig::default().with_walker_config(WalkerConfig {
        ignore_patterns: vec!["*.tmp".to_string(), "target/".to_string()],
        ..WalkerConfig::default()
    });
    let names = member_names(&DuplicateFinder::new(config), dir.path());
    assert_eq!(names, vec![vec!["keep1.txt".to_string(), "keep2.txt".to_string()]]);
}

#[test]
fn test_scan_gitignore() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), ".gitignore", b"build/\n");
    write_file(dir.path(), "src.txt", b"dup");
    write_file(dir.path(), "build/copy.txt", b"dup");

    let config = FinderConfig::default().with_walker_config(WalkerConfig {
        respect_gitignore: true,
        ..WalkerConfig::default()
    });
    let (groups, _) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();
    assert!(groups.is_empty());
}

#[test]
fn test_scan_excluded_path() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a", b"dup");
    let report = write_file(dir.path(), "report.csv", b"dup");

    let root = dir.path().canonicalize().unwrap();
    let excluded = root.join(report.file_name().unwrap());
    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_excluded_path(excluded));

    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();
    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[cfg(unix)]
#[test]
fn test_scan_does_not_follow_symlinks() {
    let dir = tempdir().unwrap();
    let target = write_file(dir.path(), "real.txt", b"content");
    std::os::unix::fs::symlink(&target, dir.path().join("link.txt")).unwrap();

    let outside = tempdir().unwrap();
    write_file(outside.path(), "elsewhere.txt", b"content");
    std::os::unix::fs::symlink(outside.path(), dir.path().join("linked_dir")).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[test]
fn test_scan_verify_mode() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a", b"verified content");
    write_file(dir.path(), "b", b"verified content");
    write_file(dir.path(), "c", b"other");

    let config = FinderConfig::default().with_verify(true).with_io_threads(2);
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(summary.verify_collisions, 0);
    assert!(summary.scan_errors.is_empty());
}
