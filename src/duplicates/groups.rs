//! Digest-based grouping of processed files.
//!
//! # Overview
//!
//! [`DuplicateGrouper`] is a single-pass accumulator. Each processed file is
//! submitted once with its digest; the first file seen for a digest is the
//! "original" and every later file with the same digest is one of its
//! duplicates. When all files have been recorded, [`DuplicateGrouper::groups`]
//! returns the buckets holding at least two files.
//!
//! Ordering is insertion order throughout: groups come out in the order
//! their original was first recorded, and members keep the order in which
//! they were recorded.
//!
//! # Example
//!
//! ```
//! use dupscan::duplicates::DuplicateGrouper;
//! use dupscan::scanner::{Digest, FileRecord};
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let record = |name: &str| {
//!     FileRecord::new(PathBuf::from(name), 5, None, SystemTime::UNIX_EPOCH)
//! };
//!
//! let mut grouper = DuplicateGrouper::new();
//! grouper.record(record("/a.txt"), Digest::from_bytes(&[1]));
//! grouper.record(record("/b.txt"), Digest::from_bytes(&[1]));
//! grouper.record(record("/c.txt"), Digest::from_bytes(&[2]));
//!
//! let groups = grouper.groups();
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].original().name, "a.txt");
//! ```

use std::collections::HashMap;

use crate::scanner::{Digest, FileRecord};

/// Two or more files sharing the same digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Content digest shared by every member
    pub digest: Digest,
    /// Members in discovery order; the first one is the original
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    ///
    /// # Arguments
    ///
    /// * `digest` - Shared content digest
    /// * `files` - Members in discovery order
    #[must_use]
    pub fn new(digest: Digest, files: Vec<FileRecord>) -> Self {
        Self { digest, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The first file recorded with this digest.
    ///
    /// # Panics
    ///
    /// Panics if the group is empty, which [`DuplicateGrouper`] never produces.
    #[must_use]
    pub fn original(&self) -> &FileRecord {
        &self.files[0]
    }

    /// Every member after the original.
    #[must_use]
    pub fn duplicates(&self) -> &[FileRecord] {
        self.files.get(1..).unwrap_or_default()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Space taken by the copies beyond the original.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.duplicates().iter().map(|f| f.size).sum()
    }

    /// Digest as hexadecimal string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        self.digest.to_hex()
    }
}

/// Insertion-ordered index from digest to the files carrying it.
///
/// `record` is O(1) on average; nothing is re-read or re-hashed.
#[derive(Debug, Default)]
pub struct DuplicateGrouper {
    /// Digest to position in `buckets`
    index: HashMap<Digest, usize>,
    /// Buckets in order of first appearance
    buckets: Vec<(Digest, Vec<FileRecord>)>,
    /// Total records submitted
    records: usize,
}

impl DuplicateGrouper {
    /// Create an empty grouper.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one processed file.
    pub fn record(&mut self, file: FileRecord, digest: Digest) {
        self.records += 1;

        if let Some(&slot) = self.index.get(&digest) {
            log::trace!(
                "Duplicate of {}: {}",
                self.buckets[slot].1[0].path.display(),
                file.path.display()
            );
            self.buckets[slot].1.push(file);
        } else {
            self.index.insert(digest.clone(), self.buckets.len());
            self.buckets.push((digest, vec![file]));
        }
    }

    /// Number of records submitted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
    }

    /// Check if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Number of distinct digests seen so far.
    #[must_use]
    pub fn unique_digests(&self) -> usize {
        self.buckets.len()
    }

    /// Finish grouping and return every bucket with two or more files.
    ///
    /// Consumes the grouper, so it can only be called once.
    #[must_use]
    pub fn groups(self) -> Vec<DuplicateGroup> {
        let groups: Vec<DuplicateGroup> = self
            .buckets
            .into_iter()
            .filter(|(_, files)| files.len() > 1)
            .map(|(digest, files)| {
                log::debug!(
                    "Duplicate group {}: {} files",
                    digest,
                    files.len()
                );
                DuplicateGroup::new(digest, files)
            })
            .collect();

        log::debug!(
            "Grouped {} records into {} duplicate groups",
            self.records,
            groups.len()
        );
        groups
    }
}
