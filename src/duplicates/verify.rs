//! Optional byte-for-byte confirmation of digest matches.
//!
//! Grouping treats equal digests as equal content. When that is not good
//! enough, [`verify_groups`] re-reads every member of every group and
//! compares it against the other members, splitting a group whenever the
//! bytes differ. This doubles the I/O for duplicated files and is therefore
//! off unless [`FinderConfig::verify`](super::FinderConfig) is set.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{DuplicateGroup, FinderError};
use crate::scanner::{FileRecord, ScanError};

/// Result of a verification pass.
#[derive(Debug, Default)]
pub struct Verification {
    /// Groups whose members are byte-identical
    pub groups: Vec<DuplicateGroup>,
    /// Members that could not be re-read and were dropped
    pub errors: Vec<ScanError>,
    /// Digest groups that turned out to hold different content
    pub collisions: usize,
}

/// Confirm every group byte by byte.
///
/// Members keep their relative order. A group whose members split into
/// several content classes yields one group per class that still has two or
/// more members.
///
/// # Errors
///
/// Returns [`FinderError::Interrupted`] if `shutdown` is set between files.
pub fn verify_groups(
    groups: Vec<DuplicateGroup>,
    chunk_size: usize,
    shutdown: Option<&AtomicBool>,
) -> Result<Verification, FinderError> {
    let mut verification = Verification::default();
    let chunk_size = chunk_size.max(1);

    for group in groups {
        let digest = group.digest.clone();
        let mut classes: Vec<Vec<FileRecord>> = Vec::new();

        for file in group.files {
            if shutdown.is_some_and(|f| f.load(Ordering::SeqCst)) {
                return Err(FinderError::Interrupted);
            }

            match place(&mut classes, &file, chunk_size, &mut verification.errors) {
                Placement::Class(index) => classes[index].push(file),
                Placement::New => classes.push(vec![file]),
                Placement::Unreadable => {}
            }
        }

        if classes.len() > 1 {
            verification.collisions += 1;
            log::warn!(
                "Digest {} is shared by {} different contents",
                digest,
                classes.len()
            );
        }

        verification.groups.extend(
            classes
                .into_iter()
                .filter(|class| class.len() > 1)
                .map(|files| DuplicateGroup::new(digest.clone(), files)),
        );
    }

    Ok(verification)
}

/// Where a member ends up after comparison.
enum Placement {
    /// Byte-identical to the class at this index
    Class(usize),
    /// Starts a new content class
    New,
    /// Could not be read and was dropped
    Unreadable,
}

/// Find the content class `file` belongs to.
///
/// A class representative that can no longer be read is evicted once and
/// the next member of its class takes over, so only the unreadable file is
/// lost. Emptied classes are removed.
fn place(
    classes: &mut Vec<Vec<FileRecord>>,
    file: &FileRecord,
    chunk_size: usize,
    errors: &mut Vec<ScanError>,
) -> Placement {
    let mut index = 0;
    while index < classes.len() {
        let representative = &classes[index][0].path;
        match files_equal(representative, &file.path, chunk_size) {
            Ok(true) => return Placement::Class(index),
            Ok(false) => index += 1,
            Err(e) if e.path() == representative.as_path() => {
                let evicted = classes[index].remove(0);
                log::warn!("Verification skipped {}: {}", evicted.path.display(), e);
                errors.push(e);
                if classes[index].is_empty() {
                    classes.remove(index);
                }
            }
            Err(e) => {
                log::warn!("Verification skipped {}: {}", file.path.display(), e);
                errors.push(e);
                return Placement::Unreadable;
            }
        }
    }
    Placement::New
}

/// Compare two files chunk by chunk.
fn files_equal(a: &Path, b: &Path, chunk_size: usize) -> Result<bool, ScanError> {
    let mut file_a = File::open(a).map_err(|e| ScanError::from_io(a, e))?;
    let mut file_b = File::open(b).map_err(|e| ScanError::from_io(b, e))?;

    let mut buf_a = vec![0u8; chunk_size];
    let mut buf_b = vec![0u8; chunk_size];

    loop {
        let n_a = read_full(&mut file_a, &mut buf_a).map_err(|e| ScanError::from_io(a, e))?;
        let n_b = read_full(&mut file_b, &mut buf_b).map_err(|e| ScanError::from_io(b, e))?;

        if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as the reader allows. Returns the bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
