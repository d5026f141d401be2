//! Size and timestamp retrieval.
//!
//! Creation time is not available everywhere: some platforms and
//! filesystems only record modification time, and older Linux kernels or
//! filesystems without `statx` birth-time support report it as unsupported.
//! In that case [`FileMetadata::created`] is `None`. It is never replaced
//! with another timestamp behind the caller's back.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use super::ScanError;

/// Size and timestamps of a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    /// Size in bytes at read time
    pub size: u64,
    /// Creation time, if the platform records one
    pub created: Option<SystemTime>,
    /// Last modification time
    pub modified: SystemTime,
}

/// Read size and timestamps for `path` without following symlinks.
///
/// # Errors
///
/// - [`ScanError::NotFound`] if the file vanished since it was enumerated
/// - [`ScanError::NotAFile`] if the path is no longer a regular file
/// - [`ScanError::PermissionDenied`] / [`ScanError::Io`] for other failures
pub fn read_metadata(path: &Path) -> Result<FileMetadata, ScanError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| ScanError::from_io(path, e))?;

    if !metadata.is_file() {
        return Err(ScanError::NotAFile(path.to_path_buf()));
    }

    let modified = metadata
        .modified()
        .map_err(|e| ScanError::from_io(path, e))?;

    let created = match metadata.created() {
        Ok(time) => Some(time),
        Err(e) => {
            log::trace!("No creation time for {}: {}", path.display(), e);
            None
        }
    };

    Ok(FileMetadata {
        size: metadata.len(),
        created,
        modified,
    })
}
