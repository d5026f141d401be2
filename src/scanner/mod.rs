//! Scanner module for directory traversal, metadata and content hashing.
//!
//! This module provides functionality for:
//! - Directory walking using jwalk (regular files only, sorted, no symlinks)
//! - Streaming content digests (BLAKE3, SHA-256, MD5)
//! - Size and timestamp retrieval for discovered files
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: Chunked file hashing
//! - [`metadata`]: Size and timestamp reads
//!
//! # Example
//!
//! ```no_run
//! use dupscan::scanner::{FileRecord, HashAlgorithm, Hasher, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let hasher = Hasher::new(HashAlgorithm::Blake3);
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(path) => {
//!             let record = FileRecord::from_path(path).unwrap();
//!             let digest = hasher.hash_file(&record.path).unwrap();
//!             println!("{} {}", digest, record.path.display());
//!         }
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod metadata;
pub mod walker;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

// Re-export main types
pub use hasher::{Digest, HashAlgorithm, Hasher, DEFAULT_CHUNK_SIZE};
pub use metadata::{read_metadata, FileMetadata};
pub use walker::Walker;

/// A successfully processed file.
///
/// Created once by the metadata reader and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute path to the file
    pub path: PathBuf,
    /// Final path component
    pub name: String,
    /// File size in bytes at the time of the metadata read
    pub size: u64,
    /// Creation (birth) time, `None` where the platform does not record it
    pub created: Option<SystemTime>,
    /// Last modification time
    pub modified: SystemTime,
}

impl FileRecord {
    /// Create a new FileRecord from already-known values.
    ///
    /// # Arguments
    ///
    /// * `path` - Absolute path to the file
    /// * `size` - File size in bytes
    /// * `created` - Creation time, if known
    /// * `modified` - Last modification time
    #[must_use]
    pub fn new(
        path: PathBuf,
        size: u64,
        created: Option<SystemTime>,
        modified: SystemTime,
    ) -> Self {
        let name = file_name_of(&path);
        Self {
            path,
            name,
            size,
            created,
            modified,
        }
    }

    /// Read the metadata of `path` and build a record from it.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`] if the file vanished since it was
    /// enumerated, or another [`ScanError`] if the metadata cannot be read.
    pub fn from_path(path: PathBuf) -> Result<Self, ScanError> {
        let meta = read_metadata(&path)?;
        Ok(Self::new(path, meta.size, meta.created, meta.modified))
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Configuration for directory walking.
///
/// Controls filtering and traversal parallelism. Symbolic links are never
/// followed and are never reported as files.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Load `.gitignore` from the scan root and apply it.
    pub respect_gitignore: bool,

    /// Glob patterns to ignore (gitignore-style).
    pub ignore_patterns: Vec<String>,

    /// Exact paths that are never yielded (e.g. the report being written).
    pub exclude_paths: Vec<PathBuf>,

    /// Threads used to read directories. `1` walks serially.
    pub threads: usize,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            skip_hidden: false,
            respect_gitignore: false,
            ignore_patterns: Vec::new(),
            exclude_paths: Vec::new(),
            threads: 1,
        }
    }
}

impl WalkerConfig {
    /// Add a path that must never be yielded by the walk.
    #[must_use]
    pub fn with_excluded_path(mut self, path: PathBuf) -> Self {
        self.exclude_paths.push(path);
        self
    }

    /// Set the number of directory-reading threads.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }
}

/// Why a file or subtree was left out of the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    /// A directory could not be enumerated.
    UnreadableDirectory,
    /// The file disappeared between enumeration and processing.
    NotFound,
    /// Access to the file was denied.
    PermissionDenied,
    /// Any other I/O failure.
    Io,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnreadableDirectory => write!(f, "unreadable directory"),
            Self::NotFound => write!(f, "file vanished"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

/// Errors that can occur during directory scanning.
///
/// None of these abort a scan: the affected file or subtree is skipped.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// A directory could not be enumerated; its subtree was skipped.
    #[error("Cannot read directory {path}: {message}")]
    Walk {
        /// Directory that failed
        path: PathBuf,
        /// Description of the underlying failure
        message: String,
    },

    /// The file was removed after it was enumerated.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when accessing a file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path no longer refers to a regular file.
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Hashing the file failed.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl ScanError {
    /// Classify an I/O error for `path`.
    pub(crate) fn from_io(path: &Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// The path this error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Walk { path, .. } | Self::Io { path, .. } => path,
            Self::NotFound(path) | Self::PermissionDenied(path) | Self::NotAFile(path) => path,
            Self::Hash(e) => e.path(),
        }
    }

    /// Summary bucket for the end-of-run report.
    #[must_use]
    pub fn reason(&self) -> SkipReason {
        match self {
            Self::Walk { .. } => SkipReason::UnreadableDirectory,
            Self::NotFound(_) | Self::Hash(HashError::NotFound(_)) => SkipReason::NotFound,
            Self::PermissionDenied(_) | Self::Hash(HashError::PermissionDenied(_)) => {
                SkipReason::PermissionDenied
            }
            Self::NotAFile(_) | Self::Io { .. } | Self::Hash(_) => SkipReason::Io,
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Hashing stopped because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),
}

impl HashError {
    /// Classify an I/O error for `path`.
    pub(crate) fn from_io(path: &Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// The path this error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(path) | Self::PermissionDenied(path) | Self::Interrupted(path) => path,
            Self::Io { path, .. } => path,
        }
    }
}
