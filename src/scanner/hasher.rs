//! Streaming file hasher.
//!
//! # Overview
//!
//! [`Hasher`] computes a [`Digest`] of a file's full content by reading it in
//! fixed-size chunks, so memory use does not grow with file size.
//!
//! # Algorithms
//!
//! | name     | digest size | notes                                   |
//! |----------|-------------|-----------------------------------------|
//! | `blake3` | 256 bits    | default                                 |
//! | `sha256` | 256 bits    |                                         |
//! | `md5`    | 128 bits    | legacy compatibility, weakest of the three |
//!
//! Two files with the same digest are treated as having the same content.
//! That is a probabilistic equality: for BLAKE3 or SHA-256 the chance of an
//! accidental collision is around 2^-128 per pair, for MD5 it is far higher
//! and deliberate MD5 collisions are practical. Use
//! [`FinderConfig::verify`](crate::duplicates::FinderConfig) when a proof is
//! required.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use super::HashError;

/// Default read size for each chunk, in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Supported content digest algorithms.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// BLAKE3, 256-bit output.
    #[default]
    Blake3,
    /// SHA-256, 256-bit output.
    Sha256,
    /// MD5, 128-bit output.
    Md5,
}

impl HashAlgorithm {
    /// Lowercase algorithm name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Blake3 => "blake3",
            Self::Sha256 => "sha256",
            Self::Md5 => "md5",
        }
    }

    /// Digest length in bytes.
    #[must_use]
    pub fn digest_len(self) -> usize {
        match self {
            Self::Blake3 | Self::Sha256 => 32,
            Self::Md5 => 16,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blake3" => Ok(Self::Blake3),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "md5" => Ok(Self::Md5),
            other => Err(format!(
                "Unknown hash algorithm '{other}' (expected blake3, sha256 or md5)"
            )),
        }
    }
}

/// Fixed-length fingerprint of a file's full content.
///
/// Equal digests are taken to mean equal content; see the module docs for
/// the collision caveat.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(Box<[u8]>);

impl Digest {
    /// Wrap raw digest bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hexadecimal representation.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

/// In-progress digest state for one file.
enum DigestState {
    Blake3(Box<blake3::Hasher>),
    Sha256(sha2::Sha256),
    Md5(md5::Md5),
}

impl DigestState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Md5 => Self::Md5(md5::Md5::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Blake3(h) => {
                h.update(data);
            }
            Self::Sha256(h) => h.update(data),
            Self::Md5(h) => h.update(data),
        }
    }

    fn finalize(self) -> Digest {
        match self {
            Self::Blake3(h) => Digest::from_bytes(h.finalize().as_bytes()),
            Self::Sha256(h) => Digest::from_bytes(&h.finalize()),
            Self::Md5(h) => Digest::from_bytes(&h.finalize()),
        }
    }
}

/// Chunked content hasher.
///
/// # Example
///
/// ```no_run
/// use dupscan::scanner::{HashAlgorithm, Hasher};
/// use std::path::Path;
///
/// let hasher = Hasher::new(HashAlgorithm::Sha256);
/// let digest = hasher.hash_file(Path::new("Cargo.toml")).unwrap();
/// println!("{digest}");
/// ```
#[derive(Debug, Clone)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    chunk_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new(HashAlgorithm::default())
    }
}

impl Hasher {
    /// Create a hasher for `algorithm` with the default chunk size.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            chunk_size: DEFAULT_CHUNK_SIZE,
            shutdown_flag: None,
        }
    }

    /// Set the read chunk size. Zero is raised to one byte.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Stop hashing between chunks once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The configured chunk size in bytes.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Hash the full content of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::NotFound`] if the file vanished,
    /// [`HashError::PermissionDenied`] or [`HashError::Io`] if opening or a
    /// read fails partway, and [`HashError::Interrupted`] on shutdown.
    pub fn hash_file(&self, path: &Path) -> Result<Digest, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        self.hash_stream(file, path)
    }

    /// Hash everything readable from `reader`.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error from `reader`.
    pub fn hash_reader<R: Read>(&self, reader: R) -> io::Result<Digest> {
        self.hash_stream(reader, Path::new("<reader>"))
            .map_err(|e| match e {
                HashError::Io { source, .. } => source,
                other => io::Error::other(other.to_string()),
            })
    }

    fn hash_stream<R: Read>(&self, mut reader: R, path: &Path) -> Result<Digest, HashError> {
        let mut state = DigestState::new(self.algorithm);
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => state.update(&buffer[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::debug!("Read failed for {}: {}", path.display(), e);
                    return Err(HashError::from_io(path, e));
                }
            }
        }

        Ok(state.finalize())
    }
}
