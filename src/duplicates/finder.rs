//! Duplicate finder: the walk → hash → group pipeline.
//!
//! # Overview
//!
//! [`DuplicateFinder::find_duplicates`] runs one full comparison of a
//! directory tree:
//! 1. **Walk** - enumerate regular files under the root
//! 2. **Hash** - read metadata and compute a content digest per file
//! 3. **Group** - index records by digest (see [`crate::duplicates::groups`])
//! 4. **Verify** (optional) - confirm digest matches byte by byte
//!
//! With a single I/O thread every file is walked, read and recorded before
//! the next one is touched. With more threads the walk first collects paths
//! (without opening any file), then a bounded rayon pool hashes them while
//! the calling thread remains the only writer to the grouper.
//!
//! Files that cannot be read are skipped and kept in
//! [`ScanSummary::scan_errors`]; only an invalid root or a shutdown request
//! aborts the scan.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::groups::{DuplicateGroup, DuplicateGrouper};
use super::verify::verify_groups;
use crate::output::format_size;
use crate::progress::ProgressCallback;
use crate::scanner::{
    Digest, FileRecord, HashAlgorithm, HashError, Hasher, ScanError, SkipReason, Walker,
    WalkerConfig, DEFAULT_CHUNK_SIZE,
};

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Digest algorithm used for content comparison.
    pub algorithm: HashAlgorithm,
    /// Read chunk size in bytes.
    pub chunk_size: usize,
    /// Number of I/O threads. `1` runs the whole pipeline sequentially.
    pub io_threads: usize,
    /// Confirm digest matches byte by byte after grouping.
    pub verify: bool,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("algorithm", &self.algorithm)
            .field("chunk_size", &self.chunk_size)
            .field("io_threads", &self.io_threads)
            .field("verify", &self.verify)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            io_threads: 1,
            verify: false,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the read chunk size. Zero is raised to one byte.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the I/O thread count.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Enable byte-by-byte verification of digest matches.
    #[must_use]
    pub fn with_verify(mut self, enabled: bool) -> Self {
        self.verify = enabled;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Regular files found by the walk
    pub total_files: usize,
    /// Files whose metadata and digest were read successfully
    pub processed_files: usize,
    /// Total size of all processed files in bytes
    pub total_size: u64,
    /// Number of duplicate groups reported
    pub duplicate_groups: usize,
    /// Number of duplicate files (excluding originals)
    pub duplicate_files: usize,
    /// Space held by the duplicates beyond their originals
    pub reclaimable_space: u64,
    /// Processed files for which the platform reported no creation time
    pub missing_creation_time: usize,
    /// Digest groups split by verification
    pub verify_collisions: usize,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Files and directories skipped because of errors
    pub scan_errors: Vec<ScanError>,
}

impl ScanSummary {
    /// Number of skipped files and directories.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.scan_errors.len()
    }

    /// Skipped entries counted per reason.
    #[must_use]
    pub fn skipped_by_reason(&self) -> BTreeMap<SkipReason, usize> {
        let mut counts = BTreeMap::new();
        for error in &self.scan_errors {
            *counts.entry(error.reason()).or_insert(0) += 1;
        }
        counts
    }

    /// Percentage of processed bytes held by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        format_size(self.reclaimable_space)
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        format_size(self.total_size)
    }
}

/// Errors that abort a duplicate scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The root could not be resolved to an absolute path.
    #[error("I/O error for {path}: {source}")]
    IoWithPath {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The hashing thread pool could not be created.
    #[error("Failed to create thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Outcome of processing one enumerated path.
type Processed = Result<(FileRecord, Digest), ScanError>;

/// Duplicate finder that runs the walk → hash → group pipeline.
///
/// # Example
///
/// ```no_run
/// use dupscan::duplicates::{DuplicateFinder, FinderConfig};
/// use std::path::Path;
///
/// let config = FinderConfig::default().with_io_threads(4);
/// let finder = DuplicateFinder::new(config);
///
/// let (groups, summary) = finder.find_duplicates(Path::new("/some/path")).unwrap();
///
/// println!("Found {} duplicate groups", groups.len());
/// println!("Reclaimable space: {}", summary.reclaimable_display());
/// ```
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new(config.algorithm).with_chunk_size(config.chunk_size);
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(Arc::clone(flag));
        }
        Self { config, hasher }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The configuration this finder was built with.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files below `path`.
    ///
    /// # Returns
    ///
    /// The duplicate groups (groups in order of their original's discovery,
    /// members in discovery order) and the scan statistics.
    ///
    /// # Errors
    ///
    /// - [`FinderError::PathNotFound`] / [`FinderError::NotADirectory`] for
    ///   an invalid root; nothing is read in that case
    /// - [`FinderError::Interrupted`] if the shutdown flag is raised
    ///
    /// Per-file failures are not errors; see [`ScanSummary::scan_errors`].
    pub fn find_duplicates(
        &self,
        path: &Path,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();

        if !path.exists() {
            return Err(FinderError::PathNotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(FinderError::NotADirectory(path.to_path_buf()));
        }
        let root = path.canonicalize().map_err(|source| FinderError::IoWithPath {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!(
            "Starting duplicate scan of {} ({}, {} I/O thread{})",
            root.display(),
            self.config.algorithm,
            self.config.io_threads,
            if self.config.io_threads == 1 { "" } else { "s" }
        );

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let mut walker = Walker::new(&root, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let mut summary = ScanSummary::default();
        let grouper = if self.config.io_threads > 1 {
            self.scan_parallel(&walker, &mut summary)?
        } else {
            self.scan_sequential(&walker, &mut summary)?
        };

        summary.processed_files = grouper.len();
        log::info!(
            "Hashed {} of {} files ({}), {} distinct contents",
            summary.processed_files,
            summary.total_files,
            format_size(summary.total_size),
            grouper.unique_digests()
        );

        let mut groups = grouper.groups();

        if self.config.verify && !groups.is_empty() {
            groups = self.verify(groups, &mut summary)?;
        }

        if summary.missing_creation_time > 0 {
            log::warn!(
                "Creation time is unavailable for {} file(s) on this platform or filesystem",
                summary.missing_creation_time
            );
        }

        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(|g| g.duplicates().len()).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Found {} duplicate groups ({} duplicate files, {} reclaimable) in {:.2?}",
            summary.duplicate_groups,
            summary.duplicate_files,
            format_size(summary.reclaimable_space),
            summary.scan_duration
        );
        if !summary.scan_errors.is_empty() {
            log::info!("Skipped {} entries because of errors", summary.skipped());
        }

        Ok((groups, summary))
    }

    /// Walk, hash and record one file at a time.
    fn scan_sequential(
        &self,
        walker: &Walker,
        summary: &mut ScanSummary,
    ) -> Result<DuplicateGrouper, FinderError> {
        let mut grouper = DuplicateGrouper::new();
        let mut processed = 0usize;

        self.phase_start("hashing", 0);

        for entry in walker.walk() {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    summary.scan_errors.push(e);
                    continue;
                }
            };
            summary.total_files += 1;

            let result = self.process_file(&path);
            processed += 1;
            self.report_progress(processed, &path);

            if let Some((record, digest)) = self.accept(result, summary)? {
                grouper.record(record, digest);
            }
        }

        self.phase_end("hashing");

        if self.config.is_shutdown_requested() {
            log::info!("Scan interrupted after {} files", processed);
            return Err(FinderError::Interrupted);
        }

        Ok(grouper)
    }

    /// Collect paths first, then hash them on a bounded pool.
    fn scan_parallel(
        &self,
        walker: &Walker,
        summary: &mut ScanSummary,
    ) -> Result<DuplicateGrouper, FinderError> {
        self.phase_start("walking", 0);
        let mut paths = Vec::new();
        for entry in walker.walk() {
            match entry {
                Ok(path) => paths.push(path),
                Err(e) => summary.scan_errors.push(e),
            }
        }
        self.phase_end("walking");

        if self.config.is_shutdown_requested() {
            log::info!("Scan interrupted while walking");
            return Err(FinderError::Interrupted);
        }

        summary.total_files = paths.len();
        log::info!("Found {} files, hashing...", paths.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()?;

        let counter = AtomicUsize::new(0);
        self.phase_start("hashing", paths.len());

        let results: Vec<Option<Processed>> = pool.install(|| {
            paths
                .par_iter()
                .map(|path| {
                    if self.config.is_shutdown_requested() {
                        return None;
                    }
                    let result = self.process_file(path);
                    let current = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    self.report_progress(current, path);
                    Some(result)
                })
                .collect()
        });

        self.phase_end("hashing");

        if self.config.is_shutdown_requested() {
            log::info!(
                "Scan interrupted after {} of {} files",
                counter.load(Ordering::SeqCst),
                paths.len()
            );
            return Err(FinderError::Interrupted);
        }

        let mut grouper = DuplicateGrouper::new();
        for result in results.into_iter().flatten() {
            if let Some((record, digest)) = self.accept(result, summary)? {
                grouper.record(record, digest);
            }
        }
        Ok(grouper)
    }

    /// Read metadata and digest for one path.
    fn process_file(&self, path: &Path) -> Processed {
        let record = FileRecord::from_path(path.to_path_buf())?;
        let digest = self.hasher.hash_file(path)?;
        log::trace!("{} {}", digest, path.display());
        Ok((record, digest))
    }

    /// Fold one processing result into the summary.
    ///
    /// Returns the record to group, `None` for a skipped file, or
    /// [`FinderError::Interrupted`] if hashing was cut short by shutdown.
    fn accept(
        &self,
        result: Processed,
        summary: &mut ScanSummary,
    ) -> Result<Option<(FileRecord, Digest)>, FinderError> {
        match result {
            Ok((record, digest)) => {
                summary.total_size += record.size;
                if record.created.is_none() {
                    summary.missing_creation_time += 1;
                }
                Ok(Some((record, digest)))
            }
            Err(ScanError::Hash(HashError::Interrupted(_))) => Err(FinderError::Interrupted),
            Err(e) => {
                log::warn!("Skipping {}: {}", e.path().display(), e);
                summary.scan_errors.push(e);
                Ok(None)
            }
        }
    }

    fn verify(
        &self,
        groups: Vec<DuplicateGroup>,
        summary: &mut ScanSummary,
    ) -> Result<Vec<DuplicateGroup>, FinderError> {
        let members: usize = groups.iter().map(DuplicateGroup::len).sum();
        log::info!("Verifying {} files byte by byte", members);
        self.phase_start("verifying", 0);

        let verification = verify_groups(
            groups,
            self.config.chunk_size,
            self.config.shutdown_flag.as_deref(),
        );

        self.phase_end("verifying");
        let verification = verification?;

        summary.verify_collisions = verification.collisions;
        summary.scan_errors.extend(verification.errors);
        Ok(verification.groups)
    }

    fn phase_start(&self, phase: &str, total: usize) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(phase, total);
        }
    }

    fn phase_end(&self, phase: &str) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(phase);
        }
    }

    fn report_progress(&self, current: usize, path: &Path) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_progress(current, &path.to_string_lossy());
        }
    }
}
