//! Directory walker implementation using jwalk.
//!
//! # Overview
//!
//! [`Walker`] enumerates every regular file below a root directory. Each
//! call to [`Walker::walk`] starts a fresh traversal and returns a lazy
//! iterator of absolute paths.
//!
//! # Behaviour
//!
//! - Directory children are sorted by name, so the order is stable between
//!   runs and every file is yielded exactly once
//! - Symbolic links are never followed and never yielded
//! - Devices, sockets and fifos are skipped
//! - An unreadable directory yields a single [`ScanError::Walk`] and the
//!   rest of the tree is still walked
//! - Gitignore-style patterns and exact excluded paths prune entries before
//!   descent
//! - A shutdown flag stops iteration between entries
//!
//! # Example
//!
//! ```no_run
//! use dupscan::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(path) => println!("{}", path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::{Parallelism, WalkDir};

use super::{ScanError, WalkerConfig};

/// Directory walker for file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

/// Entry pruning rules applied while each directory is read.
struct EntryFilter {
    root: PathBuf,
    gitignore: Option<Gitignore>,
    excluded: HashSet<PathBuf>,
}

impl EntryFilter {
    fn is_filtered(&self, path: &Path, is_dir: bool) -> bool {
        if self.excluded.contains(path) {
            log::trace!("Excluded path: {}", path.display());
            return true;
        }

        let Some(gi) = &self.gitignore else {
            return false;
        };

        // Gitignore matching expects paths relative to the root with
        // forward slashes, even on Windows.
        let relative_path = path.strip_prefix(&self.root).unwrap_or(path);
        let path_str = relative_path.to_string_lossy();
        let normalized_path = if cfg!(windows) {
            path_str.replace('\\', "/")
        } else {
            path_str.into_owned()
        };

        let ignored = gi.matched(normalized_path, is_dir).is_ignore();
        if ignored {
            log::trace!("Ignoring: {}", path.display());
        }
        ignored
    }
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Root directory to scan
    /// * `config` - Walker configuration options
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Root directory of this walker.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build gitignore matcher from config patterns and the root .gitignore.
    fn build_gitignore(&self) -> Option<Gitignore> {
        let mut builder = GitignoreBuilder::new(&self.root);

        if self.config.respect_gitignore {
            let gitignore_path = self.root.join(".gitignore");
            if gitignore_path.exists() {
                if let Some(e) = builder.add(&gitignore_path) {
                    log::warn!(
                        "Failed to load .gitignore from {}: {}",
                        gitignore_path.display(),
                        e
                    );
                } else {
                    log::debug!("Loaded .gitignore from {}", gitignore_path.display());
                }
            }
        }

        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if gitignore.is_empty() => None,
            Ok(gitignore) => Some(gitignore),
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Walk the directory tree, yielding absolute paths of regular files.
    ///
    /// Errors are yielded as [`ScanError::Walk`] values rather than stopping
    /// iteration.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dupscan::scanner::{Walker, WalkerConfig};
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new("."), WalkerConfig::default());
    /// let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
    /// println!("Found {} files", files.len());
    /// ```
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf, ScanError>> + '_ {
        let filter = Arc::new(EntryFilter {
            root: self.root.clone(),
            gitignore: self.build_gitignore(),
            excluded: self.config.exclude_paths.iter().cloned().collect(),
        });

        let parallelism = if self.config.threads > 1 {
            Parallelism::RayonNewPool(self.config.threads)
        } else {
            Parallelism::Serial
        };

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .skip_hidden(self.config.skip_hidden)
            .parallelism(parallelism)
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                children.retain(|child| match child {
                    Ok(entry) => !filter.is_filtered(&entry.path(), entry.file_type().is_dir()),
                    Err(_) => true,
                });
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir
            .into_iter()
            .take_while(move |_| {
                let stop = self.is_shutdown_requested();
                if stop {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                }
                !stop
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    let path = entry.path();
                    let file_type = entry.file_type();

                    if file_type.is_dir() {
                        return entry.read_children_error.as_ref().map(|error| {
                            log::warn!("Cannot read directory {}: {}", path.display(), error);
                            Err(ScanError::Walk {
                                path: path.clone(),
                                message: error.to_string(),
                            })
                        });
                    }

                    if file_type.is_symlink() {
                        log::trace!("Skipping symlink: {}", path.display());
                        return None;
                    }

                    if !file_type.is_file() {
                        log::trace!("Skipping special file: {}", path.display());
                        return None;
                    }

                    Some(Ok(path))
                }
                Err(error) => {
                    let path = error
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    log::warn!("Walker error for {}: {}", path.display(), error);
                    Some(Err(ScanError::Walk {
                        path,
                        message: error.to_string(),
                    }))
                }
            })
    }
}
