//! Ctrl+C handling for graceful shutdown.
//!
//! A single `Arc<AtomicBool>` is shared by the walker, the hasher and the
//! finder. Pressing Ctrl+C sets it; every loop that checks it stops at the
//! next file (or chunk) boundary and the scan returns
//! [`FinderError::Interrupted`](crate::duplicates::FinderError::Interrupted).
//!
//! ```rust,no_run
//! use dupscan::duplicates::FinderConfig;
//! use dupscan::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Process exit code after an interrupt (128 + SIGINT).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Owner of the shared shutdown flag.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether Ctrl+C was pressed or [`request_shutdown`](Self::request_shutdown) called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Raise the flag without a signal.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag to hand to [`FinderConfig::with_shutdown_flag`](crate::duplicates::FinderConfig::with_shutdown_flag).
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Lower the flag again.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler and return its shutdown handle.
///
/// `ctrlc` accepts one handler per process. Later calls return the
/// already-installed handler with its flag reset, so repeated runs inside
/// one process (tests calling [`run_app`](crate::run_app)) each start clean.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if the OS refuses the handler and
/// none was installed before.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\nInterrupted. Cleaning up...");
        let _ = stderr.flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => {
            // A concurrent caller may have won the race; use whichever is stored
            let stored = GLOBAL_HANDLER.get_or_init(|| handler.clone());
            Ok(stored.clone())
        }
        Err(ctrlc::Error::MultipleHandlers) => {
            log::debug!("Ctrl+C handler already registered, using unhooked handler");
            let stored = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new);
            stored.reset();
            Ok(stored.clone())
        }
        Err(e) => Err(SignalError::InstallFailed(e)),
    }
}
