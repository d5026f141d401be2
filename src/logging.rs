//! Logging setup on top of the `log` facade and `env_logger`.
//!
//! Level selection, highest priority first:
//!
//! 1. `RUST_LOG`, if set
//! 2. `--quiet` → errors only
//! 3. `-v` → debug, `-vv` → trace
//! 4. info
//!
//! Debug builds prefix a timestamp (and the module path when verbose);
//! release builds print `LEVEL message` only.

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Initialize logging from the CLI verbosity flags.
///
/// Only the first call in a process installs a logger. Later calls are
/// ignored, which lets tests drive [`run_app`](crate::run_app) repeatedly.
///
/// # Example
///
/// ```rust,no_run
/// use dupscan::logging::init_logging;
///
/// init_logging(1, false);
/// log::debug!("visible with -v");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) {
    let from_env = env::var("RUST_LOG").is_ok();

    let mut builder = Builder::new();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        return;
    }

    if from_env {
        log::debug!("Logging configured from RUST_LOG");
    } else {
        log::debug!("Logging initialized at level {}", current_level_name());
    }
}

/// Map CLI flags to a level filter. `quiet` wins over `verbose`.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let level = record.level();
            let style = buf.default_level_style(level);
            let timestamp = buf.timestamp_seconds();

            if verbose >= 1 {
                writeln!(
                    buf,
                    "{} {style}{:<5}{style:#} [{}] {}",
                    timestamp,
                    level,
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(
                    buf,
                    "{} {style}{:<5}{style:#} {}",
                    timestamp,
                    level,
                    record.args()
                )
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let style = buf.default_level_style(level);
            writeln!(buf, "{style}{:<5}{style:#} {}", level, record.args())
        });
    }
}

/// Name of the currently active maximum level.
#[must_use]
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
