//! dupscan - content-hash duplicate file scanner
//!
//! Walks a directory tree, hashes every regular file, groups files with the
//! same digest, and writes the groups with two or more members to a CSV
//! report.
//!
//! The library exposes each stage on its own ([`scanner`], [`duplicates`],
//! [`output`]); [`run_app`] wires them together for the binary.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use yansi::Paint;

use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderError, ScanSummary};
use crate::error::ExitCode;
use crate::output::{format_size, CsvOutput};
use crate::progress::Progress;

/// Run one scan as described by `cli` and write the report.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the root is missing
/// or not a directory, the scan is interrupted, or the report cannot be
/// written. [`ExitCode::for_error`] maps these to process exit codes.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let mut config =
        Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.merge_cli(&cli);
    log::debug!("Effective configuration: {:?}", config);

    let root = resolve_root(cli.path.as_deref())?;
    let report = report_path(&root, cli.output.as_deref(), &config.report_name)?;
    log::debug!("Report will be written to {}", report.display());

    let handler = signal::install_handler().context("Failed to install Ctrl+C handler")?;

    let walker_config = config.walker_config().with_excluded_path(report.clone());
    let finder_config = config
        .finder_config()
        .with_walker_config(walker_config)
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(Arc::new(Progress::new(cli.quiet)));

    let finder = DuplicateFinder::new(finder_config);
    let (groups, summary) = finder.find_duplicates(&root)?;

    CsvOutput::new(&groups)
        .write_to_path(&report)
        .with_context(|| format!("Failed to write report to {}", report.display()))?;
    log::info!("Report written to {}", report.display());

    if !cli.quiet {
        print_summary(&summary, &report);
    }

    Ok(ExitCode::Success)
}

/// Validate the scan root and make it absolute.
///
/// Defaults to the current working directory.
fn resolve_root(path: Option<&Path>) -> anyhow::Result<PathBuf> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    if !path.exists() {
        return Err(FinderError::PathNotFound(path).into());
    }
    if !path.is_dir() {
        return Err(FinderError::NotADirectory(path).into());
    }

    path.canonicalize()
        .with_context(|| format!("Failed to resolve {}", path.display()))
}

/// Absolute location of the report.
///
/// An explicit output path is resolved against the working directory, and
/// its parent is canonicalized so it compares equal to the path the walker
/// sees. Without one the report goes into the scan root.
fn report_path(root: &Path, output: Option<&Path>, report_name: &str) -> anyhow::Result<PathBuf> {
    let Some(output) = output else {
        return Ok(root.join(report_name));
    };

    let absolute = if output.is_absolute() {
        output.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to determine current directory")?
            .join(output)
    };

    let canonical = match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|parent| parent.join(name))
            .unwrap_or(absolute),
        _ => absolute,
    };
    Ok(canonical)
}

fn print_summary(summary: &ScanSummary, report: &Path) {
    println!(
        "{} Scanned {} files ({}) in {:.2?}",
        "✓".green().bold(),
        summary.processed_files,
        format_size(summary.total_size),
        summary.scan_duration
    );

    if summary.duplicate_groups == 0 {
        println!("  No duplicates found");
    } else {
        println!(
            "  {} duplicate groups, {} duplicate files, {} reclaimable",
            summary.duplicate_groups.bold(),
            summary.duplicate_files.bold(),
            summary.reclaimable_display().bold()
        );
    }

    if summary.verify_collisions > 0 {
        println!(
            "  {} digest collisions split by verification",
            summary.verify_collisions.yellow()
        );
    }

    if summary.skipped() > 0 {
        eprintln!(
            "{} Skipped {} entries:",
            "!".yellow().bold(),
            summary.skipped()
        );
        for (reason, count) in summary.skipped_by_reason() {
            eprintln!("  {:>6}  {}", count, reason);
        }
    }

    println!("  Report: {}", report.display().bold());
}
