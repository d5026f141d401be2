//! Command-line interface definitions for dupscan.
//!
//! Every scan option is optional on the command line so that unset flags
//! fall through to the config file and environment (see [`crate::config`]).
//!
//! # Example
//!
//! ```bash
//! # Scan the current directory, report to ./duplicates_report.csv
//! dupscan
//!
//! # Scan with SHA-256 on four threads, report elsewhere
//! dupscan ~/Photos -a sha256 -j 4 -o /tmp/photos.csv
//!
//! # Skip build output and confirm matches byte by byte
//! dupscan . -i 'target/' -i '*.o' --verify
//! ```

use clap::Parser;
use std::path::PathBuf;

use crate::scanner::HashAlgorithm;

/// Find files with identical content and report them as CSV.
///
/// dupscan walks a directory tree, hashes every regular file, and writes
/// each group of identical files to a CSV report.
#[derive(Debug, Parser)]
#[command(name = "dupscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Directory to scan (default: current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Report file (default: <PATH>/duplicates_report.csv)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Content digest algorithm
    #[arg(short, long, value_enum, value_name = "ALG")]
    pub algorithm: Option<HashAlgorithm>,

    /// Read chunk size (e.g. 8192, 64KiB, 1MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_chunk_size)]
    pub chunk_size: Option<usize>,

    /// Worker threads for hashing (1 = sequential)
    #[arg(short = 'j', long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub io_threads: Option<u16>,

    /// Confirm digest matches with a byte-by-byte comparison
    #[arg(long, overrides_with = "no_verify")]
    pub verify: bool,

    /// Turn off verification enabled in the config file
    #[arg(long, overrides_with = "verify")]
    pub no_verify: bool,

    /// Skip hidden files and directories
    #[arg(long, overrides_with = "no_skip_hidden")]
    pub skip_hidden: bool,

    /// Include hidden files even if the config file skips them
    #[arg(long, overrides_with = "skip_hidden")]
    pub no_skip_hidden: bool,

    /// Ignore paths matching a gitignore-style pattern (repeatable)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Honour the .gitignore file at the scan root
    #[arg(long, overrides_with = "no_gitignore")]
    pub gitignore: bool,

    /// Ignore the .gitignore file even if the config file honours it
    #[arg(long, overrides_with = "gitignore")]
    pub no_gitignore: bool,

    /// Load settings from this TOML file instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

/// Parse a human-readable size string into bytes.
///
/// Supports decimal (KB, MB, GB, TB) and binary (KiB, MiB, GiB, TiB)
/// suffixes, case-insensitive. A bare number is a byte count.
///
/// # Examples
///
/// ```
/// use dupscan::cli::parse_size;
///
/// assert_eq!(parse_size("8192").unwrap(), 8192);
/// assert_eq!(parse_size("8KiB").unwrap(), 8192);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// ```
///
/// # Errors
///
/// Returns an error for empty input, a malformed number, a negative value
/// or an unknown suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}

/// Parse a read chunk size: a positive size that fits in memory.
///
/// # Errors
///
/// Everything [`parse_size`] rejects, plus zero and sizes above 1 GiB.
pub fn parse_chunk_size(s: &str) -> Result<usize, String> {
    const MAX_CHUNK: u64 = 1 << 30;

    let bytes = parse_size(s)?;
    if bytes == 0 {
        return Err("Chunk size must be at least 1 byte".to_string());
    }
    if bytes > MAX_CHUNK {
        return Err("Chunk size cannot exceed 1GiB".to_string());
    }
    usize::try_from(bytes).map_err(|_| format!("Chunk size too large: {bytes}"))
}
