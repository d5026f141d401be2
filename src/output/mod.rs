//! Report output for duplicate scan results.
//!
//! The report is a CSV table (see [`csv::CsvOutput`]). This module also holds
//! the value formatters the report uses: human-readable sizes and UTC
//! timestamps.
//!
//! # Example
//!
//! ```no_run
//! use dupscan::duplicates::DuplicateFinder;
//! use dupscan::output::CsvOutput;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, _summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! CsvOutput::new(&groups)
//!     .write_to_path(Path::new("duplicates_report.csv"))
//!     .unwrap();
//! ```

pub mod csv;

use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};

pub use self::csv::{CsvOutput, CsvOutputError, REPORT_HEADERS};

/// Rendered in place of a timestamp the platform does not provide.
pub const UNAVAILABLE: &str = "unavailable";

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with two decimals and 1024-based units.
///
/// Sizes at or above 1024 TB stay in TB.
///
/// ```
/// use dupscan::output::format_size;
///
/// assert_eq!(format_size(0), "0.00 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(1 << 30), "1.00 GB");
/// ```
#[must_use]
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// Format a timestamp as UTC RFC 3339 with whole seconds.
///
/// ```
/// use dupscan::output::format_timestamp;
/// use std::time::{Duration, SystemTime};
///
/// let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1_706_702_400);
/// assert_eq!(format_timestamp(t), "2024-01-31T12:00:00Z");
/// ```
#[must_use]
pub fn format_timestamp(time: SystemTime) -> String {
    let datetime: DateTime<Utc> = time.into();
    datetime.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Format an optional timestamp, using [`UNAVAILABLE`] for `None`.
#[must_use]
pub fn format_optional_timestamp(time: Option<SystemTime>) -> String {
    time.map_or_else(|| UNAVAILABLE.to_string(), format_timestamp)
}
