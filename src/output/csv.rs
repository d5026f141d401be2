//! CSV report writer.
//!
//! One row is written for every member of every duplicate group, original
//! first, with each group's rows contiguous. There are no separator rows;
//! an empty result produces the header row alone.
//!
//! # Columns
//!
//! - `File Path`: absolute path
//! - `File Name`: final path component
//! - `File Size`: human-readable size (see [`format_size`])
//! - `Created Date`: UTC RFC 3339, or `unavailable`
//! - `Modified Date`: UTC RFC 3339
//!
//! # Example
//!
//! ```no_run
//! use dupscan::duplicates::DuplicateFinder;
//! use dupscan::output::csv::CsvOutput;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, _) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! let output = CsvOutput::new(&groups);
//! output.write_to(std::io::stdout()).unwrap();
//! ```

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use super::{format_optional_timestamp, format_size, format_timestamp};
use crate::duplicates::DuplicateGroup;

/// Report header row, in column order.
pub const REPORT_HEADERS: [&str; 5] = [
    "File Path",
    "File Name",
    "File Size",
    "Created Date",
    "Modified Date",
];

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A single report row.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    path: &'a str,
    name: &'a str,
    size: String,
    created: String,
    modified: String,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    groups: &'a [DuplicateGroup],
    size_formatter: fn(u64) -> String,
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self {
            groups,
            size_formatter: format_size,
        }
    }

    /// Replace the size column formatter.
    ///
    /// ```
    /// use dupscan::output::CsvOutput;
    ///
    /// let raw = CsvOutput::new(&[]).with_size_formatter(|bytes| bytes.to_string());
    /// ```
    #[must_use]
    pub fn with_size_formatter(mut self, formatter: fn(u64) -> String) -> Self {
        self.size_formatter = formatter;
        self
    }

    /// Number of data rows the report will contain.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::len).sum()
    }

    /// Write the report to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        csv_writer.write_record(REPORT_HEADERS)?;

        for group in self.groups {
            for file in &group.files {
                let path = file.path.to_string_lossy();
                let row = CsvRow {
                    path: &path,
                    name: &file.name,
                    size: (self.size_formatter)(file.size),
                    created: format_optional_timestamp(file.created),
                    modified: format_timestamp(file.modified),
                };
                csv_writer.serialize(row)?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Create (or truncate) `path` and write the report into it.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError::Io` if the file cannot be created.
    pub fn write_to_path(&self, path: &Path) -> Result<(), CsvOutputError> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))?;
        log::debug!("Wrote {} report rows to {}", self.row_count(), path.display());
        Ok(())
    }

    /// Generate the report as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
