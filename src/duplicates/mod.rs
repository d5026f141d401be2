//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Running the walk → hash → group pipeline ([`DuplicateFinder`])
//! - Indexing processed files by digest ([`DuplicateGrouper`])
//! - Optional byte-for-byte confirmation of digest matches

pub mod finder;
pub mod groups;
pub mod verify;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use groups::{DuplicateGroup, DuplicateGrouper};
pub use verify::{verify_groups, Verification};
