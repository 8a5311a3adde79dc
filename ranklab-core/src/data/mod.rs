//! Input-side data handling: chronological grouping and quality checks.
//!
//! Acquisition and persistence of bars live outside this crate; everything
//! here works on an in-memory bar set.

pub mod timeline;
pub mod validate;

pub use timeline::BarTimeline;
pub use validate::{validate_bars, Severity, ValidationIssue, ValidationReport};

use crate::domain::Timestamp;
use thiserror::Error;

/// Structured error types for bar-set input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("duplicate bar for '{symbol}' on {timestamp}")]
    DuplicateBar { timestamp: Timestamp, symbol: String },

    #[error("bar set failed validation: {0}")]
    Validation(String),

    #[error("invalid engine input: {0}")]
    InvalidInput(String),
}
