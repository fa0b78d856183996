//! Error types for towntune-clock

use thiserror::Error;

/// Result type for clock operations
pub type Result<T> = std::result::Result<T, ClockError>;

/// Errors raised while resolving regions and hours
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// The region label is not in the offset table
    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    /// An hour outside 0..=23
    #[error("Invalid hour {0}: expected a value between 0 and 23")]
    InvalidHour(i64),
}
