//! Error types for series-engine operations.
//!
//! Engine operations degrade silently (an unknown rule stops expansion, a
//! missing id is a no-op). Errors only surface at construction and parsing
//! boundaries.

use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid time range: end {end} is not after start {start}")]
    InvalidTimeRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("Invalid occurrence id: {0}")]
    InvalidOccurrenceId(String),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
