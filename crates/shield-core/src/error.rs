//! Error types for the shield engine
//!
//! The engine has no I/O, so every variant is a caller contract violation
//! that is reported at construction time instead of being clamped away.

use thiserror::Error;

/// Core shield errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShieldError {
    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    #[error("Invalid region table: {0}")]
    InvalidRegionTable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown stage: {0}")]
    UnknownStage(String),
}

/// Result type for shield operations
pub type ShieldResult<T> = Result<T, ShieldError>;
