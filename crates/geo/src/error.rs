//! Errors of the geography engine.

use thiserror::Error;

use crate::level::GeoLevel;

/// Failure of a single option fetch.
///
/// Recoverable: it is recorded on the affected level only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("server responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not decode options: {0}")]
    Decode(String),

    /// The source has no catalog for this level.
    #[error("no catalog for level {0}")]
    Unavailable(GeoLevel),
}

/// Misuse of the chain API (as opposed to a failed fetch).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("level {0} is not part of this chain")]
    LevelNotInChain(GeoLevel),

    #[error("level {0} does not support manual entry")]
    NotALeafLevel(GeoLevel),

    #[error("level {level} is in {mode} mode")]
    EntryModeMismatch {
        level: GeoLevel,
        mode: &'static str,
    },

    #[error("invalid chain topology: {0}")]
    InvalidTopology(String),
}
