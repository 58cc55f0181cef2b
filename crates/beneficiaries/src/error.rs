use thiserror::Error;

use padron_geo::ChainError;

/// Failures at the boundary between stored records and the form engine.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A persisted location value has a shape that names no place.
    #[error("unrecognized location value: {0}")]
    UnrecognizedValue(String),

    #[error("geocoder precision {0} is outside 1..=10")]
    InvalidPrecision(u8),

    #[error("geocoder returned coordinates off the globe: ({lat}, {lon})")]
    InvalidCoordinates { lat: f64, lon: f64 },

    #[error("malformed record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Chain(#[from] ChainError),
}
