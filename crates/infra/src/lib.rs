//! Infrastructure layer: backend configuration and the HTTP catalog source.

pub mod config;
pub mod http_source;

pub use config::{ApiConfig, ConfigError};
pub use http_source::{HttpReferenceSource, decode_rows};
