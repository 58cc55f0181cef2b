//! Shared tracing setup for the padron binaries.

pub mod tracing;

pub use crate::tracing::{LogFormat, init, init_with};
