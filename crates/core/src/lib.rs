//! `padron-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the registration
//! portal crates (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod value_object;

pub use error::DomainError;
pub use id::{FormSessionId, Identifier};
pub use value_object::ValueObject;
