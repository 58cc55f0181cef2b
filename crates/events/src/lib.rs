//! Event plumbing: the `Event` contract and a pub/sub bus.
//!
//! The geography engine raises notices (failed fetches, discarded stale
//! responses, unresolved persisted values) through this crate so the
//! surrounding UI can surface them without the engine knowing how.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
