//! Hierarchical geography selection for beneficiary address forms.
//!
//! A [`DependencyChain`] holds one address context (birthplace, residence):
//! an ordered set of [`GeoLevel`]s where the options of each level depend on
//! the selection of its parent. The chain itself does no IO; it hands out
//! [`FetchRequest`]s and accepts their results through
//! [`DependencyChain::commit`]. [`ChainDriver`] performs those fetches against
//! a [`ReferenceDataSource`].

pub mod catalog;
pub mod chain;
pub mod driver;
pub mod entity;
pub mod error;
pub mod leaf;
pub mod level;
pub mod notice;
pub mod seed;
pub mod source;
pub mod state;
pub mod topology;

pub use catalog::InMemoryCatalog;
pub use chain::{AppliedOptions, ChainConfig, CommitOutcome, DependencyChain, LevelView};
pub use driver::{ChainDriver, DriveReport};
pub use entity::GeoEntity;
pub use error::{ChainError, FetchError};
pub use leaf::{EntryMode, FieldValue, LeafEntry};
pub use level::GeoLevel;
pub use notice::ChainNotice;
pub use seed::ChainSeed;
pub use source::{FetchRequest, ReferenceDataSource, fetch_gated};
pub use state::{LevelState, LevelStatus, Selection, Verification};
pub use topology::ChainTopology;
