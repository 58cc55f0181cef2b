//! Notices raised while driving a chain.

use chrono::{DateTime, Utc};
use serde::Serialize;

use padron_core::Identifier;
use padron_events::Event;

use crate::level::GeoLevel;

/// Something the surrounding UI may want to surface (a toast, a log line).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainNotice {
    /// Options could not be fetched; the level is empty until retried.
    FetchFailed {
        chain: String,
        level: GeoLevel,
        parent: Option<Identifier>,
        message: String,
        at: DateTime<Utc>,
    },
    /// A response arrived after its request had been superseded.
    StaleDiscarded {
        chain: String,
        level: GeoLevel,
        generation: u64,
        at: DateTime<Utc>,
    },
    /// A selected (usually persisted) id is absent from the fetched options.
    SeedUnresolved {
        chain: String,
        level: GeoLevel,
        id: Identifier,
        at: DateTime<Utc>,
    },
    /// The only option of a level was selected without user input.
    AutoSelected {
        chain: String,
        level: GeoLevel,
        id: Identifier,
        at: DateTime<Utc>,
    },
}

impl ChainNotice {
    pub fn level(&self) -> GeoLevel {
        match self {
            ChainNotice::FetchFailed { level, .. }
            | ChainNotice::StaleDiscarded { level, .. }
            | ChainNotice::SeedUnresolved { level, .. }
            | ChainNotice::AutoSelected { level, .. } => *level,
        }
    }

    pub fn chain(&self) -> &str {
        match self {
            ChainNotice::FetchFailed { chain, .. }
            | ChainNotice::StaleDiscarded { chain, .. }
            | ChainNotice::SeedUnresolved { chain, .. }
            | ChainNotice::AutoSelected { chain, .. } => chain,
        }
    }
}

impl Event for ChainNotice {
    fn event_type(&self) -> &'static str {
        match self {
            ChainNotice::FetchFailed { .. } => "geo.level.fetch_failed",
            ChainNotice::StaleDiscarded { .. } => "geo.level.stale_discarded",
            ChainNotice::SeedUnresolved { .. } => "geo.level.seed_unresolved",
            ChainNotice::AutoSelected { .. } => "geo.level.auto_selected",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ChainNotice::FetchFailed { at, .. }
            | ChainNotice::StaleDiscarded { at, .. }
            | ChainNotice::SeedUnresolved { at, .. }
            | ChainNotice::AutoSelected { at, .. } => *at,
        }
    }
}
