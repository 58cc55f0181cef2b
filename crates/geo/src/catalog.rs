//! In-memory reference catalog for tests and offline use.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use padron_core::Identifier;

use crate::entity::GeoEntity;
use crate::error::FetchError;
use crate::level::GeoLevel;
use crate::source::ReferenceDataSource;

type CatalogKey = (GeoLevel, Option<Identifier>);

/// Fixed option lists keyed by `(level, parent)`.
///
/// Unknown keys yield an empty list. Every call is recorded so callers can
/// assert which fetches were (or were not) issued.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    rows: HashMap<CatalogKey, Vec<GeoEntity>>,
    failing: HashSet<CatalogKey>,
    calls: Mutex<Vec<CatalogKey>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options of a root level.
    pub fn with_roots(mut self, level: GeoLevel, rows: Vec<GeoEntity>) -> Self {
        self.rows.insert((level, None), rows);
        self
    }

    /// Options of `level` under `parent`. Rows are stamped with the parent id.
    pub fn with_children(
        mut self,
        level: GeoLevel,
        parent: impl Into<Identifier>,
        rows: Vec<GeoEntity>,
    ) -> Self {
        let parent = parent.into();
        let rows = rows
            .into_iter()
            .map(|r| r.with_parent(parent.clone()))
            .collect();
        self.rows.insert((level, Some(parent)), rows);
        self
    }

    /// Make every fetch of `level` under `parent` fail.
    pub fn failing(mut self, level: GeoLevel, parent: impl Into<Identifier>) -> Self {
        self.failing.insert((level, Some(parent.into())));
        self
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<(GeoLevel, Option<Identifier>)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_for(&self, level: GeoLevel) -> Vec<Option<Identifier>> {
        self.calls()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, p)| p)
            .collect()
    }
}

#[async_trait::async_trait]
impl ReferenceDataSource for InMemoryCatalog {
    async fn fetch_options(
        &self,
        level: GeoLevel,
        parent: Option<&Identifier>,
    ) -> Result<Vec<GeoEntity>, FetchError> {
        let key = (level, parent.cloned());
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(key.clone());
        }

        if self.failing.contains(&key) {
            return Err(FetchError::Transport(format!(
                "catalog unavailable for {level} under {}",
                parent.map(ToString::to_string).unwrap_or_default()
            )));
        }

        Ok(self.rows.get(&key).cloned().unwrap_or_default())
    }
}
