//! Per-level state: current selection plus the option set that justifies it.

use serde::{Deserialize, Serialize};

use padron_core::Identifier;

use crate::entity::GeoEntity;
use crate::error::FetchError;
use crate::level::GeoLevel;

/// How far a selection has been checked against the level's options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    /// Present in the currently loaded options.
    Confirmed,
    /// Options for the current parent have not arrived yet.
    Provisional,
    /// Options arrived and do not contain the id.
    Orphaned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub id: Identifier,
    pub verification: Verification,
}

/// Lifecycle of the level's option set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelStatus {
    /// Nothing requested (parent unset, or cleared by a cascade).
    Idle,
    Loading,
    Loaded,
    /// Last fetch failed; options are empty until a retry succeeds.
    Failed(FetchError),
}

/// Selection and options of one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelState {
    level: GeoLevel,
    selection: Option<Selection>,
    options: Vec<GeoEntity>,
    status: LevelStatus,
    generation: u64,
}

impl LevelState {
    pub fn new(level: GeoLevel) -> Self {
        Self {
            level,
            selection: None,
            options: Vec::new(),
            status: LevelStatus::Idle,
            generation: 0,
        }
    }

    pub fn level(&self) -> GeoLevel {
        self.level
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn selected_id(&self) -> Option<&Identifier> {
        self.selection.as_ref().map(|s| &s.id)
    }

    /// The selection as it should be rendered: unresolved ids show as blank.
    pub fn displayed_id(&self) -> Option<&Identifier> {
        self.selection
            .as_ref()
            .filter(|s| s.verification == Verification::Confirmed)
            .map(|s| &s.id)
    }

    pub fn options(&self) -> &[GeoEntity] {
        &self.options
    }

    pub fn status(&self) -> &LevelStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == LevelStatus::Loading
    }

    pub fn error(&self) -> Option<&FetchError> {
        match &self.status {
            LevelStatus::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Generation of the latest fetch issued for (or reset applied to) this level.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn find_option(&self, id: &Identifier) -> Option<&GeoEntity> {
        self.options.iter().find(|o| &o.id == id)
    }

    /// The selected option, when it is confirmed against the loaded options.
    /// Selected id that the loaded options do not contain.
    pub fn orphaned_id(&self) -> Option<&Identifier> {
        self.selection
            .as_ref()
            .filter(|s| s.verification == Verification::Orphaned)
            .map(|s| &s.id)
    }

    pub fn selected_entity(&self) -> Option<&GeoEntity> {
        self.displayed_id().and_then(|id| self.find_option(id))
    }

    fn verify(&self, id: &Identifier) -> Verification {
        match self.status {
            LevelStatus::Loaded if self.find_option(id).is_some() => Verification::Confirmed,
            LevelStatus::Loaded => Verification::Orphaned,
            _ => Verification::Provisional,
        }
    }

    pub(crate) fn select(&mut self, id: Option<Identifier>) {
        self.selection = id.map(|id| Selection {
            verification: self.verify(&id),
            id,
        });
    }

    /// Cascading reset: drop selection and options, invalidate in-flight fetches.
    pub(crate) fn reset(&mut self) {
        self.selection = None;
        self.options.clear();
        self.status = LevelStatus::Idle;
        self.generation += 1;
    }

    /// Start a fetch; returns the generation the result must carry to commit.
    pub(crate) fn begin_fetch(&mut self) -> u64 {
        self.generation += 1;
        self.options.clear();
        self.status = LevelStatus::Loading;
        self.generation
    }

    /// Whether a result stamped with `generation` may still commit.
    pub(crate) fn accepts(&self, generation: u64) -> bool {
        self.is_loading() && self.generation == generation
    }

    /// Install fetched options and re-verify the selection against them.
    ///
    /// Returns the selected id if it turned out to be absent from the options.
    pub(crate) fn load(&mut self, options: Vec<GeoEntity>) -> Option<Identifier> {
        self.options = options;
        self.status = LevelStatus::Loaded;

        let id = self.selection.as_ref()?.id.clone();
        let verification = self.verify(&id);
        if let Some(selection) = self.selection.as_mut() {
            selection.verification = verification;
        }
        (verification == Verification::Orphaned).then_some(id)
    }

    pub(crate) fn fail(&mut self, error: FetchError) {
        self.options.clear();
        self.status = LevelStatus::Failed(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_before_options_is_provisional() {
        let mut state = LevelState::new(GeoLevel::Department);
        state.select(Some(Identifier::Numeric(5)));

        assert_eq!(
            state.selection().map(|s| s.verification),
            Some(Verification::Provisional)
        );
        assert_eq!(state.displayed_id(), None);
    }

    #[test]
    fn loading_options_confirms_or_orphans_the_selection() {
        let mut state = LevelState::new(GeoLevel::Department);
        state.select(Some(Identifier::Numeric(5)));
        state.begin_fetch();
        let orphan = state.load(vec![GeoEntity::new(5, "San Fernando")]);

        assert_eq!(orphan, None);
        assert_eq!(state.selected_entity().map(|e| e.name.as_str()), Some("San Fernando"));

        state.begin_fetch();
        let orphan = state.load(vec![GeoEntity::new(6, "Libertad")]);
        assert_eq!(orphan, Some(Identifier::Numeric(5)));
        assert_eq!(state.displayed_id(), None);
        assert_eq!(state.selected_id(), Some(&Identifier::Numeric(5)));
    }

    #[test]
    fn reset_invalidates_the_pending_generation() {
        let mut state = LevelState::new(GeoLevel::Locality);
        let issued = state.begin_fetch();
        assert!(state.accepts(issued));

        state.reset();
        assert!(!state.accepts(issued));
        assert_eq!(state.status(), &LevelStatus::Idle);
    }

    #[test]
    fn failure_empties_options_and_keeps_the_error() {
        let mut state = LevelState::new(GeoLevel::Street);
        state.begin_fetch();
        state.fail(FetchError::Transport("connection refused".into()));

        assert!(state.options().is_empty());
        assert!(matches!(state.error(), Some(FetchError::Transport(_))));
        assert!(!state.is_loading());
    }
}
