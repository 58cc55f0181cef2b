//! Dependent selection over a chain of geographic levels.
//!
//! The chain is a pure state machine: transitions return the fetches they
//! need, and fetch results come back through [`DependencyChain::commit`].
//! Nothing here performs IO or awaits, so a UI event loop can interleave user
//! input with in-flight fetches freely. [`crate::ChainDriver`] is the async
//! loop that performs the fetches for callers that do not need to interleave.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, warn};

use padron_core::Identifier;

use crate::entity::GeoEntity;
use crate::error::{ChainError, FetchError};
use crate::leaf::{EntryMode, FieldValue, LeafEntry, matching_option};
use crate::level::GeoLevel;
use crate::source::FetchRequest;
use crate::state::LevelState;
use crate::topology::ChainTopology;

/// Per-chain behavior switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    auto_select_single: BTreeSet<GeoLevel>,
    manual_entry: BTreeSet<GeoLevel>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            auto_select_single: BTreeSet::from([GeoLevel::PostalCode]),
            manual_entry: BTreeSet::from([GeoLevel::Neighborhood, GeoLevel::Street]),
        }
    }
}

impl ChainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the only option of `level` without waiting for the user.
    pub fn with_auto_select(mut self, level: GeoLevel) -> Self {
        self.auto_select_single.insert(level);
        self
    }

    pub fn without_auto_select(mut self, level: GeoLevel) -> Self {
        self.auto_select_single.remove(&level);
        self
    }

    pub fn without_manual_entry(mut self, level: GeoLevel) -> Self {
        self.manual_entry.remove(&level);
        self
    }

    pub fn auto_selects(&self, level: GeoLevel) -> bool {
        self.auto_select_single.contains(&level)
    }

    pub fn allows_manual_entry(&self, level: GeoLevel) -> bool {
        level.supports_manual_entry() && self.manual_entry.contains(&level)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    state: LevelState,
    leaf: Option<LeafEntry>,
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedOptions {
    pub level: GeoLevel,
    pub option_count: usize,
    /// Set when the level had a single option and auto-selection applies.
    pub auto_selected: Option<Identifier>,
    /// Selected id that is absent from the options just installed.
    pub unresolved: Option<Identifier>,
    /// Entry mode decided for a leaf level by value detection.
    pub detected_mode: Option<EntryMode>,
    /// Fetches triggered by an auto-selection.
    pub follow_ups: Vec<FetchRequest>,
}

/// What [`DependencyChain::commit`] did with a fetch result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied(AppliedOptions),
    /// The fetch failed; the level is empty and shows the error.
    Failed { level: GeoLevel, error: FetchError },
    /// The request was superseded or its level cleared; nothing changed.
    Stale { level: GeoLevel, generation: u64 },
}

/// Read-only view of one level for the rendering layer.
#[derive(Debug, Clone, Serialize)]
pub struct LevelView<'a> {
    pub level: GeoLevel,
    pub selected_id: Option<&'a Identifier>,
    pub options: &'a [GeoEntity],
    pub is_loading: bool,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_mode: Option<EntryMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_text: Option<&'a str>,
}

/// Ordered level states plus the parent relation between them.
///
/// Invariants:
/// - a level other than the root has options only while its parent is selected;
/// - changing a selection empties every descendant level;
/// - a fetch result commits only if it belongs to the level's latest request.
#[derive(Debug, Clone)]
pub struct DependencyChain {
    label: String,
    topology: ChainTopology,
    config: ChainConfig,
    slots: Vec<Slot>,
}

impl DependencyChain {
    pub fn new(label: impl Into<String>, topology: ChainTopology, config: ChainConfig) -> Self {
        let slots = topology
            .levels()
            .map(|level| Slot {
                state: LevelState::new(level),
                leaf: config
                    .allows_manual_entry(level)
                    .then(LeafEntry::default),
            })
            .collect();

        Self {
            label: label.into(),
            topology,
            config,
            slots,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn topology(&self) -> &ChainTopology {
        &self.topology
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn levels(&self) -> impl Iterator<Item = &LevelState> {
        self.slots.iter().map(|s| &s.state)
    }

    pub fn level(&self, level: GeoLevel) -> Result<&LevelState, ChainError> {
        let idx = self.index_of(level)?;
        Ok(&self.slots[idx].state)
    }

    pub fn selected_id(&self, level: GeoLevel) -> Option<&Identifier> {
        let idx = self.index_of(level).ok()?;
        self.slots[idx].state.selected_id()
    }

    /// No level has a fetch in flight.
    pub fn is_settled(&self) -> bool {
        self.slots.iter().all(|s| !s.state.is_loading())
    }

    pub fn leaf(&self, level: GeoLevel) -> Result<&LeafEntry, ChainError> {
        let idx = self.index_of(level)?;
        self.slots[idx]
            .leaf
            .as_ref()
            .ok_or(ChainError::NotALeafLevel(level))
    }

    pub fn entry_mode(&self, level: GeoLevel) -> Result<EntryMode, ChainError> {
        self.leaf(level).map(LeafEntry::mode)
    }

    /// The value the form holds for `level`: the selected id, or the typed
    /// text of a leaf in manual mode. A persisted leaf value still waiting for
    /// detection is reported as it was stored, an id if it reads as one.
    pub fn field_value(&self, level: GeoLevel) -> Option<FieldValue> {
        let idx = self.index_of(level).ok()?;
        let slot = &self.slots[idx];

        if let Some(leaf) = &slot.leaf {
            if let Some(value) = leaf.pending_value() {
                return Some(value);
            }
            if leaf.mode() == EntryMode::Manual {
                let text = leaf.manual_text().trim();
                return (!text.is_empty()).then(|| FieldValue::Typed(text.to_string()));
            }
        }

        slot.state.selected_id().cloned().map(FieldValue::Selected)
    }

    pub fn views(&self) -> Vec<LevelView<'_>> {
        self.slots
            .iter()
            .map(|slot| LevelView {
                level: slot.state.level(),
                selected_id: slot.state.displayed_id(),
                options: slot.state.options(),
                is_loading: slot.state.is_loading(),
                error: slot.state.error().map(ToString::to_string),
                entry_mode: slot.leaf.as_ref().map(LeafEntry::mode),
                manual_text: slot
                    .leaf
                    .as_ref()
                    .filter(|l| l.mode() == EntryMode::Manual)
                    .map(LeafEntry::manual_text),
            })
            .collect()
    }

    /// Request the root level's options. The root is fetched without a parent.
    pub fn load_root(&mut self) -> FetchRequest {
        let level = self.topology.root();
        self.issue(0, level, None)
    }

    /// Select `id` at `level` (or clear it with `None`).
    ///
    /// Every descendant level loses its selection and options. A non-empty
    /// selection requests the options of each direct child level. Selecting the
    /// value already held changes nothing and requests nothing.
    /// A leaf still holding an undecided persisted value always counts as
    /// changed, so clearing it drops that value.
    pub fn set_selected(
        &mut self,
        level: GeoLevel,
        id: Option<Identifier>,
    ) -> Result<Vec<FetchRequest>, ChainError> {
        let idx = self.index_of(level)?;
        let id = id.filter(|id| !id.is_blank());

        if let Some(leaf) = &self.slots[idx].leaf {
            if leaf.mode() == EntryMode::Manual {
                return Err(ChainError::EntryModeMismatch {
                    level,
                    mode: EntryMode::Manual.as_str(),
                });
            }
        }

        let pending = self.slots[idx]
            .leaf
            .as_ref()
            .is_some_and(|l| l.pending().is_some());
        if self.slots[idx].state.selected_id() == id.as_ref() && !pending {
            debug!(chain = %self.label, %level, "selection unchanged");
            return Ok(Vec::new());
        }

        let slot = &mut self.slots[idx];
        slot.state.select(id.clone());
        if let Some(leaf) = slot.leaf.as_mut() {
            leaf.user_selected();
        }
        debug!(chain = %self.label, %level, id = ?id, "selection changed");

        self.reset_descendants(level);

        Ok(match id {
            Some(id) => self.issue_children(level, &id),
            None => Vec::new(),
        })
    }

    /// Apply the result of `request`.
    ///
    /// Results of superseded requests, or of requests for a level that has
    /// since been cleared, are discarded.
    pub fn commit(
        &mut self,
        request: &FetchRequest,
        result: Result<Vec<GeoEntity>, FetchError>,
    ) -> CommitOutcome {
        let level = request.level;
        let stale = CommitOutcome::Stale {
            level,
            generation: request.generation,
        };
        let Ok(idx) = self.index_of(level) else {
            return stale;
        };
        if !self.slots[idx].state.accepts(request.generation) {
            debug!(
                chain = %self.label,
                %level,
                generation = request.generation,
                current = self.slots[idx].state.generation(),
                "discarding superseded response"
            );
            return stale;
        }

        let options = match result {
            Ok(options) => options,
            Err(error) => {
                warn!(chain = %self.label, %level, parent = ?request.parent, %error, "option fetch failed");
                self.slots[idx].state.fail(error.clone());
                self.detect_leaf(idx);
                return CommitOutcome::Failed { level, error };
            }
        };

        let option_count = options.len();
        self.slots[idx].state.load(options);
        let detected_mode = self.detect_leaf(idx);
        let unresolved = self.slots[idx].state.orphaned_id().cloned();
        if let Some(id) = &unresolved {
            warn!(chain = %self.label, %level, %id, "selection not among fetched options");
        }

        let auto_selected = self.single_option_to_select(idx);
        let follow_ups = match &auto_selected {
            Some(id) => {
                debug!(chain = %self.label, %level, %id, "selecting the only option");
                self.slots[idx].state.select(Some(id.clone()));
                self.issue_children(level, id)
            }
            None => Vec::new(),
        };

        CommitOutcome::Applied(AppliedOptions {
            level,
            option_count,
            auto_selected,
            unresolved,
            detected_mode,
            follow_ups,
        })
    }

    /// Request `level`'s options again (retry after a failure).
    ///
    /// Returns `None` when the level's parent is unset: there is nothing to
    /// list under an empty parent.
    pub fn reload(&mut self, level: GeoLevel) -> Result<Option<FetchRequest>, ChainError> {
        let idx = self.index_of(level)?;
        let parent = match self.topology.parent_of(level) {
            None => return Ok(Some(self.issue(idx, level, None))),
            Some(parent) => self.selected_id(parent).cloned(),
        };

        Ok(parent.map(|parent| self.issue(idx, level, Some(parent))))
    }

    /// Switch a leaf level between list and manual entry.
    pub fn toggle_entry_mode(&mut self, level: GeoLevel) -> Result<EntryMode, ChainError> {
        let mode = self.entry_mode(level)?.toggled();
        self.set_entry_mode(level, mode)?;
        Ok(mode)
    }

    /// Put a leaf level in `mode`.
    ///
    /// The list selection and the manual text are kept in separate slots:
    /// switching modes never copies one into the other, and only the slot of
    /// the active mode is reported by [`DependencyChain::field_value`].
    pub fn set_entry_mode(&mut self, level: GeoLevel, mode: EntryMode) -> Result<(), ChainError> {
        let idx = self.index_of(level)?;
        if self.slots[idx].leaf.is_none() {
            return Err(ChainError::NotALeafLevel(level));
        }
        // A persisted value still awaiting options lands in its own slot first.
        self.detect_leaf(idx);

        if let Some(leaf) = self.slots[idx].leaf.as_mut() {
            leaf.set_mode(mode);
        }
        debug!(chain = %self.label, %level, mode = mode.as_str(), "entry mode set");
        Ok(())
    }

    /// Type the value of a leaf level in manual mode.
    pub fn set_manual_text(&mut self, level: GeoLevel, text: impl Into<String>) -> Result<(), ChainError> {
        let idx = self.index_of(level)?;
        let leaf = self.slots[idx]
            .leaf
            .as_mut()
            .ok_or(ChainError::NotALeafLevel(level))?;
        if leaf.mode() != EntryMode::Manual {
            return Err(ChainError::EntryModeMismatch {
                level,
                mode: EntryMode::List.as_str(),
            });
        }
        leaf.set_text(text.into());
        Ok(())
    }

    pub(crate) fn index_of(&self, level: GeoLevel) -> Result<usize, ChainError> {
        self.topology
            .index_of(level)
            .ok_or(ChainError::LevelNotInChain(level))
    }

    pub(crate) fn issue(&mut self, idx: usize, level: GeoLevel, parent: Option<Identifier>) -> FetchRequest {
        let generation = self.slots[idx].state.begin_fetch();
        let root = self.topology.parent_of(level).is_none();
        debug!(chain = %self.label, %level, parent = ?parent, generation, "fetch issued");
        FetchRequest {
            level,
            parent,
            generation,
            root,
        }
    }

    pub(crate) fn reset_all(&mut self) {
        for slot in &mut self.slots {
            slot.state.reset();
            if let Some(leaf) = slot.leaf.as_mut() {
                leaf.reset();
            }
        }
    }

    pub(crate) fn seed_slot(&mut self, idx: usize, value: &Identifier) {
        let slot = &mut self.slots[idx];
        match slot.leaf.as_mut() {
            Some(leaf) => leaf.seed(value.to_string()),
            None => slot.state.select(Some(value.clone())),
        }
    }

    fn reset_descendants(&mut self, level: GeoLevel) {
        for descendant in self.topology.descendants_of(level) {
            let Some(idx) = self.topology.index_of(descendant) else {
                continue;
            };
            let slot = &mut self.slots[idx];
            slot.state.reset();
            if let Some(leaf) = slot.leaf.as_mut() {
                leaf.reset();
            }
        }
    }

    fn issue_children(&mut self, level: GeoLevel, parent: &Identifier) -> Vec<FetchRequest> {
        let mut requests = Vec::new();
        for child in self.topology.children_of(level) {
            if let Some(idx) = self.topology.index_of(child) {
                requests.push(self.issue(idx, child, Some(parent.clone())));
            }
        }
        requests
    }

    fn single_option_to_select(&self, idx: usize) -> Option<Identifier> {
        let slot = &self.slots[idx];
        if !self.config.auto_selects(slot.state.level()) || slot.state.selected_id().is_some() {
            return None;
        }
        if slot.leaf.as_ref().is_some_and(|l| l.mode() == EntryMode::Manual) {
            return None;
        }
        match slot.state.options() {
            [only] => Some(only.id.clone()),
            _ => None,
        }
    }

    /// Decide the mode of a leaf's pending persisted value.
    ///
    /// Runs once per seeded value. Only text becomes typed text: ids stay list
    /// selections, and later option sets only re-verify them.
    fn detect_leaf(&mut self, idx: usize) -> Option<EntryMode> {
        let slot = &mut self.slots[idx];
        let leaf = slot.leaf.as_mut()?;
        let raw = leaf.take_pending()?;

        let (mode, selection) = match matching_option(slot.state.options(), &raw) {
            Some(option) => (EntryMode::List, Some(option.id.clone())),
            // An id the catalog no longer lists stays an unresolved id.
            None => match Identifier::from_raw(&raw) {
                id @ Identifier::Numeric(_) => (EntryMode::List, Some(id)),
                Identifier::Text(_) => (EntryMode::Manual, None),
            },
        };
        leaf.resolve(mode, &raw);
        slot.state.select(selection);
        Some(mode)
    }

}
