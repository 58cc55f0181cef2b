//! List-or-manual entry for the lowest, least standardized levels.

use serde::{Deserialize, Serialize};

use padron_core::{Identifier, ValueObject};

use crate::entity::GeoEntity;

/// Where a leaf level's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryMode {
    /// Picked from the level's fetched options.
    #[default]
    List,
    /// Typed as free text.
    Manual,
}

impl EntryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryMode::List => "list",
            EntryMode::Manual => "manual",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            EntryMode::List => EntryMode::Manual,
            EntryMode::Manual => EntryMode::List,
        }
    }
}

impl ValueObject for EntryMode {}

/// The value a level hands to the form: an option id or typed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Selected(Identifier),
    Typed(String),
}

impl ValueObject for FieldValue {}

/// Entry state of one leaf level.
///
/// The list selection lives in the level's `LevelState`; this holds the mode
/// and the manual text. The two never leak into each other: only the slot of
/// the active mode is bridged to the form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LeafEntry {
    mode: EntryMode,
    manual_text: String,
    /// Persisted value waiting for options before its mode can be decided.
    /// Detection runs once per seeded value.
    pending: Option<String>,
}

impl LeafEntry {
    pub fn mode(&self) -> EntryMode {
        self.mode
    }

    pub fn manual_text(&self) -> &str {
        &self.manual_text
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// The pending value as the form should hold it: a catalog id when it
    /// looks like one, typed text otherwise.
    pub fn pending_value(&self) -> Option<FieldValue> {
        let raw = self.pending.as_deref()?;
        Some(match Identifier::from_raw(raw) {
            id @ Identifier::Numeric(_) => FieldValue::Selected(id),
            Identifier::Text(text) => FieldValue::Typed(text),
        })
    }

    pub(crate) fn set_mode(&mut self, mode: EntryMode) {
        self.mode = mode;
    }

    /// Typing takes over from any persisted value still pending.
    pub(crate) fn set_text(&mut self, text: String) {
        self.manual_text = text;
        self.pending = None;
    }

    /// A user selection or clear replaces the persisted value.
    pub(crate) fn user_selected(&mut self) {
        self.pending = None;
    }

    pub(crate) fn seed(&mut self, raw: String) {
        self.manual_text.clear();
        self.pending = Some(raw);
    }

    /// Apply the detection result for the pending value `raw`.
    pub(crate) fn resolve(&mut self, mode: EntryMode, raw: &str) {
        self.pending = None;
        self.mode = mode;
        self.manual_text = match mode {
            EntryMode::Manual => raw.to_string(),
            EntryMode::List => String::new(),
        };
    }

    pub(crate) fn take_pending(&mut self) -> Option<String> {
        self.pending.take()
    }

    /// Cascade reset keeps the mode the user chose, drops the value.
    pub(crate) fn reset(&mut self) {
        self.manual_text.clear();
        self.pending = None;
    }
}

/// The option whose id `raw` names, if any. Names never match ids.
pub(crate) fn matching_option<'a>(options: &'a [GeoEntity], raw: &str) -> Option<&'a GeoEntity> {
    if raw.trim().is_empty() {
        return None;
    }
    options.iter().find(|o| o.id.matches_raw(raw))
}
