//! Reference records returned for one level.

use serde::{Deserialize, Serialize};

use padron_core::Identifier;

/// One option of a level: a country, province, street, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoEntity {
    pub id: Identifier,
    pub name: String,
    /// Id of the parent option this row was fetched under (None for roots).
    #[serde(default)]
    pub parent_id: Option<Identifier>,
}

impl GeoEntity {
    pub fn new(id: impl Into<Identifier>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
        }
    }

    /// A catalog row without a separate id: the text is both id and name.
    ///
    /// The id is normalized like any raw value, so a postal code `"3500"`
    /// keys as `Numeric(3500)`.
    pub fn from_text(text: impl Into<String>) -> Self {
        let name = text.into();
        Self {
            id: Identifier::from_raw(&name),
            name,
            parent_id: None,
        }
    }

    pub fn with_parent(mut self, parent: Identifier) -> Self {
        self.parent_id = Some(parent);
        self
    }
}

