//! Name-valued location fields for the beneficiary payload.
//!
//! The backend stores places by name. Each level's final value is resolved
//! against the options that level last fetched.

use serde::Serialize;
use tracing::debug;

use padron_geo::{DependencyChain, FieldValue, GeoLevel};

use crate::record::{PersistedLocation, PersistedRef};

/// Resolve the name the backend should store for `level`.
///
/// Typed text passes through. A selected id resolves to its option's name.
/// When the options do not contain it, the name stored with the same id is
/// kept, and anything else resolves to `""`.
pub fn resolve_name(chain: &DependencyChain, level: GeoLevel, stored: Option<&PersistedRef>) -> String {
    match chain.field_value(level) {
        None => String::new(),
        Some(FieldValue::Typed(text)) => text,
        Some(FieldValue::Selected(id)) => {
            let name = chain
                .level(level)
                .ok()
                .and_then(|state| state.find_option(&id))
                .map(|option| option.name.clone())
                .or_else(|| {
                    stored
                        .filter(|r| r.id == id)
                        .and_then(|r| r.name.clone())
                });
            if name.is_none() {
                debug!(chain = %chain.label(), %level, %id, "selected id has no option to name it");
            }
            name.unwrap_or_default()
        }
    }
}

/// Location fields as the create/update endpoints expect them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionFields {
    pub pais_nac: String,
    pub provincia_nac: String,
    pub departamento_nac: String,
    pub localidad_nac: String,

    pub pais_residencia: String,
    pub provincia: String,
    pub departamento: String,
    pub localidad: String,
    pub municipio: String,
    pub barrio: String,
    pub calle: String,
    pub cod_pos: String,
}

impl SubmissionFields {
    /// Resolve both chains. `stored` is the record being edited, or the
    /// default record when creating.
    pub fn resolve(
        birthplace: &DependencyChain,
        residence: &DependencyChain,
        stored: &PersistedLocation,
    ) -> Self {
        let birth = |level: GeoLevel| resolve_name(birthplace, level, stored.birthplace_ref(level));
        let home = |level: GeoLevel| resolve_name(residence, level, stored.residence_ref(level));

        Self {
            pais_nac: birth(GeoLevel::Country),
            provincia_nac: birth(GeoLevel::Province),
            departamento_nac: birth(GeoLevel::Department),
            localidad_nac: birth(GeoLevel::Locality),

            pais_residencia: home(GeoLevel::Country),
            provincia: home(GeoLevel::Province),
            departamento: home(GeoLevel::Department),
            localidad: home(GeoLevel::Locality),
            municipio: home(GeoLevel::Municipality),
            barrio: home(GeoLevel::Neighborhood),
            calle: home(GeoLevel::Street),
            cod_pos: home(GeoLevel::PostalCode),
        }
    }

    /// Merge into an outgoing payload, overwriting any id-valued fields.
    pub fn apply_to(&self, payload: &mut serde_json::Map<String, serde_json::Value>) {
        if let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(self) {
            payload.extend(fields);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padron_core::Identifier;
    use padron_geo::{ChainConfig, ChainTopology, CommitOutcome, EntryMode, GeoEntity};
    use serde_json::json;

    fn residence() -> DependencyChain {
        DependencyChain::new("residence", ChainTopology::residence(), ChainConfig::default())
    }

    fn commit_all(chain: &mut DependencyChain, level: GeoLevel, id: i64, options: &[(i64, &str)]) {
        let requests = chain.set_selected(level, Some(Identifier::Numeric(id))).unwrap();
        for r in requests {
            let rows = options.iter().map(|(i, n)| GeoEntity::new(*i, *n)).collect();
            let outcome = chain.commit(&r, Ok(rows));
            assert!(matches!(outcome, CommitOutcome::Applied(_)));
        }
    }

    #[test]
    fn selected_ids_resolve_to_names() {
        let mut chain = residence();
        let root = chain.load_root();
        chain.commit(&root, Ok(vec![GeoEntity::new(1, "Argentina")]));
        commit_all(&mut chain, GeoLevel::Country, 1, &[(2, "Chaco")]);
        chain.set_selected(GeoLevel::Province, Some(Identifier::Numeric(2))).unwrap();

        assert_eq!(resolve_name(&chain, GeoLevel::Country, None), "Argentina");
        assert_eq!(resolve_name(&chain, GeoLevel::Province, None), "Chaco");
        assert_eq!(resolve_name(&chain, GeoLevel::Department, None), "");
    }

    #[test]
    fn unknown_id_resolves_to_empty_string() {
        let mut chain = residence();
        let root = chain.load_root();
        chain.commit(&root, Ok(vec![GeoEntity::new(1, "Argentina")]));
        chain.set_selected(GeoLevel::Country, Some(Identifier::Numeric(44))).unwrap();

        assert_eq!(resolve_name(&chain, GeoLevel::Country, None), "");
    }

    #[test]
    fn orphaned_stored_id_keeps_its_stored_name() {
        let mut chain = residence();
        let root = chain.load_root();
        chain.commit(&root, Ok(vec![GeoEntity::new(1, "Argentina")]));
        chain.set_selected(GeoLevel::Country, Some(Identifier::Numeric(44))).unwrap();
        let stored = PersistedRef {
            id: Identifier::Numeric(44),
            name: Some("Uruguay".into()),
        };
        let other = PersistedRef {
            id: Identifier::Numeric(45),
            name: Some("Chile".into()),
        };

        assert_eq!(resolve_name(&chain, GeoLevel::Country, Some(&stored)), "Uruguay");
        assert_eq!(resolve_name(&chain, GeoLevel::Country, Some(&other)), "");
    }

    #[test]
    fn manual_text_is_submitted_verbatim() {
        let mut chain = residence();
        chain.set_entry_mode(GeoLevel::Street, EntryMode::Manual).unwrap();
        chain.set_manual_text(GeoLevel::Street, "Pasaje 3").unwrap();

        assert_eq!(resolve_name(&chain, GeoLevel::Street, None), "Pasaje 3");
    }

    #[test]
    fn fields_overwrite_ids_in_the_payload() {
        let birthplace = DependencyChain::new("birthplace", ChainTopology::birthplace(), ChainConfig::default());
        let mut chain = residence();
        let root = chain.load_root();
        chain.commit(&root, Ok(vec![GeoEntity::new(1, "Argentina")]));
        chain.set_selected(GeoLevel::Country, Some(Identifier::Numeric(1))).unwrap();

        let fields = SubmissionFields::resolve(&birthplace, &chain, &PersistedLocation::default());
        let mut payload = json!({ "nombre": "Ana", "pais_residencia": 1 })
            .as_object()
            .cloned()
            .unwrap();
        fields.apply_to(&mut payload);

        assert_eq!(payload["pais_residencia"], "Argentina");
        assert_eq!(payload["pais_nac"], "");
        assert_eq!(payload["nombre"], "Ana");
    }
}
