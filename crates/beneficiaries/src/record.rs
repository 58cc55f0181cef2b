//! Location fields of a stored beneficiary, normalized for the form engine.
//!
//! The backend is inconsistent about how it returns a place: a bare id, a
//! numeric string, a nested `{ id_provincia, nombre }` object, or (streets,
//! postal codes, hand-typed neighborhoods) free text. Everything is collapsed
//! into [`PersistedRef`] here so the chains never see the raw shapes.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use padron_core::Identifier;
use padron_geo::{ChainSeed, GeoLevel};

use crate::error::BridgeError;

/// A stored reference to a place: its id, plus its name when the record
/// carried one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRef {
    pub id: Identifier,
    pub name: Option<String>,
}

impl PersistedRef {
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    /// Normalize one raw JSON value. `null`, `0` and `""` mean "no value".
    pub fn from_value(value: &Value) -> Result<Option<Self>, BridgeError> {
        match value {
            Value::Null => Ok(None),
            Value::Number(_) => Ok(numeric(value)?.map(Self::new)),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => Ok(Some(Self::new(Identifier::from_raw(s)))),
            Value::Object(fields) => from_object(fields),
            other => Err(BridgeError::UnrecognizedValue(other.to_string())),
        }
    }
}

fn numeric(value: &Value) -> Result<Option<i64>, BridgeError> {
    let n = value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        .ok_or_else(|| BridgeError::UnrecognizedValue(value.to_string()))?;
    Ok((n != 0).then_some(n))
}

/// `{ id | id_<level>, nombre | name }`; a named object without an id is
/// keyed by its name, like any other free-text place.
fn from_object(fields: &Map<String, Value>) -> Result<Option<PersistedRef>, BridgeError> {
    let name = ["nombre", "name"]
        .iter()
        .find_map(|k| fields.get(*k))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let id_value = fields
        .get("id")
        .or_else(|| {
            fields
                .iter()
                .find(|(k, _)| k.starts_with("id_"))
                .map(|(_, v)| v)
        });

    let id = match id_value {
        Some(v) => PersistedRef::from_value(v)?.map(|r| r.id),
        None => None,
    };

    Ok(match (id, name) {
        (Some(id), name) => Some(PersistedRef { id, name }),
        (None, Some(name)) => Some(PersistedRef {
            id: Identifier::text(name.clone()),
            name: Some(name),
        }),
        (None, None) if id_value.is_some() => None,
        (None, None) => {
            return Err(BridgeError::UnrecognizedValue(
                Value::Object(fields.clone()).to_string(),
            ));
        }
    })
}

fn persisted_ref<'de, D>(deserializer: D) -> Result<Option<PersistedRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    PersistedRef::from_value(&value).map_err(serde::de::Error::custom)
}

/// Birthplace and residence of a stored beneficiary.
///
/// Deserializes straight from the beneficiary payload; unrelated fields are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PersistedLocation {
    #[serde(default, deserialize_with = "persisted_ref")]
    pub pais_nac: Option<PersistedRef>,
    #[serde(default, deserialize_with = "persisted_ref")]
    pub provincia_nac: Option<PersistedRef>,
    #[serde(default, deserialize_with = "persisted_ref")]
    pub departamento_nac: Option<PersistedRef>,
    #[serde(default, deserialize_with = "persisted_ref")]
    pub localidad_nac: Option<PersistedRef>,

    #[serde(default, deserialize_with = "persisted_ref")]
    pub pais_residencia: Option<PersistedRef>,
    #[serde(default, deserialize_with = "persisted_ref")]
    pub provincia: Option<PersistedRef>,
    #[serde(default, deserialize_with = "persisted_ref")]
    pub departamento: Option<PersistedRef>,
    #[serde(default, deserialize_with = "persisted_ref")]
    pub localidad: Option<PersistedRef>,
    #[serde(default, deserialize_with = "persisted_ref")]
    pub municipio: Option<PersistedRef>,
    #[serde(default, deserialize_with = "persisted_ref")]
    pub barrio: Option<PersistedRef>,
    #[serde(default, deserialize_with = "persisted_ref")]
    pub calle: Option<PersistedRef>,
    #[serde(default, deserialize_with = "persisted_ref")]
    pub cod_pos: Option<PersistedRef>,

    #[serde(default)]
    pub numero_calle: Option<String>,
    #[serde(default)]
    pub ubicacionlatitud: Option<f64>,
    #[serde(default)]
    pub ubicacionlongitud: Option<f64>,
    #[serde(default)]
    pub precision: Option<u8>,
}

impl PersistedLocation {
    pub fn from_json(json: &str) -> Result<Self, BridgeError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: Value) -> Result<Self, BridgeError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Stored birthplace reference at `level`.
    pub fn birthplace_ref(&self, level: GeoLevel) -> Option<&PersistedRef> {
        match level {
            GeoLevel::Country => self.pais_nac.as_ref(),
            GeoLevel::Province => self.provincia_nac.as_ref(),
            GeoLevel::Department => self.departamento_nac.as_ref(),
            GeoLevel::Locality => self.localidad_nac.as_ref(),
            _ => None,
        }
    }

    /// Stored residence reference at `level`.
    pub fn residence_ref(&self, level: GeoLevel) -> Option<&PersistedRef> {
        match level {
            GeoLevel::Country => self.pais_residencia.as_ref(),
            GeoLevel::Province => self.provincia.as_ref(),
            GeoLevel::Department => self.departamento.as_ref(),
            GeoLevel::Locality => self.localidad.as_ref(),
            GeoLevel::Municipality => self.municipio.as_ref(),
            GeoLevel::Neighborhood => self.barrio.as_ref(),
            GeoLevel::Street => self.calle.as_ref(),
            GeoLevel::PostalCode => self.cod_pos.as_ref(),
        }
    }

    pub fn birthplace_seed(&self) -> ChainSeed {
        seed_from(|level| self.birthplace_ref(level))
    }

    pub fn residence_seed(&self) -> ChainSeed {
        seed_from(|level| self.residence_ref(level))
    }

    /// Stored coordinates. Zero is the form's "not geocoded" value.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.ubicacionlatitud, self.ubicacionlongitud) {
            (Some(lat), Some(lon)) if lat != 0.0 || lon != 0.0 => Some((lat, lon)),
            _ => None,
        }
    }
}

fn seed_from<'a>(stored: impl Fn(GeoLevel) -> Option<&'a PersistedRef>) -> ChainSeed {
    let mut seed = ChainSeed::new();
    for level in GeoLevel::ALL {
        seed.set(level, stored(level).map(|r| r.id.clone()));
    }
    seed
}
