//! Address geocoding: when to ask, what to send, how to read the answer.

use serde::{Deserialize, Serialize};

use padron_geo::{DependencyChain, FieldValue, GeoLevel};

/// Body of the geocoding call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeocodeRequest {
    pub calle: String,
    pub numero: String,
    pub barrio: String,
    pub localidad: String,
    pub provincia: String,
    pub pais: String,
}

impl GeocodeRequest {
    /// Build the request from the residence chain and the street number.
    ///
    /// `None` unless street, number and locality are all present, or when the
    /// record is already geocoded.
    pub fn from_residence(
        residence: &DependencyChain,
        numero: Option<&str>,
        coordinates: Option<(f64, f64)>,
    ) -> Option<Self> {
        if coordinates.is_some() {
            return None;
        }

        let calle = raw_value(residence, GeoLevel::Street)?;
        let numero = numero.map(str::trim).filter(|n| !n.is_empty())?.to_string();
        let localidad = raw_value(residence, GeoLevel::Locality)?;

        Some(Self {
            calle,
            numero,
            barrio: raw_value(residence, GeoLevel::Neighborhood).unwrap_or_default(),
            localidad,
            provincia: raw_value(residence, GeoLevel::Province).unwrap_or_default(),
            pais: raw_value(residence, GeoLevel::Country).unwrap_or_default(),
        })
    }
}

fn raw_value(chain: &DependencyChain, level: GeoLevel) -> Option<String> {
    match chain.field_value(level)? {
        FieldValue::Selected(id) => Some(id.to_string()),
        FieldValue::Typed(text) => Some(text),
    }
}

/// Geocoder answer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodeResult {
    pub latitud: f64,
    pub longitud: f64,
    pub precision: u8,
}

/// How specific a geocoded point is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionScope {
    Country,
    Province,
    City,
    Neighborhood,
    Street,
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionQuality {
    Poor,
    Acceptable,
    VeryGood,
}

/// Geocoder precision on its 1 (worst) to 10 (best) scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Precision(u8);

impl Precision {
    pub fn new(value: u8) -> Option<Self> {
        (1..=10).contains(&value).then_some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn scope(&self) -> PrecisionScope {
        match self.0 {
            1 | 2 => PrecisionScope::Country,
            3 | 4 => PrecisionScope::Province,
            5 | 6 => PrecisionScope::City,
            7 | 8 => PrecisionScope::Neighborhood,
            9 => PrecisionScope::Street,
            _ => PrecisionScope::Exact,
        }
    }

    pub fn quality(&self) -> PrecisionQuality {
        match self.0 {
            0..6 => PrecisionQuality::Poor,
            6..8 => PrecisionQuality::Acceptable,
            _ => PrecisionQuality::VeryGood,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padron_core::Identifier;
    use padron_geo::{ChainConfig, ChainTopology, EntryMode};

    fn residence_with_locality() -> DependencyChain {
        let mut chain = DependencyChain::new("residence", ChainTopology::residence(), ChainConfig::default());
        chain.set_selected(GeoLevel::Province, Some(Identifier::Numeric(2))).unwrap();
        chain.set_selected(GeoLevel::Locality, Some(Identifier::Numeric(9))).unwrap();
        chain
    }

    #[test]
    fn request_needs_street_number_and_locality() {
        let mut chain = residence_with_locality();
        assert_eq!(GeocodeRequest::from_residence(&chain, Some("1250"), None), None);

        chain.set_entry_mode(GeoLevel::Street, EntryMode::Manual).unwrap();
        chain.set_manual_text(GeoLevel::Street, "Av. Alberdi").unwrap();
        assert_eq!(GeocodeRequest::from_residence(&chain, Some("  "), None), None);

        let request = GeocodeRequest::from_residence(&chain, Some("1250"), None).unwrap();
        assert_eq!(request.calle, "Av. Alberdi");
        assert_eq!(request.localidad, "9");
        assert_eq!(request.provincia, "2");
        assert_eq!(request.barrio, "");
    }

    #[test]
    fn geocoded_records_are_not_geocoded_again() {
        let mut chain = residence_with_locality();
        chain.set_entry_mode(GeoLevel::Street, EntryMode::Manual).unwrap();
        chain.set_manual_text(GeoLevel::Street, "Av. Alberdi").unwrap();

        let request = GeocodeRequest::from_residence(&chain, Some("1250"), Some((-27.45, -58.98)));
        assert_eq!(request, None);
    }

    #[test]
    fn precision_maps_to_scope_and_quality() {
        assert_eq!(Precision::new(0), None);
        assert_eq!(Precision::new(11), None);

        let cases = [
            (1, PrecisionScope::Country, PrecisionQuality::Poor),
            (4, PrecisionScope::Province, PrecisionQuality::Poor),
            (6, PrecisionScope::City, PrecisionQuality::Acceptable),
            (7, PrecisionScope::Neighborhood, PrecisionQuality::Acceptable),
            (8, PrecisionScope::Neighborhood, PrecisionQuality::VeryGood),
            (9, PrecisionScope::Street, PrecisionQuality::VeryGood),
            (10, PrecisionScope::Exact, PrecisionQuality::VeryGood),
        ];
        for (value, scope, quality) in cases {
            let p = Precision::new(value).unwrap();
            assert_eq!((p.scope(), p.quality()), (scope, quality), "precision {value}");
        }
    }
}
