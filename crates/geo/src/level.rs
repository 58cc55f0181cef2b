//! Geographic levels.

use serde::{Deserialize, Serialize};

use padron_core::ValueObject;

/// One rung of the geographic hierarchy.
///
/// Variants are declared root first; the derived `Ord` follows that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoLevel {
    Country,
    Province,
    Department,
    Locality,
    Municipality,
    Neighborhood,
    Street,
    PostalCode,
}

impl GeoLevel {
    pub const ALL: [GeoLevel; 8] = [
        GeoLevel::Country,
        GeoLevel::Province,
        GeoLevel::Department,
        GeoLevel::Locality,
        GeoLevel::Municipality,
        GeoLevel::Neighborhood,
        GeoLevel::Street,
        GeoLevel::PostalCode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GeoLevel::Country => "country",
            GeoLevel::Province => "province",
            GeoLevel::Department => "department",
            GeoLevel::Locality => "locality",
            GeoLevel::Municipality => "municipality",
            GeoLevel::Neighborhood => "neighborhood",
            GeoLevel::Street => "street",
            GeoLevel::PostalCode => "postal_code",
        }
    }

    /// Levels whose value may be typed instead of picked, because the
    /// reference catalog is incomplete for them.
    pub fn supports_manual_entry(&self) -> bool {
        matches!(self, GeoLevel::Neighborhood | GeoLevel::Street)
    }
}

impl ValueObject for GeoLevel {}

impl core::fmt::Display for GeoLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for GeoLevel {
    type Err = padron_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GeoLevel::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| padron_core::DomainError::validation(format!("unknown level: {s}")))
    }
}
