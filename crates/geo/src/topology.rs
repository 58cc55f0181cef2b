//! Which levels a chain has, and which level each one is fetched under.

use crate::error::ChainError;
use crate::level::GeoLevel;

/// Ordered levels with one declared parent each (none for the root).
///
/// Order is root first and every parent precedes its children, so iterating
/// in order is a valid top-down traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTopology {
    nodes: Vec<(GeoLevel, Option<GeoLevel>)>,
}

impl ChainTopology {
    pub fn new(nodes: Vec<(GeoLevel, Option<GeoLevel>)>) -> Result<Self, ChainError> {
        let Some((_, None)) = nodes.first() else {
            return Err(ChainError::InvalidTopology(
                "first level must be the root".into(),
            ));
        };

        for (i, (level, parent)) in nodes.iter().enumerate() {
            if nodes[..i].iter().any(|(l, _)| l == level) {
                return Err(ChainError::InvalidTopology(format!("{level} listed twice")));
            }
            match parent {
                None if i > 0 => {
                    return Err(ChainError::InvalidTopology(format!(
                        "{level} has no parent; only one root is allowed"
                    )));
                }
                Some(p) if !nodes[..i].iter().any(|(l, _)| l == p) => {
                    return Err(ChainError::InvalidTopology(format!(
                        "parent {p} of {level} must come before it"
                    )));
                }
                _ => {}
            }
        }

        Ok(Self { nodes })
    }

    /// Each level fetched under the one before it.
    pub fn linear(levels: &[GeoLevel]) -> Result<Self, ChainError> {
        let nodes = levels
            .iter()
            .enumerate()
            .map(|(i, l)| (*l, i.checked_sub(1).map(|p| levels[p])))
            .collect();
        Self::new(nodes)
    }

    /// Place of birth: country, province, department, locality.
    pub fn birthplace() -> Self {
        Self {
            nodes: vec![
                (GeoLevel::Country, None),
                (GeoLevel::Province, Some(GeoLevel::Country)),
                (GeoLevel::Department, Some(GeoLevel::Province)),
                (GeoLevel::Locality, Some(GeoLevel::Department)),
            ],
        }
    }

    /// Place of residence. Municipality, street and postal code are listed per
    /// locality; neighborhoods per municipality.
    pub fn residence() -> Self {
        Self {
            nodes: vec![
                (GeoLevel::Country, None),
                (GeoLevel::Province, Some(GeoLevel::Country)),
                (GeoLevel::Department, Some(GeoLevel::Province)),
                (GeoLevel::Locality, Some(GeoLevel::Department)),
                (GeoLevel::Municipality, Some(GeoLevel::Locality)),
                (GeoLevel::Neighborhood, Some(GeoLevel::Municipality)),
                (GeoLevel::Street, Some(GeoLevel::Locality)),
                (GeoLevel::PostalCode, Some(GeoLevel::Locality)),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn levels(&self) -> impl Iterator<Item = GeoLevel> + '_ {
        self.nodes.iter().map(|(l, _)| *l)
    }

    pub fn root(&self) -> GeoLevel {
        self.nodes[0].0
    }

    pub fn index_of(&self, level: GeoLevel) -> Option<usize> {
        self.nodes.iter().position(|(l, _)| *l == level)
    }

    pub fn contains(&self, level: GeoLevel) -> bool {
        self.index_of(level).is_some()
    }

    pub fn parent_of(&self, level: GeoLevel) -> Option<GeoLevel> {
        self.nodes
            .iter()
            .find(|(l, _)| *l == level)
            .and_then(|(_, p)| *p)
    }

    /// Levels fetched directly under `level`, in chain order.
    pub fn children_of(&self, level: GeoLevel) -> Vec<GeoLevel> {
        self.nodes
            .iter()
            .filter(|(_, p)| *p == Some(level))
            .map(|(l, _)| *l)
            .collect()
    }

    /// Every level reachable below `level`, in chain order.
    pub fn descendants_of(&self, level: GeoLevel) -> Vec<GeoLevel> {
        let mut below = vec![level];
        for (l, p) in &self.nodes {
            if p.is_some_and(|p| below.contains(&p)) {
                below.push(*l);
            }
        }
        below.remove(0);
        below
    }
}
