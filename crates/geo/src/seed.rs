//! Reconciling a chain with persisted values (edit mode).

use std::collections::BTreeMap;

use tracing::info;

use padron_core::Identifier;

use crate::chain::DependencyChain;
use crate::level::GeoLevel;
use crate::source::FetchRequest;

/// Previously saved value per level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainSeed {
    values: BTreeMap<GeoLevel, Identifier>,
}

impl ChainSeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, level: GeoLevel, value: impl Into<Identifier>) -> Self {
        self.set(level, Some(value.into()));
        self
    }

    /// Blank values count as absent.
    pub fn set(&mut self, level: GeoLevel, value: Option<Identifier>) {
        match value.filter(|v| !v.is_blank()) {
            Some(v) => {
                self.values.insert(level, v);
            }
            None => {
                self.values.remove(&level);
            }
        }
    }

    pub fn get(&self, level: GeoLevel) -> Option<&Identifier> {
        self.values.get(&level)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GeoLevel, &Identifier)> {
        self.values.iter().map(|(l, v)| (*l, v))
    }
}

impl DependencyChain {
    /// Pre-populate the chain from persisted values.
    ///
    /// Selections are installed before their options arrive and stay
    /// provisional until the options confirm them. Options are requested for
    /// every level whose parent is seeded, all at once rather than waiting for
    /// each level in turn. A level below an unseeded ancestor is left empty.
    /// Leaf values are held until their options arrive, which decides whether
    /// they are list selections or typed text.
    pub fn seed(&mut self, seed: &ChainSeed) -> Vec<FetchRequest> {
        self.reset_all();
        let mut requests = vec![self.load_root()];
        let levels: Vec<GeoLevel> = self.topology().levels().collect();

        let mut seeded: Vec<GeoLevel> = Vec::new();
        for (idx, level) in levels.into_iter().enumerate() {
            if let Some(parent) = self.topology().parent_of(level) {
                if !seeded.contains(&parent) {
                    continue;
                }
                let Some(parent_id) = seed.get(parent).cloned() else {
                    continue;
                };
                requests.push(self.issue(idx, level, Some(parent_id)));
            }

            if let Some(value) = seed.get(level) {
                self.seed_slot(idx, value);
                seeded.push(level);
            }
        }

        info!(
            chain = %self.label(),
            seeded = seeded.len(),
            fetches = requests.len(),
            "chain seeded"
        );
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainConfig, CommitOutcome};
    use crate::entity::GeoEntity;
    use crate::leaf::{EntryMode, FieldValue};
    use crate::state::Verification;
    use crate::topology::ChainTopology;
    use GeoLevel::*;

    fn residence() -> DependencyChain {
        DependencyChain::new("residence", ChainTopology::residence(), ChainConfig::default())
    }

    fn request_for(requests: &[FetchRequest], level: GeoLevel) -> FetchRequest {
        requests
            .iter()
            .find(|r| r.level == level)
            .cloned()
            .unwrap_or_else(|| panic!("no request for {level}"))
    }

    #[test]
    fn blank_values_are_not_seeded() {
        let mut seed = ChainSeed::new().with(Country, 1);
        seed.set(Province, Some(Identifier::text("")));
        seed.set(Country, None);

        assert!(seed.is_empty());
    }

    #[test]
    fn every_seeded_parent_gets_its_children_requested_at_once() {
        let seed = ChainSeed::new()
            .with(Country, 1)
            .with(Province, 2)
            .with(Department, 5)
            .with(Locality, 9);
        let mut chain = residence();

        let requests = chain.seed(&seed);
        let pairs: Vec<_> = requests.iter().map(|r| (r.level, r.parent.clone())).collect();

        assert_eq!(
            pairs,
            vec![
                (Country, None),
                (Province, Some(Identifier::Numeric(1))),
                (Department, Some(Identifier::Numeric(2))),
                (Locality, Some(Identifier::Numeric(5))),
                (Municipality, Some(Identifier::Numeric(9))),
                (Street, Some(Identifier::Numeric(9))),
                (PostalCode, Some(Identifier::Numeric(9))),
            ]
        );
        assert_eq!(
            chain.level(Locality).unwrap().selection().map(|s| s.verification),
            Some(Verification::Provisional)
        );
    }

    #[test]
    fn levels_below_a_gap_stay_empty() {
        let seed = ChainSeed::new()
            .with(Country, 1)
            .with(Department, 5)
            .with(Locality, 9);
        let mut chain = residence();

        let requests = chain.seed(&seed);

        let levels: Vec<_> = requests.iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![Country, Province]);
        assert_eq!(chain.selected_id(Department), None);
        assert_eq!(chain.selected_id(Locality), None);
    }

    #[test]
    fn seeded_value_missing_from_options_renders_blank() {
        let seed = ChainSeed::new().with(Country, 1).with(Province, 99);
        let mut chain = residence();
        let requests = chain.seed(&seed);

        let outcome = chain.commit(
            &request_for(&requests, Province),
            Ok(vec![GeoEntity::new(2, "Chaco")]),
        );

        let CommitOutcome::Applied(applied) = outcome else {
            panic!("expected applied options");
        };
        assert_eq!(applied.unresolved, Some(Identifier::Numeric(99)));
        let province = chain.level(Province).unwrap();
        assert_eq!(province.displayed_id(), None);
        assert_eq!(province.selected_id(), Some(&Identifier::Numeric(99)));
    }

    #[test]
    fn seeded_leaf_value_is_detected_once_options_arrive() {
        let seed = ChainSeed::new()
            .with(Country, 1)
            .with(Province, 2)
            .with(Department, 5)
            .with(Locality, 9)
            .with(Municipality, 12)
            .with(Neighborhood, 14)
            .with(Street, "Calle Inventada 123");
        let mut chain = residence();
        let requests = chain.seed(&seed);

        assert_eq!(
            chain.field_value(Street),
            Some(FieldValue::Typed("Calle Inventada 123".into()))
        );

        chain.commit(
            &request_for(&requests, Neighborhood),
            Ok(vec![GeoEntity::new(14, "Villa Prosperidad")]),
        );
        chain.commit(
            &request_for(&requests, Street),
            Ok(vec![GeoEntity::from_text("25 de Mayo")]),
        );

        assert_eq!(chain.entry_mode(Neighborhood).unwrap(), EntryMode::List);
        assert_eq!(
            chain.field_value(Neighborhood),
            Some(FieldValue::Selected(Identifier::Numeric(14)))
        );
        assert_eq!(chain.entry_mode(Street).unwrap(), EntryMode::Manual);
        assert_eq!(
            chain.field_value(Street),
            Some(FieldValue::Typed("Calle Inventada 123".into()))
        );
    }

    #[test]
    fn failed_leaf_fetch_keeps_the_seeded_value_as_text() {
        let seed = ChainSeed::new()
            .with(Country, 1)
            .with(Province, 2)
            .with(Department, 5)
            .with(Locality, 9)
            .with(Street, "San Martin 450");
        let mut chain = residence();
        let requests = chain.seed(&seed);

        chain.commit(
            &request_for(&requests, Street),
            Err(crate::FetchError::Transport("timeout".into())),
        );

        assert_eq!(chain.entry_mode(Street).unwrap(), EntryMode::Manual);
        assert_eq!(
            chain.field_value(Street),
            Some(FieldValue::Typed("San Martin 450".into()))
        );
    }

    #[test]
    fn user_edit_during_seeding_wins() {
        let seed = ChainSeed::new().with(Country, 1).with(Province, 2).with(Department, 5);
        let mut chain = residence();
        let requests = chain.seed(&seed);

        chain.set_selected(Province, Some(Identifier::Numeric(3))).unwrap();

        let late = chain.commit(
            &request_for(&requests, Department),
            Ok(vec![GeoEntity::new(5, "San Fernando")]),
        );
        assert!(matches!(late, CommitOutcome::Stale { .. }));
        assert_eq!(chain.selected_id(Department), None);
        assert_eq!(chain.selected_id(Province), Some(&Identifier::Numeric(3)));
    }

    fn seeded_to_neighborhood(value: impl Into<Identifier>) -> ChainSeed {
        ChainSeed::new()
            .with(Country, 1)
            .with(Province, 2)
            .with(Department, 5)
            .with(Locality, 9)
            .with(Municipality, 12)
            .with(Neighborhood, value)
    }

    #[test]
    fn reloading_a_resolved_leaf_never_turns_its_id_into_text() {
        let mut chain = residence();
        let requests = chain.seed(&seeded_to_neighborhood(14));
        chain.commit(
            &request_for(&requests, Neighborhood),
            Ok(vec![GeoEntity::new(14, "Villa Prosperidad")]),
        );
        assert_eq!(chain.entry_mode(Neighborhood).unwrap(), EntryMode::List);

        let retry = chain.reload(Neighborhood).unwrap().unwrap();
        let outcome = chain.commit(&retry, Ok(vec![GeoEntity::new(15, "Villa Libertad")]));

        let CommitOutcome::Applied(applied) = outcome else {
            panic!("expected applied options");
        };
        assert_eq!(applied.detected_mode, None);
        assert_eq!(applied.unresolved, Some(Identifier::Numeric(14)));
        assert_eq!(chain.entry_mode(Neighborhood).unwrap(), EntryMode::List);
        assert_eq!(chain.leaf(Neighborhood).unwrap().manual_text(), "");
        assert_eq!(
            chain.field_value(Neighborhood),
            Some(FieldValue::Selected(Identifier::Numeric(14)))
        );
        assert_eq!(chain.level(Neighborhood).unwrap().displayed_id(), None);
    }

    #[test]
    fn clearing_a_leaf_before_its_options_arrive_drops_the_seeded_value() {
        let mut chain = residence();
        let requests = chain.seed(&seeded_to_neighborhood("El Palmar"));

        let cleared = chain.set_selected(Neighborhood, None).unwrap();

        assert!(cleared.is_empty());
        assert_eq!(chain.field_value(Neighborhood), None);

        let outcome = chain.commit(
            &request_for(&requests, Neighborhood),
            Ok(vec![GeoEntity::new(14, "Villa Prosperidad")]),
        );
        assert!(matches!(outcome, CommitOutcome::Applied(ref a) if a.detected_mode.is_none()));
        assert_eq!(chain.entry_mode(Neighborhood).unwrap(), EntryMode::List);
        assert_eq!(chain.field_value(Neighborhood), None);
    }

    #[test]
    fn pending_leaf_ids_are_reported_as_selections() {
        let mut chain = residence();
        chain.seed(&seeded_to_neighborhood(14));

        assert_eq!(
            chain.field_value(Neighborhood),
            Some(FieldValue::Selected(Identifier::Numeric(14)))
        );
    }

    #[test]
    fn stored_leaf_id_missing_from_options_stays_an_id() {
        let mut chain = residence();
        let requests = chain.seed(&seeded_to_neighborhood(99));

        let outcome = chain.commit(
            &request_for(&requests, Neighborhood),
            Ok(vec![GeoEntity::new(14, "Villa Prosperidad")]),
        );

        let CommitOutcome::Applied(applied) = outcome else {
            panic!("expected applied options");
        };
        assert_eq!(applied.detected_mode, Some(EntryMode::List));
        assert_eq!(applied.unresolved, Some(Identifier::Numeric(99)));
        assert_eq!(chain.leaf(Neighborhood).unwrap().manual_text(), "");
        assert_eq!(
            chain.field_value(Neighborhood),
            Some(FieldValue::Selected(Identifier::Numeric(99)))
        );
    }
}
