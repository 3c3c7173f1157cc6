//! Ideal-Range Resolution
//!
//! A species' acceptable band per metric lives in one of two rows:
//!
//! ```text
//! FACILITY#<facility_id> / SPECIES#<species_id>   facility override
//! SPECIES#<species_id>   / PROFILE                global profile
//! ```
//!
//! Precedence is explicit: a facility override, when one exists, replaces
//! the global profile entirely (no per-field merging). The lookup plan is
//! walked in precedence order and stops at the first row found, so the
//! global row is only read when there is no override.
//!
//! Store failures are logged and treated as "no row" for that step; the
//! next step is still attempted.

use log::error;

use crate::attributes::{first_present, AttributeMap, AttributeValue};
use crate::classifier::BUSINESS_FIELDS;
use crate::keys::ItemKey;
use crate::traits::TableStore;

/// Where a resolved range came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSource {
    /// `FACILITY#<facility_id>` / `SPECIES#<species_id>`
    FacilityOverride,
    /// `SPECIES#<species_id>` / `PROFILE`
    SpeciesProfile,
}

impl RangeSource {
    pub const fn name(&self) -> &'static str {
        match self {
            RangeSource::FacilityOverride => "facility override",
            RangeSource::SpeciesProfile => "species profile",
        }
    }
}

/// The ideal-range row chosen for a species
#[derive(Debug, Clone, PartialEq)]
pub struct IdealRanges {
    pub source: RangeSource,
    pub key: ItemKey,
    pub attributes: AttributeMap,
}

impl IdealRanges {
    /// Business owning the profile, used to back-fill plot records that lack one
    pub fn business_id(&self) -> Option<String> {
        first_present(&self.attributes, BUSINESS_FIELDS).and_then(AttributeValue::as_identifier)
    }
}

/// Lookups to attempt, highest precedence first
pub fn lookup_plan(facility_id: Option<&str>, species_id: &str) -> Vec<(RangeSource, ItemKey)> {
    let mut plan = Vec::with_capacity(2);
    if let Some(facility_id) = facility_id.filter(|id| !id.is_empty()) {
        plan.push((
            RangeSource::FacilityOverride,
            ItemKey::facility_species(facility_id, species_id),
        ));
    }
    plan.push((RangeSource::SpeciesProfile, ItemKey::species_profile(species_id)));
    plan
}

/// Resolve the ideal ranges for `species_id`, preferring the facility override.
///
/// Returns `None` when neither row exists (or every lookup failed).
pub async fn resolve_ideal_ranges<S: TableStore + ?Sized>(
    store: &S,
    facility_id: Option<&str>,
    species_id: &str,
) -> Option<IdealRanges> {
    for (source, key) in lookup_plan(facility_id, species_id) {
        match store.get_item(&key).await {
            Ok(Some(attributes)) if !attributes.is_empty() => {
                return Some(IdealRanges { source, key, attributes });
            }
            Ok(_) => {}
            Err(e) => {
                error!(
                    "Failed to fetch ideal parameters ({}) {} from {}: {}",
                    source.name(),
                    key,
                    store.table_name(),
                    e
                );
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTable {
        items: HashMap<ItemKey, AttributeMap>,
        failing: HashSet<ItemKey>,
        lookups: Mutex<Vec<ItemKey>>,
    }

    impl FakeTable {
        fn with(mut self, key: ItemKey, pairs: &[(&str, f64)]) -> Self {
            let attrs = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), AttributeValue::number(v)))
                .collect();
            self.items.insert(key, attrs);
            self
        }

        fn failing(mut self, key: ItemKey) -> Self {
            self.failing.insert(key);
            self
        }
    }

    #[async_trait]
    impl TableStore for FakeTable {
        async fn get_item(&self, key: &ItemKey) -> Result<Option<AttributeMap>, StoreError> {
            self.lookups.lock().unwrap().push(key.clone());
            if self.failing.contains(key) {
                return Err(StoreError::Lookup {
                    pk: key.pk.clone(),
                    sk: key.sk.clone(),
                    reason: "throttled".into(),
                });
            }
            Ok(self.items.get(key).cloned())
        }

        fn table_name(&self) -> &str {
            "fake"
        }
    }

    #[test]
    fn plan_orders_override_first() {
        let plan = lookup_plan(Some("F1"), "S1");
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0], (RangeSource::FacilityOverride, ItemKey::facility_species("F1", "S1")));
        assert_eq!(plan[1], (RangeSource::SpeciesProfile, ItemKey::species_profile("S1")));

        let plan = lookup_plan(None, "S1");
        assert_eq!(plan, vec![(RangeSource::SpeciesProfile, ItemKey::species_profile("S1"))]);
    }

    #[tokio::test]
    async fn facility_override_wins() {
        let table = FakeTable::default()
            .with(ItemKey::facility_species("F1", "S1"), &[("MaxTemperature", 30.0)])
            .with(ItemKey::species_profile("S1"), &[("MaxTemperature", 35.0)]);

        let ranges = resolve_ideal_ranges(&table, Some("F1"), "S1").await.unwrap();
        assert_eq!(ranges.source, RangeSource::FacilityOverride);
        assert_eq!(ranges.attributes["MaxTemperature"].as_f64(), Some(30.0));
        // Global profile never read once the override is found
        assert_eq!(table.lookups.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn falls_back_to_species_profile() {
        let table = FakeTable::default()
            .with(ItemKey::species_profile("S1"), &[("MaxTemperature", 35.0)]);

        let ranges = resolve_ideal_ranges(&table, Some("F1"), "S1").await.unwrap();
        assert_eq!(ranges.source, RangeSource::SpeciesProfile);

        let ranges = resolve_ideal_ranges(&table, None, "S1").await.unwrap();
        assert_eq!(ranges.key, ItemKey::species_profile("S1"));
    }

    #[tokio::test]
    async fn store_failure_is_treated_as_no_match() {
        let table = FakeTable::default()
            .failing(ItemKey::facility_species("F1", "S1"))
            .with(ItemKey::species_profile("S1"), &[("MinHumidity", 40.0)]);

        let ranges = resolve_ideal_ranges(&table, Some("F1"), "S1").await.unwrap();
        assert_eq!(ranges.source, RangeSource::SpeciesProfile);
    }

    #[tokio::test]
    async fn nothing_found() {
        let table = FakeTable::default().failing(ItemKey::species_profile("S1"));
        assert!(resolve_ideal_ranges(&table, None, "S1").await.is_none());
        assert!(resolve_ideal_ranges(&FakeTable::default(), Some("F1"), "S1").await.is_none());
    }

    #[test]
    fn business_id_from_profile() {
        let mut attributes = AttributeMap::new();
        attributes.insert("business_id".into(), AttributeValue::string("B7"));
        let ranges = IdealRanges {
            source: RangeSource::SpeciesProfile,
            key: ItemKey::species_profile("S1"),
            attributes,
        };
        assert_eq!(ranges.business_id().as_deref(), Some("B7"));
    }
}
