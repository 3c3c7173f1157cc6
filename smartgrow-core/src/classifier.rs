//! Plot-State Classification
//!
//! ## Overview
//!
//! Only rows keyed `PLOT#<plot_id>` / `STATE#<timestamp>` are sensor
//! snapshots. Everything else on the stream (facility rows, species
//! profiles, rosters) is not applicable and stops here.
//!
//! ## Identifier Resolution
//!
//! Identifiers come from several places depending on which writer produced
//! the row. Each identifier has an ordered chain of resolvers; the first one
//! that yields a value wins.
//!
//! ```text
//! species_id   SpeciesId → species_id
//! facility_id  FacilityId → facility_id → GSI_PK (if FACILITY#...)
//! business_id  BusinessId → business_id   (may stay unresolved)
//! timestamp    Timestamp → SK without STATE#
//! ```
//!
//! The chains are plain slices of functions so each step can be tested on
//! its own and the order is visible in one place.

use crate::attributes::{first_present, AttributeMap, AttributeValue};
use crate::keys::{self, FACILITY_PREFIX, PLOT_PREFIX, STATE_PREFIX};

/// One step in an identifier chain
pub type IdResolver = fn(&AttributeMap) -> Option<String>;

pub const SPECIES_FIELDS: &[&str] = &["SpeciesId", "species_id"];
pub const FACILITY_FIELDS: &[&str] = &["FacilityId", "facility_id"];
pub const BUSINESS_FIELDS: &[&str] = &["BusinessId", "business_id"];
pub const TIMESTAMP_FIELD: &str = "Timestamp";

pub const SPECIES_CHAIN: &[IdResolver] = &[species_attribute];
pub const FACILITY_CHAIN: &[IdResolver] = &[facility_attribute, facility_from_index];
pub const BUSINESS_CHAIN: &[IdResolver] = &[business_attribute];

/// Identifiers extracted from an accepted plot-state record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotState {
    pub plot_id: String,
    pub timestamp: String,
    pub species_id: Option<String>,
    pub facility_id: Option<String>,
    pub business_id: Option<String>,
}

/// Accept `item` as a plot-state event and extract its identifiers.
///
/// Returns `None` when the key pair does not match the plot-state layout.
pub fn classify(item: &AttributeMap) -> Option<PlotState> {
    let pk = key_attribute(item, keys::PK)?;
    let sk = key_attribute(item, keys::SK)?;

    let plot_id = pk.strip_prefix(PLOT_PREFIX)?;
    let state_suffix = sk.strip_prefix(STATE_PREFIX)?;

    let timestamp = item
        .get(TIMESTAMP_FIELD)
        .filter(|v| v.is_present())
        .and_then(AttributeValue::as_identifier)
        .unwrap_or_else(|| state_suffix.to_string());

    Some(PlotState {
        plot_id: plot_id.to_string(),
        timestamp,
        species_id: resolve_first(item, SPECIES_CHAIN),
        facility_id: resolve_first(item, FACILITY_CHAIN),
        business_id: resolve_first(item, BUSINESS_CHAIN),
    })
}

/// Run `chain` in order and return the first hit
pub fn resolve_first(item: &AttributeMap, chain: &[IdResolver]) -> Option<String> {
    chain.iter().find_map(|resolve| resolve(item))
}

pub fn species_attribute(item: &AttributeMap) -> Option<String> {
    first_present(item, SPECIES_FIELDS).and_then(AttributeValue::as_identifier)
}

pub fn facility_attribute(item: &AttributeMap) -> Option<String> {
    first_present(item, FACILITY_FIELDS).and_then(AttributeValue::as_identifier)
}

/// Facility taken from the secondary index partition key
pub fn facility_from_index(item: &AttributeMap) -> Option<String> {
    item.get(keys::GSI_PK)
        .and_then(AttributeValue::as_str)
        .and_then(|gsi| gsi.strip_prefix(FACILITY_PREFIX))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

pub fn business_attribute(item: &AttributeMap) -> Option<String> {
    first_present(item, BUSINESS_FIELDS).and_then(AttributeValue::as_identifier)
}

fn key_attribute<'a>(item: &'a AttributeMap, name: &str) -> Option<&'a str> {
    item.get(name).and_then(AttributeValue::as_str).filter(|k| !k.is_empty())
}
