//! Partition/sort key layout of the single SmartGrow table
//!
//! ```text
//! PK                      SK                      Entity
//! PLOT#<plot_id>          STATE#<timestamp>       plot-state reading
//! FACILITY#<facility_id>  SPECIES#<species_id>    facility ideal-range override
//! SPECIES#<species_id>    PROFILE                 global ideal-range profile
//! BUSINESS#<business_id>  FACILITY#<facility_id>  responsible roster
//! ```
//!
//! Secondary index: `GSI_PK = FACILITY#<facility_id>`,
//! `GSI_SK = TIMESTAMP#<timestamp>`.

use std::fmt;

pub const PK: &str = "PK";
pub const SK: &str = "SK";
pub const GSI_PK: &str = "GSI_PK";
pub const GSI_SK: &str = "GSI_SK";

pub const PLOT_PREFIX: &str = "PLOT#";
pub const STATE_PREFIX: &str = "STATE#";
pub const FACILITY_PREFIX: &str = "FACILITY#";
pub const SPECIES_PREFIX: &str = "SPECIES#";
pub const BUSINESS_PREFIX: &str = "BUSINESS#";
pub const USER_PREFIX: &str = "USER#";
pub const SENSOR_PREFIX: &str = "SENSOR#";
pub const EVENT_PREFIX: &str = "EVENT#";
pub const TIMESTAMP_PREFIX: &str = "TIMESTAMP#";

/// Sort key of the global species profile row
pub const PROFILE_SK: &str = "PROFILE";

/// Exact primary key of one item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub pk: String,
    pub sk: String,
}

impl ItemKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self { pk: pk.into(), sk: sk.into() }
    }

    /// Facility-scoped ideal-range override
    pub fn facility_species(facility_id: &str, species_id: &str) -> Self {
        Self::new(pk_facility(facility_id), sk_species(species_id))
    }

    /// Global ideal-range profile for a species
    pub fn species_profile(species_id: &str) -> Self {
        Self::new(pk_species(species_id), PROFILE_SK)
    }

    /// Responsible roster for a facility under a business
    pub fn business_facility(business_id: &str, facility_id: &str) -> Self {
        Self::new(pk_business(business_id), sk_facility(facility_id))
    }

    pub fn plot_state(plot_id: &str, timestamp: &str) -> Self {
        Self::new(pk_plot(plot_id), sk_state(timestamp))
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pk, self.sk)
    }
}

pub fn pk_user(user_id: &str) -> String {
    format!("{}{}", USER_PREFIX, user_id)
}

pub fn pk_plot(plot_id: &str) -> String {
    format!("{}{}", PLOT_PREFIX, plot_id)
}

pub fn pk_facility(facility_id: &str) -> String {
    format!("{}{}", FACILITY_PREFIX, facility_id)
}

pub fn pk_sensor(sensor_id: &str) -> String {
    format!("{}{}", SENSOR_PREFIX, sensor_id)
}

pub fn pk_species(species_id: &str) -> String {
    format!("{}{}", SPECIES_PREFIX, species_id)
}

pub fn pk_business(business_id: &str) -> String {
    format!("{}{}", BUSINESS_PREFIX, business_id)
}

pub fn sk_state(timestamp: &str) -> String {
    format!("{}{}", STATE_PREFIX, timestamp)
}

pub fn sk_event(timestamp: &str) -> String {
    format!("{}{}", EVENT_PREFIX, timestamp)
}

pub fn sk_species(species_id: &str) -> String {
    format!("{}{}", SPECIES_PREFIX, species_id)
}

pub fn sk_facility(facility_id: &str) -> String {
    format!("{}{}", FACILITY_PREFIX, facility_id)
}

pub fn gsi_pk(facility_id: &str) -> String {
    format!("{}{}", FACILITY_PREFIX, facility_id)
}

pub fn gsi_sk(timestamp: &str) -> String {
    format!("{}{}", TIMESTAMP_PREFIX, timestamp)
}

/// Everything after the first `#`, or the whole key if there is none
pub fn strip_prefix(key: &str) -> &str {
    key.split_once('#').map_or(key, |(_, rest)| rest)
}
