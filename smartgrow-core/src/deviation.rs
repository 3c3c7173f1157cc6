//! Deviation Detection
//!
//! ## Overview
//!
//! Compares each measured metric of a plot-state record against the
//! resolved ideal range and reports what falls outside it.
//!
//! ## Range Fields
//!
//! Bounds are looked up through a fixed table, canonical name first, then
//! the lowercase spelling older writers used:
//!
//! | Metric      | Lower bound                         | Upper bound                         |
//! |-------------|-------------------------------------|-------------------------------------|
//! | temperature | `MinTemperature`, `mintemperature`  | `MaxTemperature`, `maxtemperature`  |
//! | humidity    | `MinHumidity`, `minhumidity`        | `MaxHumidity`, `maxhumidity`        |
//! | light       | `MinLight`, `minlight`              | `MaxLight`, `maxlight`              |
//! | irrigation  | `MinIrrigation`, `minirrigation`    | `MaxIrrigation`, `maxirrigation`    |
//!
//! ## Comparison Policy
//!
//! ```text
//! value < lower            → below   (upper not checked)
//! otherwise value > upper  → above
//! otherwise                → in range (a value equal to a bound is in range)
//! ```
//!
//! A bound that is missing or not numeric is ignored for its side. A
//! measured value that is not numeric skips the metric and is logged as a
//! data-quality warning, since it usually means a misbehaving sensor.

use log::warn;

use crate::attributes::{first_present, AttributeMap, AttributeValue};

/// Metrics evaluated against ideal ranges, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Temperature,
    Humidity,
    Light,
    Irrigation,
}

/// Candidate field names for one metric's bounds
#[derive(Debug, Clone, Copy)]
pub struct RangeFields {
    pub metric: Metric,
    pub lower: [&'static str; 2],
    pub upper: [&'static str; 2],
}

pub const METRIC_RANGE_FIELDS: [RangeFields; 4] = [
    RangeFields {
        metric: Metric::Temperature,
        lower: ["MinTemperature", "mintemperature"],
        upper: ["MaxTemperature", "maxtemperature"],
    },
    RangeFields {
        metric: Metric::Humidity,
        lower: ["MinHumidity", "minhumidity"],
        upper: ["MaxHumidity", "maxhumidity"],
    },
    RangeFields {
        metric: Metric::Light,
        lower: ["MinLight", "minlight"],
        upper: ["MaxLight", "maxlight"],
    },
    RangeFields {
        metric: Metric::Irrigation,
        lower: ["MinIrrigation", "minirrigation"],
        upper: ["MaxIrrigation", "maxirrigation"],
    },
];

impl Metric {
    /// Attribute name on the plot-state record
    pub const fn field(&self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Light => "light",
            Metric::Irrigation => "irrigation",
        }
    }

    /// Capitalized name for alert text
    pub const fn label(&self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
            Metric::Light => "Light",
            Metric::Irrigation => "Irrigation",
        }
    }
}

/// Which side of the range was breached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Below,
    Above,
}

impl Direction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Below => "below",
            Direction::Above => "above",
        }
    }
}

/// One metric outside its ideal range
#[derive(Debug, Clone, PartialEq)]
pub struct Deviation {
    pub metric: Metric,
    pub actual: f64,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    pub direction: Direction,
}

/// Compare `measurement` against `ideal_ranges`.
///
/// At most one deviation per metric, in [`METRIC_RANGE_FIELDS`] order.
/// An empty result means every present metric is within range.
pub fn find_deviations(measurement: &AttributeMap, ideal_ranges: &AttributeMap) -> Vec<Deviation> {
    METRIC_RANGE_FIELDS
        .iter()
        .filter_map(|fields| check_metric(fields, measurement, ideal_ranges))
        .collect()
}

fn check_metric(
    fields: &RangeFields,
    measurement: &AttributeMap,
    ideal_ranges: &AttributeMap,
) -> Option<Deviation> {
    let raw = measurement.get(fields.metric.field())?;

    let actual = match raw.as_f64() {
        Some(value) => value,
        None => {
            if raw.is_present() {
                warn!(
                    "Non-numeric {} value {:?}; skipping range check",
                    fields.metric.field(),
                    raw
                );
            }
            return None;
        }
    };

    let lower_bound = bound(ideal_ranges, &fields.lower);
    let upper_bound = bound(ideal_ranges, &fields.upper);

    let direction = match (lower_bound, upper_bound) {
        (Some(lower), _) if actual < lower => Direction::Below,
        (_, Some(upper)) if actual > upper => Direction::Above,
        _ => return None,
    };

    Some(Deviation {
        metric: fields.metric,
        actual,
        lower_bound,
        upper_bound,
        direction,
    })
}

fn bound(ideal_ranges: &AttributeMap, candidates: &[&'static str]) -> Option<f64> {
    first_present(ideal_ranges, candidates).and_then(AttributeValue::as_f64)
}
