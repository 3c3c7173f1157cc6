//! Responsible-party lookup
//!
//! Recipients for a facility live on the `BUSINESS#<business_id>` /
//! `FACILITY#<facility_id>` row. Several generations of writers stored them
//! under different names and shapes, all of which are accepted:
//!
//! ```text
//! responsibles: ["a@x.com", "b@x.com"]
//! Responsibles: [...]
//! Users:        "a@x.com, b@x.com"
//! users:        "..."
//! ```

use log::{error, info, warn};

use crate::attributes::{first_present, AttributeMap, AttributeValue};
use crate::keys::ItemKey;
use crate::traits::TableStore;

/// Roster attribute names, highest priority first
pub const RECIPIENT_FIELDS: &[&str] = &["responsibles", "Responsibles", "Users", "users"];

/// Look up who should hear about a facility's deviations.
///
/// Every failure mode (missing ids, missing row, store error, no usable
/// attribute) yields an empty list.
pub async fn resolve_recipients<S: TableStore + ?Sized>(
    store: &S,
    business_id: Option<&str>,
    facility_id: Option<&str>,
) -> Vec<String> {
    let (business_id, facility_id) = match (business_id, facility_id) {
        (Some(b), Some(f)) if !b.is_empty() && !f.is_empty() => (b, f),
        _ => {
            warn!(
                "Missing business_id ({:?}) or facility_id ({:?}) for responsible lookup",
                business_id, facility_id
            );
            return Vec::new();
        }
    };

    let key = ItemKey::business_facility(business_id, facility_id);
    let record = match store.get_item(&key).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            info!(
                "No responsible record found for business {} / facility {}",
                business_id, facility_id
            );
            return Vec::new();
        }
        Err(e) => {
            error!("Failed to fetch responsibles for {}: {}", key, e);
            return Vec::new();
        }
    };

    let recipients = extract_recipients(&record);
    if recipients.is_empty() {
        info!(
            "Responsible record for business {} / facility {} does not contain emails",
            business_id, facility_id
        );
    }
    recipients
}

/// Pull recipient addresses out of a roster row
pub fn extract_recipients(record: &AttributeMap) -> Vec<String> {
    match first_present(record, RECIPIENT_FIELDS) {
        Some(AttributeValue::List(items)) => items
            .iter()
            .filter_map(AttributeValue::as_str)
            .filter(|email| !email.trim().is_empty())
            .map(str::to_string)
            .collect(),
        Some(AttributeValue::String(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
