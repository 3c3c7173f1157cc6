//! Shared fixtures for pipeline integration tests
//!
//! - `FakeTable`: in-memory `TableStore` with injectable failures
//! - `RecordingNotifier`: captures publish calls
//! - Builders for tagged change-stream images

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use smartgrow_core::{
    AttributeMap, AttributeValue, ChangeRecord, ItemKey, Notifier, NotifyError, StoreError,
    TableStore,
};

#[derive(Default)]
pub struct FakeTable {
    items: Mutex<HashMap<ItemKey, AttributeMap>>,
    failing: Mutex<HashSet<ItemKey>>,
    lookups: Mutex<Vec<ItemKey>>,
}

impl FakeTable {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store a plain-JSON object under `key`
    pub fn put(&self, key: ItemKey, item: Value) {
        let AttributeValue::Map(attrs) = AttributeValue::from(item) else {
            panic!("fixture items must be JSON objects");
        };
        self.items.lock().unwrap().insert(key, attrs);
    }

    pub fn fail_on(&self, key: ItemKey) {
        self.failing.lock().unwrap().insert(key);
    }

    pub fn lookups(&self) -> Vec<ItemKey> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl TableStore for FakeTable {
    async fn get_item(&self, key: &ItemKey) -> Result<Option<AttributeMap>, StoreError> {
        self.lookups.lock().unwrap().push(key.clone());
        if self.failing.lock().unwrap().contains(key) {
            return Err(StoreError::Lookup {
                pk: key.pk.clone(),
                sk: key.sk.clone(),
                reason: "ProvisionedThroughputExceededException".into(),
            });
        }
        Ok(self.items.lock().unwrap().get(key).cloned())
    }

    fn table_name(&self) -> &str {
        "smartgrow-test"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Published>>,
    fail: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_deliveries(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn sent(&self) -> Vec<Published> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, topic: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        if *self.fail.lock().unwrap() {
            return Err(NotifyError::Delivery {
                topic: topic.to_string(),
                reason: "endpoint unreachable".to_string(),
            });
        }
        self.sent.lock().unwrap().push(Published {
            topic: topic.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Tagged string value
pub fn s(value: &str) -> Value {
    json!({ "S": value })
}

/// Tagged number value
pub fn n(value: f64) -> Value {
    json!({ "N": value.to_string() })
}

/// Insert record for a plot-state reading
pub fn plot_state_insert(plot_id: &str, timestamp: &str, extra: &[(&str, Value)]) -> ChangeRecord {
    let mut image = serde_json::Map::new();
    image.insert("PK".into(), s(&format!("PLOT#{}", plot_id)));
    image.insert("SK".into(), s(&format!("STATE#{}", timestamp)));
    for (name, value) in extra {
        image.insert(name.to_string(), value.clone());
    }
    ChangeRecord::insert(Value::Object(image))
}

/// Global species profile for `species_id` with the given range fields
pub fn seed_profile(table: &FakeTable, species_id: &str, ranges: Value) {
    let mut item = json!({
        "PK": format!("SPECIES#{}", species_id),
        "SK": "PROFILE",
        "BusinessId": "B1",
    });
    if let (Some(fields), Some(extra)) = (item.as_object_mut(), ranges.as_object()) {
        fields.extend(extra.clone());
    }
    table.put(ItemKey::species_profile(species_id), item);
}

/// Roster for business B1 / facility F1
pub fn seed_roster(table: &FakeTable, recipients: Value) {
    table.put(
        ItemKey::business_facility("B1", "F1"),
        json!({ "PK": "BUSINESS#B1", "SK": "FACILITY#F1", "responsibles": recipients }),
    );
}
