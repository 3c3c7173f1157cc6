//! In-memory table and notifier
//!
//! `MemoryTable` holds items keyed by their exact `PK`/`SK` pair and can be
//! seeded from a JSON fixture file:
//!
//! ```json
//! [
//!   { "PK": "SPECIES#S1", "SK": "PROFILE", "MinTemperature": 20, "MaxTemperature": 35 },
//!   { "PK": "BUSINESS#B1", "SK": "FACILITY#F1", "responsibles": ["ops@farm.com"] }
//! ]
//! ```
//!
//! `MemoryNotifier` keeps every published message and logs it, which makes
//! it the dry-run notifier for the binary as well as the test double.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use log::{debug, info};
use serde_json::Value;

use smartgrow_core::keys::{PK, SK};
use smartgrow_core::{
    AttributeMap, AttributeValue, ItemKey, Notifier, NotifyError, StoreError, TableStore,
};

use crate::{ConnectionStats, ConnectorError};

/// Thread-safe in-memory table
#[derive(Debug, Default)]
pub struct MemoryTable {
    name: String,
    items: RwLock<HashMap<ItemKey, AttributeMap>>,
}

impl MemoryTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace an item. The item must carry string `PK` and `SK`.
    pub fn put_item(&self, item: AttributeMap) -> Result<ItemKey, ConnectorError> {
        let key = item_key(&item)?;
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), item);
        Ok(key)
    }

    /// Insert a plain-JSON object
    pub fn put_json(&self, item: Value) -> Result<ItemKey, ConnectorError> {
        match AttributeValue::from(item) {
            AttributeValue::Map(attrs) => self.put_item(attrs),
            other => Err(ConnectorError::Fixture(format!(
                "items must be JSON objects, got {:?}",
                other
            ))),
        }
    }

    /// Seed from a JSON array of plain items
    pub fn load_fixture_str(&self, fixture: &str) -> Result<usize, ConnectorError> {
        let items: Vec<Value> = serde_json::from_str(fixture)
            .map_err(|e| ConnectorError::Fixture(e.to_string()))?;
        let count = items.len();
        for item in items {
            self.put_json(item)?;
        }
        debug!("Loaded {} fixture items into table {}", count, self.name);
        Ok(count)
    }

    /// Seed from a fixture file on disk
    pub fn load_fixture(&self, path: impl AsRef<Path>) -> Result<usize, ConnectorError> {
        let text = fs::read_to_string(path.as_ref())?;
        self.load_fixture_str(&text)
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn item_key(item: &AttributeMap) -> Result<ItemKey, ConnectorError> {
    let pk = item.get(PK).and_then(AttributeValue::as_str);
    let sk = item.get(SK).and_then(AttributeValue::as_str);
    match (pk, sk) {
        (Some(pk), Some(sk)) if !pk.is_empty() && !sk.is_empty() => Ok(ItemKey::new(pk, sk)),
        _ => Err(ConnectorError::Fixture(
            "item is missing a string PK or SK".to_string(),
        )),
    }
}

#[async_trait]
impl TableStore for MemoryTable {
    async fn get_item(&self, key: &ItemKey) -> Result<Option<AttributeMap>, StoreError> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn table_name(&self) -> &str {
        &self.name
    }
}

/// A message captured by [`MemoryNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub topic: String,
    pub subject: String,
    pub body: String,
}

/// Notifier that records instead of delivering
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<SentMessage>>,
    stats: Mutex<ConnectionStats>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn stats(&self) -> ConnectionStats {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn publish(&self, topic: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!("[{}] {}\n{}", topic, subject, body);
        {
            let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
            stats.messages_sent += 1;
            stats.bytes_sent += (subject.len() + body.len()) as u64;
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMessage {
                topic: topic.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
        Ok(())
    }
}
