//! Change-stream batch types
//!
//! One invocation delivers a [`ChangeBatch`]. Each [`ChangeRecord`] carries
//! an event-type discriminator and, for inserts, the new item image in the
//! store's tagged encoding.
//!
//! ```json
//! { "Records": [
//!     { "eventID": "1",
//!       "eventName": "INSERT",
//!       "dynamodb": { "NewImage": { "PK": { "S": "PLOT#P1" } } } } ] }
//! ```
//!
//! Images are kept as raw JSON here. Decoding happens per record inside the
//! dispatcher so that one malformed image cannot fail deserialization of the
//! whole batch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of mutation a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Insert,
    Modify,
    Remove,
    #[serde(other)]
    Unknown,
}

/// One invocation's worth of change records, in delivery order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeBatch {
    #[serde(rename = "Records", default)]
    pub records: Vec<ChangeRecord>,
}

/// A single change-stream record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeRecord {
    #[serde(rename = "eventID", default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,

    #[serde(rename = "eventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<ChangeType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamodb: Option<StreamPayload>,
}

/// Store-specific part of a change record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamPayload {
    #[serde(rename = "NewImage", default, skip_serializing_if = "Option::is_none")]
    pub new_image: Option<Value>,

    #[serde(rename = "OldImage", default, skip_serializing_if = "Option::is_none")]
    pub old_image: Option<Value>,

    #[serde(rename = "SequenceNumber", default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,
}

impl ChangeRecord {
    /// Insert record carrying `image` as its new image
    pub fn insert(image: Value) -> Self {
        Self::with_type(ChangeType::Insert, Some(image))
    }

    pub fn with_type(event_name: ChangeType, new_image: Option<Value>) -> Self {
        Self {
            event_id: None,
            event_name: Some(event_name),
            dynamodb: Some(StreamPayload {
                new_image,
                ..StreamPayload::default()
            }),
        }
    }

    pub fn is_insert(&self) -> bool {
        self.event_name == Some(ChangeType::Insert)
    }

    /// The new image, unless it is missing, null, or an empty object
    pub fn new_image(&self) -> Option<&Value> {
        let image = self.dynamodb.as_ref()?.new_image.as_ref()?;
        match image {
            Value::Null => None,
            Value::Object(fields) if fields.is_empty() => None,
            other => Some(other),
        }
    }

    /// Short label for log lines
    pub fn label(&self) -> String {
        match (&self.event_id, self.dynamodb.as_ref().and_then(|d| d.sequence_number.as_ref())) {
            (Some(id), _) => format!("event {}", id),
            (None, Some(seq)) => format!("sequence {}", seq),
            (None, None) => "event <unidentified>".to_string(),
        }
    }
}

impl FromIterator<ChangeRecord> for ChangeBatch {
    fn from_iter<I: IntoIterator<Item = ChangeRecord>>(iter: I) -> Self {
        Self { records: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_stream_batch() {
        let batch: ChangeBatch = serde_json::from_value(json!({
            "Records": [
                { "eventID": "a", "eventName": "INSERT",
                  "dynamodb": { "NewImage": { "PK": { "S": "PLOT#P1" } }, "SequenceNumber": "100" } },
                { "eventID": "b", "eventName": "REMOVE", "dynamodb": {} },
                { "eventName": "TTL_EXPIRE" }
            ]
        }))
        .unwrap();

        assert_eq!(batch.records.len(), 3);
        assert!(batch.records[0].is_insert());
        assert!(batch.records[0].new_image().is_some());
        assert_eq!(batch.records[1].event_name, Some(ChangeType::Remove));
        assert!(batch.records[1].new_image().is_none());
        assert_eq!(batch.records[2].event_name, Some(ChangeType::Unknown));
    }

    #[test]
    fn empty_image_counts_as_missing() {
        let record = ChangeRecord::insert(json!({}));
        assert!(record.new_image().is_none());

        let record = ChangeRecord::insert(Value::Null);
        assert!(record.new_image().is_none());
    }

    #[test]
    fn missing_records_key_is_empty_batch() {
        let batch: ChangeBatch = serde_json::from_value(json!({})).unwrap();
        assert!(batch.records.is_empty());
    }

    #[test]
    fn labels_prefer_event_id() {
        let mut record = ChangeRecord::insert(json!({ "PK": { "S": "x" } }));
        assert_eq!(record.label(), "event <unidentified>");
        record.event_id = Some("42".into());
        assert_eq!(record.label(), "event 42");
    }
}
