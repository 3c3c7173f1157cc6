//! Batch processing against fixture-seeded connectors

use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use smartgrow_connectors::{MemoryNotifier, MemoryTable};
use smartgrow_core::{BatchSummary, ChangeBatch, ProcessorConfig, StreamDispatcher};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_batch() -> ChangeBatch {
    let text = std::fs::read_to_string(fixture("batch.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn load_table() -> MemoryTable {
    let table = MemoryTable::new("smartgrow");
    table.load_fixture(fixture("table.json")).unwrap();
    table
}

#[tokio::test]
async fn fixture_batch_publishes_one_alert_per_breaching_plot() {
    let notifier = Arc::new(MemoryNotifier::new());
    let config = ProcessorConfig::new("smartgrow").alerts_topic("smartgrow-alerts");
    let dispatcher = StreamDispatcher::new(config, load_table(), notifier.clone());

    let summary = dispatcher.handle_batch(&load_batch()).await;

    assert_eq!(
        summary,
        BatchSummary {
            status: 200,
            processed_records: 3,
            total_records: 5,
            alerts_published: 3,
        }
    );

    let sent = notifier.sent();
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|m| m.topic == "smartgrow-alerts"));

    assert_eq!(sent[0].subject, "[SmartGrow] Plot P1 out of range");
    assert_eq!(
        sent[0].body,
        "Plot ID: P1\n\
         Species: S1\n\
         Facility: F1\n\
         Timestamp: 2024-05-01T10:00:00Z\n\
         \n\
         Metrics outside tolerance:\n\
         - Temperature: actual=42.00, allowed range >= 20.00 <= 35.00\n\
         \n\
         Recipients:\n\
         ops@farm.com, lead@farm.com"
    );
}

#[tokio::test]
async fn facility_override_and_its_business_roster_are_used() {
    let notifier = Arc::new(MemoryNotifier::new());
    let config = ProcessorConfig::new("smartgrow").alerts_topic("smartgrow-alerts");
    let dispatcher = StreamDispatcher::new(config, load_table(), notifier.clone());

    dispatcher.handle_batch(&load_batch()).await;

    let p2 = notifier
        .sent()
        .into_iter()
        .find(|m| m.subject.contains("Plot P2"))
        .unwrap();
    // Timestamp falls back to the sort key suffix
    assert!(p2.body.contains("Timestamp: 2024-05-01T10:05:00Z"));
    assert!(p2.body.contains("- Temperature: actual=55.00, allowed range >= 10.00 <= 50.00"));
    assert!(p2.body.ends_with("Recipients:\nnight@farm.com, day@farm.com"));
}

#[tokio::test]
async fn below_range_humidity_reports_both_bounds() {
    let notifier = Arc::new(MemoryNotifier::new());
    let config = ProcessorConfig::new("smartgrow").alerts_topic("smartgrow-alerts");
    let dispatcher = StreamDispatcher::new(config, load_table(), notifier.clone());

    dispatcher.handle_batch(&load_batch()).await;

    let p3 = notifier
        .sent()
        .into_iter()
        .find(|m| m.subject.contains("Plot P3"))
        .unwrap();
    assert!(p3.body.contains("- Humidity: actual=12.50, allowed range >= 40.00 <= 80.00"));
    assert!(!p3.body.contains("Temperature"));
}

#[tokio::test]
async fn missing_topic_evaluates_without_publishing() {
    let notifier = Arc::new(MemoryNotifier::new());
    let dispatcher = StreamDispatcher::new(
        ProcessorConfig::new("smartgrow"),
        load_table(),
        notifier.clone(),
    );

    let summary = dispatcher.handle_batch(&load_batch()).await;

    assert_eq!(summary.processed_records, 3);
    assert_eq!(summary.alerts_published, 0);
    assert!(notifier.sent().is_empty());
    assert_eq!(notifier.stats().messages_sent, 0);
}

#[tokio::test]
async fn empty_table_processes_but_never_alerts() {
    let notifier = Arc::new(MemoryNotifier::new());
    let config = ProcessorConfig::new("smartgrow").alerts_topic("smartgrow-alerts");
    let dispatcher = StreamDispatcher::new(config, MemoryTable::new("smartgrow"), notifier.clone());

    let summary = dispatcher.handle_batch(&load_batch()).await;

    assert_eq!(summary.processed_records, 3);
    assert_eq!(summary.alerts_published, 0);
    assert!(notifier.sent().is_empty());
}

#[test]
fn binary_prints_batch_summary() {
    let output = Command::new(env!("CARGO_BIN_EXE_alert-processor"))
        .arg("--events")
        .arg(fixture("batch.json"))
        .arg("--table-fixture")
        .arg(fixture("table.json"))
        .arg("--log")
        .arg("off")
        .env("DYNAMO_TABLE_NAME", "smartgrow")
        .env("ALERTS_TOPIC_ARN", "smartgrow-alerts")
        .env_remove("NOTIFY_TOKEN")
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        summary,
        serde_json::json!({
            "status": 200,
            "processed_records": 3,
            "total_records": 5,
            "alerts_published": 3,
        })
    );
}

#[test]
fn binary_requires_table_name() {
    let output = Command::new(env!("CARGO_BIN_EXE_alert-processor"))
        .arg("--events")
        .arg(fixture("batch.json"))
        .env_remove("DYNAMO_TABLE_NAME")
        .output()
        .unwrap();

    assert!(!output.status.success());
}
