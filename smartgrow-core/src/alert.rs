//! Alert formatting and publishing
//!
//! ## Message Layout
//!
//! ```text
//! Subject: [SmartGrow] Plot P1 out of range
//!
//! Plot ID: P1
//! Species: S1
//! Facility: F1
//! Timestamp: 2024-01-01T00:00:00Z
//!
//! Metrics outside tolerance:
//! - Temperature: actual=42.00, allowed range >= 20.00 <= 35.00
//!
//! Recipients:
//! ops@farm.com, lead@farm.com
//! ```
//!
//! A bound segment is left out when that bound is not configured.
//!
//! Publishing is best effort. A missing topic disables delivery and a
//! failed delivery is logged; neither fails the record.

use std::fmt::Write as _;

use chrono::{SecondsFormat, Utc};
use log::{error, info};

use crate::deviation::Deviation;
use crate::traits::Notifier;

pub const SUBJECT_PREFIX: &str = "[SmartGrow]";

/// Everything needed to describe one out-of-range reading
#[derive(Debug, Clone, PartialEq)]
pub struct AlertContext<'a> {
    pub plot_id: &'a str,
    pub species_id: &'a str,
    pub facility_id: Option<&'a str>,
    pub timestamp: Option<&'a str>,
    pub deviations: &'a [Deviation],
    pub recipients: &'a [String],
}

/// A rendered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub subject: String,
    pub body: String,
}

/// What happened to a publish attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// No topic configured
    Disabled,
    Failed,
}

impl<'a> AlertContext<'a> {
    pub fn render(&self) -> Alert {
        Alert {
            subject: format!("{} Plot {} out of range", SUBJECT_PREFIX, self.plot_id),
            body: self.body(),
        }
    }

    fn body(&self) -> String {
        let timestamp = match self.timestamp.filter(|t| !t.is_empty()) {
            Some(t) => t.to_string(),
            None => Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        };

        let mut lines = vec![
            format!("Plot ID: {}", self.plot_id),
            format!("Species: {}", self.species_id),
            format!("Facility: {}", self.facility_id.filter(|f| !f.is_empty()).unwrap_or("Unknown")),
            format!("Timestamp: {}", timestamp),
            String::new(),
            "Metrics outside tolerance:".to_string(),
        ];
        lines.extend(self.deviations.iter().map(|d| format!("- {}", deviation_line(d))));
        lines.push(String::new());
        lines.push("Recipients:".to_string());
        lines.push(self.recipients.join(", "));

        lines.join("\n")
    }
}

/// `<Metric>: actual=<v>, allowed range [>= <lo>] [<= <hi>]`
pub fn deviation_line(deviation: &Deviation) -> String {
    let mut line = format!(
        "{}: actual={:.2}, allowed range",
        deviation.metric.label(),
        deviation.actual
    );
    if let Some(lower) = deviation.lower_bound {
        let _ = write!(line, " >= {:.2}", lower);
    }
    if let Some(upper) = deviation.upper_bound {
        let _ = write!(line, " <= {:.2}", upper);
    }
    line
}

/// Send `alert` to `topic`. Never fails; the outcome says what happened.
pub async fn publish_alert<N: Notifier + ?Sized>(
    notifier: &N,
    topic: Option<&str>,
    plot_id: &str,
    alert: &Alert,
) -> PublishOutcome {
    let topic = match topic.filter(|t| !t.is_empty()) {
        Some(topic) => topic,
        None => {
            error!("ALERTS_TOPIC_ARN is required to publish alerts; dropping alert for plot {}", plot_id);
            return PublishOutcome::Disabled;
        }
    };

    match notifier.publish(topic, &alert.subject, &alert.body).await {
        Ok(()) => {
            info!("Alert published for plot {}", plot_id);
            PublishOutcome::Published
        }
        Err(e) => {
            error!("Failed to publish alert for plot {}: {}", plot_id, e);
            PublishOutcome::Failed
        }
    }
}
