//! Processor configuration
//!
//! Resolved once at process start:
//!
//! | Variable            | Required | Effect when absent                 |
//! |---------------------|----------|------------------------------------|
//! | `DYNAMO_TABLE_NAME` | yes      | startup fails with `ConfigError`   |
//! | `ALERTS_TOPIC_ARN`  | no       | evaluation runs, publishing is off |

use crate::errors::ConfigError;

pub const TABLE_NAME_VAR: &str = "DYNAMO_TABLE_NAME";
pub const ALERTS_TOPIC_VAR: &str = "ALERTS_TOPIC_ARN";

/// Settings for one processor instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Table holding plot states, ideal ranges and rosters
    pub table_name: String,
    /// Notification topic; `None` disables alert delivery
    pub alerts_topic: Option<String>,
}

impl ProcessorConfig {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            alerts_topic: None,
        }
    }

    /// Set the notification topic. Blank topics leave delivery disabled.
    pub fn alerts_topic(mut self, topic: impl Into<String>) -> Self {
        self.alerts_topic = non_blank(Some(topic.into()));
        self
    }

    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup` (environment, file, test map)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let table_name = non_blank(lookup(TABLE_NAME_VAR)).ok_or(ConfigError::Missing(TABLE_NAME_VAR))?;
        Ok(Self {
            table_name,
            alerts_topic: non_blank(lookup(ALERTS_TOPIC_VAR)),
        })
    }

    pub fn publishing_enabled(&self) -> bool {
        self.alerts_topic.is_some()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn reads_both_settings() {
        let config = ProcessorConfig::from_lookup(lookup(&[
            ("DYNAMO_TABLE_NAME", "smartgrow"),
            ("ALERTS_TOPIC_ARN", "arn:aws:sns:us-east-1:123:alerts"),
        ]))
        .unwrap();
        assert_eq!(config.table_name, "smartgrow");
        assert!(config.publishing_enabled());
    }

    #[test]
    fn topic_is_optional() {
        let config = ProcessorConfig::from_lookup(lookup(&[("DYNAMO_TABLE_NAME", "smartgrow")])).unwrap();
        assert_eq!(config.alerts_topic, None);

        let config = ProcessorConfig::from_lookup(lookup(&[
            ("DYNAMO_TABLE_NAME", "smartgrow"),
            ("ALERTS_TOPIC_ARN", "  "),
        ]))
        .unwrap();
        assert!(!config.publishing_enabled());
    }

    #[test]
    fn table_is_required() {
        assert_eq!(
            ProcessorConfig::from_lookup(lookup(&[])),
            Err(ConfigError::Missing("DYNAMO_TABLE_NAME"))
        );
        assert!(ProcessorConfig::from_lookup(lookup(&[("DYNAMO_TABLE_NAME", "")])).is_err());
    }

    #[test]
    fn builder() {
        let config = ProcessorConfig::new("t").alerts_topic("alerts");
        assert_eq!(config.alerts_topic.as_deref(), Some("alerts"));
        assert_eq!(ProcessorConfig::new("t").alerts_topic("").alerts_topic, None);
    }
}
