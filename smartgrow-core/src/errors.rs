//! Error Types for the Alert Pipeline
//!
//! ## Error Categories
//!
//! Errors fall into four groups, each with a different blast radius:
//!
//! ### Decode Failures
//! - `DecodeError`: a change-stream image carried a malformed tagged value.
//!   Fatal for that record only; the dispatcher logs it and moves on.
//!
//! ### Collaborator Failures
//! - `StoreError`: a point lookup against the table failed.
//! - `NotifyError`: a publish call to the notification channel failed.
//!
//! Both are caught where the call is made and turned into "no match" or
//! "not delivered". They never reach the dispatcher.
//!
//! ### Configuration Failures
//! - `ConfigError`: required settings missing at startup.
//!
//! ## Propagation
//!
//! ```text
//! normalize ──DecodeError──▶ ProcessorError ──▶ dispatcher (log, skip record)
//! get_item  ──StoreError───▶ logged at call site, treated as None
//! publish   ──NotifyError──▶ logged at call site, PublishOutcome::Failed
//! ```

use thiserror::Error;

/// Result type for per-record pipeline operations
pub type ProcessorResult<T> = Result<T, ProcessorError>;

/// A tagged attribute value could not be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Value wrapper was not a single-key object
    #[error("attribute `{attribute}`: expected exactly one type tag, found {found}")]
    MalformedWrapper {
        /// Attribute path being decoded
        attribute: String,
        /// Number of keys found on the wrapper
        found: usize,
    },

    /// Tag is not part of the change-stream encoding
    #[error("attribute `{attribute}`: unknown type tag `{tag}`")]
    UnknownTag {
        /// Attribute path being decoded
        attribute: String,
        /// The offending tag
        tag: String,
    },

    /// Tag was known but its payload had the wrong shape
    #[error("attribute `{attribute}`: invalid `{tag}` payload: {reason}")]
    InvalidPayload {
        /// Attribute path being decoded
        attribute: String,
        /// Tag whose payload failed
        tag: &'static str,
        /// What was wrong
        reason: String,
    },
}

/// Point lookup against the table failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("table `{table}` unavailable: {reason}")]
    Unavailable { table: String, reason: String },

    #[error("lookup {pk}/{sk} failed: {reason}")]
    Lookup { pk: String, sk: String, reason: String },
}

/// Publish call to the notification channel failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("delivery to `{topic}` failed: {reason}")]
    Delivery { topic: String, reason: String },

    #[error("notification channel rejected message: {0}")]
    Rejected(String),
}

/// Startup configuration is incomplete
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required setting absent
    #[error("environment variable {0} must be set")]
    Missing(&'static str),
}

/// Anything that can fail a single record's pipeline run
#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("malformed change record: {0}")]
    Malformed(String),
}
