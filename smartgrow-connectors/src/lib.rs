//! Connectors for the SmartGrow Alert Processor
//!
//! ## Overview
//!
//! `smartgrow-core` only knows the [`TableStore`] and [`Notifier`] traits.
//! This crate provides the concrete collaborators a deployment wires in:
//!
//! | Connector        | Trait        | Use                                        |
//! |------------------|--------------|--------------------------------------------|
//! | `MemoryTable`    | `TableStore` | local runs and tests, seeded from fixtures |
//! | `MemoryNotifier` | `Notifier`   | dry runs and tests, records every message  |
//! | `HttpNotifier`   | `Notifier`   | webhook delivery with auth and retries     |
//!
//! ## Lifetime
//!
//! Connectors are built once at startup and shared by reference for the
//! life of the process. They are read-only after construction apart from
//! their own counters, and the dispatcher calls them one at a time.
//!
//! ## Example Usage
//!
//! ```rust
//! use smartgrow_connectors::{MemoryNotifier, MemoryTable};
//! use smartgrow_core::{ChangeBatch, ProcessorConfig, StreamDispatcher};
//!
//! # async fn example() {
//! let config = ProcessorConfig::new("smartgrow").alerts_topic("alerts");
//! let table = MemoryTable::new(&config.table_name);
//! let dispatcher = StreamDispatcher::new(config, table, MemoryNotifier::new());
//!
//! let summary = dispatcher.handle_batch(&ChangeBatch::default()).await;
//! assert_eq!(summary.processed_records, 0);
//! # }
//! ```
//!
//! [`TableStore`]: smartgrow_core::TableStore
//! [`Notifier`]: smartgrow_core::Notifier

pub mod memory;

#[cfg(feature = "http")]
pub mod http;

// Re-export common types
pub use memory::{MemoryNotifier, MemoryTable, SentMessage};

#[cfg(feature = "http")]
pub use http::{AuthMethod, HttpConfig, HttpError, HttpNotifier};

use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fixture error: {0}")]
    Fixture(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Delivery statistics common to all notifiers
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Total messages delivered
    pub messages_sent: u64,
    /// Total messages that failed after all retries
    pub messages_failed: u64,
    /// Total payload bytes delivered
    pub bytes_sent: u64,
    /// Last error message
    pub last_error: Option<String>,
}
