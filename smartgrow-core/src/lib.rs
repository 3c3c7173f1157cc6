//! Threshold-deviation evaluation for SmartGrow plot-state change streams
//!
//! Every sensor snapshot written to the SmartGrow table shows up on the
//! table's change stream. This crate evaluates each new snapshot against the
//! species' ideal ranges and notifies the facility's responsible people when
//! something is out of range.
//!
//! Pipeline stages, leaves first:
//!
//! - [`attributes`] decodes the stream's tagged values
//! - [`classifier`] recognizes plot-state rows and extracts identifiers
//! - [`ranges`] resolves the ideal range (facility override, then profile)
//! - [`deviation`] compares metrics against bounds
//! - [`roster`] finds the recipients for a facility
//! - [`alert`] renders and publishes the notification
//! - [`dispatcher`] drives a batch through all of the above
//!
//! ```no_run
//! use smartgrow_core::{ChangeBatch, ProcessorConfig, StreamDispatcher};
//! # async fn run<S, N>(store: S, notifier: N, batch: ChangeBatch) -> Result<(), Box<dyn std::error::Error>>
//! # where S: smartgrow_core::TableStore, N: smartgrow_core::Notifier {
//! let config = ProcessorConfig::from_env()?;
//! let dispatcher = StreamDispatcher::new(config, store, notifier);
//!
//! let summary = dispatcher.handle_batch(&batch).await;
//! println!("{} of {} records evaluated", summary.processed_records, summary.total_records);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod alert;
pub mod attributes;
pub mod classifier;
pub mod config;
pub mod deviation;
pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod keys;
pub mod ranges;
pub mod roster;
pub mod traits;

// Public API
pub use alert::{Alert, AlertContext, PublishOutcome};
pub use attributes::{AttributeMap, AttributeValue};
pub use classifier::PlotState;
pub use config::ProcessorConfig;
pub use deviation::{Deviation, Direction, Metric};
pub use dispatcher::{BatchSummary, RecordOutcome, StreamDispatcher};
pub use errors::{ConfigError, DecodeError, NotifyError, ProcessorError, StoreError};
pub use events::{ChangeBatch, ChangeRecord, ChangeType};
pub use keys::ItemKey;
pub use ranges::{IdealRanges, RangeSource};
pub use traits::{Notifier, TableStore};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
