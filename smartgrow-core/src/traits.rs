//! Collaborator Traits
//!
//! ## Overview
//!
//! The pipeline talks to exactly two outside services:
//!
//! - [`TableStore`]: point lookups by exact partition/sort key
//! - [`Notifier`]: fire-and-forget `publish(topic, subject, body)`
//!
//! Both are constructed once at process start and handed to the
//! dispatcher. Nothing in this crate reaches for a global client, so tests
//! substitute in-memory fakes and the binary wires real connectors.
//!
//! Calls are awaited one at a time. Timeouts and retries belong to the
//! implementation behind the trait, not to the pipeline.

use std::sync::Arc;

use async_trait::async_trait;

use crate::attributes::AttributeMap;
use crate::errors::{NotifyError, StoreError};
use crate::keys::ItemKey;

/// Read access to the single wide-column table
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Fetch the item stored under `key`, if any
    async fn get_item(&self, key: &ItemKey) -> Result<Option<AttributeMap>, StoreError>;

    /// Table identifier, for log context
    fn table_name(&self) -> &str;
}

/// Outbound notification channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, topic: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

#[async_trait]
impl<T: TableStore + ?Sized> TableStore for Arc<T> {
    async fn get_item(&self, key: &ItemKey) -> Result<Option<AttributeMap>, StoreError> {
        (**self).get_item(key).await
    }

    fn table_name(&self) -> &str {
        (**self).table_name()
    }
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    async fn publish(&self, topic: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        (**self).publish(topic, subject, body).await
    }
}
