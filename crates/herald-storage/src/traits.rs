//! Store traits the engine is built against.
//!
//! Stores are injected into the engine at construction; there is no global
//! registry state. All implementations must be thread-safe (`Send + Sync`).

use async_trait::async_trait;
use std::sync::Arc;
use time::OffsetDateTime;

use herald_core::{NotificationRecord, NotificationStatistics, Template};

use crate::error::StorageError;
use crate::types::ScheduledNotification;

/// Store for schedule-bearing notification definitions.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Persist a new definition.
    async fn insert(&self, definition: ScheduledNotification) -> Result<(), StorageError>;

    /// Fetch a definition by id.
    async fn get(&self, id: &str) -> Result<Option<ScheduledNotification>, StorageError>;

    /// All stored definitions.
    async fn list(&self) -> Result<Vec<ScheduledNotification>, StorageError>;

    /// Remove a definition (cancellation, one-shot completion, recurrence
    /// end). Returns whether it existed.
    async fn remove(&self, id: &str) -> Result<bool, StorageError>;

    /// Record a completed firing: update `last_fired_at` and increment the
    /// occurrence counter. Returns the new occurrence count.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the definition was removed in the
    /// meantime.
    async fn record_firing(&self, id: &str, at: OffsetDateTime) -> Result<u32, StorageError>;
}

/// Append-only store for delivery history records.
///
/// A record must become visible to readers atomically with its final counts;
/// no partially-written record may be observed.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append a finished record.
    async fn append(&self, record: NotificationRecord) -> Result<(), StorageError>;

    /// The most recent records, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<NotificationRecord>, StorageError>;

    /// Total number of records.
    async fn count(&self) -> Result<u64, StorageError>;

    /// Drop all history.
    async fn clear(&self) -> Result<(), StorageError>;

    /// Aggregate counts by status, priority, kind, and target, plus the
    /// success rate.
    async fn statistics(&self) -> Result<NotificationStatistics, StorageError>;
}

/// Store for reusable notification templates.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Insert or replace a template by id.
    async fn upsert(&self, template: Template) -> Result<(), StorageError>;

    /// Fetch a template by id.
    async fn get(&self, id: &str) -> Result<Option<Template>, StorageError>;

    /// Remove a template. Returns whether it existed.
    async fn remove(&self, id: &str) -> Result<bool, StorageError>;

    /// All stored templates.
    async fn list(&self) -> Result<Vec<Template>, StorageError>;
}

pub type DynScheduleStore = Arc<dyn ScheduleStore>;
pub type DynRecordStore = Arc<dyn RecordStore>;
pub type DynTemplateStore = Arc<dyn TemplateStore>;
