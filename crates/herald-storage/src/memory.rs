//! In-memory store implementations.
//!
//! Suitable for tests and single-process deployments. Each store serializes
//! access through one `RwLock`, so a record and its counts are visible to
//! readers all at once or not at all.

use async_trait::async_trait;
use std::collections::HashMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use herald_core::{NotificationRecord, NotificationStatistics, NotificationStatus, Template};

use crate::error::StorageError;
use crate::traits::{RecordStore, ScheduleStore, TemplateStore};
use crate::types::ScheduledNotification;

/// In-memory `ScheduleStore`.
#[derive(Default)]
pub struct MemoryScheduleStore {
    definitions: RwLock<HashMap<String, ScheduledNotification>>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScheduleStore for MemoryScheduleStore {
    async fn insert(&self, definition: ScheduledNotification) -> Result<(), StorageError> {
        self.definitions
            .write()
            .await
            .insert(definition.id.clone(), definition);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ScheduledNotification>, StorageError> {
        Ok(self.definitions.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<ScheduledNotification>, StorageError> {
        Ok(self.definitions.read().await.values().cloned().collect())
    }

    async fn remove(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.definitions.write().await.remove(id).is_some())
    }

    async fn record_firing(&self, id: &str, at: OffsetDateTime) -> Result<u32, StorageError> {
        let mut definitions = self.definitions.write().await;
        let definition = definitions
            .get_mut(id)
            .ok_or_else(|| StorageError::not_found("scheduled notification", id))?;
        definition.last_fired_at = Some(at);
        definition.occurrences += 1;
        Ok(definition.occurrences)
    }
}

/// In-memory `RecordStore`.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<NotificationRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn append(&self, record: NotificationRecord) -> Result<(), StorageError> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<NotificationRecord>, StorageError> {
        let records = self.records.read().await;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    async fn count(&self) -> Result<u64, StorageError> {
        Ok(self.records.read().await.len() as u64)
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.records.write().await.clear();
        Ok(())
    }

    async fn statistics(&self) -> Result<NotificationStatistics, StorageError> {
        let records = self.records.read().await;
        let mut stats = NotificationStatistics {
            total: records.len() as u64,
            ..Default::default()
        };

        for record in records.iter() {
            match record.status {
                NotificationStatus::Sent => stats.sent += 1,
                NotificationStatus::Failed => stats.failed += 1,
                NotificationStatus::Pending => stats.pending += 1,
                NotificationStatus::Scheduled => stats.scheduled += 1,
                NotificationStatus::Cancelled => stats.cancelled += 1,
            }
            *stats.by_priority.entry(record.priority).or_default() += 1;
            *stats.by_kind.entry(record.kind).or_default() += 1;
            *stats.by_target.entry(record.target.audience()).or_default() += 1;
        }

        let attempted = stats.sent + stats.failed;
        stats.success_rate = if attempted > 0 {
            (stats.sent as f64 / attempted as f64) * 100.0
        } else {
            0.0
        };

        Ok(stats)
    }
}

/// In-memory `TemplateStore`.
#[derive(Default)]
pub struct MemoryTemplateStore {
    templates: RwLock<HashMap<String, Template>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn upsert(&self, template: Template) -> Result<(), StorageError> {
        self.templates
            .write()
            .await
            .insert(template.id.clone(), template);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Template>, StorageError> {
        Ok(self.templates.read().await.get(id).cloned())
    }

    async fn remove(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.templates.write().await.remove(id).is_some())
    }

    async fn list(&self) -> Result<Vec<Template>, StorageError> {
        Ok(self.templates.read().await.values().cloned().collect())
    }
}
