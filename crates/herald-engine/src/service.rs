//! The caller-facing notification engine.
//!
//! All collaborators (transport, user directory, stores, clock) are injected
//! at construction; the engine owns no global state. Immediate sends and
//! scheduler firings share one delivery pipeline: resolve audience, filter
//! per-recipient preferences, deliver in batches, record the outcome.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use time::OffsetDateTime;
use tracing::{info, warn};

use herald_core::{
    BatchConfig, NotificationConfig, NotificationRecord, NotificationStatistics,
    NotificationStatus, NotificationTarget, Schedule, SendReport, Template,
    UserNotificationPreferences, UserRole, VariableMap, generate_id,
};
use herald_storage::{
    RecordStore, ScheduleStore, ScheduledNotification, TemplateStore,
};

use crate::audience::AudienceResolver;
use crate::batch;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::directory::UserDirectory;
use crate::error::{EngineError, Result};
use crate::transport::{OutboundMessage, Transport};

pub struct NotificationEngine {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) directory: Arc<dyn UserDirectory>,
    pub(crate) schedules: Arc<dyn ScheduleStore>,
    pub(crate) records: Arc<dyn RecordStore>,
    pub(crate) templates: Arc<dyn TemplateStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: EngineConfig,
    resolver: AudienceResolver,
}

impl NotificationEngine {
    pub fn new(
        transport: Arc<dyn Transport>,
        directory: Arc<dyn UserDirectory>,
        schedules: Arc<dyn ScheduleStore>,
        records: Arc<dyn RecordStore>,
        templates: Arc<dyn TemplateStore>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let resolver = AudienceResolver::new(directory.clone());
        Self {
            transport,
            directory,
            schedules,
            records,
            templates,
            clock,
            config,
            resolver,
        }
    }

    // ==================== Immediate sends ====================

    /// Send to a target right now, with the engine's default batching.
    pub async fn send(
        &self,
        config: NotificationConfig,
        target: NotificationTarget,
    ) -> Result<SendReport> {
        let batch = self.config.batch.clone();
        self.send_with_batch(config, target, batch).await
    }

    pub async fn send_with_batch(
        &self,
        config: NotificationConfig,
        target: NotificationTarget,
        batch: BatchConfig,
    ) -> Result<SendReport> {
        self.dispatch(&config, &target, None, &batch, HashMap::new())
            .await
    }

    pub async fn send_to_all_users(&self, config: NotificationConfig) -> Result<SendReport> {
        self.send(config, NotificationTarget::AllUsers).await
    }

    pub async fn send_to_admins(&self, config: NotificationConfig) -> Result<SendReport> {
        self.send(config, NotificationTarget::AllAdmins).await
    }

    pub async fn send_to_super_admin(&self, config: NotificationConfig) -> Result<SendReport> {
        self.send(config, NotificationTarget::SuperAdmin).await
    }

    pub async fn send_to_role(
        &self,
        role: UserRole,
        config: NotificationConfig,
    ) -> Result<SendReport> {
        self.send(config, NotificationTarget::Role { role }).await
    }

    pub async fn send_to_users(
        &self,
        user_ids: Vec<i64>,
        config: NotificationConfig,
    ) -> Result<SendReport> {
        self.send(config, NotificationTarget::users(user_ids)).await
    }

    pub async fn send_to_active_users(&self, config: NotificationConfig) -> Result<SendReport> {
        self.send(config, NotificationTarget::ActiveUsers).await
    }

    pub async fn send_to_inactive_users(&self, config: NotificationConfig) -> Result<SendReport> {
        self.send(config, NotificationTarget::InactiveUsers).await
    }

    pub async fn send_to_new_users(&self, config: NotificationConfig) -> Result<SendReport> {
        self.send(config, NotificationTarget::NewUsers).await
    }

    // ==================== Scheduling ====================

    /// Store a notification for later delivery by the scheduler loop.
    ///
    /// The schedule is validated synchronously; a malformed rule never
    /// reaches a scheduler tick.
    pub async fn schedule(
        &self,
        config: NotificationConfig,
        target: NotificationTarget,
        schedule: Schedule,
    ) -> Result<String> {
        if matches!(schedule, Schedule::Immediate) {
            return Err(EngineError::InvalidSchedule(
                "an immediate notification cannot be scheduled; use send".into(),
            ));
        }
        schedule.validate()?;

        let id = generate_id();
        let definition = ScheduledNotification::new(
            id.clone(),
            config,
            target,
            schedule,
            self.clock.now(),
        );
        info!(schedule_id = %id, schedule = %definition.schedule, "Notification scheduled");
        self.schedules.insert(definition).await?;
        Ok(id)
    }

    /// Cancel a scheduled or recurring definition. Returns whether anything
    /// was cancelled.
    pub async fn cancel_scheduled(&self, id: &str) -> Result<bool> {
        let removed = self.schedules.remove(id).await?;
        if removed {
            info!(schedule_id = %id, "Scheduled notification cancelled");
        }
        Ok(removed)
    }

    // ==================== Templates ====================

    pub async fn register_template(&self, template: Template) -> Result<()> {
        self.templates.upsert(template).await?;
        Ok(())
    }

    pub async fn template(&self, id: &str) -> Result<Option<Template>> {
        Ok(self.templates.get(id).await?)
    }

    pub async fn remove_template(&self, id: &str) -> Result<bool> {
        Ok(self.templates.remove(id).await?)
    }

    pub async fn templates(&self) -> Result<Vec<Template>> {
        Ok(self.templates.list().await?)
    }

    /// Render a template and send it.
    ///
    /// Variable completeness is checked before any delivery work: a missing
    /// declared variable is a synchronous error naming the absent names.
    pub async fn send_from_template(
        &self,
        template_id: &str,
        target: NotificationTarget,
        variables: &VariableMap,
    ) -> Result<SendReport> {
        let template = self
            .templates
            .get(template_id)
            .await?
            .ok_or_else(|| EngineError::TemplateNotFound(template_id.to_string()))?;

        let validation = template.validate_variables(variables);
        if !validation.valid {
            return Err(EngineError::MissingVariables(validation.missing));
        }

        let config = NotificationConfig {
            message: template.render(variables),
            priority: Some(template.priority),
            kind: template.kind,
            data: None,
            buttons: template.buttons.clone(),
            image: None,
            parse_mode: herald_core::ParseMode::Plain,
        };
        let metadata = template_metadata(&template);
        let batch = self.config.batch.clone();
        self.dispatch(&config, &target, None, &batch, metadata).await
    }

    /// Render a template once per recipient, merging caller-supplied
    /// variables with the directory's per-user values (user values win).
    ///
    /// Every body differs, so delivery cannot share one message; recipients
    /// are still chunked and paced like any other send. A failed per-user
    /// variable lookup fails only that recipient, never the firing.
    pub async fn send_from_template_per_user(
        &self,
        template_id: &str,
        target: NotificationTarget,
        static_variables: &VariableMap,
    ) -> Result<SendReport> {
        let template = self
            .templates
            .get(template_id)
            .await?
            .ok_or_else(|| EngineError::TemplateNotFound(template_id.to_string()))?;

        if !self.config.enabled {
            info!("Notifications are disabled; skipping personalized send");
            return Ok(disabled_report());
        }

        let now = self.clock.now();
        let priority = template.priority;
        let recipients = self.resolver.resolve(&target).await?;
        let allowed = self
            .filter_by_preferences(&recipients, template.kind, priority, now)
            .await?;

        let presentation = OutboundMessage {
            text: String::new(),
            buttons: template.buttons.clone(),
            image: None,
            parse_mode: herald_core::ParseMode::Plain,
        };

        let batch = self.config.batch.clone();
        let batch_size = batch.batch_size.max(1);
        let mut report = SendReport::empty();
        let mut batches = allowed.chunks(batch_size).peekable();
        while let Some(chunk) = batches.next() {
            let presentation = &presentation;
            let template = &template;
            let sends = chunk.iter().map(|&id| async move {
                let variables = match self.directory.user_variables(id).await {
                    Ok(user_variables) => {
                        let mut merged = static_variables.clone();
                        merged.extend(user_variables);
                        merged
                    }
                    Err(err) => return (id, Err(err.to_string())),
                };
                let message = presentation.with_text(template.render(&variables));
                match self.transport.send(id, &message).await {
                    Ok(()) => (id, Ok(())),
                    Err(failure) => (id, Err(failure.reason)),
                }
            });
            for (id, result) in join_all(sends).await {
                match result {
                    Ok(()) => report.sent_count += 1,
                    Err(reason) => {
                        report.failed_count += 1;
                        report.failed_user_ids.push(id);
                        report.errors.push(reason);
                    }
                }
            }
            if !batch.continue_on_error && report.failed_count > 0 {
                break;
            }
            if batches.peek().is_some() && batch.delay_between_batches_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(
                    batch.delay_between_batches_ms,
                ))
                .await;
            }
        }
        report.success = report.failed_count == 0;

        let status = delivery_status(report.sent_count, report.failed_count);
        self.append_record(
            &template.body,
            template.kind,
            priority,
            &target,
            status,
            now,
            None,
            allowed,
            report.sent_count,
            report.failed_count,
            failure_reason(status, &report.errors),
            template_metadata(&template),
        )
        .await?;

        Ok(report)
    }

    // ==================== Preferences ====================

    pub async fn set_user_preferences(
        &self,
        user_id: i64,
        preferences: UserNotificationPreferences,
    ) -> Result<()> {
        self.directory.set_preferences(user_id, preferences).await?;
        Ok(())
    }

    pub async fn user_preferences(
        &self,
        user_id: i64,
    ) -> Result<Option<UserNotificationPreferences>> {
        Ok(self.directory.get_preferences(user_id).await?)
    }

    // ==================== History & statistics ====================

    pub async fn statistics(&self) -> Result<NotificationStatistics> {
        Ok(self.records.statistics().await?)
    }

    pub async fn history(&self, limit: usize) -> Result<Vec<NotificationRecord>> {
        Ok(self.records.recent(limit).await?)
    }

    pub async fn clear_history(&self) -> Result<()> {
        self.records.clear().await?;
        Ok(())
    }

    // ==================== Pipeline ====================

    /// The shared delivery pipeline for immediate sends and scheduler
    /// firings.
    ///
    /// A directory failure aborts the firing: the record is written as
    /// `failed` with the reason, and the error is returned. Per-recipient
    /// transport failures never abort; they surface as aggregate counts.
    pub(crate) async fn dispatch(
        &self,
        config: &NotificationConfig,
        target: &NotificationTarget,
        scheduled_at: Option<OffsetDateTime>,
        batch: &BatchConfig,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<SendReport> {
        if !self.config.enabled {
            info!("Notifications are disabled; skipping send");
            return Ok(disabled_report());
        }

        let now = self.clock.now();
        let priority = config.priority.unwrap_or(self.config.default_priority);

        let resolved = match self.resolve_and_filter(config, target, priority, now).await {
            Ok(ids) => ids,
            Err(error) => {
                self.append_record(
                    &config.message,
                    config.kind,
                    priority,
                    target,
                    NotificationStatus::Failed,
                    now,
                    scheduled_at,
                    Vec::new(),
                    0,
                    0,
                    Some(error.to_string()),
                    metadata,
                )
                .await?;
                return Err(error.into());
            }
        };

        if resolved.is_empty() {
            self.append_record(
                &config.message,
                config.kind,
                priority,
                target,
                NotificationStatus::Sent,
                now,
                scheduled_at,
                Vec::new(),
                0,
                0,
                None,
                metadata,
            )
            .await?;
            return Ok(SendReport::empty());
        }

        let message = OutboundMessage::from_config(config);
        let outcome = batch::deliver(self.transport.as_ref(), &message, &resolved, batch).await;

        let status = delivery_status(outcome.success_count, outcome.failed_count);
        self.append_record(
            &config.message,
            config.kind,
            priority,
            target,
            status,
            now,
            scheduled_at,
            resolved.clone(),
            outcome.success_count,
            outcome.failed_count,
            failure_reason(status, &outcome.errors),
            metadata,
        )
        .await?;

        info!(
            kind = ?config.kind,
            priority = ?priority,
            target = ?target.audience(),
            recipients = resolved.len(),
            sent = outcome.success_count,
            failed = outcome.failed_count,
            "Notification delivered"
        );
        if outcome.failed_count > 0 {
            warn!(
                failed = outcome.failed_count,
                failed_ids = ?outcome.failed_ids,
                "Some recipients could not be reached"
            );
        }

        Ok(SendReport {
            success: outcome.failed_count == 0,
            sent_count: outcome.success_count,
            failed_count: outcome.failed_count,
            failed_user_ids: outcome.failed_ids,
            errors: outcome.errors,
        })
    }

    async fn resolve_and_filter(
        &self,
        config: &NotificationConfig,
        target: &NotificationTarget,
        priority: herald_core::NotificationPriority,
        now: OffsetDateTime,
    ) -> std::result::Result<Vec<i64>, crate::directory::DirectoryError> {
        let recipients = self.resolver.resolve(target).await?;
        self.filter_by_preferences(&recipients, config.kind, priority, now)
            .await
    }

    async fn filter_by_preferences(
        &self,
        recipients: &[i64],
        kind: herald_core::NotificationKind,
        priority: herald_core::NotificationPriority,
        now: OffsetDateTime,
    ) -> std::result::Result<Vec<i64>, crate::directory::DirectoryError> {
        let mut allowed = Vec::with_capacity(recipients.len());
        for id in recipients {
            let preferences = self.directory.get_preferences(*id).await?;
            let permitted = preferences
                .map(|prefs| prefs.allows(kind, priority, now))
                .unwrap_or(true);
            if permitted {
                allowed.push(*id);
            }
        }
        Ok(allowed)
    }

    #[allow(clippy::too_many_arguments)]
    async fn append_record(
        &self,
        message: &str,
        kind: herald_core::NotificationKind,
        priority: herald_core::NotificationPriority,
        target: &NotificationTarget,
        status: NotificationStatus,
        now: OffsetDateTime,
        scheduled_at: Option<OffsetDateTime>,
        recipients: Vec<i64>,
        success_count: u32,
        failure_count: u32,
        failure_reason: Option<String>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<()> {
        debug_assert!(NotificationStatus::Pending.can_transition_to(status));
        let record = NotificationRecord {
            id: generate_id(),
            message: message.to_string(),
            kind,
            priority,
            target: target.clone(),
            status,
            created_at: now,
            sent_at: (status == NotificationStatus::Sent).then_some(now),
            scheduled_at,
            recipients,
            success_count,
            failure_count,
            failure_reason,
            metadata,
        };
        self.records.append(record).await?;
        Ok(())
    }
}

fn delivery_status(success_count: u32, failed_count: u32) -> NotificationStatus {
    // Partial success still counts as sent; failed means nobody got it.
    if success_count == 0 && failed_count > 0 {
        NotificationStatus::Failed
    } else {
        NotificationStatus::Sent
    }
}

fn failure_reason(status: NotificationStatus, errors: &[String]) -> Option<String> {
    if status == NotificationStatus::Failed {
        Some(errors.join("; "))
    } else {
        None
    }
}

fn disabled_report() -> SendReport {
    SendReport {
        success: false,
        sent_count: 0,
        failed_count: 0,
        failed_user_ids: Vec::new(),
        errors: vec!["notifications are disabled".to_string()],
    }
}

fn template_metadata(template: &Template) -> HashMap<String, serde_json::Value> {
    let mut metadata = HashMap::new();
    metadata.insert(
        "templateId".to_string(),
        serde_json::Value::String(template.id.clone()),
    );
    metadata.insert(
        "templateName".to_string(),
        serde_json::Value::String(template.name.clone()),
    );
    metadata
}
