//! The scheduler loop that fires due notifications.
//!
//! A tick never blocks the loop: due processing runs on a spawned task.
//! Firings within a tick run concurrently; bookkeeping (occurrence counts,
//! removal of finished definitions) happens after each firing completes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, error, info, warn};

use herald_core::{DUE_TOLERANCE, Schedule};
use herald_storage::StorageError;

use crate::error::Result;
use crate::service::NotificationEngine;

pub struct Scheduler {
    engine: Arc<NotificationEngine>,
}

impl Scheduler {
    pub fn new(engine: Arc<NotificationEngine>) -> Self {
        Self { engine }
    }

    /// Run the tick loop forever. Intended to be spawned as a task.
    pub async fn run(self: Arc<Self>) {
        let period = Duration::from_secs(self.engine.config.tick_interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(period_secs = period.as_secs(), "Notification scheduler started");

        loop {
            ticker.tick().await;
            let scheduler = self.clone();
            tokio::spawn(async move {
                match scheduler.process_due().await {
                    Ok(fired) if fired > 0 => {
                        info!(fired, "Processed due notifications");
                    }
                    Ok(_) => {}
                    Err(err) => {
                        error!(error = %err, "Scheduler tick failed");
                    }
                }
            });
        }
    }

    /// One evaluation pass: retire finished definitions, fire due ones.
    /// Returns how many definitions fired.
    pub async fn process_due(&self) -> Result<u32> {
        let now = self.engine.clock.now();
        let mut due = Vec::new();

        for definition in self.engine.schedules.list().await? {
            if let Schedule::Recurring(rule) = &definition.schedule {
                let ended = rule.end_date.is_some_and(|end| now > end);
                let exhausted = rule
                    .max_occurrences
                    .is_some_and(|max| definition.occurrences >= max);
                if ended || exhausted {
                    info!(schedule_id = %definition.id, "Recurring notification finished; removing");
                    self.engine.schedules.remove(&definition.id).await?;
                    continue;
                }
                // A firing within the current tolerance window already
                // happened; a second tick inside the window must not refire.
                if definition
                    .last_fired_at
                    .is_some_and(|fired| now - fired < DUE_TOLERANCE * 2)
                {
                    continue;
                }
            }
            if definition.schedule.is_due(definition.last_fired_at, now) {
                due.push(definition.id);
            }
        }

        let firings = due.iter().map(|id| self.fire(id));
        let mut fired = 0;
        for outcome in join_all(firings).await {
            match outcome {
                Ok(true) => fired += 1,
                Ok(false) => {}
                Err(err) => error!(error = %err, "Scheduled firing failed"),
            }
        }
        Ok(fired)
    }

    /// Fire a single definition. Returns false when the definition was
    /// cancelled between being listed and being fired.
    async fn fire(&self, id: &str) -> Result<bool> {
        let Some(definition) = self.engine.schedules.get(id).await? else {
            debug!(schedule_id = %id, "Definition cancelled before firing");
            return Ok(false);
        };

        let now = self.engine.clock.now();
        let scheduled_at = match &definition.schedule {
            Schedule::At(at) => Some(*at),
            _ => Some(now),
        };

        let mut metadata = HashMap::new();
        metadata.insert(
            "scheduleId".to_string(),
            serde_json::Value::String(definition.id.clone()),
        );

        let batch = self.engine.config.batch.clone();
        if let Err(err) = self
            .engine
            .dispatch(&definition.config, &definition.target, scheduled_at, &batch, metadata)
            .await
        {
            // The failed outcome is already recorded; the definition stays
            // for its next occurrence (one-shots are retired below).
            warn!(schedule_id = %definition.id, error = %err, "Scheduled delivery failed");
        }

        match &definition.schedule {
            Schedule::Recurring(rule) => {
                match self.engine.schedules.record_firing(id, now).await {
                    Ok(occurrences) => {
                        if rule.max_occurrences.is_some_and(|max| occurrences >= max) {
                            info!(schedule_id = %definition.id, occurrences, "Recurring notification reached its occurrence limit; removing");
                            self.engine.schedules.remove(id).await?;
                        }
                    }
                    // Cancelled while the firing was in flight; the record
                    // stands but nothing further fires.
                    Err(StorageError::NotFound { .. }) => {
                        debug!(schedule_id = %definition.id, "Definition cancelled during firing");
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            _ => {
                self.engine.schedules.remove(id).await?;
            }
        }

        Ok(true)
    }
}
