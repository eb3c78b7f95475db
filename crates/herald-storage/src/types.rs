use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use herald_core::{NotificationConfig, NotificationStatus, NotificationTarget, Schedule};

/// A stored schedule-bearing notification definition.
///
/// The definition persists until it is cancelled, a one-shot schedule fires,
/// or a recurring rule reaches its end condition. `last_fired_at` and
/// `occurrences` are the per-rule state custom-interval evaluation and
/// max-occurrence accounting depend on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledNotification {
    pub id: String,
    pub config: NotificationConfig,
    pub target: NotificationTarget,
    pub schedule: Schedule,
    pub status: NotificationStatus,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339::option", default)]
    pub last_fired_at: Option<OffsetDateTime>,

    /// Completed firings of this definition.
    pub occurrences: u32,
}

impl ScheduledNotification {
    pub fn new(
        id: impl Into<String>,
        config: NotificationConfig,
        target: NotificationTarget,
        schedule: Schedule,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            config,
            target,
            schedule,
            status: NotificationStatus::Scheduled,
            created_at,
            last_fired_at: None,
            occurrences: 0,
        }
    }
}
