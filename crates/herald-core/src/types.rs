use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::OffsetDateTime;

/// A resolved, addressable recipient identity.
pub type UserId = i64;

/// Notification priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Normal,
    Important,
    Urgent,
    Critical,
}

impl NotificationPriority {
    pub const ALL: [NotificationPriority; 4] = [
        Self::Normal,
        Self::Important,
        Self::Urgent,
        Self::Critical,
    ];
}

/// Notification type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
    Announcement,
    Reminder,
    Alert,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 7] = [
        Self::Info,
        Self::Success,
        Self::Warning,
        Self::Error,
        Self::Announcement,
        Self::Reminder,
        Self::Alert,
    ];
}

/// Notification lifecycle status.
///
/// Transitions are monotonic: `sent`, `failed`, and `cancelled` are terminal,
/// and `cancelled` is only reachable before a delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Scheduled,
    Sent,
    Failed,
    Cancelled,
}

impl NotificationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Failed | Self::Cancelled)
    }

    pub fn can_transition_to(self, next: NotificationStatus) -> bool {
        use NotificationStatus::*;
        match (self, next) {
            (Pending, Sent) | (Pending, Failed) | (Pending, Cancelled) | (Pending, Scheduled) => {
                true
            }
            (Scheduled, Pending) | (Scheduled, Sent) | (Scheduled, Failed)
            | (Scheduled, Cancelled) => true,
            _ => false,
        }
    }
}

/// User role as known to the external user directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,
    Moderator,
    Admin,
    SuperAdmin,
}

/// An inline action button attached to a notification.
///
/// Exactly one of `url`/`callback_data` is expected to be set; the transport
/// decides how to present the button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationButton {
    pub label: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
}

impl NotificationButton {
    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: Some(url.into()),
            callback_data: None,
        }
    }

    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: None,
            callback_data: Some(data.into()),
        }
    }
}

/// Rendering mode for the message body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    #[default]
    Plain,
    Markdown,
    Html,
}

/// What to send: message body plus presentation options.
///
/// `priority: None` means "use the engine's configured default priority".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationConfig {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<NotificationPriority>,

    #[serde(default = "default_kind")]
    pub kind: NotificationKind,

    /// Opaque structured payload forwarded to the transport.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<NotificationButton>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default)]
    pub parse_mode: ParseMode,
}

fn default_kind() -> NotificationKind {
    NotificationKind::Info
}

impl NotificationConfig {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            priority: None,
            kind: NotificationKind::Info,
            data: None,
            buttons: Vec::new(),
            image: None,
            parse_mode: ParseMode::Plain,
        }
    }

    pub fn with_kind(mut self, kind: NotificationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Abstract audience descriptor; resolved to concrete recipients by the
/// audience resolver against the external user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "audience", rename_all = "snake_case")]
pub enum NotificationTarget {
    AllUsers,
    AllAdmins,
    SuperAdmin,
    Role { role: UserRole },
    SpecificUsers { user_ids: Vec<UserId> },
    ActiveUsers,
    InactiveUsers,
    NewUsers,
}

impl NotificationTarget {
    pub fn users(ids: impl Into<Vec<UserId>>) -> Self {
        Self::SpecificUsers {
            user_ids: ids.into(),
        }
    }

    /// The audience kind, used for statistics grouping.
    pub fn audience(&self) -> TargetAudience {
        match self {
            Self::AllUsers => TargetAudience::AllUsers,
            Self::AllAdmins => TargetAudience::AllAdmins,
            Self::SuperAdmin => TargetAudience::SuperAdmin,
            Self::Role { .. } => TargetAudience::Role,
            Self::SpecificUsers { .. } => TargetAudience::SpecificUsers,
            Self::ActiveUsers => TargetAudience::ActiveUsers,
            Self::InactiveUsers => TargetAudience::InactiveUsers,
            Self::NewUsers => TargetAudience::NewUsers,
        }
    }
}

/// Target audience kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetAudience {
    AllUsers,
    AllAdmins,
    SuperAdmin,
    Role,
    SpecificUsers,
    ActiveUsers,
    InactiveUsers,
    NewUsers,
}

impl TargetAudience {
    pub const ALL: [TargetAudience; 8] = [
        Self::AllUsers,
        Self::AllAdmins,
        Self::SuperAdmin,
        Self::Role,
        Self::SpecificUsers,
        Self::ActiveUsers,
        Self::InactiveUsers,
        Self::NewUsers,
    ];
}

/// Durable history entry for one delivery attempt (one-shot send or one
/// recurrence occurrence).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    pub message: String,
    pub kind: NotificationKind,
    pub priority: NotificationPriority,
    pub target: NotificationTarget,
    pub status: NotificationStatus,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339::option", default)]
    pub sent_at: Option<OffsetDateTime>,

    #[serde(with = "time::serde::rfc3339::option", default)]
    pub scheduled_at: Option<OffsetDateTime>,

    /// Recipients the delivery was attempted for, after preference filtering.
    pub recipients: Vec<UserId>,

    pub success_count: u32,
    pub failure_count: u32,

    /// Set only when the whole firing failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Aggregate statistics derived from all records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStatistics {
    pub total: u64,
    pub sent: u64,
    pub failed: u64,
    pub pending: u64,
    pub scheduled: u64,
    pub cancelled: u64,

    /// Percentage in `0.0..=100.0`; 0 when nothing was sent or failed.
    pub success_rate: f64,

    pub by_priority: HashMap<NotificationPriority, u64>,
    pub by_kind: HashMap<NotificationKind, u64>,
    pub by_target: HashMap<TargetAudience, u64>,
}

/// Outcome of one send operation as reported to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReport {
    pub success: bool,
    pub sent_count: u32,
    pub failed_count: u32,
    pub failed_user_ids: Vec<UserId>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl SendReport {
    pub fn empty() -> Self {
        Self {
            success: true,
            sent_count: 0,
            failed_count: 0,
            failed_user_ids: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// Batched delivery tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchConfig {
    /// Recipients per batch; batches are delivered one after another.
    pub batch_size: usize,

    /// Pause between batches, to smooth outbound rate.
    pub delay_between_batches_ms: u64,

    /// Keep delivering after a recipient fails.
    pub continue_on_error: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            delay_between_batches_ms: 1000,
            continue_on_error: true,
        }
    }
}
