//! Per-recipient notification preferences and the preference filter.
//!
//! The model is opt-out: a recipient with no stored preferences receives
//! everything, and an absent type/priority list means no restriction on
//! that axis.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::time::{TimeOfDay, minute_of_day};
use crate::types::{NotificationKind, NotificationPriority};

/// A recipient-configured window during which notifications are suppressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuietHours {
    pub enabled: bool,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// Whether `now` falls inside the quiet window `[start, end]`.
///
/// Comparison is on minute-of-day only, bounds inclusive. A window with
/// `start > end` wraps overnight: 22:00-08:00 covers 23:30 and 03:00 but
/// not 12:00.
pub fn is_in_quiet_hours(start: TimeOfDay, end: TimeOfDay, now: OffsetDateTime) -> bool {
    let current = minute_of_day(now);
    let start = start.minute_of_day();
    let end = end.minute_of_day();

    if start <= end {
        current >= start && current <= end
    } else {
        current >= start || current <= end
    }
}

/// Per-recipient notification preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNotificationPreferences {
    pub enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<NotificationKind>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priorities: Option<Vec<NotificationPriority>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiet_hours: Option<QuietHours>,
}

impl Default for UserNotificationPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            kinds: None,
            priorities: None,
            quiet_hours: None,
        }
    }
}

impl UserNotificationPreferences {
    /// The preference filter: may a notification of this kind and priority
    /// reach the recipient right now?
    ///
    /// Checks run in order: enabled flag, kind allow-list, priority
    /// allow-list, quiet hours. `enabled: false` short-circuits everything.
    pub fn allows(
        &self,
        kind: NotificationKind,
        priority: NotificationPriority,
        now: OffsetDateTime,
    ) -> bool {
        if !self.enabled {
            return false;
        }

        if let Some(kinds) = &self.kinds
            && !kinds.is_empty()
            && !kinds.contains(&kind)
        {
            return false;
        }

        if let Some(priorities) = &self.priorities
            && !priorities.is_empty()
            && !priorities.contains(&priority)
        {
            return false;
        }

        if let Some(quiet) = &self.quiet_hours
            && quiet.enabled
            && is_in_quiet_hours(quiet.start, quiet.end, now)
        {
            return false;
        }

        true
    }
}
