pub mod error;
pub mod id;
pub mod prefs;
pub mod schedule;
pub mod template;
pub mod time;
pub mod types;

pub use error::{CoreError, Result};
pub use id::generate_id;
pub use prefs::{QuietHours, UserNotificationPreferences, is_in_quiet_hours};
pub use schedule::{DUE_TOLERANCE, RecurrenceFrequency, RecurringRule, Schedule};
pub use template::{Template, VariableMap, VariableValidation, detect_variables, render_body};
pub use time::{TimeOfDay, minute_of_day};
pub use types::{
    BatchConfig, NotificationButton, NotificationConfig, NotificationKind, NotificationPriority,
    NotificationRecord, NotificationStatistics, NotificationStatus, NotificationTarget, ParseMode,
    SendReport, TargetAudience, UserId, UserRole,
};
