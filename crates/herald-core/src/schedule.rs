//! Schedule model and recurrence evaluation.
//!
//! All functions here are pure and deterministic given `(rule, last_fired, now)`,
//! so due-time logic is testable without wall-clock waits. A malformed rule
//! (missing a field its frequency requires) is inert: `is_due` returns false
//! instead of failing a scheduler tick.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Date, Duration, Month, OffsetDateTime};

use crate::error::{CoreError, Result};
use crate::time::TimeOfDay;

/// Tolerance window around a rule's time-of-day that absorbs tick jitter.
pub const DUE_TOLERANCE: Duration = Duration::minutes(1);

/// Recurrence frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceFrequency {
    Daily,
    Weekly,
    Monthly,
    Custom,
}

/// A recurring schedule definition.
///
/// Weekdays are numbered `0 = Sunday .. 6 = Saturday`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringRule {
    pub frequency: RecurrenceFrequency,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeOfDay>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<u8>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u8>,

    /// Interval in days, for `custom` frequency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_days: Option<u32>,

    #[serde(with = "time::serde::rfc3339::option", default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<OffsetDateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_occurrences: Option<u32>,
}

impl RecurringRule {
    pub fn daily(time: TimeOfDay) -> Self {
        Self {
            frequency: RecurrenceFrequency::Daily,
            time: Some(time),
            days_of_week: None,
            day_of_month: None,
            interval_days: None,
            end_date: None,
            max_occurrences: None,
        }
    }

    pub fn weekly(days_of_week: Vec<u8>, time: TimeOfDay) -> Self {
        Self {
            frequency: RecurrenceFrequency::Weekly,
            time: Some(time),
            days_of_week: Some(days_of_week),
            day_of_month: None,
            interval_days: None,
            end_date: None,
            max_occurrences: None,
        }
    }

    pub fn monthly(day_of_month: u8, time: TimeOfDay) -> Self {
        Self {
            frequency: RecurrenceFrequency::Monthly,
            time: Some(time),
            days_of_week: None,
            day_of_month: Some(day_of_month),
            interval_days: None,
            end_date: None,
            max_occurrences: None,
        }
    }

    pub fn every_days(interval_days: u32) -> Self {
        Self {
            frequency: RecurrenceFrequency::Custom,
            time: None,
            days_of_week: None,
            day_of_month: None,
            interval_days: Some(interval_days),
            end_date: None,
            max_occurrences: None,
        }
    }

    pub fn until(mut self, end_date: OffsetDateTime) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn at_most(mut self, max_occurrences: u32) -> Self {
        self.max_occurrences = Some(max_occurrences);
        self
    }

    /// Reject rules missing a field their frequency requires.
    ///
    /// Callers must validate at schedule time; the evaluator itself never
    /// fails, it just treats a malformed rule as not due.
    pub fn validate(&self) -> Result<()> {
        match self.frequency {
            RecurrenceFrequency::Daily => {
                if self.time.is_none() {
                    return Err(CoreError::invalid_schedule("daily rule requires a time"));
                }
            }
            RecurrenceFrequency::Weekly => {
                if self.time.is_none() {
                    return Err(CoreError::invalid_schedule("weekly rule requires a time"));
                }
                match &self.days_of_week {
                    None => {
                        return Err(CoreError::invalid_schedule(
                            "weekly rule requires days of week",
                        ));
                    }
                    Some(days) if days.is_empty() => {
                        return Err(CoreError::invalid_schedule(
                            "weekly rule requires at least one day of week",
                        ));
                    }
                    Some(days) => {
                        if let Some(bad) = days.iter().find(|d| **d > 6) {
                            return Err(CoreError::invalid_schedule(format!(
                                "day of week {bad} is out of range 0-6"
                            )));
                        }
                    }
                }
            }
            RecurrenceFrequency::Monthly => {
                if self.time.is_none() {
                    return Err(CoreError::invalid_schedule("monthly rule requires a time"));
                }
                match self.day_of_month {
                    None => {
                        return Err(CoreError::invalid_schedule(
                            "monthly rule requires a day of month",
                        ));
                    }
                    Some(d) if !(1..=31).contains(&d) => {
                        return Err(CoreError::invalid_schedule(format!(
                            "day of month {d} is out of range 1-31"
                        )));
                    }
                    Some(_) => {}
                }
            }
            RecurrenceFrequency::Custom => match self.interval_days {
                None | Some(0) => {
                    return Err(CoreError::invalid_schedule(
                        "custom rule requires an interval of at least one day",
                    ));
                }
                Some(_) => {}
            },
        }
        if self.max_occurrences == Some(0) {
            return Err(CoreError::invalid_schedule(
                "max occurrences must be at least one",
            ));
        }
        Ok(())
    }

    /// Whether the rule is due at `now`.
    ///
    /// `last_fired` is the persisted last-firing instant; custom-interval
    /// rules are due immediately when they have never fired.
    pub fn is_due(&self, last_fired: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
        if let Some(end) = self.end_date
            && now > end
        {
            return false;
        }

        match self.frequency {
            RecurrenceFrequency::Daily => self.due_at_time_of_day(now),
            RecurrenceFrequency::Weekly => {
                let Some(days) = &self.days_of_week else {
                    return false;
                };
                days.contains(&now.weekday().number_days_from_sunday())
                    && self.due_at_time_of_day(now)
            }
            RecurrenceFrequency::Monthly => {
                self.day_of_month == Some(now.day()) && self.due_at_time_of_day(now)
            }
            RecurrenceFrequency::Custom => {
                let Some(interval) = self.interval_days else {
                    return false;
                };
                match last_fired {
                    None => true,
                    Some(fired) => (now - fired).whole_days() >= i64::from(interval),
                }
            }
        }
    }

    fn due_at_time_of_day(&self, now: OffsetDateTime) -> bool {
        let Some(time) = self.time else {
            return false;
        };
        let target = time.on_date_of(now);
        (now - target).abs() < DUE_TOLERANCE
    }

    /// Next instant at or after `now` the rule will fire.
    ///
    /// Returns `None` for malformed rules and for rules whose next firing
    /// would fall past the end date. Monthly rules skip months that lack the
    /// configured day of month.
    pub fn next_occurrence(
        &self,
        last_fired: Option<OffsetDateTime>,
        now: OffsetDateTime,
    ) -> Option<OffsetDateTime> {
        let next = match self.frequency {
            RecurrenceFrequency::Daily => {
                let time = self.time?;
                let today = time.on_date_of(now);
                if today > now { today } else { today + Duration::days(1) }
            }
            RecurrenceFrequency::Weekly => {
                let time = self.time?;
                let days = self.days_of_week.as_ref()?;
                self.next_weekday_occurrence(days, time, now)?
            }
            RecurrenceFrequency::Monthly => {
                let time = self.time?;
                let day = self.day_of_month?;
                next_monthly(day, time, now)?
            }
            RecurrenceFrequency::Custom => {
                let interval = self.interval_days?;
                match last_fired {
                    None => now,
                    Some(fired) => fired + Duration::days(i64::from(interval)),
                }
            }
        };

        if let Some(end) = self.end_date
            && next > end
        {
            return None;
        }
        Some(next)
    }

    fn next_weekday_occurrence(
        &self,
        days: &[u8],
        time: TimeOfDay,
        now: OffsetDateTime,
    ) -> Option<OffsetDateTime> {
        // Today counts when its time has not yet passed; otherwise wrap
        // through the following week.
        for offset in 0..=7i64 {
            let date = now.date() + Duration::days(offset);
            if !days.contains(&date.weekday().number_days_from_sunday()) {
                continue;
            }
            let candidate = date.with_time(time.as_time()).assume_offset(now.offset());
            if candidate > now {
                return Some(candidate);
            }
        }
        None
    }
}

fn next_monthly(day: u8, time: TimeOfDay, now: OffsetDateTime) -> Option<OffsetDateTime> {
    let mut year = now.year();
    let mut month = now.month();
    // Months without the configured day are skipped, not clamped.
    for _ in 0..48 {
        if let Ok(date) = Date::from_calendar_date(year, month, day) {
            let candidate = date.with_time(time.as_time()).assume_offset(now.offset());
            if candidate > now {
                return Some(candidate);
            }
        }
        if month == Month::December {
            year += 1;
        }
        month = month.next();
    }
    None
}

/// When a notification should go out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    /// No schedule: send as soon as the request is processed.
    Immediate,

    /// One firing at an absolute instant.
    At(#[serde(with = "time::serde::rfc3339")] OffsetDateTime),

    /// Repeated firings per a recurrence rule.
    Recurring(RecurringRule),
}

impl Schedule {
    pub fn validate(&self) -> Result<()> {
        match self {
            Schedule::Immediate | Schedule::At(_) => Ok(()),
            Schedule::Recurring(rule) => rule.validate(),
        }
    }

    pub fn is_due(&self, last_fired: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
        match self {
            Schedule::Immediate => true,
            Schedule::At(at) => now >= *at,
            Schedule::Recurring(rule) => rule.is_due(last_fired, now),
        }
    }

    pub fn next_occurrence(
        &self,
        last_fired: Option<OffsetDateTime>,
        now: OffsetDateTime,
    ) -> Option<OffsetDateTime> {
        match self {
            Schedule::Immediate => Some(now),
            Schedule::At(at) => Some(*at),
            Schedule::Recurring(rule) => rule.next_occurrence(last_fired, now),
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, Schedule::Recurring(_))
    }
}

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Immediate => write!(f, "Send immediately"),
            Schedule::At(at) => {
                let formatted = at
                    .format(&time::format_description::well_known::Rfc3339)
                    .map_err(|_| fmt::Error)?;
                write!(f, "Scheduled for {formatted}")
            }
            Schedule::Recurring(rule) => write!(f, "{rule}"),
        }
    }
}

impl fmt::Display for RecurringRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.frequency {
            RecurrenceFrequency::Daily => {
                write!(f, "Daily")?;
                if let Some(time) = self.time {
                    write!(f, " at {time}")?;
                }
            }
            RecurrenceFrequency::Weekly => {
                write!(f, "Weekly")?;
                if let Some(days) = &self.days_of_week {
                    let names: Vec<&str> = days
                        .iter()
                        .filter_map(|d| DAY_NAMES.get(usize::from(*d)).copied())
                        .collect();
                    write!(f, " on {}", names.join(", "))?;
                }
                if let Some(time) = self.time {
                    write!(f, " at {time}")?;
                }
            }
            RecurrenceFrequency::Monthly => {
                write!(f, "Monthly")?;
                if let Some(day) = self.day_of_month {
                    write!(f, " on day {day}")?;
                }
                if let Some(time) = self.time {
                    write!(f, " at {time}")?;
                }
            }
            RecurrenceFrequency::Custom => {
                if let Some(interval) = self.interval_days {
                    write!(f, "Every {interval} days")?;
                }
            }
        }
        if let Some(end) = self.end_date {
            let formatted = end
                .format(&time::format_description::well_known::Rfc3339)
                .map_err(|_| fmt::Error)?;
            write!(f, " until {formatted}")?;
        }
        Ok(())
    }
}
