use crate::error::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::{OffsetDateTime, Time};

/// A wall-clock time of day in `HH:mm` form, as used by recurrence rules
/// and quiet-hour windows. Timezone normalization is the caller's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(CoreError::invalid_time_of_day(format!(
                "{hour:02}:{minute:02} is out of range"
            )));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Minutes elapsed since midnight.
    pub fn minute_of_day(&self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }

    pub fn as_time(&self) -> Time {
        Time::from_hms(self.hour, self.minute, 0).unwrap_or(Time::MIDNIGHT)
    }

    /// The given instant's date at this time of day, same offset.
    pub fn on_date_of(&self, instant: OffsetDateTime) -> OffsetDateTime {
        instant.replace_time(self.as_time())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| CoreError::invalid_time_of_day(format!("expected HH:mm, got '{s}'")))?;
        let hour: u8 = h
            .parse()
            .map_err(|_| CoreError::invalid_time_of_day(format!("invalid hour in '{s}'")))?;
        let minute: u8 = m
            .parse()
            .map_err(|_| CoreError::invalid_time_of_day(format!("invalid minute in '{s}'")))?;
        TimeOfDay::new(hour, minute)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TimeOfDay::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Minute-of-day for an instant, used by quiet-hour comparisons.
pub fn minute_of_day(instant: OffsetDateTime) -> u16 {
    u16::from(instant.hour()) * 60 + u16::from(instant.minute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_parse_valid() {
        let t = TimeOfDay::from_str("09:30").unwrap();
        assert_eq!(t.hour(), 9);
        assert_eq!(t.minute(), 30);
        assert_eq!(t.minute_of_day(), 570);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(TimeOfDay::from_str("24:00").is_err());
        assert!(TimeOfDay::from_str("12:60").is_err());
        assert!(TimeOfDay::from_str("12").is_err());
        assert!(TimeOfDay::from_str("ab:cd").is_err());
        assert!(TimeOfDay::from_str("").is_err());
    }

    #[test]
    fn test_display() {
        let t = TimeOfDay::new(7, 5).unwrap();
        assert_eq!(t.to_string(), "07:05");
    }

    #[test]
    fn test_serde_roundtrip() {
        let t = TimeOfDay::new(22, 15).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"22:15\"");
        let back: TimeOfDay = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_on_date_of() {
        let now = datetime!(2024-01-15 14:42:31 UTC);
        let t = TimeOfDay::new(9, 0).unwrap();
        assert_eq!(t.on_date_of(now), datetime!(2024-01-15 09:00:00 UTC));
    }

    #[test]
    fn test_minute_of_day_instant() {
        assert_eq!(minute_of_day(datetime!(2024-01-15 23:30:00 UTC)), 1410);
        assert_eq!(minute_of_day(datetime!(2024-01-15 00:00:59 UTC)), 0);
    }
}
