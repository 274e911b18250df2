use std::fmt;

use chrono::NaiveTime;

use crate::error::DashboardError;

/// Parses `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(text: &str) -> Result<NaiveTime, DashboardError> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .map_err(|_| DashboardError::MalformedTime(text.to_string()))
}

/// Whole minutes from `entry` to `exit` on the same day, floored.
///
/// Negative when `exit` is earlier than `entry`; callers decide what that means.
pub fn elapsed_minutes(entry: NaiveTime, exit: NaiveTime) -> i64 {
    (exit - entry).num_seconds().div_euclid(60)
}

/// `HH:MM` for tables.
pub fn short_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// A minute count split for display as `"{h}h {m}m"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed {
    pub hours: i64,
    pub minutes: i64,
}

impl Elapsed {
    pub fn from_minutes(total: i64) -> Self {
        Self {
            hours: total.div_euclid(60),
            minutes: total.rem_euclid(60),
        }
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m", self.hours, self.minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn between(entry: &str, exit: &str) -> i64 {
        elapsed_minutes(
            parse_time_of_day(entry).unwrap(),
            parse_time_of_day(exit).unwrap(),
        )
    }

    #[test]
    fn ninety_minutes() {
        let minutes = between("08:00", "09:30");
        assert_eq!(minutes, 90);
        assert_eq!(Elapsed::from_minutes(minutes).to_string(), "1h 30m");
    }

    #[test]
    fn zero_minutes() {
        let minutes = between("10:00", "10:00");
        assert_eq!(minutes, 0);
        assert_eq!(Elapsed::from_minutes(minutes).to_string(), "0h 0m");
    }

    #[test]
    fn seconds_are_floored() {
        assert_eq!(between("08:00:30", "08:02:10"), 1);
        assert_eq!(between("14:00:00", "15:05"), 65);
    }

    #[test]
    fn negative_spans_pass_through() {
        assert_eq!(between("10:00", "09:15"), -45);
    }

    #[test]
    fn bad_time_is_an_error() {
        let err = parse_time_of_day("25:61").unwrap_err();
        assert!(matches!(err, DashboardError::MalformedTime(_)));
        assert!(parse_time_of_day("soon").is_err());
    }

    #[test]
    fn short_time_drops_seconds() {
        assert_eq!(short_time(parse_time_of_day("22:23:00").unwrap()), "22:23");
    }
}
