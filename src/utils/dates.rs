use chrono::{Datelike, Local, NaiveDate, TimeZone};
use serde::Deserialize;
use serde_json::Value;

/// Shown wherever a date is absent.
pub const MISSING_DATE: &str = "N/A";

/// A calendar date the way the remote API sends it.
///
/// Depending on the endpoint the same field arrives as a `[year, month, day]`
/// array, as epoch milliseconds or as text (`YYYY-MM-DD` or `DD/MM/YYYY`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DateLike {
    Triple([i64; 3]),
    Millis(i64),
    Text(String),
    Other(Value),
}

/// Outcome of normalizing a [`DateLike`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedDate {
    Normalized { display: String, sort_key: String },
    /// Not a calendar date; holds the text shown in its place.
    Unrecognized(String),
    Missing,
}

impl NormalizedDate {
    /// `DD/MM/YYYY`, the original text when unrecognized, `N/A` when missing.
    pub fn display(&self) -> &str {
        match self {
            NormalizedDate::Normalized { display, .. } => display,
            NormalizedDate::Unrecognized(original) => original,
            NormalizedDate::Missing => MISSING_DATE,
        }
    }

    /// `YYYY-MM-DD`
    pub fn sort_key(&self) -> Option<&str> {
        match self {
            NormalizedDate::Normalized { sort_key, .. } => Some(sort_key),
            _ => None,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.sort_key()
            .and_then(|key| NaiveDate::parse_from_str(key, "%Y-%m-%d").ok())
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, NormalizedDate::Normalized { .. })
    }
}

/// Normalizes using the local timezone for epoch values.
pub fn normalize(input: Option<&DateLike>) -> NormalizedDate {
    normalize_in(input, &Local)
}

pub fn normalize_in<Tz: TimeZone>(input: Option<&DateLike>, tz: &Tz) -> NormalizedDate {
    let Some(input) = input else {
        return NormalizedDate::Missing;
    };

    match input {
        DateLike::Triple([year, month, day]) => from_parts(*year, *month, *day),
        DateLike::Millis(millis) => match tz.timestamp_millis_opt(*millis).single() {
            Some(moment) => from_parts(
                i64::from(moment.year()),
                i64::from(moment.month()),
                i64::from(moment.day()),
            ),
            None => NormalizedDate::Unrecognized(millis.to_string()),
        },
        DateLike::Text(text) => normalize_text(text),
        DateLike::Other(Value::Null) => NormalizedDate::Missing,
        DateLike::Other(value) => NormalizedDate::Unrecognized(value.to_string()),
    }
}

fn from_parts(year: i64, month: i64, day: i64) -> NormalizedDate {
    let display = format!("{day:02}/{month:02}/{year}");
    match calendar_date(year, month, day) {
        Some(date) => NormalizedDate::Normalized {
            display,
            sort_key: date.format("%Y-%m-%d").to_string(),
        },
        None => NormalizedDate::Unrecognized(display),
    }
}

fn calendar_date(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
        i32::try_from(year).ok()?,
        u32::try_from(month).ok()?,
        u32::try_from(day).ok()?,
    )
}

fn parse_parts(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    calendar_date(
        year.trim().parse().ok()?,
        month.trim().parse().ok()?,
        day.trim().parse().ok()?,
    )
}

fn normalize_text(text: &str) -> NormalizedDate {
    if text.is_empty() {
        return NormalizedDate::Missing;
    }

    if text.contains('-') {
        // YYYY-MM-DD, optionally followed by a `T` time part
        let day_part = text.split_once('T').map_or(text, |(day, _)| day);
        if let [year, month, day] = day_part.split('-').collect::<Vec<_>>().as_slice() {
            return match parse_parts(year, month, day) {
                Some(date) => NormalizedDate::Normalized {
                    display: date.format("%d/%m/%Y").to_string(),
                    sort_key: date.format("%Y-%m-%d").to_string(),
                },
                None => NormalizedDate::Unrecognized(format!("{day}/{month}/{year}")),
            };
        }
    }

    if text.contains('/') {
        // already DD/MM/YYYY, display stays untouched
        if let [day, month, year] = text.split('/').collect::<Vec<_>>().as_slice() {
            if let Some(date) = parse_parts(year, month, day) {
                return NormalizedDate::Normalized {
                    display: text.to_string(),
                    sort_key: date.format("%Y-%m-%d").to_string(),
                };
            }
        }
    }

    NormalizedDate::Unrecognized(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn text(s: &str) -> DateLike {
        DateLike::Text(s.to_string())
    }

    #[test]
    fn triple_is_zero_padded() {
        let out = normalize(Some(&DateLike::Triple([2025, 11, 20])));
        assert_eq!(out.display(), "20/11/2025");
        assert_eq!(out.sort_key(), Some("2025-11-20"));

        let out = normalize(Some(&DateLike::Triple([2024, 1, 5])));
        assert_eq!(out.display(), "05/01/2024");
        assert_eq!(out.date(), NaiveDate::from_ymd_opt(2024, 1, 5));
    }

    #[test]
    fn epoch_millis_match_local_triple() {
        let moment = Local.with_ymd_and_hms(2025, 11, 20, 12, 0, 0).unwrap();
        let out = normalize(Some(&DateLike::Millis(moment.timestamp_millis())));
        let triple = normalize(Some(&DateLike::Triple([2025, 11, 20])));
        assert_eq!(out, triple);
    }

    #[test]
    fn epoch_millis_use_the_given_timezone() {
        let millis = Utc
            .with_ymd_and_hms(2025, 11, 21, 3, 0, 0)
            .unwrap()
            .timestamp_millis();
        let bogota = FixedOffset::west_opt(5 * 3600).unwrap();

        assert_eq!(
            normalize_in(Some(&DateLike::Millis(millis)), &bogota).display(),
            "20/11/2025"
        );
        assert_eq!(
            normalize_in(Some(&DateLike::Millis(millis)), &Utc).display(),
            "21/11/2025"
        );
    }

    #[test]
    fn iso_text_is_reordered() {
        let out = normalize(Some(&text("2025-11-20")));
        assert_eq!(out.display(), "20/11/2025");
        assert_eq!(out.sort_key(), Some("2025-11-20"));
    }

    #[test]
    fn display_text_is_idempotent() {
        let once = normalize(Some(&text("2025-11-20")));
        let twice = normalize(Some(&text(once.display())));
        assert_eq!(twice.display(), once.display());
        assert_eq!(twice.sort_key(), Some("2025-11-20"));

        let out = normalize(Some(&text("3/4/2025")));
        assert_eq!(out.display(), "3/4/2025");
        assert_eq!(out.sort_key(), Some("2025-04-03"));
    }

    #[test]
    fn missing_values_report_na() {
        assert_eq!(normalize(None).display(), "N/A");
        assert_eq!(normalize(Some(&DateLike::Other(Value::Null))), NormalizedDate::Missing);
        assert_eq!(normalize(Some(&text(""))).display(), MISSING_DATE);
    }

    #[test]
    fn unknown_shapes_pass_through_tagged() {
        let out = normalize(Some(&text("2025-11")));
        assert_eq!(out, NormalizedDate::Unrecognized("2025-11".into()));
        assert_eq!(out.display(), "2025-11");
        assert!(!out.is_recognized());

        let out = normalize(Some(&text("mañana")));
        assert_eq!(out.display(), "mañana");
        assert_eq!(out.sort_key(), None);

        let out = normalize(Some(&DateLike::Other(Value::Bool(true))));
        assert_eq!(out.display(), "true");
    }

    #[test]
    fn three_part_text_must_be_a_real_date() {
        let out = normalize(Some(&text("a-b-c")));
        assert!(!out.is_recognized());
        assert_eq!(out.display(), "c/b/a");
        assert_eq!(out.sort_key(), None);

        let out = normalize(Some(&text("2025-02-30")));
        assert!(!out.is_recognized());

        let out = normalize(Some(&text("31/31/2025")));
        assert_eq!(out, NormalizedDate::Unrecognized("31/31/2025".into()));

        let out = normalize(Some(&DateLike::Triple([2025, 13, 1])));
        assert!(!out.is_recognized());
        assert_eq!(out.display(), "01/13/2025");
    }

    #[test]
    fn iso_date_time_uses_the_day_part() {
        let out = normalize(Some(&text("2025-11-20T10:30:00")));
        assert!(out.is_recognized());
        assert_eq!(out.display(), "20/11/2025");
        assert_eq!(out.sort_key(), Some("2025-11-20"));
        assert_eq!(out.date(), NaiveDate::from_ymd_opt(2025, 11, 20));
    }

    #[test]
    fn wire_shapes_deserialize() {
        let triple: DateLike = serde_json::from_str("[2025, 11, 20]").unwrap();
        assert_eq!(triple, DateLike::Triple([2025, 11, 20]));

        let millis: DateLike = serde_json::from_str("1763640000000").unwrap();
        assert_eq!(millis, DateLike::Millis(1_763_640_000_000));

        let iso: DateLike = serde_json::from_str("\"2025-11-20\"").unwrap();
        assert_eq!(iso, text("2025-11-20"));

        let short: DateLike = serde_json::from_str("[2025, 11]").unwrap();
        assert!(matches!(short, DateLike::Other(_)));
        assert!(!normalize(Some(&short)).is_recognized());
    }
}
