//! Timestamps embedded in metadata values as `<...>`

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// A `<...>` value. `datetime` is `None` when no configured pattern matched,
/// in which case only the raw text is kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Timestamp {
    pub raw: String,
    pub datetime: Option<NaiveDateTime>,
}

impl Timestamp {
    /// Parse `raw` by trying each pattern in order and keeping the first success.
    ///
    /// Patterns without a time component are also tried as plain dates, which
    /// resolve to midnight.
    pub fn parse(raw: &str, formats: &[String]) -> Self {
        let raw = raw.trim();
        let datetime = formats.iter().find_map(|format| {
            NaiveDateTime::parse_from_str(raw, format)
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(raw, format)
                        .ok()
                        .and_then(|date| date.and_hms_opt(0, 0, 0))
                })
        });

        Timestamp {
            raw: raw.to_string(),
            datetime,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.datetime.is_some()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.raw)
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Resolved timestamps order chronologically and before unresolved ones;
/// unresolved timestamps fall back to their raw text.
impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.datetime, &other.datetime) {
            (Some(a), Some(b)) => a.cmp(b).then_with(|| self.raw.cmp(&other.raw)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.raw.cmp(&other.raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodetext::config::Settings;

    fn formats() -> Vec<String> {
        Settings::default().parsing.timestamp_formats
    }

    #[test]
    fn test_parses_iso_date() {
        let ts = Timestamp::parse("2024-03-05", &formats());
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(ts.datetime, Some(expected));
    }

    #[test]
    fn test_parses_date_and_time() {
        let ts = Timestamp::parse("2024-03-05 14:30", &formats());
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(ts.datetime, Some(expected));
    }

    #[test]
    fn test_first_matching_pattern_wins() {
        let formats = vec!["%d/%m/%Y".to_string(), "%m/%d/%Y".to_string()];
        let ts = Timestamp::parse("02/03/2024", &formats);
        assert_eq!(
            ts.datetime.map(|d| d.date()),
            NaiveDate::from_ymd_opt(2024, 3, 2)
        );
    }

    #[test]
    fn test_unrecognized_keeps_raw_text() {
        let ts = Timestamp::parse(" sometime soon ", &formats());
        assert_eq!(ts.raw, "sometime soon");
        assert!(!ts.is_resolved());
    }

    #[test]
    fn test_ordering() {
        let early = Timestamp::parse("2023-01-01", &formats());
        let late = Timestamp::parse("2024-01-01", &formats());
        let unknown = Timestamp::parse("later", &formats());
        assert!(early < late);
        assert!(late < unknown);
    }
}
