//! Best-effort timestamp normalization.
//!
//! The `datetime_utc` column of the log store is written by several tool
//! versions and does not follow one format. [`normalize_date`] runs an ordered
//! list of [`DateStrategy`] entries and stops at the first one that yields a
//! date. It never fails loudly: an unparseable timestamp is `None`.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use tracing::trace;

use crate::error::{Result, UsageError};

/// Canonical calendar date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format used for display timestamps.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Full timestamp layouts, tried in order.
///
/// `%.f` consumes an optional fractional part; offsets are parsed and ignored
/// so the date is the one written in the timestamp.
pub const TIMESTAMP_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S",
];

/// One way of turning a timestamp into a date.
pub struct DateStrategy {
    /// Name used in trace logs
    pub name: &'static str,

    /// Parser; `None` hands over to the next strategy
    pub parse: fn(&str) -> Option<NaiveDate>,
}

/// Strategies in the order [`normalize_date`] tries them.
pub const DATE_STRATEGIES: &[DateStrategy] = &[
    DateStrategy {
        name: "layouts",
        parse: parse_with_layouts,
    },
    DateStrategy {
        name: "strip_offset",
        parse: parse_without_offset,
    },
    DateStrategy {
        name: "date_before_t",
        parse: parse_date_before_separator,
    },
    DateStrategy {
        name: "pattern_scan",
        parse: scan_for_date,
    },
];

fn date_pattern() -> &'static Regex {
    static DATE_RE: OnceLock<Regex> = OnceLock::new();
    DATE_RE.get_or_init(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid date regex"))
}

/// Normalize a timestamp string to a calendar date.
///
/// Returns `None` when every strategy fails.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    normalize_with(raw, DATE_STRATEGIES)
}

/// Normalize using a caller-supplied strategy list.
pub fn normalize_with(raw: &str, strategies: &[DateStrategy]) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for strategy in strategies {
        if let Some(date) = (strategy.parse)(raw) {
            trace!(raw, strategy = strategy.name, %date, "Normalized timestamp");
            return Some(date);
        }
    }

    trace!(raw, "Could not parse timestamp");
    None
}

/// Render a stored timestamp as `YYYY-MM-DD HH:MM:SS`.
///
/// Falls back to the input unchanged when it does not parse.
pub fn format_display_timestamp(raw: &str) -> String {
    let trimmed = raw.trim();
    parse_datetime(trimmed)
        .or_else(|| parse_datetime(strip_offset(trimmed)))
        .map(|dt| dt.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Parse a `YYYY-MM-DD` request parameter.
pub fn parse_query_date(param: &'static str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| UsageError::InvalidDate {
        param,
        value: value.to_string(),
    })
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
}

/// Drop a trailing `+hh:mm` offset or `Z` suffix.
fn strip_offset(s: &str) -> &str {
    if let Some((head, _)) = s.split_once('+') {
        head
    } else {
        s.strip_suffix('Z').unwrap_or(s)
    }
}

fn parse_with_layouts(s: &str) -> Option<NaiveDate> {
    parse_datetime(s).map(|dt| dt.date())
}

fn parse_without_offset(s: &str) -> Option<NaiveDate> {
    let stripped = strip_offset(s);
    if stripped.len() == s.len() {
        return None;
    }
    parse_with_layouts(stripped)
}

fn parse_date_before_separator(s: &str) -> Option<NaiveDate> {
    let (date_part, _) = s.split_once('T')?;
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

fn scan_for_date(s: &str) -> Option<NaiveDate> {
    date_pattern()
        .find_iter(s)
        .find_map(|m| NaiveDate::parse_from_str(m.as_str(), DATE_FORMAT).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_fractional_seconds_with_offset() {
        assert_eq!(
            normalize_date("2024-03-01T12:00:00.123456+00:00"),
            Some(date("2024-03-01"))
        );
    }

    #[test]
    fn test_recognized_layouts() {
        let cases = [
            "2024-03-01T12:00:00.123456",
            "2024-03-01T12:00:00.123456Z",
            "2024-03-01T12:00:00",
            "2024-03-01T12:00:00Z",
            "2024-03-01T23:59:59+00:00",
            "2024-03-01 12:00:00.5",
            "2024-03-01 12:00:00",
            "  2024-03-01T12:00:00  ",
        ];
        for raw in cases {
            assert_eq!(normalize_date(raw), Some(date("2024-03-01")), "{raw}");
        }
    }

    #[test]
    fn test_offset_does_not_shift_date() {
        assert_eq!(
            normalize_date("2024-03-01T23:30:00-05:00"),
            Some(date("2024-03-01"))
        );
    }

    #[test]
    fn test_offset_without_colon_is_stripped() {
        assert_eq!(
            normalize_date("2024-03-01T12:00:00.1+0530"),
            Some(date("2024-03-01"))
        );
    }

    #[test]
    fn test_date_before_separator() {
        assert_eq!(normalize_date("2024-03-01Tgarbage"), Some(date("2024-03-01")));
    }

    #[test]
    fn test_pattern_scan() {
        assert_eq!(
            normalize_date("logged on 2024-03-01 at noon"),
            Some(date("2024-03-01"))
        );
        assert_eq!(normalize_date("2024-03-01"), Some(date("2024-03-01")));
    }

    #[test]
    fn test_pattern_scan_skips_impossible_dates() {
        assert_eq!(
            normalize_date("9999-99-99 then 2024-02-29"),
            Some(date("2024-02-29"))
        );
        assert_eq!(normalize_date("2023-02-29"), None);
    }

    #[test]
    fn test_garbage_is_none() {
        for raw in ["", "   ", "yesterday", "2024/03/01", "T", "+", "Z", "12:00:00"] {
            assert_eq!(normalize_date(raw), None, "{raw}");
        }
    }

    #[test]
    fn test_custom_strategy_list() {
        let only_scan = [DateStrategy {
            name: "pattern_scan",
            parse: scan_for_date,
        }];
        assert_eq!(normalize_with("2024-03-01Tfoo", &only_scan), Some(date("2024-03-01")));
        assert_eq!(normalize_with("nothing here", &only_scan), None);
    }

    #[test]
    fn test_format_display_timestamp() {
        assert_eq!(
            format_display_timestamp("2024-03-01T12:34:56.789+00:00"),
            "2024-03-01 12:34:56"
        );
        assert_eq!(format_display_timestamp("2024-03-01T12:34:56Z"), "2024-03-01 12:34:56");
        assert_eq!(format_display_timestamp("2024-03-01 08:00:00"), "2024-03-01 08:00:00");
        assert_eq!(format_display_timestamp("sometime"), "sometime");
    }

    #[test]
    fn test_parse_query_date() {
        assert_eq!(parse_query_date("start_date", "2024-01-05").unwrap(), date("2024-01-05"));

        let err = parse_query_date("end_date", "01/05/2024").unwrap_err();
        assert!(matches!(err, UsageError::InvalidDate { param: "end_date", .. }));
        assert!(parse_query_date("end_date", "2024-02-30").is_err());
    }
}
