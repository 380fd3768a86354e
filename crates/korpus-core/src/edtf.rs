//! Historical date normalization over a constrained EDTF grammar.
//!
//! Parses date expressions like `1942`, `1942-03`, `1942-03-29/1942-04-27`,
//! `../1945-05-08`, `1942~` into a normalized `(start, end, precision)`
//! triple. Partial dates expand to interval endpoints (a bare year spans
//! Jan 1 – Dec 31, a year-month spans the calendar month including leap
//! Februaries).
//!
//! This parser does NOT validate calendar coherence: a well-formed
//! `1943-02-30` passes through unchanged. Calendar-level rejection is the
//! job of the downstream validation layer, so normalized dates stay plain
//! `YYYY-MM-DD` strings here.
//!
//! Approximation and uncertainty markers (`~`, `?`) are preserved via
//! `DatePrecision`, never as part of the date token:
//! - `"1942~"` → precision `Circa`
//! - `"1942?"` → precision `Uncertain`
//! - `"1942"`  → precision `Year`
//!
//! Approximate intervals (e.g. `1942~/1945~`) are treated as plain
//! intervals; the validator flags them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());
static YEAR_MONTH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}$").unwrap());
static FULL_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Precision class of a normalized date expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DatePrecision {
    Day,
    Month,
    Year,
    Interval,
    Circa,
    Uncertain,
    Before,
    After,
    #[default]
    Unknown,
}

impl DatePrecision {
    /// Stable string form stored on graph nodes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Month => "month",
            Self::Year => "year",
            Self::Interval => "interval",
            Self::Circa => "circa",
            Self::Uncertain => "uncertain",
            Self::Before => "before",
            Self::After => "after",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DatePrecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized historical date: derived start/end plus precision.
///
/// `start`/`end` are `YYYY-MM-DD` strings (or `None` for open bounds);
/// strings rather than calendar types, deliberately, to keep the
/// no-validity-checking contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EdtfDate {
    pub start: Option<String>,
    pub end: Option<String>,
    pub precision: DatePrecision,
}

impl EdtfDate {
    /// Parse a date expression into normalized start/end and precision.
    ///
    /// Cases are evaluated in priority order: unknown, open start, open
    /// end, closed interval, circa, uncertain, exact.
    pub fn parse(expression: &str) -> Self {
        let edtf = expression.trim();

        if edtf.is_empty() || edtf == ".." || edtf == "../.." {
            return Self::default();
        }

        if let Some(rest) = edtf.strip_prefix("../") {
            return Self {
                start: None,
                end: normalize_single(rest, false),
                precision: DatePrecision::Before,
            };
        }

        if let Some(rest) = edtf.strip_suffix("/..") {
            return Self {
                start: normalize_single(rest, true),
                end: None,
                precision: DatePrecision::After,
            };
        }

        if let Some((left, right)) = edtf.split_once('/') {
            return Self {
                start: normalize_single(left, true),
                end: normalize_single(right, false),
                precision: DatePrecision::Interval,
            };
        }

        if let Some(base) = edtf.strip_suffix('~') {
            return Self {
                start: normalize_single(base, true),
                end: normalize_single(base, false),
                precision: DatePrecision::Circa,
            };
        }

        if let Some(base) = edtf.strip_suffix('?') {
            return Self {
                start: normalize_single(base, true),
                end: normalize_single(base, false),
                precision: DatePrecision::Uncertain,
            };
        }

        let precision = if FULL_DATE_RE.is_match(edtf) {
            DatePrecision::Day
        } else if YEAR_MONTH_RE.is_match(edtf) {
            DatePrecision::Month
        } else if YEAR_RE.is_match(edtf) {
            DatePrecision::Year
        } else {
            DatePrecision::Unknown
        };

        Self {
            start: normalize_single(edtf, true),
            end: normalize_single(edtf, false),
            precision,
        }
    }

    /// Whether either bound is open (drives the stored `gap_flag`).
    pub fn is_open(&self) -> bool {
        self.start.is_none() || self.end.is_none()
    }
}

/// Normalize a partial date token into a full `YYYY-MM-DD` date.
///
/// A bare year maps to Jan 1 (start) or Dec 31 (end); a year-month maps to
/// day 1 (start) or the last calendar day of the month (end); a full date
/// passes through unchanged. Anything else yields `None`. Trailing `~`/`?`
/// markers are stripped before matching.
fn normalize_single(token: &str, start: bool) -> Option<String> {
    let token = token.trim().trim_end_matches(['~', '?']);
    if token.is_empty() {
        return None;
    }

    if YEAR_RE.is_match(token) {
        return Some(if start {
            format!("{token}-01-01")
        } else {
            format!("{token}-12-31")
        });
    }

    if YEAR_MONTH_RE.is_match(token) {
        if start {
            return Some(format!("{token}-01"));
        }
        let (year, month) = token.split_once('-')?;
        let year: i32 = year.parse().ok()?;
        let month: u32 = month.parse().ok()?;
        let last = last_day_of_month(year, month)?;
        return Some(format!("{token}-{last:02}"));
    }

    if FULL_DATE_RE.is_match(token) {
        return Some(token.to_string());
    }

    None
}

/// Last calendar day of a month, leap-year aware. `None` for month 0 or >12.
fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    use chrono::{Datelike, NaiveDate};

    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }?;
    Some(first_of_next.pred_opt()?.day())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_year_spans_full_year() {
        let date = EdtfDate::parse("1942");
        assert_eq!(date.start.as_deref(), Some("1942-01-01"));
        assert_eq!(date.end.as_deref(), Some("1942-12-31"));
        assert_eq!(date.precision, DatePrecision::Year);
    }

    #[test]
    fn test_year_month_leap_february() {
        let date = EdtfDate::parse("1944-02");
        assert_eq!(date.start.as_deref(), Some("1944-02-01"));
        assert_eq!(date.end.as_deref(), Some("1944-02-29"));
        assert_eq!(date.precision, DatePrecision::Month);
    }

    #[test]
    fn test_year_month_common_february() {
        let date = EdtfDate::parse("1943-02");
        assert_eq!(date.end.as_deref(), Some("1943-02-28"));
    }

    #[test]
    fn test_year_month_december() {
        let date = EdtfDate::parse("1941-12");
        assert_eq!(date.end.as_deref(), Some("1941-12-31"));
    }

    #[test]
    fn test_full_date_passes_through() {
        let date = EdtfDate::parse("1942-03-29");
        assert_eq!(date.start.as_deref(), Some("1942-03-29"));
        assert_eq!(date.end.as_deref(), Some("1942-03-29"));
        assert_eq!(date.precision, DatePrecision::Day);
    }

    #[test]
    fn test_no_calendar_validity_checking() {
        // Well-formed but calendar-impossible dates pass through untouched.
        let date = EdtfDate::parse("1943-02-30");
        assert_eq!(date.start.as_deref(), Some("1943-02-30"));
        assert_eq!(date.precision, DatePrecision::Day);
    }

    #[test]
    fn test_open_start() {
        let date = EdtfDate::parse("../1945-05-08");
        assert_eq!(date.start, None);
        assert_eq!(date.end.as_deref(), Some("1945-05-08"));
        assert_eq!(date.precision, DatePrecision::Before);
        assert!(date.is_open());
    }

    #[test]
    fn test_open_end() {
        let date = EdtfDate::parse("1942-03-29/..");
        assert_eq!(date.start.as_deref(), Some("1942-03-29"));
        assert_eq!(date.end, None);
        assert_eq!(date.precision, DatePrecision::After);
        assert!(date.is_open());
    }

    #[test]
    fn test_closed_interval() {
        let date = EdtfDate::parse("1942-03-29/1942-04-27");
        assert_eq!(date.start.as_deref(), Some("1942-03-29"));
        assert_eq!(date.end.as_deref(), Some("1942-04-27"));
        assert_eq!(date.precision, DatePrecision::Interval);
        assert!(!date.is_open());
    }

    #[test]
    fn test_interval_of_partial_dates() {
        let date = EdtfDate::parse("1942/1943-06");
        assert_eq!(date.start.as_deref(), Some("1942-01-01"));
        assert_eq!(date.end.as_deref(), Some("1943-06-30"));
    }

    #[test]
    fn test_circa_expands_base_span() {
        let date = EdtfDate::parse("1942~");
        assert_eq!(date.start.as_deref(), Some("1942-01-01"));
        assert_eq!(date.end.as_deref(), Some("1942-12-31"));
        assert_eq!(date.precision, DatePrecision::Circa);
    }

    #[test]
    fn test_uncertain_day() {
        let date = EdtfDate::parse("1942-03-29?");
        assert_eq!(date.start.as_deref(), Some("1942-03-29"));
        assert_eq!(date.end.as_deref(), Some("1942-03-29"));
        assert_eq!(date.precision, DatePrecision::Uncertain);
    }

    #[test]
    fn test_unknown_forms() {
        for expr in ["", "..", "../..", "  "] {
            let date = EdtfDate::parse(expr);
            assert_eq!(date.start, None, "start for {expr:?}");
            assert_eq!(date.end, None, "end for {expr:?}");
            assert_eq!(date.precision, DatePrecision::Unknown, "precision for {expr:?}");
        }
    }

    #[test]
    fn test_garbage_is_unknown() {
        let date = EdtfDate::parse("printemps 1942");
        assert_eq!(date.start, None);
        assert_eq!(date.end, None);
        assert_eq!(date.precision, DatePrecision::Unknown);
    }

    #[test]
    fn test_markers_stripped_inside_intervals() {
        // Approximate intervals degrade to plain intervals.
        let date = EdtfDate::parse("1942~/1945~");
        assert_eq!(date.start.as_deref(), Some("1942-01-01"));
        assert_eq!(date.end.as_deref(), Some("1945-12-31"));
        assert_eq!(date.precision, DatePrecision::Interval);
    }

    #[test]
    fn test_precision_serde_snake_case() {
        let json = serde_json::to_string(&DatePrecision::Before).unwrap();
        assert_eq!(json, "\"before\"");
    }
}
