#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical period keys for hazard requests.
//!
//! Every hazard request is scoped by a period key derived from the user's
//! selected date:
//!
//! | Period     | Key          | Example     |
//! |------------|--------------|-------------|
//! | `daily`    | `YYYY-MM-DD` | `2020-01-15`|
//! | `monthly`  | `YYYY-MM`    | `2020-01`   |
//! | `annual`   | `YYYY`       | `2020`      |
//! | `seasonal` | `SEASON-YYYY`| `OND-2020`  |
//!
//! Keys double as cache-key components, so two logically identical
//! selections always resolve to the same string.
//!
//! January and February belong to the OND season of the *same* calendar
//! year (`2021-02-10` resolves to `OND-2021`), not the season that started
//! the previous October.

pub mod availability;

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use hazard_map_hazard_models::{Period, Season};
use regex::Regex;
use thiserror::Error;

pub use availability::{available_seasons, date_range, season_anchor};

/// Matches `SEASON-YYYY` keys.
static SEASON_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(MAM|JJAS|OND)-([0-9]{4})$").expect("valid regex"));

/// Errors from period key resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    /// The input is neither a calendar date nor a recognised key.
    #[error("Unrecognised date or period key: {input:?}")]
    InvalidDate {
        /// The rejected input.
        input: String,
    },
}

/// A user selection to resolve: either a calendar date or an already
/// formatted key (`2012`, `2012-03`, `2012-03-04`, `MAM-2012`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
    Date(NaiveDate),
    Key(String),
}

impl From<NaiveDate> for DateInput {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<&str> for DateInput {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for DateInput {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

/// Resolves a selection into its canonical key for `period`.
///
/// Returns `Ok(None)` when there is no selection; callers treat that as
/// "no date-scoped fetch". A season key passed with [`Period::Seasonal`] is
/// returned unchanged.
///
/// # Errors
///
/// Returns [`PeriodError::InvalidDate`] if a string input cannot be parsed.
pub fn resolve(input: Option<&DateInput>, period: Period) -> Result<Option<String>, PeriodError> {
    let Some(input) = input else {
        return Ok(None);
    };

    let date = match input {
        DateInput::Date(date) => *date,
        DateInput::Key(key) => {
            if period == Period::Seasonal && is_season_key(key) {
                return Ok(Some(key.clone()));
            }
            parse_key(key)?
        }
    };

    Ok(Some(format_key(date, period)))
}

/// Formats a calendar date as the key for `period`.
#[must_use]
pub fn format_key(date: NaiveDate, period: Period) -> String {
    match period {
        Period::Daily => date.format("%Y-%m-%d").to_string(),
        Period::Monthly => date.format("%Y-%m").to_string(),
        Period::Annual => format!("{:04}", date.year()),
        Period::Seasonal => season_key(date),
    }
}

/// `SEASON-YYYY` for the season containing `date`.
#[must_use]
pub fn season_key(date: NaiveDate) -> String {
    format!("{}-{:04}", Season::from_month(date.month()), date.year())
}

/// Whether `key` is a well-formed `SEASON-YYYY` key.
#[must_use]
pub fn is_season_key(key: &str) -> bool {
    SEASON_KEY_RE.is_match(key)
}

/// Splits a `SEASON-YYYY` key into its parts.
#[must_use]
pub fn parse_season_key(key: &str) -> Option<(Season, i32)> {
    let caps = SEASON_KEY_RE.captures(key)?;
    let season = Season::from_str(caps.get(1)?.as_str()).ok()?;
    let year = caps.get(2)?.as_str().parse().ok()?;
    Some((season, year))
}

/// Parses any canonical key back into a representative calendar date.
///
/// Partial keys resolve to the first day they cover; season keys resolve to
/// the season's anchor month (see [`season_anchor`]).
///
/// # Errors
///
/// Returns [`PeriodError::InvalidDate`] if `key` is not a recognised key.
pub fn parse_key(key: &str) -> Result<NaiveDate, PeriodError> {
    let invalid = || PeriodError::InvalidDate {
        input: key.to_string(),
    };
    let key = key.trim();

    if let Some(date) = season_anchor(key) {
        return Ok(date);
    }

    match key.len() {
        10 => NaiveDate::parse_from_str(key, "%Y-%m-%d").map_err(|_| invalid()),
        7 => NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d").map_err(|_| invalid()),
        4 => key
            .parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Derives the time-series query value for a canonical key.
///
/// The time-series endpoints are keyed across years: a daily key yields
/// `MM-DD`, a monthly key `MM`, an annual key the year and a season key the
/// bare season name.
#[must_use]
pub fn series_key(period: Period, key: &str) -> Option<String> {
    match period {
        Period::Seasonal => parse_season_key(key).map(|(season, _)| season.to_string()),
        Period::Annual => {
            let date = parse_key(key).ok()?;
            Some(format!("{:04}", date.year()))
        }
        Period::Monthly => {
            let date = parse_key(key).ok()?;
            Some(date.format("%m").to_string())
        }
        Period::Daily => {
            let date = parse_key(key).ok()?;
            Some(date.format("%m-%d").to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> DateInput {
        DateInput::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn resolved(input: &DateInput, period: Period) -> String {
        resolve(Some(input), period).unwrap().unwrap()
    }

    #[test]
    fn resolves_calendar_periods() {
        let d = date(2020, 1, 15);
        assert_eq!(resolved(&d, Period::Daily), "2020-01-15");
        assert_eq!(resolved(&d, Period::Monthly), "2020-01");
        assert_eq!(resolved(&d, Period::Annual), "2020");
    }

    #[test]
    fn resolves_seasons_by_month() {
        for m in 3..=5 {
            assert_eq!(resolved(&date(2018, m, 1), Period::Seasonal), "MAM-2018");
        }
        for m in 6..=9 {
            assert_eq!(resolved(&date(2018, m, 1), Period::Seasonal), "JJAS-2018");
        }
        for m in [10, 11, 12, 1, 2] {
            assert_eq!(resolved(&date(2018, m, 1), Period::Seasonal), "OND-2018");
        }
    }

    #[test]
    fn january_belongs_to_same_year_ond() {
        assert_eq!(resolved(&date(2021, 2, 10), Period::Seasonal), "OND-2021");
    }

    #[test]
    fn season_keys_are_idempotent() {
        let key = DateInput::from("JJAS-2014");
        assert_eq!(resolved(&key, Period::Seasonal), "JJAS-2014");
        let again = DateInput::from(resolved(&key, Period::Seasonal));
        assert_eq!(resolved(&again, Period::Seasonal), "JJAS-2014");
    }

    #[test]
    fn missing_input_resolves_to_none() {
        assert_eq!(resolve(None, Period::Daily), Ok(None));
        assert_eq!(resolve(None, Period::Seasonal), Ok(None));
    }

    #[test]
    fn string_keys_are_normalised() {
        assert_eq!(resolved(&DateInput::from("2012"), Period::Annual), "2012");
        assert_eq!(resolved(&DateInput::from("2012-07"), Period::Seasonal), "JJAS-2012");
        assert_eq!(resolved(&DateInput::from("2012-07-30"), Period::Monthly), "2012-07");
    }

    #[test]
    fn rejects_garbage_keys() {
        assert!(matches!(
            resolve(Some(&DateInput::from("yesterday")), Period::Daily),
            Err(PeriodError::InvalidDate { .. })
        ));
        assert!(resolve(Some(&DateInput::from("2012-13")), Period::Monthly).is_err());
        assert!(!is_season_key("SUMMER-2012"));
        assert!(!is_season_key("MAM-12"));
    }

    #[test]
    fn parses_season_keys() {
        assert_eq!(parse_season_key("OND-2009"), Some((Season::Ond, 2009)));
        assert_eq!(parse_season_key("ond-2009"), None);
    }

    #[test]
    fn derives_series_keys() {
        assert_eq!(series_key(Period::Daily, "2012-03-04").as_deref(), Some("03-04"));
        assert_eq!(series_key(Period::Monthly, "2012-03").as_deref(), Some("03"));
        assert_eq!(series_key(Period::Annual, "2012").as_deref(), Some("2012"));
        assert_eq!(series_key(Period::Seasonal, "MAM-2012").as_deref(), Some("MAM"));
        assert_eq!(series_key(Period::Seasonal, "2012"), None);
    }
}
