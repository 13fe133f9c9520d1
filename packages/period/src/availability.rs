//! Selectable date ranges derived from the API's availability listings.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use hazard_map_hazard_models::{AvailableDates, Period};

use crate::{parse_key, parse_season_key, season_key};

/// Representative calendar date of a `SEASON-YYYY` key: the first day of
/// the season's anchor month.
#[must_use]
pub fn season_anchor(key: &str) -> Option<NaiveDate> {
    let (season, year) = parse_season_key(key)?;
    NaiveDate::from_ymd_opt(year, season.anchor_month(), 1)
}

/// Season keys covered by a list of daily `YYYY-MM-DD` dates, oldest first.
///
/// Unparseable entries are skipped.
#[must_use]
pub fn available_seasons(dates: &[String]) -> Vec<String> {
    let anchors: BTreeSet<NaiveDate> = dates
        .iter()
        .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .filter_map(|d| season_anchor(&season_key(d)))
        .collect();

    anchors.into_iter().map(season_key).collect()
}

/// Earliest and latest selectable dates for `period`.
///
/// Returns `None` when the relevant listing is empty or entirely
/// unparseable. The annual range ends on December 31st of the last year.
#[must_use]
pub fn date_range(period: Period, available: &AvailableDates) -> Option<(NaiveDate, NaiveDate)> {
    let dates: Vec<NaiveDate> = match period {
        Period::Daily => parse_all(&available.dates),
        Period::Monthly => parse_all(&available.months),
        Period::Annual => parse_all(&available.years),
        Period::Seasonal => available_seasons(&available.dates)
            .iter()
            .filter_map(|key| season_anchor(key))
            .collect(),
    };

    let min = dates.iter().min().copied()?;
    let max = dates.iter().max().copied()?;

    let max = if period == Period::Annual {
        NaiveDate::from_ymd_opt(max.year(), 12, 31).unwrap_or(max)
    } else {
        max
    };

    Some((min, max))
}

fn parse_all(keys: &[String]) -> Vec<NaiveDate> {
    keys.iter()
        .filter_map(|key| match parse_key(key) {
            Ok(date) => Some(date),
            Err(e) => {
                log::debug!("Skipping unavailable period entry: {e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn seasons_are_deduplicated_and_chronological() {
        let dates = strings(&[
            "2012-07-01",
            "2011-04-02",
            "2011-04-03",
            "2012-01-15",
            "not-a-date",
        ]);
        assert_eq!(
            available_seasons(&dates),
            vec!["MAM-2011", "JJAS-2012", "OND-2012"]
        );
    }

    #[test]
    fn anchors_seasons() {
        assert_eq!(season_anchor("MAM-2010"), Some(ymd(2010, 5, 1)));
        assert_eq!(season_anchor("JJAS-2010"), Some(ymd(2010, 8, 1)));
        assert_eq!(season_anchor("OND-2010"), Some(ymd(2010, 12, 1)));
        assert_eq!(season_anchor("2010"), None);
    }

    #[test]
    fn ranges_per_period() {
        let available = AvailableDates {
            dates: strings(&["2005-03-02", "2014-12-31", "2009-06-30"]),
            months: strings(&["2005-01", "2014-12"]),
            years: strings(&["2014", "2005"]),
        };

        assert_eq!(
            date_range(Period::Daily, &available),
            Some((ymd(2005, 3, 2), ymd(2014, 12, 31)))
        );
        assert_eq!(
            date_range(Period::Monthly, &available),
            Some((ymd(2005, 1, 1), ymd(2014, 12, 1)))
        );
        assert_eq!(
            date_range(Period::Annual, &available),
            Some((ymd(2005, 1, 1), ymd(2014, 12, 31)))
        );
        assert_eq!(
            date_range(Period::Seasonal, &available),
            Some((ymd(2005, 5, 1), ymd(2014, 12, 1)))
        );
    }

    #[test]
    fn empty_listing_has_no_range() {
        assert_eq!(date_range(Period::Daily, &AvailableDates::default()), None);
    }
}
