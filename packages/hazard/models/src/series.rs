//! Time-series and availability payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Values recorded under one period label.
///
/// Most aggregations return one value per year of the fixed year range;
/// the annual aggregation returns a single scalar per year label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeriesValues {
    PerYear(Vec<Option<f64>>),
    Single(f64),
}

/// Mapping from period label (`MM-DD`, `01`..`12`, a year, or a season
/// name) to its values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSeries(pub BTreeMap<String, SeriesValues>);

/// A single plotted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRow {
    pub label: String,
    pub year: i32,
    pub value: f64,
}

impl TimeSeries {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flattens the series into chart rows.
    ///
    /// Per-year arrays are indexed from `first_year`; null entries are
    /// skipped. A scalar entry is plotted at the year named by its label, or
    /// at `first_year` when the label is not a year.
    #[must_use]
    pub fn chart_rows(&self, first_year: i32) -> Vec<ChartRow> {
        let mut rows = Vec::new();

        for (label, values) in &self.0 {
            match values {
                SeriesValues::PerYear(values) => {
                    for (year, value) in (first_year..).zip(values) {
                        if let Some(value) = value {
                            rows.push(ChartRow {
                                label: label.clone(),
                                year,
                                value: *value,
                            });
                        }
                    }
                }
                SeriesValues::Single(value) => rows.push(ChartRow {
                    label: label.clone(),
                    year: label.parse().unwrap_or(first_year),
                    value: *value,
                }),
            }
        }

        rows
    }
}

/// Dates for which a hazard has data, grouped by granularity.
///
/// The temperature endpoints name the groups `daily`/`monthly`/`annual`;
/// both spellings are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableDates {
    /// `YYYY-MM-DD` strings.
    #[serde(default, alias = "daily")]
    pub dates: Vec<String>,
    /// `YYYY-MM` strings.
    #[serde(default, alias = "monthly")]
    pub months: Vec<String>,
    /// `YYYY` strings.
    #[serde(default, alias = "annual")]
    pub years: Vec<String>,
}

/// Period keys with data, keyed by period name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvailablePeriods(pub BTreeMap<String, Vec<String>>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_rows_index_years_from_first_year() {
        let series: TimeSeries = serde_json::from_value(serde_json::json!({
            "MAM": [1.0, null, 3.0]
        }))
        .unwrap();

        let rows = series.chart_rows(2005);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year, 2005);
        assert_eq!(rows[1].year, 2007);
        assert!((rows[1].value - 3.0).abs() < 1e-12);
    }

    #[test]
    fn chart_rows_place_scalars_at_their_year() {
        let series: TimeSeries = serde_json::from_value(serde_json::json!({
            "2010": 812.5,
            "2011": 790.0
        }))
        .unwrap();

        let rows = series.chart_rows(2005);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year, 2010);
        assert_eq!(rows[1].year, 2011);
    }

    #[test]
    fn available_dates_accept_temperature_field_names() {
        let dates: AvailableDates = serde_json::from_value(serde_json::json!({
            "daily": ["2012-01-01"],
            "annual": ["2012"]
        }))
        .unwrap();
        assert_eq!(dates.dates, vec!["2012-01-01"]);
        assert_eq!(dates.years, vec!["2012"]);
        assert!(dates.months.is_empty());
    }
}
