//! Time-series request building.
//!
//! Series endpoints are keyed across years rather than by a single date:
//! the daily series for `2012-03-04` is requested as `date=03-04` and
//! returns one value per year for March 4th.

use std::fmt;

use hazard_map_hazard_models::{HazardType, Period};
use hazard_map_period::series_key;

/// Which series endpoint to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeriesAggregation {
    /// `/daily_by_day?date=MM-DD`
    DailyByDay,
    /// `/monthly?month=MM`
    Monthly,
    /// `/annual?year=YYYY`
    Annual,
    /// `/seasonal?season=SEASON`
    Seasonal,
    /// `?aggregation={period}` on the series root.
    Overall(Period),
}

impl fmt::Display for SeriesAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DailyByDay => f.write_str("daily_by_day"),
            Self::Monthly => f.write_str("monthly"),
            Self::Annual => f.write_str("annual"),
            Self::Seasonal => f.write_str("seasonal"),
            Self::Overall(period) => write!(f, "overall_{period}"),
        }
    }
}

impl SeriesAggregation {
    /// Sub-path below the hazard's series root, if any.
    #[must_use]
    pub const fn sub_path(self) -> Option<&'static str> {
        match self {
            Self::DailyByDay => Some("daily_by_day"),
            Self::Monthly => Some("monthly"),
            Self::Annual => Some("annual"),
            Self::Seasonal => Some("seasonal"),
            Self::Overall(_) => None,
        }
    }

    /// Name of the query parameter carrying the key.
    #[must_use]
    pub const fn key_param(self) -> &'static str {
        match self {
            Self::DailyByDay => "date",
            Self::Monthly => "month",
            Self::Annual => "year",
            Self::Seasonal => "season",
            Self::Overall(_) => "aggregation",
        }
    }
}

/// A time-series request: endpoint, key and optional region filter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesQuery {
    pub aggregation: SeriesAggregation,
    /// Query value (`03-04`, `03`, `2012`, `MAM`). Ignored for
    /// [`SeriesAggregation::Overall`].
    pub key: Option<String>,
    pub region: Option<String>,
}

impl SeriesQuery {
    #[must_use]
    pub const fn new(aggregation: SeriesAggregation) -> Self {
        Self {
            aggregation,
            key: None,
            region: None,
        }
    }

    /// Builds the series query matching a map selection.
    ///
    /// `canonical_key` is a key as produced by
    /// [`hazard_map_period::resolve`]. Without a usable key a daily
    /// selection falls back to the overall daily series and the other
    /// periods request their endpoint unfiltered.
    #[must_use]
    pub fn for_period(period: Period, canonical_key: Option<&str>, region: Option<&str>) -> Self {
        let aggregation = match period {
            Period::Daily => SeriesAggregation::DailyByDay,
            Period::Monthly => SeriesAggregation::Monthly,
            Period::Annual => SeriesAggregation::Annual,
            Period::Seasonal => SeriesAggregation::Seasonal,
        };

        let key = canonical_key.and_then(|k| series_key(period, k));
        if key.is_none() && canonical_key.is_some() {
            log::debug!("No series key for {period} key {canonical_key:?}");
        }

        let aggregation = match (aggregation, &key) {
            (SeriesAggregation::DailyByDay, None) => SeriesAggregation::Overall(Period::Daily),
            (aggregation, _) => aggregation,
        };

        Self {
            aggregation,
            key,
            region: region.map(str::to_string),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Path relative to the API base, e.g. `temperature/timeseries/monthly`.
    #[must_use]
    pub fn path(&self, hazard: HazardType) -> String {
        match self.aggregation.sub_path() {
            Some(sub) => format!("{}/{sub}", hazard.series_path()),
            None => hazard.series_path().to_string(),
        }
    }

    /// Query parameters, in request order.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        match self.aggregation {
            SeriesAggregation::Overall(period) => {
                params.push(("aggregation", period.to_string()));
            }
            aggregation => {
                if let Some(key) = &self.key {
                    params.push((aggregation.key_param(), key.clone()));
                }
            }
        }

        if let Some(region) = &self.region {
            params.push(("region", region.clone()));
        }

        params
    }
}

/// Path of a raster request relative to the API base.
#[must_use]
pub fn raster_path(hazard: HazardType, period: Period, key: &str) -> String {
    format!("{hazard}/{period}/{key}")
}

/// Path of an availability request relative to the API base.
#[must_use]
pub fn available_dates_path(hazard: HazardType) -> String {
    format!("{hazard}/available_dates")
}

#[must_use]
pub fn available_periods_path(hazard: HazardType) -> String {
    format!("{hazard}/available_periods")
}
