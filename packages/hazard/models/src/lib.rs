#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Climate hazard data types.
//!
//! Shared by the HTTP client, the spatial pipeline and the store. The raw
//! wire shapes ([`RasterResponse`], [`TimeSeries`], [`AvailableDates`]) live
//! next to the validated and derived types ([`Raster`], [`Point`], [`Cell`])
//! so every consumer agrees on one vocabulary.

pub mod raster;
pub mod series;

pub use raster::{MalformedRaster, Raster, RasterResponse, Stats};
pub use series::{AvailableDates, AvailablePeriods, ChartRow, SeriesValues, TimeSeries};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Kind of climate hazard served by the backend.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HazardType {
    /// Precipitation totals.
    Rainfall,
    /// Near-surface air temperature.
    Temperature,
}

impl HazardType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Rainfall, Self::Temperature]
    }

    /// Path segment (relative to the API base) of this hazard's
    /// time-series endpoints.
    ///
    /// Rainfall predates the temperature endpoints and lives at the
    /// unprefixed `timeseries` path.
    #[must_use]
    pub const fn series_path(self) -> &'static str {
        match self {
            Self::Rainfall => "timeseries",
            Self::Temperature => "temperature/timeseries",
        }
    }
}

/// Temporal aggregation of a hazard request.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Period {
    /// A single calendar day (`YYYY-MM-DD`).
    Daily,
    /// A calendar month (`YYYY-MM`).
    Monthly,
    /// A calendar year (`YYYY`).
    Annual,
    /// A meteorological season (`SEASON-YYYY`).
    Seasonal,
}

impl Period {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Daily, Self::Monthly, Self::Annual, Self::Seasonal]
    }
}

/// One of the three meteorological seasons used for Ethiopian rainfall.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Season {
    /// March to May (the *belg* short rains).
    Mam,
    /// June to September (the *kiremt* long rains).
    Jjas,
    /// October to December. January and February are attributed here too.
    Ond,
}

impl Season {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Mam, Self::Jjas, Self::Ond]
    }

    /// Classifies a 1-based calendar month.
    ///
    /// Months outside March to September (including January and February)
    /// fall into [`Season::Ond`].
    #[must_use]
    pub const fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Self::Mam,
            6..=9 => Self::Jjas,
            _ => Self::Ond,
        }
    }

    /// Month used to place the season on a calendar (1-based).
    #[must_use]
    pub const fn anchor_month(self) -> u32 {
        match self {
            Self::Mam => 5,
            Self::Jjas => 8,
            Self::Ond => 12,
        }
    }
}

/// A geolocated sample extracted from a raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lng: f64,
    /// Hazard value at this location.
    pub value: f64,
}

impl Point {
    #[must_use]
    pub const fn new(lat: f64, lng: f64, value: f64) -> Self {
        Self { lat, lng, value }
    }
}

/// An axis-aligned geographic bounding box.
///
/// Serialized the way the hazard API and map widgets expect it:
/// `[[minLat, minLng], [maxLat, maxLng]]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f64; 2]; 2]", into = "[[f64; 2]; 2]")]
pub struct LatLngBounds {
    /// Southern latitude boundary.
    pub min_lat: f64,
    /// Western longitude boundary.
    pub min_lng: f64,
    /// Northern latitude boundary.
    pub max_lat: f64,
    /// Eastern longitude boundary.
    pub max_lng: f64,
}

impl LatLngBounds {
    /// Creates a new bounding box from its south-west and north-east corners.
    #[must_use]
    pub const fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            min_lng,
            max_lat,
            max_lng,
        }
    }

    /// Whether the box spans a strictly positive area.
    #[must_use]
    pub fn has_area(&self) -> bool {
        self.min_lat < self.max_lat && self.min_lng < self.max_lng
    }

    /// Latitude span in degrees.
    #[must_use]
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Longitude span in degrees.
    #[must_use]
    pub fn lng_span(&self) -> f64 {
        self.max_lng - self.min_lng
    }
}

impl From<[[f64; 2]; 2]> for LatLngBounds {
    fn from([[min_lat, min_lng], [max_lat, max_lng]]: [[f64; 2]; 2]) -> Self {
        Self::new(min_lat, min_lng, max_lat, max_lng)
    }
}

impl From<LatLngBounds> for [[f64; 2]; 2] {
    fn from(b: LatLngBounds) -> Self {
        [[b.min_lat, b.min_lng], [b.max_lat, b.max_lng]]
    }
}

/// Discrete visual class of a normalized intensity.
///
/// Ordered from coolest to hottest; the derived [`Ord`] is the visual order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IntensityBand {
    /// At most 0.1 (also "no data / very light").
    Minimal,
    /// Above 0.1.
    VeryLow,
    /// Above 0.3.
    Low,
    /// Above 0.5.
    Moderate,
    /// Above 0.7.
    High,
    /// Above 0.9.
    VeryHigh,
}

impl IntensityBand {
    /// Returns all variants, coolest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Minimal,
            Self::VeryLow,
            Self::Low,
            Self::Moderate,
            Self::High,
            Self::VeryHigh,
        ]
    }

    /// Maps a normalized intensity onto its band.
    ///
    /// Band boundaries are exclusive lower bounds: exactly `0.9` is
    /// [`IntensityBand::High`], not [`IntensityBand::VeryHigh`]. `NaN` maps
    /// to [`IntensityBand::Minimal`].
    #[must_use]
    pub fn from_normalized(intensity: f64) -> Self {
        if intensity > 0.9 {
            Self::VeryHigh
        } else if intensity > 0.7 {
            Self::High
        } else if intensity > 0.5 {
            Self::Moderate
        } else if intensity > 0.3 {
            Self::Low
        } else if intensity > 0.1 {
            Self::VeryLow
        } else {
            Self::Minimal
        }
    }

    /// Human-readable legend label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Minimal => "No Data/Very Light",
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }
}

/// A fixed-size geographic bucket of re-aggregated points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    /// `[[lat, lng], [lat + size, lng + size]]`.
    pub bounds: LatLngBounds,
    /// Arithmetic mean of the values that fell into this cell.
    pub mean_value: f64,
    /// `mean_value` relative to the dataset maximum, in `[0, 1]`.
    pub normalized_intensity: f64,
    /// Discrete class of `normalized_intensity`.
    pub band: IntensityBand,
    /// Number of points aggregated into this cell.
    pub point_count: usize,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn hazard_and_period_parse_lowercase() {
        assert_eq!(HazardType::from_str("rainfall").unwrap(), HazardType::Rainfall);
        assert_eq!(Period::from_str("seasonal").unwrap(), Period::Seasonal);
        assert!(HazardType::from_str("wind").is_err());
        assert!(Period::from_str("weekly").is_err());
        assert_eq!(Period::Annual.to_string(), "annual");
    }

    #[test]
    fn season_from_month_covers_the_calendar() {
        assert_eq!(Season::from_month(1), Season::Ond);
        assert_eq!(Season::from_month(2), Season::Ond);
        for m in 3..=5 {
            assert_eq!(Season::from_month(m), Season::Mam);
        }
        for m in 6..=9 {
            assert_eq!(Season::from_month(m), Season::Jjas);
        }
        for m in 10..=12 {
            assert_eq!(Season::from_month(m), Season::Ond);
        }
        assert_eq!(Season::Jjas.to_string(), "JJAS");
    }

    #[test]
    fn bounds_serialize_as_nested_pairs() {
        let bounds = LatLngBounds::new(3.0, 32.5, 15.5, 48.5);
        let json = serde_json::to_value(bounds).unwrap();
        assert_eq!(json, serde_json::json!([[3.0, 32.5], [15.5, 48.5]]));

        let back: LatLngBounds = serde_json::from_value(json).unwrap();
        assert_eq!(back, bounds);
        assert!(back.has_area());
    }

    #[test]
    fn band_boundaries_are_exclusive() {
        assert_eq!(IntensityBand::from_normalized(1.0), IntensityBand::VeryHigh);
        assert_eq!(IntensityBand::from_normalized(0.9), IntensityBand::High);
        assert_eq!(IntensityBand::from_normalized(0.5), IntensityBand::Low);
        assert_eq!(IntensityBand::from_normalized(0.1), IntensityBand::Minimal);
        assert_eq!(IntensityBand::from_normalized(0.0), IntensityBand::Minimal);
        assert_eq!(IntensityBand::from_normalized(f64::NAN), IntensityBand::Minimal);
    }
}
