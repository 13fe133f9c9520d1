//! Cache keys for hazard requests.

use std::fmt;

use hazard_map_client::{SeriesAggregation, SeriesQuery};
use hazard_map_hazard_models::{HazardType, Period};

/// Aggregation component of raster signatures.
pub const RASTER_AGGREGATION: &str = "raster";

/// Identifies one logical hazard request.
///
/// Two requests with the same inputs always produce equal signatures, so
/// the signature doubles as the fetch cache key. Its string form is
/// `{hazard}-{aggregation}-{region}-{dateKey}-{period}`, with `all` and
/// `none` standing in for a missing region and date key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestSignature {
    pub hazard: HazardType,
    pub aggregation: String,
    pub region: Option<String>,
    pub date_key: Option<String>,
    pub period: Period,
}

impl RequestSignature {
    /// Signature of a raster request for a canonical period key.
    #[must_use]
    pub fn raster(hazard: HazardType, period: Period, date_key: &str) -> Self {
        Self {
            hazard,
            aggregation: RASTER_AGGREGATION.to_string(),
            region: None,
            date_key: Some(date_key.to_string()),
            period,
        }
    }

    /// Signature of a time-series request.
    ///
    /// The overall series has no key, whatever the query carries.
    #[must_use]
    pub fn series(hazard: HazardType, period: Period, query: &SeriesQuery) -> Self {
        let date_key = match query.aggregation {
            SeriesAggregation::Overall(_) => None,
            _ => query.key.clone(),
        };
        Self {
            hazard,
            aggregation: query.aggregation.to_string(),
            region: query.region.clone(),
            date_key,
            period,
        }
    }

    /// Signature of an availability lookup (`available_dates`,
    /// `available_periods`). Availability is not period scoped; the period
    /// slot is fixed to daily.
    #[must_use]
    pub fn availability(hazard: HazardType, kind: &str) -> Self {
        Self {
            hazard,
            aggregation: kind.to_string(),
            region: None,
            date_key: None,
            period: Period::Daily,
        }
    }
}

/// Cache key of a region boundary request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegionScope {
    /// Every region.
    All,
    /// One region by name.
    Named(String),
}

impl fmt::Display for RegionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("regions-all"),
            Self::Named(name) => write!(f, "regions-{name}"),
        }
    }
}

impl fmt::Display for RequestSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}",
            self.hazard,
            self.aggregation,
            self.region.as_deref().unwrap_or("all"),
            self.date_key.as_deref().unwrap_or("none"),
            self.period
        )
    }
}
