#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Client for the climate hazard HTTP API.
//!
//! Every endpoint is a `GET` below a configurable base path (default
//! `http://localhost:8000/api/hazards`):
//!
//! - `/regions`, `/regions/{name}`: administrative boundaries as `GeoJSON`
//! - `/{hazard}/{period}/{key}`: a raster for one period key
//! - `/timeseries/...`, `/temperature/timeseries/...`: per-year series
//! - `/{hazard}/available_dates`, `/{hazard}/available_periods`
//!
//! [`HazardApi`] is the seam the store depends on; [`http::HazardClient`]
//! implements it with `reqwest`. Non-2xx responses surface as
//! [`ClientError::Status`] with the server's `detail` message when it sent
//! one. There is no retry: a failed request is reported once.

pub mod config;
pub mod http;
pub mod query;
pub mod registry;

pub use config::ClientConfig;
pub use http::HazardClient;
pub use query::{SeriesAggregation, SeriesQuery};

use async_trait::async_trait;
use geojson::FeatureCollection;
use hazard_map_hazard_models::{
    AvailableDates, AvailablePeriods, HazardType, Period, RasterResponse, TimeSeries,
};
use thiserror::Error;

/// Errors from hazard API requests.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("HTTP error! status: {status}{}", format_detail(.detail.as_deref()))]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-supplied explanation, if any.
        detail: Option<String>,
    },

    /// The configured base URL is unusable.
    #[error("Invalid API URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    /// Transport failure (connection, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON shape.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status code, when the failure was a server response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::InvalidUrl { .. } | Self::Http(_) | Self::Json(_) => None,
        }
    }
}

fn format_detail(detail: Option<&str>) -> String {
    detail.map(|d| format!(" ({d})")).unwrap_or_default()
}

/// Read access to the hazard API.
#[async_trait]
pub trait HazardApi: Send + Sync {
    /// All region boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request or decoding fails.
    async fn regions(&self) -> Result<FeatureCollection, ClientError>;

    /// Boundaries of a single named region.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request or decoding fails.
    async fn region_by_name(&self, name: &str) -> Result<FeatureCollection, ClientError>;

    /// Raster for `hazard` over the period identified by `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request or decoding fails.
    async fn raster(
        &self,
        hazard: HazardType,
        period: Period,
        key: &str,
    ) -> Result<RasterResponse, ClientError>;

    /// Per-year time series.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request or decoding fails.
    async fn time_series(
        &self,
        hazard: HazardType,
        query: &SeriesQuery,
    ) -> Result<TimeSeries, ClientError>;

    /// Dates with data for `hazard`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request or decoding fails.
    async fn available_dates(&self, hazard: HazardType) -> Result<AvailableDates, ClientError>;

    /// Period keys with data for `hazard`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request or decoding fails.
    async fn available_periods(&self, hazard: HazardType)
    -> Result<AvailablePeriods, ClientError>;
}
