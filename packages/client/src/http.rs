//! `reqwest` implementation of [`HazardApi`].

use async_trait::async_trait;
use geojson::{Feature, FeatureCollection};
use hazard_map_hazard_models::{
    AvailableDates, AvailablePeriods, HazardType, Period, RasterResponse, TimeSeries,
};
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::query::{available_dates_path, available_periods_path, raster_path};
use crate::{ClientConfig, ClientError, HazardApi, SeriesQuery};

/// Longest raw body echoed into an error when the server sent no `detail`.
const MAX_DETAIL_CHARS: usize = 200;

/// HTTP client for the hazard API.
#[derive(Debug, Clone)]
pub struct HazardClient {
    http: reqwest::Client,
    base_url: Url,
}

/// Regions come back either as a collection or as a bare feature array.
#[derive(Deserialize)]
#[serde(untagged)]
enum RegionsPayload {
    Collection(FeatureCollection),
    Features(Vec<Feature>),
    Single(Box<Feature>),
}

impl From<RegionsPayload> for FeatureCollection {
    fn from(payload: RegionsPayload) -> Self {
        let features = match payload {
            RegionsPayload::Collection(fc) => return fc,
            RegionsPayload::Features(features) => features,
            RegionsPayload::Single(feature) => vec![*feature],
        };
        Self {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl HazardClient {
    /// Creates a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the base URL cannot carry a
    /// path, or [`ClientError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| ClientError::InvalidUrl {
            url: config.base_url.clone(),
            message: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl {
                url: config.base_url.clone(),
                message: "URL cannot have a path".to_string(),
            });
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
        })
    }

    /// Client configured from the environment.
    ///
    /// # Errors
    ///
    /// See [`HazardClient::new`].
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(&ClientConfig::from_env())
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for a `/`-separated path below the base. Each segment
    /// is percent-encoded.
    fn url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ClientError> {
        self.fetch(self.url(path), params).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<T, ClientError> {
        log::debug!("GET {url} {params:?}");

        let resp = self.http.get(url.clone()).query(params).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            log::warn!("GET {url} responded {status}");
            return Err(ClientError::Status {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// The server's explanation of a failed request: the `detail` field of a
/// JSON error body, else the (truncated) raw body.
fn error_detail(body: &str) -> Option<String> {
    if let Ok(ErrorBody { detail }) = serde_json::from_str::<ErrorBody>(body) {
        return match detail {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        };
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_DETAIL_CHARS).collect())
}

#[async_trait]
impl HazardApi for HazardClient {
    async fn regions(&self) -> Result<FeatureCollection, ClientError> {
        let payload: RegionsPayload = self.get_json("regions", &[]).await?;
        Ok(payload.into())
    }

    async fn region_by_name(&self, name: &str) -> Result<FeatureCollection, ClientError> {
        let mut url = self.url("regions");
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(name);
        }
        let payload: RegionsPayload = self.fetch(url, &[]).await?;
        Ok(payload.into())
    }

    async fn raster(
        &self,
        hazard: HazardType,
        period: Period,
        key: &str,
    ) -> Result<RasterResponse, ClientError> {
        self.get_json(&raster_path(hazard, period, key), &[]).await
    }

    async fn time_series(
        &self,
        hazard: HazardType,
        query: &SeriesQuery,
    ) -> Result<TimeSeries, ClientError> {
        self.get_json(&query.path(hazard), &query.params()).await
    }

    async fn available_dates(&self, hazard: HazardType) -> Result<AvailableDates, ClientError> {
        self.get_json(&available_dates_path(hazard), &[]).await
    }

    async fn available_periods(
        &self,
        hazard: HazardType,
    ) -> Result<AvailablePeriods, ClientError> {
        self.get_json(&available_periods_path(hazard), &[]).await
    }
}
