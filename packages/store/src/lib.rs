#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hazard data store.
//!
//! [`HazardStore`] turns a `(hazard, period, date)` selection into map
//! layers: it resolves the canonical period key, fetches and validates the
//! raster through a [`FetchCache`] (at most one request per
//! [`RequestSignature`]), converts the grid into points and publishes the
//! result on a `watch` channel.
//! [`TimeSeriesStore`] does the same for per-year series and availability.
//!
//! Store operations never return `Err`. They return a [`LoadOutcome`] and
//! mirror failures into the published state's `error` field. Each hazard
//! type has its own selection; a result whose selection was superseded
//! while it was in flight comes back as [`LoadOutcome::Stale`] and is not
//! applied.

pub mod cache;
pub mod signature;
pub mod timeseries;

pub use cache::{CacheEntry, FetchCache, FetchResult};
pub use signature::{RegionScope, RequestSignature};
pub use timeseries::{TimeSeriesState, TimeSeriesStore};

use std::collections::BTreeMap;
use std::str::FromStr as _;
use std::sync::{Arc, Mutex};

use geojson::FeatureCollection;
use hazard_map_client::{ClientError, HazardApi};
use hazard_map_hazard_models::{
    Cell, HazardType, LatLngBounds, MalformedRaster, Period, Point, Raster, Stats,
};
use hazard_map_period::{DateInput, PeriodError, resolve};
use hazard_map_spatial::{
    SpatialError, bin, cells_to_feature_collection, compute_bounds, to_points,
};
use thiserror::Error;
use tokio::sync::watch;

/// Rejected request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Unsupported hazard type: {value:?}")]
    UnsupportedHazard { value: String },

    #[error("Unsupported period: {value:?}")]
    UnsupportedPeriod { value: String },

    #[error(transparent)]
    Period(#[from] PeriodError),
}

/// Why a load produced no data.
#[derive(Debug, Clone, Error)]
pub enum LoadFailure {
    #[error(transparent)]
    Client(Arc<ClientError>),

    #[error("Invalid raster payload: {0}")]
    Malformed(#[from] MalformedRaster),

    #[error(transparent)]
    Period(#[from] PeriodError),
}

impl From<ClientError> for LoadFailure {
    fn from(e: ClientError) -> Self {
        Self::Client(Arc::new(e))
    }
}

/// Result of a store load.
#[derive(Debug, Clone)]
pub enum LoadOutcome<T> {
    Loaded(T),
    /// The selection had no date, so nothing was requested.
    NoDate,
    /// Another selection was made while this one was in flight.
    Stale(RequestSignature),
    Failed(LoadFailure),
}

impl<T> LoadOutcome<T> {
    /// The loaded value, if any.
    pub fn loaded(self) -> Option<T> {
        match self {
            Self::Loaded(value) => Some(value),
            Self::NoDate | Self::Stale(_) | Self::Failed(_) => None,
        }
    }

    /// Maps a loaded value, passing every other outcome through.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LoadOutcome<U> {
        match self {
            Self::Loaded(value) => LoadOutcome::Loaded(f(value)),
            Self::NoDate => LoadOutcome::NoDate,
            Self::Stale(signature) => LoadOutcome::Stale(signature),
            Self::Failed(failure) => LoadOutcome::Failed(failure),
        }
    }

    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// A validated hazard selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HazardRequest {
    pub hazard: HazardType,
    pub period: Period,
    pub date: Option<DateInput>,
}

impl HazardRequest {
    #[must_use]
    pub const fn new(hazard: HazardType, period: Period, date: Option<DateInput>) -> Self {
        Self {
            hazard,
            period,
            date,
        }
    }

    /// Parses string parameters as they arrive from a UI or command line.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for an unknown hazard or period, or a date
    /// that cannot be resolved for the period.
    pub fn parse(hazard: &str, period: &str, date: Option<&str>) -> Result<Self, StoreError> {
        let hazard = HazardType::from_str(hazard.trim()).map_err(|_| {
            StoreError::UnsupportedHazard {
                value: hazard.to_string(),
            }
        })?;
        let period = Period::from_str(period.trim()).map_err(|_| StoreError::UnsupportedPeriod {
            value: period.to_string(),
        })?;

        let request = Self::new(hazard, period, date.map(DateInput::from));
        request.date_key()?;
        Ok(request)
    }

    /// Canonical period key of this selection.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError`] if the date cannot be resolved.
    pub fn date_key(&self) -> Result<Option<String>, PeriodError> {
        resolve(self.date.as_ref(), self.period)
    }
}

/// A raster loaded for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// `{hazard}-{dateKey}`.
    pub id: String,
    pub hazard: HazardType,
    pub period: Period,
    pub date_key: String,
    pub visible: bool,
    pub raster: Arc<Raster>,
    pub points: Arc<[Point]>,
    pub stats: Option<Stats>,
    pub bounds: LatLngBounds,
}

impl Layer {
    fn new(hazard: HazardType, period: Period, date_key: &str, raster: Arc<Raster>) -> Self {
        let points: Arc<[Point]> = to_points(&raster).into();
        Self {
            id: format!("{hazard}-{date_key}"),
            hazard,
            period,
            date_key: date_key.to_string(),
            visible: true,
            stats: raster.stats,
            bounds: raster.bounds,
            raster,
            points,
        }
    }

    /// Bins this layer's points into cells of `cell_size` degrees over the
    /// default extent.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] for an unusable cell size.
    pub fn cells(&self, cell_size: f64) -> Result<Vec<Cell>, SpatialError> {
        bin(&self.points, cell_size, None)
    }

    /// Binned cells as a `GeoJSON` collection.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] for an unusable cell size.
    pub fn to_geojson(&self, cell_size: f64) -> Result<FeatureCollection, SpatialError> {
        Ok(cells_to_feature_collection(
            &self.cells(cell_size)?,
            self.hazard,
        ))
    }
}

/// Everything consumers render.
#[derive(Debug, Clone, Default)]
pub struct HazardState {
    /// Number of network fetches in flight.
    pub loading: usize,
    pub error: Option<String>,
    pub layers: Vec<Layer>,
    pub regions: Option<Arc<FeatureCollection>>,
    /// Extent to fit the map to: the last raster or region set loaded.
    pub map_bounds: Option<LatLngBounds>,
}

impl HazardState {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading > 0
    }

    #[must_use]
    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn visible_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| l.visible)
    }
}

/// State that counts in-flight fetches and carries the last error.
trait FetchProgress {
    fn fetch_started(&mut self);
    fn fetch_finished(&mut self);
}

impl FetchProgress for HazardState {
    fn fetch_started(&mut self) {
        self.loading += 1;
        self.error = None;
    }

    fn fetch_finished(&mut self) {
        self.loading = self.loading.saturating_sub(1);
    }
}

/// Awaits `entry`, counting it as loading in `state` if it hit the network.
async fn track<S: FetchProgress, V: Clone>(
    state: &watch::Sender<S>,
    entry: CacheEntry<V>,
) -> FetchResult<V> {
    if !entry.fresh {
        return entry.resolve().await;
    }
    state.send_modify(FetchProgress::fetch_started);
    let result = entry.resolve().await;
    state.send_modify(FetchProgress::fetch_finished);
    result
}

/// Orchestrates raster and region loading for the map.
pub struct HazardStore {
    api: Arc<dyn HazardApi>,
    rasters: FetchCache<Arc<Raster>>,
    regions: FetchCache<Arc<FeatureCollection>, RegionScope>,
    /// Latest requested raster per hazard type.
    selection: Mutex<BTreeMap<HazardType, RequestSignature>>,
    state: watch::Sender<HazardState>,
}

impl HazardStore {
    #[must_use]
    pub fn new(api: Arc<dyn HazardApi>) -> Self {
        Self {
            api,
            rasters: FetchCache::new(),
            regions: FetchCache::new(),
            selection: Mutex::new(BTreeMap::new()),
            state: watch::Sender::new(HazardState::default()),
        }
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HazardState> {
        self.state.subscribe()
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> HazardState {
        self.state.borrow().clone()
    }

    /// Raster signatures claimed so far.
    #[must_use]
    pub fn signatures(&self) -> Vec<RequestSignature> {
        self.rasters.signatures()
    }

    /// Loads the raster for `request` and publishes it as a layer.
    ///
    /// The new layer replaces any layer of the same hazard type and the map
    /// bounds move to the raster's extent. Only a newer request for the same
    /// hazard type makes this one stale.
    ///
    /// # Panics
    ///
    /// Panics if the selection `Mutex` is poisoned.
    pub async fn load_hazard(&self, request: &HazardRequest) -> LoadOutcome<Layer> {
        let date_key = match request.date_key() {
            Ok(Some(key)) => key,
            Ok(None) => {
                log::debug!("No date selected for {} {}", request.hazard, request.period);
                return LoadOutcome::NoDate;
            }
            Err(e) => return self.fail(e.into()),
        };

        let (hazard, period) = (request.hazard, request.period);
        let signature = RequestSignature::raster(hazard, period, &date_key);
        self.select(&signature);

        let api = Arc::clone(&self.api);
        let key = date_key.clone();
        let entry = self.rasters.entry(&signature, move || async move {
            log::info!("Fetching {hazard} {period} raster for {key}");
            let response = api.raster(hazard, period, &key).await?;
            let raster = Raster::try_from(response).inspect_err(|reason| {
                log::warn!("Unusable {hazard} raster for {key}: {reason}");
            })?;
            Ok::<_, LoadFailure>(Arc::new(raster))
        });
        let result = track(&self.state, entry).await;

        if !self.is_selected(&signature) {
            log::debug!("Discarding stale result for {signature}");
            return LoadOutcome::Stale(signature);
        }

        let raster = match result {
            Ok(raster) => raster,
            Err(e) => return self.fail(e),
        };

        let layer = Layer::new(hazard, period, &date_key, raster);
        log::info!(
            "Loaded layer {} ({} points)",
            layer.id,
            layer.points.len()
        );

        self.state.send_modify(|state| {
            state.layers.retain(|l| l.hazard != hazard);
            state.layers.push(layer.clone());
            state.map_bounds = Some(layer.bounds);
        });

        LoadOutcome::Loaded(layer)
    }

    /// Loads every region boundary and fits the map to them.
    pub async fn load_regions(&self) -> LoadOutcome<Arc<FeatureCollection>> {
        let api = Arc::clone(&self.api);
        let entry = self.regions.entry(&RegionScope::All, move || async move {
            log::info!("Fetching regions");
            api.regions().await.map(Arc::new).map_err(LoadFailure::from)
        });

        match track(&self.state, entry).await {
            Ok(regions) => {
                let bounds = compute_bounds(&regions);
                self.state.send_modify(|state| {
                    state.regions = Some(Arc::clone(&regions));
                    if bounds.is_some() {
                        state.map_bounds = bounds;
                    }
                });
                LoadOutcome::Loaded(regions)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Loads one region's boundary and fits the map to it.
    pub async fn load_region(&self, name: &str) -> LoadOutcome<Arc<FeatureCollection>> {
        let api = Arc::clone(&self.api);
        let owned = name.to_string();
        let entry = self
            .regions
            .entry(&RegionScope::Named(name.to_string()), move || async move {
                log::info!("Fetching region {owned}");
                api.region_by_name(&owned)
                    .await
                    .map(Arc::new)
                    .map_err(LoadFailure::from)
            });

        match track(&self.state, entry).await {
            Ok(region) => {
                if let Some(bounds) = compute_bounds(&region) {
                    self.state.send_modify(|state| state.map_bounds = Some(bounds));
                }
                LoadOutcome::Loaded(region)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Flips a layer's visibility. Returns `false` if there is no such
    /// layer.
    pub fn toggle_layer_visibility(&self, id: &str) -> bool {
        self.state.send_if_modified(|state| {
            state
                .layers
                .iter_mut()
                .find(|l| l.id == id)
                .is_some_and(|layer| {
                    layer.visible = !layer.visible;
                    true
                })
        })
    }

    /// Drops a layer. Returns `false` if there is no such layer.
    pub fn remove_layer(&self, id: &str) -> bool {
        self.state.send_if_modified(|state| {
            let before = state.layers.len();
            state.layers.retain(|l| l.id != id);
            state.layers.len() != before
        })
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| state.error.take().is_some());
    }

    fn fail<T>(&self, failure: LoadFailure) -> LoadOutcome<T> {
        log::error!("Hazard load failed: {failure}");
        let message = failure.to_string();
        self.state.send_modify(|state| state.error = Some(message));
        LoadOutcome::Failed(failure)
    }

    fn select(&self, signature: &RequestSignature) {
        self.selection
            .lock()
            .expect("selection mutex poisoned")
            .insert(signature.hazard, signature.clone());
    }

    fn is_selected(&self, signature: &RequestSignature) -> bool {
        self.selection
            .lock()
            .expect("selection mutex poisoned")
            .get(&signature.hazard)
            == Some(signature)
    }
}


#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::testing::FakeApi;
    use super::*;

    fn store() -> (Arc<FakeApi>, HazardStore) {
        let api = Arc::new(FakeApi::default());
        let store = HazardStore::new(Arc::clone(&api) as Arc<dyn HazardApi>);
        (api, store)
    }

    fn annual(year: &str) -> HazardRequest {
        HazardRequest::new(HazardType::Rainfall, Period::Annual, Some(year.into()))
    }

    #[tokio::test]
    async fn annual_2012_end_to_end() {
        let (api, store) = store();
        let date = NaiveDate::from_ymd_opt(2012, 6, 1).unwrap();
        let request = HazardRequest::new(HazardType::Rainfall, Period::Annual, Some(date.into()));

        assert_eq!(request.date_key().unwrap().as_deref(), Some("2012"));

        let layer = store.load_hazard(&request).await.loaded().unwrap();
        assert_eq!(layer.id, "rainfall-2012");
        assert_eq!(store.signatures().len(), 1);
        assert_eq!(store.signatures()[0].to_string(), "rainfall-raster-all-2012-annual");
        // one null and one zero in the sample grid
        assert_eq!(layer.points.len(), 14);

        let cells = layer.cells(0.5).unwrap();
        assert!(!cells.is_empty());
        assert!(cells.iter().all(|c| (0.0..=1.0).contains(&c.normalized_intensity)));
        assert_eq!(FakeApi::calls(&api.raster_calls), 1);
    }

    #[tokio::test]
    async fn identical_loads_hit_the_network_once() {
        let (api, store) = store();

        assert!(store.load_hazard(&annual("2012")).await.is_loaded());
        assert!(store.load_hazard(&annual("2012")).await.is_loaded());

        assert_eq!(FakeApi::calls(&api.raster_calls), 1);
        assert_eq!(store.signatures().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_identical_loads_share_a_fetch() {
        let (api, store) = store();
        let request = annual("2012");

        let (a, b) = tokio::join!(store.load_hazard(&request), store.load_hazard(&request));

        assert!(a.is_loaded());
        assert!(b.is_loaded());
        assert_eq!(FakeApi::calls(&api.raster_calls), 1);
        assert_eq!(store.snapshot().layers.len(), 1);
        assert!(!store.snapshot().is_loading());
    }

    #[tokio::test]
    async fn superseded_selection_is_stale() {
        let (api, store) = store();
        let (y2012, y2013) = (annual("2012"), annual("2013"));

        let (first, second) = tokio::join!(store.load_hazard(&y2012), store.load_hazard(&y2013));

        assert!(matches!(first, LoadOutcome::Stale(ref sig) if sig.date_key.as_deref() == Some("2012")));
        assert!(second.is_loaded());
        assert_eq!(FakeApi::calls(&api.raster_calls), 2);

        let state = store.snapshot();
        assert_eq!(state.layers.len(), 1);
        assert_eq!(state.layers[0].id, "rainfall-2013");
    }

    #[tokio::test]
    async fn hazards_load_side_by_side() {
        let (api, store) = store();
        let rainfall = annual("2012");
        let temperature =
            HazardRequest::new(HazardType::Temperature, Period::Annual, Some("2012".into()));

        let (rain, temp) = tokio::join!(
            store.load_hazard(&rainfall),
            store.load_hazard(&temperature)
        );

        assert!(rain.is_loaded());
        assert!(temp.is_loaded());
        assert_eq!(FakeApi::calls(&api.raster_calls), 2);

        let mut ids: Vec<String> = store.snapshot().layers.iter().map(|l| l.id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["rainfall-2012", "temperature-2012"]);
    }

    #[tokio::test]
    async fn cache_hits_share_the_validated_raster() {
        let (_api, store) = store();

        let first = store.load_hazard(&annual("2012")).await.loaded().unwrap();
        let second = store.load_hazard(&annual("2012")).await.loaded().unwrap();

        assert!(Arc::ptr_eq(&first.raster, &second.raster));
    }

    #[tokio::test]
    async fn failed_fetch_can_be_retried() {
        let (api, store) = store();
        api.mark_missing("2031");

        let outcome = store.load_hazard(&annual("2031")).await;
        assert!(matches!(outcome, LoadOutcome::Failed(LoadFailure::Client(ref e)) if e.status() == Some(404)));
        let state = store.snapshot();
        assert!(state.error.as_deref().is_some_and(|e| e.contains("404")));
        assert!(store.signatures().is_empty());

        api.restore("2031");
        assert!(store.load_hazard(&annual("2031")).await.is_loaded());
        assert_eq!(store.snapshot().error, None);
        assert_eq!(FakeApi::calls(&api.raster_calls), 2);
    }

    #[tokio::test]
    async fn malformed_payload_is_reported_not_thrown() {
        let (api, store) = store();

        let outcome = store.load_hazard(&annual("1999")).await;
        assert!(matches!(
            outcome,
            LoadOutcome::Failed(LoadFailure::Malformed(MalformedRaster::MissingData))
        ));
        assert!(store.snapshot().layers.is_empty());
        assert!(store.snapshot().error.is_some());
        assert!(store.signatures().is_empty());

        store.clear_error();
        assert_eq!(store.snapshot().error, None);

        // the unusable payload was not kept, so asking again refetches
        store.load_hazard(&annual("1999")).await;
        assert_eq!(FakeApi::calls(&api.raster_calls), 2);
    }

    #[tokio::test]
    async fn missing_date_skips_the_fetch() {
        let (api, store) = store();
        let request = HazardRequest::new(HazardType::Temperature, Period::Daily, None);

        assert!(matches!(store.load_hazard(&request).await, LoadOutcome::NoDate));
        assert_eq!(FakeApi::calls(&api.raster_calls), 0);
    }

    #[test]
    fn invalid_input_is_rejected_up_front() {
        assert_eq!(
            HazardRequest::parse("wind", "annual", Some("2012")),
            Err(StoreError::UnsupportedHazard {
                value: "wind".to_string()
            })
        );
        assert_eq!(
            HazardRequest::parse("rainfall", "weekly", Some("2012")),
            Err(StoreError::UnsupportedPeriod {
                value: "weekly".to_string()
            })
        );
        assert!(matches!(
            HazardRequest::parse("rainfall", "daily", Some("yesterday")),
            Err(StoreError::Period(_))
        ));

        let ok = HazardRequest::parse("temperature", "seasonal", Some("OND-2012")).unwrap();
        assert_eq!(ok.date_key().unwrap().as_deref(), Some("OND-2012"));
    }

    #[tokio::test]
    async fn layers_replace_per_hazard_and_can_be_managed() {
        let (_api, store) = store();
        let temperature =
            HazardRequest::new(HazardType::Temperature, Period::Monthly, Some("2012-03".into()));

        store.load_hazard(&annual("2012")).await;
        store.load_hazard(&temperature).await;
        store.load_hazard(&annual("2013")).await;

        let ids: Vec<String> = store.snapshot().layers.iter().map(|l| l.id.clone()).collect();
        assert_eq!(ids, vec!["temperature-2012-03", "rainfall-2013"]);

        assert!(store.toggle_layer_visibility("rainfall-2013"));
        assert_eq!(store.snapshot().visible_layers().count(), 1);
        assert!(!store.toggle_layer_visibility("rainfall-1900"));

        assert!(store.remove_layer("temperature-2012-03"));
        assert!(!store.remove_layer("temperature-2012-03"));
        assert_eq!(store.snapshot().layers.len(), 1);
    }

    #[tokio::test]
    async fn subscribers_see_layer_and_bounds() {
        let (_api, store) = store();
        let mut rx = store.subscribe();

        store.load_hazard(&annual("2012")).await;

        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.layers.len(), 1);
        assert_eq!(state.map_bounds, Some(LatLngBounds::new(6.0, 36.0, 10.0, 40.0)));
    }

    #[tokio::test]
    async fn regions_are_cached_and_fit_the_map() {
        let (api, store) = store();

        let regions = store.load_regions().await.loaded().unwrap();
        assert_eq!(regions.features.len(), 2);
        store.load_regions().await;
        assert_eq!(FakeApi::calls(&api.region_calls), 1);

        let state = store.snapshot();
        assert!(state.regions.is_some());
        assert_eq!(state.map_bounds, Some(LatLngBounds::new(6.5, 38.5, 12.0, 42.0)));

        let afar = store.load_region("Afar").await.loaded().unwrap();
        assert_eq!(afar.features.len(), 1);
        assert_eq!(
            store.snapshot().map_bounds,
            Some(LatLngBounds::new(10.0, 40.0, 12.0, 42.0))
        );
    }
}
