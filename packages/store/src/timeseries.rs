//! Per-year series and data availability.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use hazard_map_client::{HazardApi, SeriesQuery};
use hazard_map_hazard_models::{
    AvailableDates, AvailablePeriods, ChartRow, HazardType, Period, TimeSeries,
};
use hazard_map_period::{available_seasons, date_range};
use tokio::sync::watch;

use crate::{FetchCache, FetchProgress, LoadFailure, LoadOutcome, RequestSignature, track};

/// Year of the first value in every per-year series.
pub const SERIES_FIRST_YEAR: i32 = 2005;

/// Time-series view state.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesState {
    /// Number of network fetches in flight.
    pub loading: usize,
    pub error: Option<String>,
    pub hazard: Option<HazardType>,
    /// Period of the last requested series.
    pub current_period: Option<Period>,
    pub query: Option<SeriesQuery>,
    /// Cleared when the last request failed.
    pub series: Option<Arc<TimeSeries>>,
}

impl TimeSeriesState {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading > 0
    }

    /// Chart rows of the current series, years counted from
    /// [`SERIES_FIRST_YEAR`].
    #[must_use]
    pub fn chart_rows(&self) -> Vec<ChartRow> {
        self.series
            .as_ref()
            .map(|s| s.chart_rows(SERIES_FIRST_YEAR))
            .unwrap_or_default()
    }
}

impl FetchProgress for TimeSeriesState {
    fn fetch_started(&mut self) {
        self.loading += 1;
        self.error = None;
    }

    fn fetch_finished(&mut self) {
        self.loading = self.loading.saturating_sub(1);
    }
}

/// Orchestrates time-series and availability loading.
pub struct TimeSeriesStore {
    api: Arc<dyn HazardApi>,
    series: FetchCache<Arc<TimeSeries>>,
    dates: FetchCache<Arc<AvailableDates>>,
    periods: FetchCache<Arc<AvailablePeriods>>,
    selection: Mutex<Option<RequestSignature>>,
    state: watch::Sender<TimeSeriesState>,
}

impl TimeSeriesStore {
    #[must_use]
    pub fn new(api: Arc<dyn HazardApi>) -> Self {
        Self {
            api,
            series: FetchCache::new(),
            dates: FetchCache::new(),
            periods: FetchCache::new(),
            selection: Mutex::new(None),
            state: watch::Sender::new(TimeSeriesState::default()),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TimeSeriesState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> TimeSeriesState {
        self.state.borrow().clone()
    }

    /// Series signatures claimed so far.
    #[must_use]
    pub fn signatures(&self) -> Vec<RequestSignature> {
        self.series.signatures()
    }

    /// Loads the series matching a map selection. `date_key` is a canonical
    /// period key.
    pub async fn load_series(
        &self,
        hazard: HazardType,
        period: Period,
        date_key: Option<&str>,
        region: Option<&str>,
    ) -> LoadOutcome<Arc<TimeSeries>> {
        self.load_query(hazard, period, SeriesQuery::for_period(period, date_key, region))
            .await
    }

    /// Loads an explicit series query.
    ///
    /// # Panics
    ///
    /// Panics if the selection `Mutex` is poisoned.
    pub async fn load_query(
        &self,
        hazard: HazardType,
        period: Period,
        query: SeriesQuery,
    ) -> LoadOutcome<Arc<TimeSeries>> {
        let signature = RequestSignature::series(hazard, period, &query);
        *self.selection.lock().expect("selection mutex poisoned") = Some(signature.clone());

        self.state.send_modify(|state| {
            state.hazard = Some(hazard);
            state.current_period = Some(period);
            state.query = Some(query.clone());
        });

        let api = Arc::clone(&self.api);
        let entry = self.series.entry(&signature, move || async move {
            log::info!("Fetching {hazard} {} series", query.aggregation);
            api.time_series(hazard, &query)
                .await
                .map(Arc::new)
                .map_err(LoadFailure::from)
        });
        let result = track(&self.state, entry).await;

        let current = self
            .selection
            .lock()
            .expect("selection mutex poisoned")
            .as_ref()
            == Some(&signature);
        if !current {
            log::debug!("Discarding stale result for {signature}");
            return LoadOutcome::Stale(signature);
        }

        match result {
            Ok(series) => {
                self.state.send_modify(|state| state.series = Some(Arc::clone(&series)));
                LoadOutcome::Loaded(series)
            }
            Err(e) => {
                self.state.send_modify(|state| state.series = None);
                self.fail(e)
            }
        }
    }

    /// Dates, months and years with data for `hazard`.
    pub async fn available_dates(&self, hazard: HazardType) -> LoadOutcome<Arc<AvailableDates>> {
        let api = Arc::clone(&self.api);
        let signature = RequestSignature::availability(hazard, "available_dates");
        let entry = self.dates.entry(&signature, move || async move {
            api.available_dates(hazard)
                .await
                .map(Arc::new)
                .map_err(LoadFailure::from)
        });

        match track(&self.state, entry).await {
            Ok(dates) => LoadOutcome::Loaded(dates),
            Err(e) => self.fail(e),
        }
    }

    /// Period keys with data for `hazard`.
    pub async fn available_periods(
        &self,
        hazard: HazardType,
    ) -> LoadOutcome<Arc<AvailablePeriods>> {
        let api = Arc::clone(&self.api);
        let signature = RequestSignature::availability(hazard, "available_periods");
        let entry = self.periods.entry(&signature, move || async move {
            api.available_periods(hazard)
                .await
                .map(Arc::new)
                .map_err(LoadFailure::from)
        });

        match track(&self.state, entry).await {
            Ok(periods) => LoadOutcome::Loaded(periods),
            Err(e) => self.fail(e),
        }
    }

    /// `SEASON-YYYY` keys covered by the available daily dates.
    pub async fn available_seasons(&self, hazard: HazardType) -> LoadOutcome<Vec<String>> {
        self.available_dates(hazard)
            .await
            .map(|dates| available_seasons(&dates.dates))
    }

    /// Earliest and latest selectable date for `period`.
    pub async fn date_range(
        &self,
        hazard: HazardType,
        period: Period,
    ) -> LoadOutcome<Option<(NaiveDate, NaiveDate)>> {
        self.available_dates(hazard)
            .await
            .map(|dates| date_range(period, &dates))
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| state.error.take().is_some());
    }

    fn fail<T>(&self, failure: LoadFailure) -> LoadOutcome<T> {
        log::error!("Time series load failed: {failure}");
        let message = failure.to_string();
        self.state.send_modify(|state| state.error = Some(message));
        LoadOutcome::Failed(failure)
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::FakeApi;

    use super::*;

    fn store() -> (Arc<FakeApi>, TimeSeriesStore) {
        let api = Arc::new(FakeApi::default());
        let store = TimeSeriesStore::new(Arc::clone(&api) as Arc<dyn HazardApi>);
        (api, store)
    }

    #[tokio::test]
    async fn series_are_fetched_once_per_query() {
        let (api, store) = store();

        let first = store
            .load_series(HazardType::Rainfall, Period::Monthly, Some("2012-03"), None)
            .await;
        assert!(first.is_loaded());
        store
            .load_series(HazardType::Rainfall, Period::Monthly, Some("2013-03"), None)
            .await;

        // both selections map to month 03
        assert_eq!(FakeApi::calls(&api.series_calls), 1);
        assert_eq!(store.signatures().len(), 1);

        store
            .load_series(HazardType::Rainfall, Period::Monthly, Some("2012-03"), Some("Afar"))
            .await;
        assert_eq!(FakeApi::calls(&api.series_calls), 2);
    }

    #[tokio::test]
    async fn chart_rows_start_in_2005() {
        let (_api, store) = store();
        store
            .load_series(HazardType::Temperature, Period::Monthly, Some("2010-03"), None)
            .await;

        let state = store.snapshot();
        assert_eq!(state.current_period, Some(Period::Monthly));
        let years: Vec<i32> = state.chart_rows().iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2005, 2006, 2008]);
    }

    #[tokio::test]
    async fn failure_clears_the_series() {
        let (api, store) = store();
        store
            .load_series(HazardType::Rainfall, Period::Annual, Some("2012"), None)
            .await;
        assert!(store.snapshot().series.is_some());

        api.mark_missing("2031");
        let outcome = store
            .load_series(HazardType::Rainfall, Period::Annual, Some("2031"), None)
            .await;
        assert!(matches!(outcome, LoadOutcome::Failed(_)));

        let state = store.snapshot();
        assert!(state.series.is_none());
        assert!(state.error.is_some());
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn superseded_series_is_stale() {
        let (_api, store) = store();

        let (first, second) = tokio::join!(
            store.load_series(HazardType::Rainfall, Period::Annual, Some("2012"), None),
            store.load_series(HazardType::Rainfall, Period::Annual, Some("2013"), None),
        );

        assert!(matches!(first, LoadOutcome::Stale(_)));
        assert!(second.is_loaded());
    }

    #[tokio::test]
    async fn availability_is_cached_and_derived() {
        let (api, store) = store();

        let seasons = store
            .available_seasons(HazardType::Rainfall)
            .await
            .loaded()
            .unwrap();
        assert_eq!(seasons, vec!["MAM-2012", "JJAS-2012", "OND-2012", "OND-2013"]);

        let (start, end) = store
            .date_range(HazardType::Rainfall, Period::Annual)
            .await
            .loaded()
            .flatten()
            .unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2012, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2013, 12, 31).unwrap());

        let periods = store
            .available_periods(HazardType::Rainfall)
            .await
            .loaded()
            .unwrap();
        assert_eq!(periods.0["annual"].len(), 2);

        // one available_dates call, one available_periods call
        assert_eq!(FakeApi::calls(&api.availability_calls), 2);
    }
}
