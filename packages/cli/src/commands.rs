//! Subcommand implementations.

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use hazard_map_cli_utils::{MultiProgress, Progress};
use hazard_map_client::HazardApi;
use hazard_map_client::registry::{self, all_hazards};
use hazard_map_hazard_models::{HazardType, IntensityBand, Period};
use hazard_map_spatial::classify::{classify, color, normalize_to_range};
use hazard_map_store::{
    HazardRequest, HazardStore, Layer, LoadOutcome, TimeSeriesStore, timeseries::SERIES_FIRST_YEAR,
};

type CliResult<T = ()> = Result<T, Box<dyn Error>>;

/// Unwraps a store outcome for a one-shot command.
fn loaded<T>(outcome: LoadOutcome<T>, what: &str) -> CliResult<T> {
    match outcome {
        LoadOutcome::Loaded(value) => Ok(value),
        LoadOutcome::NoDate => Err(format!("No date given for {what}").into()),
        LoadOutcome::Stale(signature) => Err(format!("{what} superseded by {signature}").into()),
        LoadOutcome::Failed(failure) => Err(failure.into()),
    }
}

pub fn hazards() {
    for def in all_hazards() {
        println!("{} ({}, {})", def.title, def.slug, def.unit);
        for option in &def.periods {
            let picker = if option.needs_date { "date" } else { "season" };
            println!("  {:<10} {:<10} pick a {picker}", option.value.to_string(), option.label);
        }
    }
}

pub async fn regions(
    multi: &MultiProgress,
    api: Arc<dyn HazardApi>,
    name: Option<&str>,
) -> CliResult {
    let store = HazardStore::new(api);
    let progress = Progress::spinner(multi, "Loading regions");

    let regions = match name {
        Some(name) => loaded(store.load_region(name).await, name)?,
        None => loaded(store.load_regions().await, "regions")?,
    };
    progress.finish_and_clear();

    println!("{} region feature(s)", regions.features.len());
    for feature in &regions.features {
        if let Some(name) = feature.property("name").and_then(|v| v.as_str()) {
            println!("  {name}");
        }
    }
    match store.snapshot().map_bounds {
        Some(b) => println!(
            "Extent: [{:.3}, {:.3}] to [{:.3}, {:.3}]",
            b.min_lat, b.min_lng, b.max_lat, b.max_lng
        ),
        None => println!("Extent: none (no usable geometry)"),
    }

    Ok(())
}

pub async fn raster(
    multi: &MultiProgress,
    api: Arc<dyn HazardApi>,
    hazard: &str,
    period: &str,
    dates: &[String],
    cell_size: f64,
    geojson: Option<&Path>,
) -> CliResult {
    // reject bad input before any request goes out
    let requests = dates
        .iter()
        .map(|date| HazardRequest::parse(hazard, period, Some(date)))
        .collect::<Result<Vec<_>, _>>()?;

    let store = HazardStore::new(api);
    let progress = Progress::steps(multi, "Loading rasters", requests.len() as u64);
    let mut last = None;

    for request in &requests {
        let layer = loaded(store.load_hazard(request).await, "raster")?;
        progress.inc(1);
        print_layer(&layer, cell_size)?;
        last = Some(layer);
    }
    progress.finish_and_clear();

    if let (Some(path), Some(layer)) = (geojson, last) {
        let collection = layer.to_geojson(cell_size)?;
        std::fs::write(path, serde_json::to_string_pretty(&collection)?)?;
        log::info!(
            "Wrote {} cells to {}",
            collection.features.len(),
            path.display()
        );
    }

    Ok(())
}

fn print_layer(layer: &Layer, cell_size: f64) -> CliResult {
    println!("{}", layer.id);
    println!(
        "  grid {}x{}, {} points",
        layer.raster.rows(),
        layer.raster.cols(),
        layer.points.len()
    );
    let unit = registry::hazard(layer.hazard).map(|def| def.unit).unwrap_or_default();
    if let Some(stats) = layer.stats {
        println!(
            "  min {:.2}  max {:.2}  mean {:.2}  median {:.2}  sum {:.2} {unit}",
            stats.min, stats.max, stats.mean, stats.median, stats.sum
        );

        let (lo, hi) = layer.raster.value_range();
        let mean = classify(normalize_to_range(stats.mean, lo, hi), layer.hazard);
        println!("  mean is {} {} within {lo:.2}..{hi:.2}", mean.band.label(), mean.color);
    }

    let cells = layer.cells(cell_size)?;
    println!("  {} cells of {cell_size} deg", cells.len());
    for band in IntensityBand::all() {
        let count = cells.iter().filter(|c| c.band == *band).count();
        if count > 0 {
            println!(
                "    {:<10} {} {count}",
                band.label(),
                color(*band, layer.hazard)
            );
        }
    }

    Ok(())
}

pub async fn series(
    multi: &MultiProgress,
    api: Arc<dyn HazardApi>,
    hazard: &str,
    period: &str,
    date: Option<&str>,
    region: Option<&str>,
) -> CliResult {
    let request = HazardRequest::parse(hazard, period, date)?;
    let date_key = request.date_key()?;

    let store = TimeSeriesStore::new(api);
    let progress = Progress::spinner(multi, "Loading time series");
    loaded(
        store
            .load_series(request.hazard, request.period, date_key.as_deref(), region)
            .await,
        "time series",
    )?;
    progress.finish_and_clear();

    let rows = store.snapshot().chart_rows();
    if rows.is_empty() {
        println!("No values.");
        return Ok(());
    }

    println!("{:<8} {:<6} VALUE (years from {SERIES_FIRST_YEAR})", "LABEL", "YEAR");
    for row in rows {
        println!("{:<8} {:<6} {:.2}", row.label, row.year, row.value);
    }

    Ok(())
}

pub async fn available(multi: &MultiProgress, api: Arc<dyn HazardApi>, hazard: &str) -> CliResult {
    let hazard: HazardType = hazard
        .parse()
        .map_err(|_| format!("Unsupported hazard type: {hazard:?}"))?;

    let store = TimeSeriesStore::new(api);
    let progress = Progress::spinner(multi, "Loading availability");
    let dates = loaded(store.available_dates(hazard).await, "available dates")?;
    let seasons = loaded(store.available_seasons(hazard).await, "available seasons")?;
    let periods = store.available_periods(hazard).await.loaded();
    progress.finish_and_clear();

    println!(
        "{hazard}: {} dates, {} months, {} years",
        dates.dates.len(),
        dates.months.len(),
        dates.years.len()
    );
    for period in Period::all() {
        if let Some((start, end)) = loaded(store.date_range(hazard, *period).await, "range")? {
            println!("  {:<10} {start} .. {end}", period.to_string());
        }
    }
    println!("  seasons    {}", seasons.join(", "));

    if let Some(periods) = periods {
        for (period, keys) in &periods.0 {
            println!("  {period:<10} {} key(s)", keys.len());
        }
    }

    Ok(())
}
