//! Interactive menu for exploring hazard data.
//!
//! Walks the user through hazard, period and date selection with
//! `dialoguer`, then runs the matching subcommand.

use std::path::PathBuf;
use std::sync::Arc;

use dialoguer::{Confirm, Input, Select};
use hazard_map_cli_utils::MultiProgress;
use hazard_map_client::HazardApi;
use hazard_map_client::registry::{HazardDefinition, PeriodOption, all_hazards};
use hazard_map_store::TimeSeriesStore;

use crate::commands;

/// Top-level actions in the interactive menu.
enum Action {
    Raster,
    Series,
    Available,
    Regions,
    Hazards,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Raster,
        Self::Series,
        Self::Available,
        Self::Regions,
        Self::Hazards,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Raster => "View a hazard map",
            Self::Series => "View a time series",
            Self::Available => "Show data availability",
            Self::Regions => "Load region boundaries",
            Self::Hazards => "List hazard datasets",
        }
    }
}

/// Runs the interactive menu.
///
/// # Errors
///
/// Returns an error if a prompt or the selected operation fails.
pub async fn run(
    multi: &MultiProgress,
    api: Arc<dyn HazardApi>,
    cell_size: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("Hazard map")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Raster => handle_raster(multi, api, cell_size).await?,
        Action::Series => handle_series(multi, api).await?,
        Action::Available => {
            let def = pick_hazard()?;
            commands::available(multi, api, def.slug.as_ref()).await?;
        }
        Action::Regions => {
            let name: String = Input::new()
                .with_prompt("Region name (blank for all)")
                .allow_empty(true)
                .interact_text()?;
            let name = name.trim();
            commands::regions(multi, api, (!name.is_empty()).then_some(name)).await?;
        }
        Action::Hazards => commands::hazards(),
    }

    Ok(())
}

async fn handle_raster(
    multi: &MultiProgress,
    api: Arc<dyn HazardApi>,
    cell_size: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let def = pick_hazard()?;
    let option = pick_period(&def)?;
    let Some(date) = pick_date(multi, Arc::clone(&api), &def, &option).await? else {
        return Ok(());
    };

    let export = Confirm::new()
        .with_prompt("Export cells as GeoJSON?")
        .default(false)
        .interact()?;
    let geojson = if export {
        let path: String = Input::new()
            .with_prompt("Output file")
            .default(format!("{}-{date}.geojson", def.slug))
            .interact_text()?;
        Some(PathBuf::from(path))
    } else {
        None
    };

    commands::raster(
        multi,
        api,
        def.slug.as_ref(),
        option.value.as_ref(),
        &[date],
        cell_size,
        geojson.as_deref(),
    )
    .await
}

async fn handle_series(
    multi: &MultiProgress,
    api: Arc<dyn HazardApi>,
) -> Result<(), Box<dyn std::error::Error>> {
    let def = pick_hazard()?;
    let option = pick_period(&def)?;
    let date = pick_date(multi, Arc::clone(&api), &def, &option).await?;

    let region: String = Input::new()
        .with_prompt("Region (blank for the whole country)")
        .allow_empty(true)
        .interact_text()?;
    let region = region.trim();

    commands::series(
        multi,
        api,
        def.slug.as_ref(),
        option.value.as_ref(),
        date.as_deref(),
        (!region.is_empty()).then_some(region),
    )
    .await
}

fn pick_hazard() -> Result<HazardDefinition, Box<dyn std::error::Error>> {
    let hazards = all_hazards();
    let labels: Vec<String> = hazards
        .iter()
        .map(|h| format!("{} ({})", h.title, h.unit))
        .collect();

    let idx = Select::new()
        .with_prompt("Hazard")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(hazards[idx].clone())
}

fn pick_period(def: &HazardDefinition) -> Result<PeriodOption, Box<dyn std::error::Error>> {
    let labels: Vec<&str> = def.periods.iter().map(|p| p.label.as_str()).collect();

    let idx = Select::new()
        .with_prompt("Period")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(def.periods[idx].clone())
}

/// Asks for a date, or offers the seasons with data when the period is
/// picked by season. Returns `None` when nothing can be picked.
async fn pick_date(
    multi: &MultiProgress,
    api: Arc<dyn HazardApi>,
    def: &HazardDefinition,
    option: &PeriodOption,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    if option.needs_date {
        let date: String = Input::new()
            .with_prompt("Date (YYYY, YYYY-MM or YYYY-MM-DD)")
            .interact_text()?;
        return Ok(Some(date.trim().to_string()));
    }

    let store = TimeSeriesStore::new(api);
    let progress = hazard_map_cli_utils::Progress::spinner(multi, "Loading seasons");
    let seasons = store.available_seasons(def.slug).await.loaded();
    progress.finish_and_clear();

    let Some(seasons) = seasons.filter(|s| !s.is_empty()) else {
        println!("No seasons with {} data.", def.slug);
        return Ok(None);
    };

    let idx = Select::new()
        .with_prompt("Season")
        .items(&seasons)
        .default(seasons.len() - 1)
        .interact()?;

    Ok(Some(seasons[idx].clone()))
}
