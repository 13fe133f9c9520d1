#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the Ethiopia climate hazard map.
//!
//! Each subcommand drives the store end to end against the hazard API and
//! prints a summary. Without a subcommand an interactive prompt picks the
//! hazard, period and date.
//!
//! Uses `indicatif-log-bridge` (via [`hazard_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and spinners never fight for the terminal.

mod commands;
mod interactive;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use hazard_map_client::{ClientConfig, HazardApi, HazardClient};

/// Cell size (degrees) used when neither `--cell-size` nor
/// `HAZARD_CELL_SIZE` is given.
const DEFAULT_CELL_SIZE: f64 = 0.5;

#[derive(Parser)]
#[command(name = "hazard_map", about = "Ethiopia climate hazard map toolchain")]
struct Cli {
    /// Hazard API base URL (overrides `HAZARD_API_URL`)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Request timeout in seconds (overrides `HAZARD_API_TIMEOUT_SECS`)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the hazard datasets and the periods they can be viewed at
    Hazards,
    /// Load region boundaries and print the map extent
    Regions {
        /// Only load this region (e.g., "Afar")
        #[arg(long)]
        name: Option<String>,
    },
    /// Load rasters, convert them to points and bin them into map cells
    Raster {
        /// Hazard type (`rainfall` or `temperature`)
        #[arg(long, default_value = "rainfall")]
        hazard: String,
        /// Period (`daily`, `monthly`, `annual` or `seasonal`)
        #[arg(long, default_value = "annual")]
        period: String,
        /// Date or period key (e.g., `2012`, `2012-03`, `2012-03-04`,
        /// `OND-2012`). Repeat to load several.
        #[arg(long = "date", required = true)]
        dates: Vec<String>,
        /// Cell size in degrees (overrides `HAZARD_CELL_SIZE`)
        #[arg(long)]
        cell_size: Option<f64>,
        /// Write the binned cells of the last date as `GeoJSON` to this file
        #[arg(long)]
        geojson: Option<PathBuf>,
    },
    /// Load the per-year time series for a selection
    Series {
        /// Hazard type (`rainfall` or `temperature`)
        #[arg(long, default_value = "rainfall")]
        hazard: String,
        /// Period (`daily`, `monthly`, `annual` or `seasonal`)
        #[arg(long, default_value = "monthly")]
        period: String,
        /// Date or period key; omit for the overall series
        #[arg(long)]
        date: Option<String>,
        /// Restrict the series to a region
        #[arg(long)]
        region: Option<String>,
    },
    /// Show the dates, seasons and periods with data
    Available {
        /// Hazard type (`rainfall` or `temperature`)
        #[arg(long, default_value = "rainfall")]
        hazard: String,
    },
}

fn cell_size(flag: Option<f64>) -> f64 {
    flag.or_else(|| {
        std::env::var("HAZARD_CELL_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
    })
    .unwrap_or(DEFAULT_CELL_SIZE)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = hazard_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Some(Duration::from_secs(secs)));
    }
    log::debug!("Using hazard API at {}", config.base_url);

    let api: Arc<dyn HazardApi> = Arc::new(HazardClient::new(&config)?);

    let Some(command) = cli.command else {
        return interactive::run(&multi, api, cell_size(None)).await;
    };

    match command {
        Commands::Hazards => commands::hazards(),
        Commands::Regions { name } => commands::regions(&multi, api, name.as_deref()).await?,
        Commands::Raster {
            hazard,
            period,
            dates,
            cell_size: size,
            geojson,
        } => {
            commands::raster(
                &multi,
                api,
                &hazard,
                &period,
                &dates,
                cell_size(size),
                geojson.as_deref(),
            )
            .await?;
        }
        Commands::Series {
            hazard,
            period,
            date,
            region,
        } => {
            commands::series(
                &multi,
                api,
                &hazard,
                &period,
                date.as_deref(),
                region.as_deref(),
            )
            .await?;
        }
        Commands::Available { hazard } => commands::available(&multi, api, &hazard).await?,
    }

    Ok(())
}
