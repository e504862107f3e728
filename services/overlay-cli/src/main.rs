//! Solar overlay CLI.
//!
//! Renders one Solar API data layer for the building closest to a location:
//! - Looks up the building and the radius that covers it
//! - Lists the data-layer rasters around its center
//! - Assembles and renders the requested layer
//! - Writes `frame_XX.png` per image and `layer.json` with bounds and legend

mod config;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use acquisition::{ApiKey, HttpRasterSource};
use config::OverlayConfig;
use data_layers::{assemble, RenderOptions};
use solar_api::{radius_for, SolarApiClient};
use solar_common::LayerId;

#[derive(Parser, Debug)]
#[command(name = "overlay-cli")]
#[command(about = "Render a Solar API data layer for a location")]
struct Args {
    /// Latitude of the location in degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude of the location in degrees
    #[arg(long, allow_hyphen_values = true)]
    lng: f64,

    /// Layer to render (mask, dsm, rgb, annualFlux, monthlyFlux, hourlyShade)
    #[arg(short, long, default_value = "monthlyFlux")]
    layer: String,

    /// Month for hourlyShade, 0-based (default: April)
    #[arg(long)]
    month: Option<u32>,

    /// Day of month for hourlyShade (default: 14)
    #[arg(long)]
    day: Option<u32>,

    /// Hide everything outside the roof (default depends on the layer)
    #[arg(long)]
    mask_only: Option<bool>,

    /// Directory for frames and layer.json
    #[arg(short, long, default_value = "overlay")]
    out: PathBuf,

    /// Google Maps Platform API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn render_options(&self, id: LayerId) -> RenderOptions {
        let mut options = RenderOptions::defaults_for(id);
        if let Some(month) = self.month {
            options.month = month;
        }
        if let Some(day) = self.day {
            options.day = day;
        }
        if let Some(mask_only) = self.mask_only {
            options.show_mask_only = mask_only;
        }
        options
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = OverlayConfig::from_env();
    config.validate()?;

    // Reject a bad layer id before any request goes out
    let id: LayerId = args.layer.parse()?;
    let options = args.render_options(id);
    if id == LayerId::HourlyShade {
        options.validate_date()?;
    }

    info!(lat = args.lat, lng = args.lng, layer = %id, "Starting solar overlay");

    let api_key = ApiKey::new(args.api_key.clone());
    let api = SolarApiClient::new(api_key.clone(), config.api.clone())?;

    let insights = api
        .building_insights(args.lat, args.lng)
        .await
        .context("Failed to find a building near the location")?;
    let radius = radius_for(&insights.bounding_box);

    let response = api
        .data_layers(insights.center, Some(radius))
        .await
        .context("Failed to list data layers")?;

    let source = HttpRasterSource::new(Some(api_key), config.fetch.clone())?;
    let layer = assemble(&source, id, &response.urls)
        .await
        .with_context(|| format!("Failed to assemble layer {}", id))?;

    let frames = layer.render(&options)?;
    let manifest = output::write_layer(&args.out, &layer, &options, &frames)?;

    info!(
        out = %args.out.display(),
        frames = manifest.frames.len(),
        "Solar overlay complete"
    );
    Ok(())
}
