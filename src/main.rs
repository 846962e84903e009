//! CLI entry point for the environmental data ingestion tool.
//!
//! Provides subcommands for ingesting historical air-quality measurements,
//! downloading daily climate observations, and inspecting station
//! resolution for a configured city.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use enviro_ingest::config::{self, IngestLimits, Pacing};
use enviro_ingest::fetch::BasicClient;
use enviro_ingest::infra::openaq::OpenAqClient;
use enviro_ingest::ingest::{orchestrator, resolver};
use enviro_ingest::{aggregate, climate, output};

#[derive(Parser)]
#[command(name = "enviro_ingest")]
#[command(about = "Historical air-quality and climate data ingestion", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest historical air-quality measurements and write daily aggregates
    AirQuality {
        /// CSV file to write the daily aggregates to
        #[arg(short, long, default_value = "data/raw/air_quality_data_2020_2024.csv")]
        output: String,
    },
    /// Download daily climate observations for all configured cities
    Climate {
        /// CSV file to write the climate table to
        #[arg(short, long, default_value = "data/raw/climate_data_2015_2024.csv")]
        output: String,
    },
    /// Resolve and list candidate monitoring stations for a configured city
    ListStations {
        /// City name from the configured registry
        city: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/enviro_ingest.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("enviro_ingest.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::AirQuality { output } => {
            // A keyboard interrupt is the only cancellation path; catch it
            // at the top level so shutdown is logged rather than abrupt.
            tokio::select! {
                result = run_air_quality(&output) => {
                    if let Err(e) = result {
                        error!(error = %e, "air-quality ingestion failed, no data downloaded");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("download cancelled, shutting down");
                }
            }
        }
        Commands::Climate { output } => {
            tokio::select! {
                result = run_climate(&output) => {
                    if let Err(e) = result {
                        error!(error = %e, "climate download failed");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("download cancelled, shutting down");
                }
            }
        }
        Commands::ListStations { city } => run_list_stations(&city).await?,
    }

    Ok(())
}

/// Runs the full historical air-quality pipeline: ingest, aggregate, write.
async fn run_air_quality(output: &str) -> Result<()> {
    let api_key =
        std::env::var("OPENAQ_API_KEY").context("OPENAQ_API_KEY must be set")?;
    let client = OpenAqClient::new(api_key);

    let cities = config::air_quality_cities();
    info!(
        cities = cities.len(),
        years = config::TARGET_YEARS.len(),
        "starting historical air-quality ingestion"
    );

    let records = orchestrator::collect_all(
        &client,
        &cities,
        config::TARGET_YEARS,
        IngestLimits::default(),
        &Pacing::standard(),
    )
    .await;

    if records.is_empty() {
        error!("no historical data could be obtained");
        return Ok(());
    }

    info!(records = records.len(), "ingestion complete, aggregating");
    let rows = aggregate::aggregate_daily(records, config::valid_date_range());
    output::write_table(output, &rows)?;
    output::print_run_report(&rows, output);

    info!(rows = rows.len(), path = output, "historical download complete");
    Ok(())
}

/// Downloads the climate table for every configured city and writes it.
async fn run_climate(output: &str) -> Result<()> {
    let client = BasicClient::new();

    let rows = climate::download_all(&client, config::CITIES).await;
    if !rows.is_empty() {
        output::write_table(output, &rows)?;
    }
    climate::print_report(&rows, output);

    Ok(())
}

/// Resolves stations for one configured city and logs the candidates.
async fn run_list_stations(city_name: &str) -> Result<()> {
    let api_key =
        std::env::var("OPENAQ_API_KEY").context("OPENAQ_API_KEY must be set")?;
    let city = config::find_city(city_name)
        .with_context(|| format!("city '{city_name}' is not configured"))?;

    let client = OpenAqClient::new(api_key);
    let stations = resolver::resolve_stations(&client, city).await;

    if stations.is_empty() {
        warn!(city = city.name, "no stations resolved");
        return Ok(());
    }

    for station in &stations {
        info!(
            station_id = station.id,
            station = %station.name,
            distance_m = station.distance,
            sensors = station.sensors.len(),
            "resolved station"
        );
        for sensor in &station.sensors {
            info!(
                sensor_id = sensor.id,
                parameter = %sensor.parameter,
                units = %sensor.units,
                "sensor"
            );
        }
    }
    info!(total = stations.len(), city = city.name, "station resolution summary");

    Ok(())
}
