//! `cirrus`: track a list of cities and keep their forecasts fresh.
//!
//! ```text
//! cirrus add Tokyo
//! cirrus here 48.8566 2.3522
//! cirrus show 0
//! cirrus --config ./cirrus.toml list
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use cirrus_core::App;
use cirrus_store::{migrate_legacy_file, SqliteLocationStore, StoreHandle, TrackedLocation};
use cirrus_sync::{LocationSync, SyncSettings, TransientStatus};
use cirrus_weather::{NominatimGeocoder, OpenMeteoClient};

const UPCOMING_HOURS: usize = 24;

#[derive(Parser, Debug)]
#[command(name = "cirrus", version, about = "Track cities and keep their forecasts fresh")]
struct Args {
    /// Path to a TOML config file (default: the user config directory).
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tracked locations in page order.
    List,
    /// Add a city by name, or jump to it if already tracked.
    Add { city: String },
    /// Track the device position given as latitude and longitude.
    Here {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
    },
    /// Stop tracking the location on page INDEX.
    Remove { index: usize },
    /// Refresh page INDEX unless its forecast is still fresh.
    Refresh { index: usize },
    /// Show the forecast for page INDEX.
    Show { index: usize },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    cirrus_core::init()?;
    let app = App::new(args.config.as_deref())?;
    let config = app.config();

    let sqlite = SqliteLocationStore::new(app.database_path())?;
    if let Some(legacy) = app.pending_legacy_file() {
        match migrate_legacy_file(&legacy, &sqlite) {
            Ok(result) => tracing::info!("{}", result),
            Err(e) => tracing::warn!("Legacy location file not migrated: {:#}", e),
        }
    }

    let fetcher = Arc::new(OpenMeteoClient::new(&config.weather)?);
    let geocoder = Arc::new(NominatimGeocoder::new(&config.weather)?);
    let sync = LocationSync::new(
        fetcher,
        geocoder,
        StoreHandle::new(sqlite),
        SyncSettings::from(&config.sync),
    );

    sync.start().await;
    report(&sync);

    match args.command {
        Command::List => {}
        Command::Add { city } => sync.add_by_name(&city).await,
        Command::Here {
            latitude,
            longitude,
        } => sync.add_current_location(latitude, longitude).await,
        Command::Remove { index } => sync.remove_location(index).await,
        Command::Refresh { index } => sync.refresh_location(index).await,
        Command::Show { index } => {
            sync.on_page_changed(index).await;
            report(&sync);
            match sync.locations().get(index) {
                Some(location) => print_forecast(location),
                None => eprintln!("No location on page {}", index),
            }
            app.shutdown();
            return Ok(());
        }
    }

    report(&sync);
    print_list(&sync.locations());
    app.shutdown();
    Ok(())
}

/// Print the pending status once and acknowledge it.
fn report(sync: &LocationSync) {
    match sync.status() {
        TransientStatus::Idle => return,
        status @ TransientStatus::Error { .. } => eprintln!("{}", status),
        status => println!("{}", status),
    }
    sync.message_shown();
}

fn format_updated(millis: i64) -> String {
    if millis <= 0 {
        return "never".to_string();
    }
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn print_list(locations: &[TrackedLocation]) {
    if locations.is_empty() {
        println!("No locations yet. Try `cirrus add <city>`.");
        return;
    }

    for (index, location) in locations.iter().enumerate() {
        let current = &location.forecast.current;
        println!(
            "{} {:>2}  {:<28} {:>6.1}°C  {:<13} updated {}",
            if location.is_current_location { "*" } else { " " },
            index,
            location.name,
            current.temperature,
            current.condition().description(),
            format_updated(location.last_updated_at),
        );
    }
}

fn print_forecast(location: &TrackedLocation) {
    let forecast = &location.forecast;
    let current = &forecast.current;

    println!(
        "{} ({:.4}, {:.4}){}",
        location.name,
        location.latitude,
        location.longitude,
        if location.is_current_location { "  [current location]" } else { "" }
    );
    println!(
        "  {:.1}°C, feels like {:.1}°C, {}{}",
        current.temperature,
        current.apparent_temperature,
        current.condition().description(),
        if current.is_day { "" } else { " (night)" }
    );
    println!(
        "  humidity {}%, wind {:.1} km/h, pressure {:.0} hPa",
        current.humidity, current.wind_speed, current.pressure_msl
    );
    println!("  updated {}", format_updated(location.last_updated_at));

    let upcoming = forecast
        .hourly
        .upcoming(Local::now().naive_local(), UPCOMING_HOURS);
    if !upcoming.is_empty() {
        println!("\nNext hours:");
        for point in upcoming {
            let hour = point.time.split('T').nth(1).unwrap_or(point.time);
            println!(
                "  {:>5}  {:>5.1}°C  {:>3}%  {:>5.1} km/h",
                hour, point.temperature, point.humidity, point.wind_speed
            );
        }
    }

    if !forecast.daily.is_empty() {
        println!("\nDaily:");
        for (index, day) in forecast.daily.points().enumerate() {
            let label = forecast
                .daily
                .weekday_label(index)
                .unwrap_or_else(|| day.date.to_string());
            println!(
                "  {:<4} {:>5.1}° / {:>5.1}°  humidity {:>3}%  wind {:>5.1} km/h",
                label,
                day.temperature_max,
                day.temperature_min,
                forecast.hourly.daily_humidity_average(day.date),
                day.wind_speed_max
            );
        }
    }
}
