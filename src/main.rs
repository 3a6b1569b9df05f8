mod config;
mod database;
mod utils;

use log::{error, info, warn};
use time::OffsetDateTime;
use tokio::time::{interval, MissedTickBehavior};

use config::DriverConfig;
use database::store_samples;
use onewire_etl::{BusReading, OneWireClient};
use utils::{collect_samples, display_or_dash, format_datetime};

/// Poll once and push the configured channels to the database.
///
/// Every failure is logged and left for the next tick; nothing here ends the
/// process.
async fn poll_once(client: &mut OneWireClient, config: &DriverConfig) {
    let poll_time = OffsetDateTime::now_utc();
    info!("Polling {} at {}", config.host, format_datetime(&poll_time));

    let reading = match client.poll().await {
        Ok(reading) => reading,
        Err(e) => {
            if e.is_retryable() {
                error!("Poll failed: {}, will retry", e);
            } else {
                error!("Poll failed, device answer rejected: {}, will retry", e);
            }
            return;
        }
    };

    log_summary(&reading);

    let samples = collect_samples(&reading, &config.channels, &config.db_channel, poll_time);
    if samples.is_empty() {
        warn!("No configured channels present in this poll!");
        return;
    }

    match store_samples(&samples, &config.database_url).await {
        Ok(rows) => info!("Successfully stored {} samples", rows),
        Err(e) => error!("Failed to store samples: {}", e),
    }
}

fn log_summary(reading: &BusReading) {
    info!(
        "Summary for {}:",
        reading.device_name.as_deref().unwrap_or("Unknown device")
    );
    info!("  Sensors reported: {}", reading.sensor_count());
    for sensor in reading.sensors() {
        let base = sensor.base();
        info!(
            "  {}: temp={}°C, humidity={}%",
            sensor.rom_id().unwrap_or("Unknown"),
            display_or_dash(base.temperature, 2),
            display_or_dash(base.humidity, 2)
        );
    }
}

async fn main_loop(config: DriverConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "Starting 1-Wire data collection from {}:{} every {}s",
        config.host,
        config.port,
        config.poll_interval.as_secs()
    );

    let mut client = OneWireClient::new(config.host.clone(), config.port, config.timeout);
    let mut ticker = interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        poll_once(&mut client, &config).await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match DriverConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    // Run main loop or wait for shutdown signal
    tokio::select! {
        result = main_loop(config) => {
            match result {
                Ok(_) => info!("Program completed successfully"),
                Err(e) => error!("Fatal error: {}", e),
            }
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
