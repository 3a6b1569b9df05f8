use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use onewire_etl::models::NUMERIC_FIELDS;
use onewire_etl::onewire::{DEFAULT_TIMEOUT, HTTP_PORT};

const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_DB_CHANNEL: &str = "onewire";
const DEFAULT_LOG_CHANNELS: &str = "temperature=degC,humidity=%RH";

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub database_url: String,
    pub db_channel: String,
    /// Sensor field name -> units label.
    pub channels: BTreeMap<String, String>,
}

impl DriverConfig {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        let host = env::var("ONEWIRE_HOST").map_err(|_| "ONEWIRE_HOST environment variable not set")?;
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL environment variable not set")?;

        let port = match env::var("ONEWIRE_PORT") {
            Ok(value) => value
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|port| *port != 0)
                .ok_or_else(|| format!("ONEWIRE_PORT must be 1-65535, got '{}'", value))?,
            Err(_) => HTTP_PORT,
        };

        let timeout = match env::var("ONEWIRE_TIMEOUT_SECS") {
            Ok(value) => value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|secs| secs.is_finite() && *secs > 0.0)
                .map(Duration::from_secs_f64)
                .ok_or_else(|| format!("ONEWIRE_TIMEOUT_SECS must be positive, got '{}'", value))?,
            Err(_) => DEFAULT_TIMEOUT,
        };

        let poll_interval_secs = match env::var("POLL_INTERVAL_SECS") {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| format!("POLL_INTERVAL_SECS must be positive, got '{}'", value))?,
            Err(_) => DEFAULT_POLL_INTERVAL_SECS,
        };

        let db_channel =
            env::var("DB_CHANNEL").unwrap_or_else(|_| DEFAULT_DB_CHANNEL.to_string());

        let channels = parse_channels(
            &env::var("LOG_CHANNELS").unwrap_or_else(|_| DEFAULT_LOG_CHANNELS.to_string()),
        )?;

        Ok(DriverConfig {
            host,
            port,
            timeout,
            poll_interval: Duration::from_secs(poll_interval_secs),
            database_url,
            db_channel,
            channels,
        })
    }
}

/// Parse `field=units` pairs separated by commas, e.g.
/// `temperature=degC,pressure_mb=mbar`.
pub fn parse_channels(spec: &str) -> Result<BTreeMap<String, String>, String> {
    let mut channels = BTreeMap::new();

    for pair in spec.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }

        let (field, units) = pair.split_once('=').unwrap_or((pair, ""));
        let field = field.trim();
        if !NUMERIC_FIELDS.contains(&field) {
            return Err(format!(
                "Unknown sensor field '{}' in LOG_CHANNELS, expected one of: {}",
                field,
                NUMERIC_FIELDS.join(", ")
            ));
        }
        channels.insert(field.to_string(), units.trim().to_string());
    }

    if channels.is_empty() {
        return Err("LOG_CHANNELS does not name any sensor field".into());
    }

    Ok(channels)
}
