/// Helpers for turning readings into stored samples and log lines
use std::collections::BTreeMap;
use time::{format_description, OffsetDateTime};

use onewire_etl::BusReading;

/// One value destined for the `onewire_data` table.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSample {
    pub rom_id: String,
    pub device_type: String,
    pub field: String,
    pub value: f64,
    pub units: String,
    pub channel: String,
    pub time: OffsetDateTime,
}

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    format_description::parse("[day].[month].[year] - [hour]:[minute]:[second]")
        .ok()
        .and_then(|format| dt.format(&format).ok())
        .unwrap_or_else(|| dt.to_string())
}

/// Select the configured channels from every sensor in a reading
///
/// Sensors are visited in reading order (EDS0065 first). Fields a sensor did
/// not report in this poll are skipped rather than stored as zero.
///
/// # Arguments
/// * `reading` - Decoded poll result
/// * `channels` - Sensor field name -> units label
/// * `db_channel` - Channel tag stored with every sample
/// * `time` - Timestamp shared by all samples of this poll
pub fn collect_samples(
    reading: &BusReading,
    channels: &BTreeMap<String, String>,
    db_channel: &str,
    time: OffsetDateTime,
) -> Vec<ChannelSample> {
    let mut samples = Vec::new();

    for sensor in reading.sensors() {
        let base = sensor.base();
        for (field, units) in channels {
            if let Some(value) = sensor.numeric_field(field) {
                samples.push(ChannelSample {
                    rom_id: base.rom_id.clone().unwrap_or_else(|| "Unknown".to_string()),
                    device_type: base
                        .device_type
                        .clone()
                        .unwrap_or_else(|| "Unknown".to_string()),
                    field: field.clone(),
                    value,
                    units: units.clone(),
                    channel: db_channel.to_string(),
                    time,
                });
            }
        }
    }

    samples
}

/// Render an optional value for the summary log.
pub fn display_or_dash(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "-".to_string())
}
