/// High-level client: one poll is connect, request, frame, decode, disconnect
use log::{info, warn};
use std::time::Duration;

use super::decoder::decode;
use super::framer::exchange;
use super::transport::Session;
use crate::error::Result;
use crate::models::{BusReading, RomValue, SensorRef};

/// HTTP service port of the bridge, the only one this client talks to.
pub const HTTP_PORT: u16 = 80;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Polls a single 1-Wire bridge.
///
/// Not meant to be shared between callers: a poll needs `&mut self` for its
/// whole duration.
pub struct OneWireClient {
    host: String,
    port: u16,
    session: Session,
    last: Option<BusReading>,
}

impl OneWireClient {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            session: Session::new(timeout),
            last: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Connect to `host:port` and make it the target of later polls.
    pub async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        self.session.connect(host, port).await?;
        self.host = host.to_string();
        self.port = port;
        Ok(())
    }

    pub async fn disconnect(&mut self) -> Result<()> {
        self.session.disconnect().await
    }

    /// Fetch and decode one device summary.
    ///
    /// Connects first if needed and always leaves the session disconnected,
    /// since the bridge answers only one request per connection.
    pub async fn poll(&mut self) -> Result<BusReading> {
        self.last = None;

        if !self.session.is_connected() {
            let host = self.host.clone();
            self.session.connect(&host, self.port).await?;
        }

        let exchanged = exchange(&mut self.session).await;
        if let Err(e) = self.session.disconnect().await {
            warn!("Failed to close connection to {}:{}: {}", self.host, self.port, e);
        }

        let reading = decode(&exchanged?)?;
        info!(
            "Poll {} from {}: {} sensors",
            reading
                .poll_count
                .map_or_else(|| "?".to_string(), |count| count.to_string()),
            self.host,
            reading.sensor_count()
        );

        self.last = Some(reading.clone());
        Ok(reading)
    }

    /// The reading from the most recent successful poll, cleared when a poll
    /// fails.
    pub fn last_reading(&self) -> Option<&BusReading> {
        self.last.as_ref()
    }

    pub fn list_sensor_readings(&self) -> Vec<SensorRef<'_>> {
        self.last
            .as_ref()
            .map(BusReading::sensors)
            .unwrap_or_default()
    }

    pub fn list_temperatures(&self) -> Vec<RomValue<'_>> {
        self.last
            .as_ref()
            .map(BusReading::temperatures)
            .unwrap_or_default()
    }

    pub fn list_humidities(&self) -> Vec<RomValue<'_>> {
        self.last
            .as_ref()
            .map(BusReading::humidities)
            .unwrap_or_default()
    }
}
