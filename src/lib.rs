//! Client for EDS OW-SERVER style 1-Wire bridges.
//!
//! [`OneWireClient::poll`] fetches the bridge's `details.xml` summary over a
//! fresh TCP connection and decodes it into a [`BusReading`] with bus
//! counters plus one record per EDS0065 and EDS0068 sensor.

pub mod error;
pub mod models;
pub mod onewire;

pub use error::{DecodeError, OneWireError, Result};
pub use models::{BusReading, Eds0065Reading, Eds0068Reading, RomValue, SensorRef};
pub use onewire::OneWireClient;
