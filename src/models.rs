//! Readings decoded from the bridge's device-summary document
//!
//! Every field is optional: `None` means the device did not report the field
//! in this poll, never zero.

/// Temperature/humidity sensor (EDS0065 family).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Eds0065Reading {
    pub rom_id: Option<String>,
    pub device_type: Option<String>,
    pub health: Option<i32>,
    pub channel: Option<i32>,
    pub raw_data: Option<String>,
    pub relative_humidity: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub dew_point: Option<f64>,
    pub humidex: Option<f64>,
    pub heat_index: Option<f64>,
    pub version: Option<f64>,
}

/// Environmental sensor (EDS0068 family): everything EDS0065 reports plus
/// barometric pressure and light.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Eds0068Reading {
    pub base: Eds0065Reading,
    pub pressure_mb: Option<f64>,
    pub pressure_hg: Option<f64>,
    pub illuminance: Option<i32>,
}

/// One complete poll of the bridge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusReading {
    pub poll_count: Option<i64>,
    pub total_devices: Option<i64>,
    pub loop_time: Option<f64>,
    pub ch1_connected: Option<i64>,
    pub ch2_connected: Option<i64>,
    pub ch3_connected: Option<i64>,
    pub ch1_error: Option<i64>,
    pub ch2_error: Option<i64>,
    pub ch3_error: Option<i64>,
    pub ch1_voltage: Option<f64>,
    pub ch2_voltage: Option<f64>,
    pub ch3_voltage: Option<f64>,
    pub voltage_power: Option<f64>,
    pub device_name: Option<String>,
    pub hostname: Option<String>,
    pub mac_address: Option<String>,
    pub datetime: Option<String>,
    pub eds0065: Vec<Eds0065Reading>,
    pub eds0068: Vec<Eds0068Reading>,
}

/// A borrowed view of one sensor, whichever family it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorRef<'a> {
    Eds0065(&'a Eds0065Reading),
    Eds0068(&'a Eds0068Reading),
}

/// A single metric keyed by the sensor that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RomValue<'a> {
    pub rom_id: Option<&'a str>,
    pub value: f64,
}

impl<'a> SensorRef<'a> {
    /// Fields shared by both families.
    pub fn base(&self) -> &'a Eds0065Reading {
        match *self {
            SensorRef::Eds0065(sensor) => sensor,
            SensorRef::Eds0068(sensor) => &sensor.base,
        }
    }

    pub fn rom_id(&self) -> Option<&'a str> {
        self.base().rom_id.as_deref()
    }

    /// Look up a numeric metric by its field name, e.g. `"temperature"` or
    /// `"pressure_mb"`. Returns `None` for unknown names, for fields the
    /// sensor family does not have and for fields absent from this poll.
    pub fn numeric_field(&self, name: &str) -> Option<f64> {
        let base = self.base();
        let value = match name {
            "health" => base.health.map(f64::from),
            "channel" => base.channel.map(f64::from),
            "relative_humidity" => base.relative_humidity,
            "temperature" => base.temperature,
            "humidity" => base.humidity,
            "dew_point" => base.dew_point,
            "humidex" => base.humidex,
            "heat_index" => base.heat_index,
            "version" => base.version,
            _ => None,
        };
        if value.is_some() {
            return value;
        }

        match (self, name) {
            (SensorRef::Eds0068(sensor), "pressure_mb") => sensor.pressure_mb,
            (SensorRef::Eds0068(sensor), "pressure_hg") => sensor.pressure_hg,
            (SensorRef::Eds0068(sensor), "illuminance") => sensor.illuminance.map(f64::from),
            _ => None,
        }
    }
}

/// Every name accepted by [`SensorRef::numeric_field`].
pub const NUMERIC_FIELDS: &[&str] = &[
    "health",
    "channel",
    "relative_humidity",
    "temperature",
    "humidity",
    "dew_point",
    "humidex",
    "heat_index",
    "version",
    "pressure_mb",
    "pressure_hg",
    "illuminance",
];

impl BusReading {
    /// All sensors, EDS0065 first, each family in document order.
    pub fn sensors(&self) -> Vec<SensorRef<'_>> {
        self.eds0065
            .iter()
            .map(SensorRef::Eds0065)
            .chain(self.eds0068.iter().map(SensorRef::Eds0068))
            .collect()
    }

    pub fn temperatures(&self) -> Vec<RomValue<'_>> {
        self.collect_metric(|sensor| sensor.temperature)
    }

    pub fn humidities(&self) -> Vec<RomValue<'_>> {
        self.collect_metric(|sensor| sensor.humidity)
    }

    pub fn sensor_count(&self) -> usize {
        self.eds0065.len() + self.eds0068.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensor_count() == 0
    }

    fn collect_metric<F>(&self, metric: F) -> Vec<RomValue<'_>>
    where
        F: Fn(&Eds0065Reading) -> Option<f64>,
    {
        self.sensors()
            .into_iter()
            .filter_map(|sensor| {
                metric(sensor.base()).map(|value| RomValue {
                    rom_id: sensor.rom_id(),
                    value,
                })
            })
            .collect()
    }
}
