/// Decoding of the device-summary document into a [`BusReading`]
///
/// Dispatch is table driven: each known local tag name maps to an accessor
/// for the target field plus the coercion to apply to the element text.
/// Unknown tags are skipped so newer firmware fields never break a poll.
use log::debug;
use roxmltree::{Document, Node};

use crate::error::DecodeError;
use crate::models::{BusReading, Eds0065Reading, Eds0068Reading};

pub const EDS0065_TAG: &str = "owd_EDS0065";
pub const EDS0068_TAG: &str = "owd_EDS0068";

/// Target field of a tag together with how its text is coerced.
enum Field<R> {
    Int(fn(&mut R) -> &mut Option<i64>),
    SmallInt(fn(&mut R) -> &mut Option<i32>),
    Float(fn(&mut R) -> &mut Option<f64>),
    /// Float taken from the first whitespace-separated token, e.g. `"42.5 %RH"`.
    LeadingFloat(fn(&mut R) -> &mut Option<f64>),
    Text(fn(&mut R) -> &mut Option<String>),
}

impl<R> Field<R> {
    fn apply(&self, record: &mut R, tag: &str, text: &str) -> Result<(), DecodeError> {
        match self {
            Field::Int(slot) => *slot(record) = Some(parse_number(tag, text, text.trim())?),
            Field::SmallInt(slot) => *slot(record) = Some(parse_number(tag, text, text.trim())?),
            Field::Float(slot) => *slot(record) = Some(parse_number(tag, text, text.trim())?),
            Field::LeadingFloat(slot) => {
                let token = text.split_whitespace().next().unwrap_or("");
                *slot(record) = Some(parse_number(tag, text, token)?);
            }
            Field::Text(slot) => {
                let text = text.trim();
                *slot(record) = (!text.is_empty()).then(|| text.to_string());
            }
        }
        Ok(())
    }
}

const BUS_FIELDS: &[(&str, Field<BusReading>)] = &[
    ("PollCount", Field::Int(|r| &mut r.poll_count)),
    ("DevicesConnected", Field::Int(|r| &mut r.total_devices)),
    ("LoopTime", Field::Float(|r| &mut r.loop_time)),
    ("DevicesConnectedChannel1", Field::Int(|r| &mut r.ch1_connected)),
    ("DevicesConnectedChannel2", Field::Int(|r| &mut r.ch2_connected)),
    ("DevicesConnectedChannel3", Field::Int(|r| &mut r.ch3_connected)),
    ("DataErrorsChannel1", Field::Int(|r| &mut r.ch1_error)),
    ("DataErrorsChannel2", Field::Int(|r| &mut r.ch2_error)),
    ("DataErrorsChannel3", Field::Int(|r| &mut r.ch3_error)),
    ("VoltageChannel1", Field::Float(|r| &mut r.ch1_voltage)),
    ("VoltageChannel2", Field::Float(|r| &mut r.ch2_voltage)),
    ("VoltageChannel3", Field::Float(|r| &mut r.ch3_voltage)),
    ("VoltagePower", Field::Float(|r| &mut r.voltage_power)),
    ("DeviceName", Field::Text(|r| &mut r.device_name)),
    ("HostName", Field::Text(|r| &mut r.hostname)),
    ("MACAddress", Field::Text(|r| &mut r.mac_address)),
    ("DateTime", Field::Text(|r| &mut r.datetime)),
];

/// Fields every sensor family reports.
const SENSOR_FIELDS: &[(&str, Field<Eds0065Reading>)] = &[
    ("ROMId", Field::Text(|r| &mut r.rom_id)),
    ("Name", Field::Text(|r| &mut r.device_type)),
    ("Health", Field::SmallInt(|r| &mut r.health)),
    ("Channel", Field::SmallInt(|r| &mut r.channel)),
    ("RawData", Field::Text(|r| &mut r.raw_data)),
    ("PrimaryValue", Field::LeadingFloat(|r| &mut r.relative_humidity)),
    ("Temperature", Field::Float(|r| &mut r.temperature)),
    ("Humidity", Field::Float(|r| &mut r.humidity)),
    ("DewPoint", Field::Float(|r| &mut r.dew_point)),
    ("Humidex", Field::Float(|r| &mut r.humidex)),
    ("HeatIndex", Field::Float(|r| &mut r.heat_index)),
    ("Version", Field::Float(|r| &mut r.version)),
];

const EDS0068_FIELDS: &[(&str, Field<Eds0068Reading>)] = &[
    ("BarometricPressureMb", Field::Float(|r| &mut r.pressure_mb)),
    ("BarometricPressureHg", Field::Float(|r| &mut r.pressure_hg)),
    ("Light", Field::SmallInt(|r| &mut r.illuminance)),
];

/// A sensor family: its own fields layered over the shared ones.
trait SensorRecord: Default + Sized + 'static {
    fn family_fields() -> &'static [(&'static str, Field<Self>)];
    fn shared(&mut self) -> &mut Eds0065Reading;
}

impl SensorRecord for Eds0065Reading {
    fn family_fields() -> &'static [(&'static str, Field<Self>)] {
        &[]
    }

    fn shared(&mut self) -> &mut Eds0065Reading {
        self
    }
}

impl SensorRecord for Eds0068Reading {
    fn family_fields() -> &'static [(&'static str, Field<Self>)] {
        EDS0068_FIELDS
    }

    fn shared(&mut self) -> &mut Eds0065Reading {
        &mut self.base
    }
}

/// Decode a complete document payload. Either every field decodes or the
/// whole document is rejected.
pub fn decode(payload: &[u8]) -> Result<BusReading, DecodeError> {
    let text = std::str::from_utf8(payload)?;
    let doc = Document::parse(text)?;
    debug!("XML data received: {}", text);

    let mut reading = BusReading::default();
    for node in doc.root_element().descendants().filter(Node::is_element) {
        let tag = local_name(node);
        match tag {
            EDS0065_TAG => reading.eds0065.push(decode_sensor(node)?),
            EDS0068_TAG => reading.eds0068.push(decode_sensor(node)?),
            _ => {
                if let Some(field) = lookup(BUS_FIELDS, tag) {
                    field.apply(&mut reading, tag, node.text().unwrap_or(""))?;
                }
            }
        }
    }

    Ok(reading)
}

/// Fill a new sensor record from the immediate children of its container.
fn decode_sensor<R: SensorRecord>(container: Node) -> Result<R, DecodeError> {
    let mut record = R::default();

    for child in container.children().filter(Node::is_element) {
        let tag = local_name(child);
        let text = child.text().unwrap_or("");

        if let Some(field) = lookup(R::family_fields(), tag) {
            field.apply(&mut record, tag, text)?;
        } else if let Some(field) = lookup(SENSOR_FIELDS, tag) {
            field.apply(record.shared(), tag, text)?;
        }
    }

    Ok(record)
}

/// Tag name with the namespace stripped. `{uri}LocalName` and
/// `prefix:LocalName` both match as `LocalName`.
fn local_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

fn lookup<'t, R>(table: &'t [(&str, Field<R>)], tag: &str) -> Option<&'t Field<R>> {
    table
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, field)| field)
}

fn parse_number<T: std::str::FromStr>(tag: &str, text: &str, token: &str) -> Result<T, DecodeError> {
    token.parse().map_err(|_| DecodeError::Field {
        tag: tag.to_string(),
        text: text.to_string(),
    })
}
