use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use crate::protocol::{SENSOR_LIGHT_LEVEL, SENSOR_PRESENCE, SENSOR_TEMPERATURE};
use crate::wire::{WireLight, WireSensor};

/// The hub selected by discovery.
/// Built once at startup and owned by the hub client for the rest of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredHub {
    /// Hub identifier as reported by the discovery service
    pub id: String,

    /// Host (and optional port) of the hub's local API
    pub address: String,
}

/// State of a single light, rebuilt on every poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "WireLight")]
pub struct LightRecord {
    pub unique_id: String,
    pub name: String,
    pub is_on: bool,
    pub is_reachable: bool,
}

/// State of a single sensor, rebuilt on every poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "WireSensor")]
pub struct SensorRecord {
    pub unique_id: String,
    pub name: String,
    pub reading: SensorReading,
}

/// Anything the hub reports as an addressable device
pub trait Device {
    /// Stable hardware identifier; empty when the hub reports none
    fn unique_id(&self) -> &str;
}

impl Device for LightRecord {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }
}

impl Device for SensorRecord {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }
}

/// Sensor payload, discriminated by the hub's `type` string.
///
/// Only the fields meaningful for a given sensor type exist on its variant,
/// so a temperature reading can never be mistaken for a presence flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorReading {
    Temperature {
        /// Hundredths of a degree Celsius, as reported
        temperature: i64,
    },
    Presence {
        presence: bool,
        battery: Option<i64>,
        reachable: Option<bool>,
    },
    LightLevel {
        light_level: i64,
    },
    /// Any sensor type without a dedicated reading; keeps the raw type string
    Other {
        kind: String,
    },
}

impl SensorReading {
    /// The hub's `type` string for this reading
    pub fn kind(&self) -> &str {
        match self {
            SensorReading::Temperature { .. } => SENSOR_TEMPERATURE,
            SensorReading::Presence { .. } => SENSOR_PRESENCE,
            SensorReading::LightLevel { .. } => SENSOR_LIGHT_LEVEL,
            SensorReading::Other { kind } => kind,
        }
    }
}

/// Gauge families an observation can be written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    LightState,
    SensorState,
}

impl Metric {
    /// Un-namespaced metric name
    pub fn name(&self) -> &'static str {
        match self {
            Metric::LightState => "light_state",
            Metric::SensorState => "sensor_state",
        }
    }
}

/// One normalized (metric, label set, value) tuple.
///
/// Writing an observation whose metric and labels match an earlier one
/// replaces the earlier value.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub metric: Metric,
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

impl Observation {
    pub fn new<'a>(
        metric: Metric,
        labels: impl IntoIterator<Item = (&'a str, &'a str)>,
        value: f64,
    ) -> Self {
        Self {
            metric,
            labels: labels
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            value,
        }
    }
}
