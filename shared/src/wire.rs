//! JSON shapes served by the discovery endpoint and the hub's local API.
//!
//! Records are converted into the typed model while deserializing, so the
//! loosely-typed sensor payloads never leave this module.

use serde::Deserialize;
use crate::protocol::{SENSOR_LIGHT_LEVEL, SENSOR_PRESENCE, SENSOR_TEMPERATURE};
use crate::types::{DiscoveredHub, LightRecord, SensorReading, SensorRecord};

/// One entry of the discovery endpoint's response array
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryCandidate {
    pub id: String,
    #[serde(rename = "internalipaddress")]
    pub internal_ip_address: String,
}

impl From<DiscoveryCandidate> for DiscoveredHub {
    fn from(candidate: DiscoveryCandidate) -> Self {
        Self {
            id: candidate.id,
            address: candidate.internal_ip_address,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("{kind} sensor has no `{field}` reading")]
    MissingReading {
        kind: &'static str,
        field: &'static str,
    },
}

#[derive(Debug, Deserialize)]
pub struct WireLight {
    #[serde(default)]
    uniqueid: String,
    #[serde(default)]
    name: String,
    state: WireLightState,
}

#[derive(Debug, Deserialize)]
struct WireLightState {
    #[serde(default)]
    on: bool,
    #[serde(default)]
    reachable: bool,
}

impl From<WireLight> for LightRecord {
    fn from(light: WireLight) -> Self {
        Self {
            unique_id: light.uniqueid,
            name: light.name,
            is_on: light.state.on,
            is_reachable: light.state.reachable,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireSensor {
    #[serde(default)]
    uniqueid: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    state: WireSensorState,
    #[serde(default)]
    config: WireSensorConfig,
}

#[derive(Debug, Default, Deserialize)]
struct WireSensorState {
    temperature: Option<i64>,
    presence: Option<bool>,
    lightlevel: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct WireSensorConfig {
    battery: Option<i64>,
    reachable: Option<bool>,
}

impl TryFrom<WireSensor> for SensorRecord {
    type Error = WireError;

    fn try_from(sensor: WireSensor) -> Result<Self, Self::Error> {
        let reading = match sensor.kind.as_str() {
            SENSOR_TEMPERATURE => SensorReading::Temperature {
                temperature: sensor.state.temperature.ok_or(WireError::MissingReading {
                    kind: SENSOR_TEMPERATURE,
                    field: "temperature",
                })?,
            },
            SENSOR_PRESENCE => SensorReading::Presence {
                presence: sensor.state.presence.ok_or(WireError::MissingReading {
                    kind: SENSOR_PRESENCE,
                    field: "presence",
                })?,
                battery: sensor.config.battery,
                reachable: sensor.config.reachable,
            },
            SENSOR_LIGHT_LEVEL => SensorReading::LightLevel {
                light_level: sensor.state.lightlevel.ok_or(WireError::MissingReading {
                    kind: SENSOR_LIGHT_LEVEL,
                    field: "lightlevel",
                })?,
            },
            _ => SensorReading::Other { kind: sensor.kind },
        };

        Ok(Self {
            unique_id: sensor.uniqueid,
            name: sensor.name,
            reading,
        })
    }
}
