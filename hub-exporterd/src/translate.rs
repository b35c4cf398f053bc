use std::collections::BTreeMap;
use shared::protocol::{
    LABEL_NAME, LABEL_STATE, LABEL_TYPE, LABEL_UNIQUE_ID, LIGHT_STATE_ON, LIGHT_STATE_REACHABLE,
    SENSOR_BATTERY, SENSOR_REACHABLE,
};
use shared::types::{LightRecord, Metric, Observation, SensorReading, SensorRecord};

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

fn light_observation(light: &LightRecord, state: &str, value: f64) -> Observation {
    Observation::new(
        Metric::LightState,
        [
            (LABEL_UNIQUE_ID, light.unique_id.as_str()),
            (LABEL_NAME, light.name.as_str()),
            (LABEL_STATE, state),
        ],
        value,
    )
}

fn sensor_observation(sensor: &SensorRecord, kind: &str, value: f64) -> Observation {
    Observation::new(
        Metric::SensorState,
        [
            (LABEL_UNIQUE_ID, sensor.unique_id.as_str()),
            (LABEL_NAME, sensor.name.as_str()),
            (LABEL_TYPE, kind),
        ],
        value,
    )
}

fn translate_lights(lights: &BTreeMap<u32, LightRecord>) -> Vec<Observation> {
    lights
        .values()
        .flat_map(|light| {
            [
                light_observation(light, LIGHT_STATE_ON, flag(light.is_on)),
                light_observation(light, LIGHT_STATE_REACHABLE, flag(light.is_reachable)),
            ]
        })
        .collect()
}

fn translate_sensors(sensors: &BTreeMap<u32, SensorRecord>) -> Vec<Observation> {
    let mut observations = Vec::new();

    for sensor in sensors.values() {
        let kind = sensor.reading.kind();
        match &sensor.reading {
            SensorReading::Temperature { temperature } => {
                observations.push(sensor_observation(sensor, kind, *temperature as f64));
            }
            SensorReading::Presence { presence, battery, reachable } => {
                observations.push(sensor_observation(sensor, kind, flag(*presence)));
                // Omitted rather than zeroed when the hub did not report them, so a
                // presence sensor yields one to three observations (see DESIGN.md).
                if let Some(battery) = battery {
                    observations.push(sensor_observation(sensor, SENSOR_BATTERY, *battery as f64));
                }
                if let Some(reachable) = reachable {
                    observations.push(sensor_observation(sensor, SENSOR_REACHABLE, flag(*reachable)));
                }
            }
            SensorReading::LightLevel { light_level } => {
                observations.push(sensor_observation(sensor, kind, *light_level as f64));
            }
            SensorReading::Other { .. } => {
                observations.push(sensor_observation(sensor, kind, 0.0));
            }
        }
    }

    observations
}

/// Flatten one cycle's devices into observations. Pure; the order of the
/// result carries no meaning.
pub fn translate(
    lights: &BTreeMap<u32, LightRecord>,
    sensors: &BTreeMap<u32, SensorRecord>,
) -> Vec<Observation> {
    let mut observations = translate_lights(lights);
    observations.extend(translate_sensors(sensors));
    observations
}
