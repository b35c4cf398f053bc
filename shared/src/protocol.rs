/// Public discovery service that lists hubs registered from the caller's network
pub const DEFAULT_DISCOVERY_URL: &str = "https://discovery.meethue.com/";

/// Hub local API resource paths, appended to `/api/{credential}`
pub const LIGHTS_PATH: &str = "/lights";
pub const SENSORS_PATH: &str = "/sensors";

/// Sensor `type` strings reported by the hub
pub const SENSOR_TEMPERATURE: &str = "ZLLTemperature";
pub const SENSOR_PRESENCE: &str = "ZLLPresence";
pub const SENSOR_LIGHT_LEVEL: &str = "ZLLLightLevel";

/// Label keys of the exported gauges
pub const LABEL_UNIQUE_ID: &str = "uniqueid";
pub const LABEL_NAME: &str = "name";
pub const LABEL_STATE: &str = "state";
pub const LABEL_TYPE: &str = "type";

/// Values of the `state` label on light gauges
pub const LIGHT_STATE_ON: &str = "on";
pub const LIGHT_STATE_REACHABLE: &str = "reachable";

/// Extra `type` label values emitted alongside a presence reading
pub const SENSOR_BATTERY: &str = "battery";
pub const SENSOR_REACHABLE: &str = "reachable";
