use std::collections::BTreeMap;
use std::sync::Arc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::protocol::{LIGHTS_PATH, SENSORS_PATH};
use shared::types::{Device, DiscoveredHub, LightRecord, SensorRecord};
use crate::error::FetchError;
use crate::metrics::Instrumentation;
use super::timed_get;

/// Authenticated access to one discovered hub's local API
pub struct HubClient {
    http: reqwest::Client,
    hub: DiscoveredHub,
    credential: String,
    instrumentation: Arc<dyn Instrumentation>,
}

impl HubClient {
    pub fn new(
        http: reqwest::Client,
        hub: DiscoveredHub,
        credential: String,
        instrumentation: Arc<dyn Instrumentation>,
    ) -> Self {
        Self {
            http,
            hub,
            credential,
            instrumentation,
        }
    }

    pub fn hub(&self) -> &DiscoveredHub {
        &self.hub
    }

    /// Whether the hub answers on its base address. Never fails; any
    /// transport error or non-success status counts as unreachable.
    pub async fn is_reachable(&self) -> bool {
        let url = format!("http://{}/", self.hub.address);
        match timed_get(&self.http, self.instrumentation.as_ref(), &url, &self.hub.address).await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Hub {} unreachable: {}", self.hub.address, e);
                false
            }
        }
    }

    pub async fn fetch_lights(&self) -> Result<BTreeMap<u32, LightRecord>, FetchError<LightRecord>> {
        self.fetch(LIGHTS_PATH).await
    }

    pub async fn fetch_sensors(&self) -> Result<BTreeMap<u32, SensorRecord>, FetchError<SensorRecord>> {
        self.fetch(SENSORS_PATH).await
    }

    async fn fetch<T>(&self, path: &str) -> Result<BTreeMap<u32, T>, FetchError<T>>
    where
        T: DeserializeOwned + Device,
    {
        // The credential is a path segment; only `path` goes into metric labels.
        let url = format!("http://{}/api/{}{}", self.hub.address, self.credential, path);
        let response = timed_get(&self.http, self.instrumentation.as_ref(), &url, path)
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(FetchError::BadStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(FetchError::Transport)?;
        decode_collection(&body)
    }
}

/// Decode a `{"<index>": {...}, ...}` collection entry by entry, so one bad
/// device does not hide the others.
fn decode_collection<T>(body: &[u8]) -> Result<BTreeMap<u32, T>, FetchError<T>>
where
    T: DeserializeOwned + Device,
{
    let entries = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(entries)) => entries,
        // The hub reports API errors (e.g. an unknown user) as a 200 with an array body
        Ok(Value::Array(items)) => {
            return Err(FetchError::Decode {
                partial: BTreeMap::new(),
                errors: hub_error_descriptions(&items),
            });
        }
        Ok(other) => {
            return Err(FetchError::Decode {
                partial: BTreeMap::new(),
                errors: vec![format!("expected a JSON object, got {}", json_kind(&other))],
            });
        }
        Err(e) => {
            return Err(FetchError::Decode {
                partial: BTreeMap::new(),
                errors: vec![e.to_string()],
            });
        }
    };

    let mut records = BTreeMap::new();
    let mut errors = Vec::new();

    for (key, value) in entries {
        let Ok(index) = key.parse::<u32>() else {
            errors.push(format!("device key {:?} is not an index", key));
            continue;
        };

        match serde_json::from_value::<T>(value) {
            Ok(record) if record.unique_id().is_empty() => {
                tracing::debug!("Skipping device {} without a uniqueid", index);
            }
            Ok(record) => {
                records.insert(index, record);
            }
            Err(e) => errors.push(format!("device {}: {}", index, e)),
        }
    }

    if errors.is_empty() {
        Ok(records)
    } else {
        Err(FetchError::Decode {
            partial: records,
            errors,
        })
    }
}

fn hub_error_descriptions(items: &[Value]) -> Vec<String> {
    let descriptions: Vec<String> = items
        .iter()
        .filter_map(|item| item.pointer("/error/description")?.as_str())
        .map(|description| format!("hub error: {}", description))
        .collect();

    if descriptions.is_empty() {
        vec!["expected a JSON object, got array".to_string()]
    } else {
        descriptions
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
