pub mod registry;

use std::time::Duration;
use anyhow::Result;
use shared::types::Observation;

/// Destination for translated device observations.
///
/// Setting an observation overwrites any earlier value with the same metric
/// and label set.
pub trait ObservationSink: Send + Sync {
    fn set(&self, observation: &Observation) -> Result<()>;

    /// Set every observation, logging (not returning) individual failures.
    /// Returns the number of observations written.
    fn publish(&self, observations: &[Observation]) -> usize {
        observations
            .iter()
            .filter(|obs| match self.set(obs) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Failed to set {}: {}", obs.metric.name(), e);
                    false
                }
            })
            .count()
    }
}

/// Records latency and outcome of outbound HTTP calls.
pub trait Instrumentation: Send + Sync {
    /// `status` is `None` when the request failed before a response arrived
    fn observe_request(&self, target: &str, method: &str, status: Option<u16>, elapsed: Duration);
}

/// Label value used for a request that never got a status code
pub fn status_label(status: Option<u16>) -> String {
    status.map_or_else(|| "-1".to_string(), |code| code.to_string())
}
