use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;
use crate::error::FetchError;
use crate::hub::client::HubClient;
use crate::hub::discovery::DiscoveryResolver;
use crate::metrics::{Instrumentation, ObservationSink};
use crate::translate::translate;

/// What became of one collection fetch within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Every device decoded
    Complete(usize),
    /// The response only partly decoded; the decoded devices were still published
    Partial(usize),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub lights: FetchOutcome,
    pub sensors: FetchOutcome,
    pub published: usize,
}

/// Drives fetch → translate → publish against one hub on a fixed interval
pub struct Poller {
    client: HubClient,
    sink: Arc<dyn ObservationSink>,
    interval: Duration,
}

impl Poller {
    pub fn new(client: HubClient, sink: Arc<dyn ObservationSink>, interval: Duration) -> Self {
        Self {
            client,
            sink,
            interval,
        }
    }

    /// Discover the hub, build a client for it and check that it answers.
    /// Any failure here is returned; there is nothing to poll without a hub.
    pub async fn start(
        resolver: &DiscoveryResolver,
        http: reqwest::Client,
        credential: String,
        instrumentation: Arc<dyn Instrumentation>,
        sink: Arc<dyn ObservationSink>,
        interval: Duration,
    ) -> Result<Self> {
        let hub = resolver
            .discover()
            .await
            .context("Failed to discover hub")?;
        tracing::info!("Discovered hub {} at {}", hub.id, hub.address);

        let client = HubClient::new(http, hub, credential, instrumentation);
        if !client.is_reachable().await {
            bail!("Hub {} at {} is not reachable", client.hub().id, client.hub().address);
        }

        Ok(Self::new(client, sink, interval))
    }

    pub fn client(&self) -> &HubClient {
        &self.client
    }

    /// Run one cycle. Lights and sensors are fetched independently, so a
    /// failure on one never skips the other. Errors are logged, not returned.
    pub async fn poll_once(&self) -> CycleReport {
        let (lights, lights_outcome) = settle("lights", self.client.fetch_lights().await);
        let (sensors, sensors_outcome) = settle("sensors", self.client.fetch_sensors().await);

        let published = self.sink.publish(&translate(&lights, &sensors));

        CycleReport {
            lights: lights_outcome,
            sensors: sensors_outcome,
            published,
        }
    }

    /// Poll until `cancel` fires. The token is checked while waiting for the
    /// next cycle.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            "Polling hub {} every {}ms",
            self.client.hub().id,
            self.interval.as_millis()
        );

        loop {
            let report = self.poll_once().await;
            tracing::debug!(
                "Cycle done: lights {:?}, sensors {:?}, {} observations",
                report.lights,
                report.sensors,
                report.published
            );

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = cancel.cancelled() => {
                    tracing::info!("Poller shutting down");
                    break;
                }
            }
        }
    }
}

/// Turn a fetch result into the records worth publishing plus its outcome
fn settle<T>(what: &str, result: Result<BTreeMap<u32, T>, FetchError<T>>) -> (BTreeMap<u32, T>, FetchOutcome) {
    match result {
        Ok(records) => {
            let count = records.len();
            (records, FetchOutcome::Complete(count))
        }
        Err(FetchError::Decode { partial, errors }) => {
            tracing::warn!(
                "Failed to decode {} ({} decoded): {}",
                what,
                partial.len(),
                errors.join("; ")
            );
            let count = partial.len();
            (partial, FetchOutcome::Partial(count))
        }
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", what, e);
            (BTreeMap::new(), FetchOutcome::Failed)
        }
    }
}
