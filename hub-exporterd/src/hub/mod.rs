pub mod client;
pub mod discovery;

use std::time::{Duration, Instant};
use anyhow::{Context, Result};
use crate::metrics::Instrumentation;

/// Build the HTTP client shared by discovery and the hub client
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(10)
        .build()
        .context("Failed to build HTTP client")
}

/// Issue a GET and record its latency under `target`, whatever the outcome
async fn timed_get(
    http: &reqwest::Client,
    instrumentation: &dyn Instrumentation,
    url: &str,
    target: &str,
) -> reqwest::Result<reqwest::Response> {
    let start = Instant::now();
    let result = http.get(url).send().await;
    let status = result.as_ref().ok().map(|resp| resp.status().as_u16());
    instrumentation.observe_request(target, "GET", status, start.elapsed());
    result
}
