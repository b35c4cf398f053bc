use std::collections::HashMap;
use std::time::Duration;
use anyhow::{Context, Result};
use prometheus::{Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use shared::protocol::{LABEL_NAME, LABEL_STATE, LABEL_TYPE, LABEL_UNIQUE_ID};
use shared::types::{Metric, Observation};
use super::{status_label, Instrumentation, ObservationSink};

const REQUEST_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0,
];

/// Prometheus series owned by the exporter, registered on an injected registry
#[derive(Clone)]
pub struct HubMetrics {
    light_state: GaugeVec,
    sensor_state: GaugeVec,
    request_duration: HistogramVec,
}

impl HubMetrics {
    pub fn register(registry: &Registry, namespace: &str) -> Result<Self> {
        let light_state = GaugeVec::new(
            Opts::new(Metric::LightState.name(), "State of each light known to the hub.")
                .namespace(namespace),
            &[LABEL_UNIQUE_ID, LABEL_NAME, LABEL_STATE],
        )?;
        let sensor_state = GaugeVec::new(
            Opts::new(Metric::SensorState.name(), "Readings of each sensor known to the hub.")
                .namespace(namespace),
            &[LABEL_UNIQUE_ID, LABEL_NAME, LABEL_TYPE],
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "hub_client_request_duration_seconds",
                "Latency of requests to the discovery endpoint and the hub.",
            )
            .namespace(namespace)
            .buckets(REQUEST_BUCKETS.to_vec()),
            &["url", "method", "status_code"],
        )?;

        registry
            .register(Box::new(light_state.clone()))
            .context("Failed to register light gauge")?;
        registry
            .register(Box::new(sensor_state.clone()))
            .context("Failed to register sensor gauge")?;
        registry
            .register(Box::new(request_duration.clone()))
            .context("Failed to register request histogram")?;

        Ok(Self {
            light_state,
            sensor_state,
            request_duration,
        })
    }

    fn family(&self, metric: Metric) -> &GaugeVec {
        match metric {
            Metric::LightState => &self.light_state,
            Metric::SensorState => &self.sensor_state,
        }
    }
}

impl ObservationSink for HubMetrics {
    fn set(&self, observation: &Observation) -> Result<()> {
        let labels: HashMap<&str, &str> = observation
            .labels
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        self.family(observation.metric)
            .get_metric_with(&labels)?
            .set(observation.value);
        Ok(())
    }
}

impl Instrumentation for HubMetrics {
    fn observe_request(&self, target: &str, method: &str, status: Option<u16>, elapsed: Duration) {
        let status = status_label(status);
        self.request_duration
            .with_label_values(&[target, method, status.as_str()])
            .observe(elapsed.as_secs_f64());
    }
}

/// Register `<namespace>_info{version}` with a constant value of 1
pub fn register_build_info(registry: &Registry, namespace: &str, version: &str) -> Result<()> {
    let info = GaugeVec::new(
        Opts::new("info", "Version of the application.").namespace(namespace),
        &["version"],
    )?;
    registry
        .register(Box::new(info.clone()))
        .context("Failed to register build info gauge")?;
    info.with_label_values(&[version]).set(1.0);
    Ok(())
}

/// Render every family in the registry in the Prometheus text format
pub fn render(registry: &Registry) -> Result<String> {
    let mut buf = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buf)
        .context("Failed to encode metrics")?;
    String::from_utf8(buf).context("Metrics output was not UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light(state: &str, value: f64) -> Observation {
        Observation::new(
            Metric::LightState,
            [(LABEL_UNIQUE_ID, "00:17:88-0b"), (LABEL_NAME, "Desk"), (LABEL_STATE, state)],
            value,
        )
    }

    #[test]
    fn test_gauges_render_with_namespace() {
        let registry = Registry::new();
        let metrics = HubMetrics::register(&registry, "hue").unwrap();

        metrics.set(&light("on", 1.0)).unwrap();
        metrics.set(&light("reachable", 0.0)).unwrap();

        let text = render(&registry).unwrap();
        assert!(text.contains(r#"hue_light_state{name="Desk",state="on",uniqueid="00:17:88-0b"} 1"#));
        assert!(text.contains(r#"hue_light_state{name="Desk",state="reachable",uniqueid="00:17:88-0b"} 0"#));
    }

    #[test]
    fn test_set_overwrites_previous_value() {
        let registry = Registry::new();
        let metrics = HubMetrics::register(&registry, "hue").unwrap();

        metrics.set(&light("on", 1.0)).unwrap();
        metrics.set(&light("on", 0.0)).unwrap();

        let gauge = metrics.light_state.with_label_values(&["00:17:88-0b", "Desk", "on"]);
        assert_eq!(gauge.get(), 0.0);
    }

    #[test]
    fn test_mismatched_labels_are_rejected() {
        let registry = Registry::new();
        let metrics = HubMetrics::register(&registry, "hue").unwrap();

        let bad = Observation::new(Metric::SensorState, [(LABEL_UNIQUE_ID, "x"), (LABEL_STATE, "on")], 1.0);
        assert!(metrics.set(&bad).is_err());
    }

    #[test]
    fn test_request_histogram_labels() {
        let registry = Registry::new();
        let metrics = HubMetrics::register(&registry, "hue").unwrap();

        metrics.observe_request("/lights", "GET", Some(200), Duration::from_millis(12));
        metrics.observe_request("/lights", "GET", None, Duration::from_secs(10));

        let text = render(&registry).unwrap();
        assert!(text.contains(r#"hue_hub_client_request_duration_seconds_count{method="GET",status_code="200",url="/lights"} 1"#));
        assert!(text.contains(r#"hue_hub_client_request_duration_seconds_count{method="GET",status_code="-1",url="/lights"} 1"#));
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        HubMetrics::register(&registry, "hue").unwrap();
        assert!(HubMetrics::register(&registry, "hue").is_err());
    }

    #[test]
    fn test_build_info() {
        let registry = Registry::new();
        register_build_info(&registry, "hue", "0.1.0").unwrap();
        let text = render(&registry).unwrap();
        assert!(text.contains(r#"hue_info{version="0.1.0"} 1"#));
    }
}
