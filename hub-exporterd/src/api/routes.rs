use std::sync::Arc;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use prometheus::Registry;
use serde::Serialize;
use shared::types::DiscoveredHub;
use crate::metrics::registry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub hub: Arc<DiscoveredHub>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub hub_id: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(get_metrics))
        .route("/health", get(get_health))
        .with_state(state)
}

async fn get_metrics(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let body = registry::render(&state.registry).map_err(|e| {
        tracing::error!("Failed to render metrics: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}

async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        hub_id: state.hub.id.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use shared::types::{Metric, Observation};
    use crate::hub::testing;
    use crate::metrics::registry::HubMetrics;
    use crate::metrics::ObservationSink;

    #[tokio::test]
    async fn test_metrics_endpoint_renders_registry() {
        let registry = Registry::new();
        let metrics = HubMetrics::register(&registry, "hue").unwrap();
        metrics
            .set(&Observation::new(
                Metric::SensorState,
                [("uniqueid", "temp-a"), ("name", "Hall"), ("type", "ZLLTemperature")],
                2100.0,
            ))
            .unwrap();

        let state = AppState {
            registry,
            hub: Arc::new(DiscoveredHub { id: "abc".to_string(), address: "10.0.0.5".to_string() }),
        };
        let addr = testing::serve(router(state)).await;
        let http = crate::hub::http_client(Duration::from_secs(5)).unwrap();

        let response = http.get(format!("http://{}/metrics", addr)).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body = response.text().await.unwrap();
        assert!(body.contains(r#"hue_sensor_state{name="Hall",type="ZLLTemperature",uniqueid="temp-a"} 2100"#));

        let health: serde_json::Value = http
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["hub_id"], "abc");
    }
}
