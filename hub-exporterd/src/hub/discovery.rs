use std::sync::Arc;
use shared::types::DiscoveredHub;
use shared::wire::DiscoveryCandidate;
use crate::error::DiscoveryError;
use crate::metrics::Instrumentation;
use super::timed_get;

/// Resolves the hub's address through the public discovery endpoint
pub struct DiscoveryResolver {
    http: reqwest::Client,
    url: String,
    instrumentation: Arc<dyn Instrumentation>,
}

impl DiscoveryResolver {
    pub fn new(
        http: reqwest::Client,
        url: impl Into<String>,
        instrumentation: Arc<dyn Instrumentation>,
    ) -> Self {
        Self {
            http,
            url: url.into(),
            instrumentation,
        }
    }

    /// Query the discovery endpoint and take the first hub it lists.
    /// Any further candidates are ignored.
    pub async fn discover(&self) -> Result<DiscoveredHub, DiscoveryError> {
        let response = timed_get(&self.http, self.instrumentation.as_ref(), &self.url, &self.url)
            .await
            .map_err(DiscoveryError::Unreachable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::BadStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(DiscoveryError::Unreachable)?;
        let candidates: Vec<DiscoveryCandidate> = serde_json::from_slice(&body)
            .map_err(|e| DiscoveryError::Malformed(e.to_string()))?;

        let mut candidates = candidates.into_iter();
        let first = candidates.next().ok_or(DiscoveryError::Empty)?;
        for skipped in candidates {
            tracing::debug!("Ignoring additional hub {} at {}", skipped.id, skipped.internal_ip_address);
        }

        Ok(first.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use crate::hub::{http_client, testing};
    use crate::metrics::testing::{RecordedRequest, RecordingInstrumentation};
    use std::time::Duration;

    async fn resolver_for(body: &'static str, status: StatusCode) -> (DiscoveryResolver, Arc<RecordingInstrumentation>) {
        let router = Router::new().route("/", get(move || async move { (status, body) }));
        let addr = testing::serve(router).await;
        let instrumentation = Arc::new(RecordingInstrumentation::default());
        let resolver = DiscoveryResolver::new(
            http_client(Duration::from_secs(5)).unwrap(),
            format!("http://{}/", addr),
            instrumentation.clone(),
        );
        (resolver, instrumentation)
    }

    #[tokio::test]
    async fn test_first_candidate_wins() {
        let (resolver, instrumentation) = resolver_for(
            r#"[{"id":"abc","internalipaddress":"10.0.0.5"},{"id":"def","internalipaddress":"10.0.0.6"}]"#,
            StatusCode::OK,
        )
        .await;

        let hub = resolver.discover().await.unwrap();
        assert_eq!(hub, DiscoveredHub { id: "abc".to_string(), address: "10.0.0.5".to_string() });

        let recorded = instrumentation.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].method, "GET");
        assert_eq!(recorded[0].status, Some(200));
    }

    #[tokio::test]
    async fn test_empty_list() {
        let (resolver, _) = resolver_for("[]", StatusCode::OK).await;
        assert!(matches!(resolver.discover().await, Err(DiscoveryError::Empty)));
    }

    #[tokio::test]
    async fn test_bad_status() {
        let (resolver, instrumentation) = resolver_for("slow down", StatusCode::TOO_MANY_REQUESTS).await;
        assert!(matches!(resolver.discover().await, Err(DiscoveryError::BadStatus(429))));
        assert_eq!(instrumentation.recorded()[0].status, Some(429));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (resolver, _) = resolver_for(r#"{"id":"abc"}"#, StatusCode::OK).await;
        assert!(matches!(resolver.discover().await, Err(DiscoveryError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_unreachable_records_minus_one() {
        let addr = testing::closed_addr().await;
        let url = format!("http://{}/", addr);
        let instrumentation = Arc::new(RecordingInstrumentation::default());
        let resolver = DiscoveryResolver::new(
            http_client(Duration::from_secs(5)).unwrap(),
            url.clone(),
            instrumentation.clone(),
        );

        assert!(matches!(resolver.discover().await, Err(DiscoveryError::Unreachable(_))));
        assert_eq!(
            instrumentation.recorded(),
            vec![RecordedRequest { target: url, method: "GET".to_string(), status: None }]
        );
    }
}
