use std::path::Path;
use std::time::Duration;
use serde::Deserialize;
use anyhow::{Context, Result};
use shared::protocol::DEFAULT_DISCOVERY_URL;

/// Environment variable that supplies (or overrides) the hub credential
pub const CREDENTIAL_ENV: &str = "HUB_EXPORTER_CREDENTIAL";

/// Upper bound on a single hub request, so a stalled hub cannot hold a poll cycle
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Authorized username issued by the hub; never logged
    #[serde(default)]
    pub credential: Option<String>,
    #[serde(default = "default_discovery_url")]
    pub discovery_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_discovery_url() -> String {
    DEFAULT_DISCOVERY_URL.to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_namespace() -> String {
    "hue".to_string()
}

fn default_listen() -> String {
    "0.0.0.0:2112".to_string()
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            credential: None,
            discovery_url: default_discovery_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            listen: default_listen(),
        }
    }
}

impl HubConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.poll.interval_ms > 0, "poll.interval_ms must be greater than 0");
        anyhow::ensure!(
            (1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.hub.request_timeout_secs),
            "hub.request_timeout_secs must be between 1 and {}, got {}",
            MAX_REQUEST_TIMEOUT_SECS,
            self.hub.request_timeout_secs
        );
        Ok(())
    }

    /// Resolve the hub credential, preferring the environment over the file
    pub fn credential(&self, env_value: Option<String>) -> Result<String> {
        env_value
            .filter(|v| !v.is_empty())
            .or_else(|| self.hub.credential.clone().filter(|v| !v.is_empty()))
            .with_context(|| {
                format!("No hub credential: set {} or hub.credential in the config file", CREDENTIAL_ENV)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.hub.discovery_url, DEFAULT_DISCOVERY_URL);
        assert_eq!(config.hub.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.poll.interval(), Duration::from_secs(1));
        assert_eq!(config.metrics.namespace, "hue");
        assert_eq!(config.metrics.listen, "0.0.0.0:2112");
        assert!(config.hub.credential.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
            [hub]
            credential = "file-user"

            [poll]
            interval_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.hub.credential.as_deref(), Some("file-user"));
        assert_eq!(config.hub.request_timeout_secs, 10);
        assert_eq!(config.poll.interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_credential_resolution() {
        let mut config = Config::default();
        assert!(config.credential(None).is_err());
        assert!(config.credential(Some(String::new())).is_err());

        config.hub.credential = Some("file-user".to_string());
        assert_eq!(config.credential(None).unwrap(), "file-user");
        assert_eq!(config.credential(Some("env-user".to_string())).unwrap(), "env-user");
    }

    #[test]
    fn test_rejects_bad_types() {
        assert!(Config::parse("[poll]\ninterval_ms = \"fast\"").is_err());
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = Config::parse("[poll]\ninterval_ms = 0").unwrap_err();
        assert!(format!("{:#}", err).contains("interval_ms"));
    }

    #[test]
    fn test_rejects_zero_request_timeout() {
        let err = Config::parse("[hub]\nrequest_timeout_secs = 0").unwrap_err();
        assert!(format!("{:#}", err).contains("request_timeout_secs"));
    }

    #[test]
    fn test_rejects_request_timeout_above_cap() {
        let err = Config::parse("[hub]\nrequest_timeout_secs = 86400").unwrap_err();
        assert!(format!("{:#}", err).contains("between 1 and 10"));

        let config = Config::parse("[hub]\nrequest_timeout_secs = 10").unwrap();
        assert_eq!(config.hub.request_timeout(), Duration::from_secs(MAX_REQUEST_TIMEOUT_SECS));
    }
}
