use std::collections::BTreeMap;
use thiserror::Error;

/// Failures while resolving the hub through the discovery endpoint
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("discovery endpoint unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("discovery endpoint answered with status {0}")]
    BadStatus(u16),

    #[error("discovery endpoint returned no hubs")]
    Empty,

    #[error("discovery response could not be parsed: {0}")]
    Malformed(String),
}

/// Failures while fetching a device collection from the hub.
///
/// `Decode` carries whatever entries could be decoded before giving up on
/// the rest, keyed by the hub's device index.
#[derive(Debug, Error)]
pub enum FetchError<T> {
    #[error("hub request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("hub answered with status {0}")]
    BadStatus(u16),

    #[error("hub response could not be decoded: {}", .errors.join("; "))]
    Decode {
        partial: BTreeMap<u32, T>,
        errors: Vec<String>,
    },
}
