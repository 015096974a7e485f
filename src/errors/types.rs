//! Error type definitions for the IPTV catalog service
//!
//! Failures on the aggregation path never reach a query caller. They are
//! modelled here so each stage can log a precise cause and then degrade to
//! cached or empty data.

use thiserror::Error;

/// Top-level application error type
///
/// Returned while wiring up clients and sources at startup. Pipeline
/// failures ([`FetchError`], [`ProbeError`]) are recovered before they would
/// need to be wrapped in this type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Upstream feed errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Stream liveness probe errors
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failures while retrieving one of the upstream JSON feeds
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request did not complete within the configured timeout
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Connection, TLS or protocol failure
    #[error("Transport failure for {url}: {message}")]
    Transport { url: String, message: String },

    /// The feed answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    /// The payload was not the expected JSON shape
    #[error("Malformed payload from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Reasons a liveness probe produced a negative verdict
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("Probe of {url} timed out")]
    Timeout { url: String },

    #[error("Probe of {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Anything other than exactly 200 is treated as dead
    #[error("Probe of {url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// Startup configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Layered configuration could not be extracted
    #[error("Failed to load configuration: {0}")]
    Extract(String),

    /// A value passed extraction but is out of range
    #[error("Invalid configuration: {field} - {message}")]
    Invalid { field: String, message: String },

    /// The forward proxy URL could not be turned into a client proxy
    #[error("Invalid proxy URL '{url}': {message}")]
    InvalidProxy { url: String, message: String },
}

impl FetchError {
    /// Classify a reqwest failure for the given feed URL
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        let url = url.to_string();
        if error.is_timeout() {
            Self::Timeout { url }
        } else if error.is_decode() {
            Self::Decode {
                url,
                message: error.to_string(),
            }
        } else if let Some(status) = error.status() {
            Self::Status {
                url,
                status: status.as_u16(),
            }
        } else {
            Self::Transport {
                url,
                message: error.to_string(),
            }
        }
    }
}

impl ProbeError {
    /// Classify a reqwest failure for the probed stream URL
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        let url = url.to_string();
        if error.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Transport {
                url,
                message: error.to_string(),
            }
        }
    }
}
