//! Stream liveness verification
//!
//! A stream is live when a HEAD request to its URL answers with exactly
//! `200 OK`. Verdicts, positive or negative, are memoized per URL in the
//! [`CatalogCache`] so a URL is only probed once.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::cache::CatalogCache;
use crate::config::VerifierConfig;
use crate::errors::{AppResult, ProbeError, ProbeResult};
use crate::utils::{ProxyTarget, StandardHttpClient, UrlUtils};

/// Network probe behind the verifier
#[async_trait]
pub trait StreamProbe: Send + Sync {
    /// Probe `url` with the given headers and return the final HTTP status
    async fn probe(&self, url: &str, user_agent: &str, referer: &str) -> ProbeResult<u16>;
}

/// HEAD probe over HTTP, optionally through a forward proxy
pub struct HttpStreamProbe {
    client: StandardHttpClient,
}

impl HttpStreamProbe {
    pub fn new(timeout: Duration, proxy: Option<&ProxyTarget>) -> AppResult<Self> {
        Ok(Self {
            client: StandardHttpClient::for_probes(timeout, proxy)?,
        })
    }

    pub fn from_config(config: &VerifierConfig, timeout: Duration) -> AppResult<Self> {
        let proxy = config
            .proxy_url
            .as_deref()
            .map(ProxyTarget::parse)
            .transpose()?;
        Self::new(timeout, proxy.as_ref())
    }
}

#[async_trait]
impl StreamProbe for HttpStreamProbe {
    async fn probe(&self, url: &str, user_agent: &str, referer: &str) -> ProbeResult<u16> {
        let status = self.client.head_status(url, user_agent, referer).await?;
        Ok(status.as_u16())
    }
}

pub struct LivenessVerifier {
    probe: Arc<dyn StreamProbe>,
    cache: Arc<CatalogCache>,
    default_user_agent: String,
}

impl LivenessVerifier {
    pub fn new(
        probe: Arc<dyn StreamProbe>,
        cache: Arc<CatalogCache>,
        default_user_agent: impl Into<String>,
    ) -> Self {
        Self {
            probe,
            cache,
            default_user_agent: default_user_agent.into(),
        }
    }

    /// Decide whether `url` is currently reachable.
    ///
    /// A memoized verdict is returned without touching the network. Otherwise
    /// the URL is probed once and the outcome stored before returning; probe
    /// failures count as a negative verdict.
    pub async fn verify(&self, url: &str, user_agent: Option<&str>, referrer: Option<&str>) -> bool {
        if let Some(live) = self.cache.verdict(url).await {
            trace!("Using cached verdict for {}: {}", UrlUtils::obfuscate_credentials(url), live);
            return live;
        }

        let user_agent = user_agent
            .filter(|ua| !ua.is_empty())
            .unwrap_or(&self.default_user_agent);
        let referer = referrer.unwrap_or_default();

        let live = match self.probe.probe(url, user_agent, referer).await {
            Ok(200) => true,
            Ok(status) => {
                let err = ProbeError::Status {
                    url: UrlUtils::obfuscate_credentials(url),
                    status,
                };
                debug!("{}", err);
                false
            }
            Err(err) => {
                debug!("{}", err);
                false
            }
        };

        self.cache.record_verdict(url, live).await;
        live
    }
}
