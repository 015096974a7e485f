use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, REFERER, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::errors::{AppResult, FetchError, FetchResult, ProbeError, ProbeResult};
use crate::utils::proxy::ProxyTarget;
use crate::utils::url::UrlUtils;

/// Thin wrapper over a reqwest client with a total request timeout
///
/// Every outbound operation of the service goes through one of these so a
/// slow upstream can never suspend a cycle indefinitely.
#[derive(Clone)]
pub struct StandardHttpClient {
    client: Client,
}

impl StandardHttpClient {
    /// Create a client for feed downloads
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client })
    }

    /// Create a client for stream probes, optionally routed through a proxy
    pub fn for_probes(timeout: Duration, proxy: Option<&ProxyTarget>) -> AppResult<Self> {
        let mut builder = Client::builder().timeout(timeout);
        if let Some(proxy) = proxy {
            debug!(
                "Routing stream probes through {} proxy {}",
                proxy.kind,
                UrlUtils::obfuscate_credentials(&proxy.url)
            );
            builder = builder.proxy(proxy.to_reqwest()?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Fetch URL and decode the JSON body
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> FetchResult<T> {
        let safe_url = UrlUtils::obfuscate_credentials(url);
        debug!("Fetching JSON content from: {}", safe_url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&safe_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: safe_url,
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(&safe_url, e))?;
        debug!("Fetched {} bytes from {}", bytes.len(), safe_url);

        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode {
            url: safe_url,
            message: e.to_string(),
        })
    }

    /// Issue a HEAD request and return the final status
    ///
    /// `Accept: */*` is always sent; `user_agent` and `referer` are sent
    /// verbatim, including an empty referer.
    pub async fn head_status(
        &self,
        url: &str,
        user_agent: &str,
        referer: &str,
    ) -> ProbeResult<StatusCode> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).map_err(|_| ProbeError::Transport {
                url: UrlUtils::obfuscate_credentials(url),
                message: format!("invalid user agent header '{user_agent}'"),
            })?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            REFERER,
            HeaderValue::from_str(referer).map_err(|_| ProbeError::Transport {
                url: UrlUtils::obfuscate_credentials(url),
                message: format!("invalid referer header '{referer}'"),
            })?,
        );

        let response = self
            .client
            .head(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| ProbeError::from_reqwest(&UrlUtils::obfuscate_credentials(url), e))?;

        Ok(response.status())
    }
}
