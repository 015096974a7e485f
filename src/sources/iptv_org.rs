//! HTTP feed source for the iptv-org JSON API

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use super::traits::FeedSource;
use crate::config::UpstreamConfig;
use crate::errors::{AppResult, FetchResult};
use crate::models::{Channel, StreamEntry};
use crate::utils::{StandardHttpClient, UrlUtils};

/// Fetches `channels.json` and `streams.json` over HTTP
pub struct IptvOrgSource {
    client: StandardHttpClient,
    channels_url: String,
    streams_url: String,
}

impl IptvOrgSource {
    pub fn new(
        channels_url: impl Into<String>,
        streams_url: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        Ok(Self {
            client: StandardHttpClient::new(timeout)?,
            channels_url: channels_url.into(),
            streams_url: streams_url.into(),
        })
    }

    pub fn from_config(config: &UpstreamConfig) -> AppResult<Self> {
        Self::new(
            &config.channels_url,
            &config.streams_url,
            config.request_timeout,
        )
    }
}

#[async_trait]
impl FeedSource for IptvOrgSource {
    async fn fetch_channels(&self) -> FetchResult<Vec<Channel>> {
        let channels: Vec<Channel> = self.client.fetch_json(&self.channels_url).await?;
        info!(
            "Fetched {} channels from {}",
            channels.len(),
            UrlUtils::obfuscate_credentials(&self.channels_url)
        );
        Ok(channels)
    }

    async fn fetch_streams(&self) -> FetchResult<Vec<StreamEntry>> {
        let streams: Vec<StreamEntry> = self.client.fetch_json(&self.streams_url).await?;
        let orphaned = streams.iter().filter(|s| s.channel.is_none()).count();
        info!(
            "Fetched {} streams from {}",
            streams.len(),
            UrlUtils::obfuscate_credentials(&self.streams_url)
        );
        if orphaned > 0 {
            debug!("{} stream entries carry no channel id", orphaned);
        }
        Ok(streams)
    }
}
