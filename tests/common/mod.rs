//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use iptv_catalog::cache::CatalogCache;
use iptv_catalog::config::FilterConfig;
use iptv_catalog::errors::{FetchError, FetchResult, ProbeResult};
use iptv_catalog::ingestor::AggregationEngine;
use iptv_catalog::models::{Channel, StreamEntry};
use iptv_catalog::services::{ChannelFilter, LivenessVerifier, StreamProbe};
use iptv_catalog::sources::FeedSource;

/// In-memory feeds; `None` makes the corresponding fetch fail
#[derive(Default)]
pub struct FakeFeeds {
    channels: Mutex<Option<Vec<Channel>>>,
    streams: Mutex<Option<Vec<StreamEntry>>>,
    channel_fetches: AtomicUsize,
    stream_fetches: AtomicUsize,
}

impl FakeFeeds {
    pub fn new(channels: Vec<Channel>, streams: Vec<StreamEntry>) -> Arc<Self> {
        let feeds = Self::default();
        *feeds.channels.lock().unwrap() = Some(channels);
        *feeds.streams.lock().unwrap() = Some(streams);
        Arc::new(feeds)
    }

    pub fn set_channels(&self, channels: Option<Vec<Channel>>) {
        *self.channels.lock().unwrap() = channels;
    }

    pub fn set_streams(&self, streams: Option<Vec<StreamEntry>>) {
        *self.streams.lock().unwrap() = streams;
    }

    pub fn channel_fetches(&self) -> usize {
        self.channel_fetches.load(Ordering::SeqCst)
    }

    pub fn stream_fetches(&self) -> usize {
        self.stream_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for FakeFeeds {
    async fn fetch_channels(&self) -> FetchResult<Vec<Channel>> {
        self.channel_fetches.fetch_add(1, Ordering::SeqCst);
        self.channels
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| FetchError::Status {
                url: "fake://channels.json".to_string(),
                status: 503,
            })
    }

    async fn fetch_streams(&self) -> FetchResult<Vec<StreamEntry>> {
        self.stream_fetches.fetch_add(1, Ordering::SeqCst);
        self.streams
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| FetchError::Timeout {
                url: "fake://streams.json".to_string(),
            })
    }
}

/// Probe answering 200 for live URLs and 404 otherwise
#[derive(Default)]
pub struct FakeProbe {
    live: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, usize>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeProbe {
    pub fn new(live: &[&str]) -> Arc<Self> {
        Arc::new(Self::with_live(live, None))
    }

    pub fn slow(live: &[&str], delay: Duration) -> Arc<Self> {
        Arc::new(Self::with_live(live, Some(delay)))
    }

    fn with_live(live: &[&str], delay: Option<Duration>) -> Self {
        Self {
            live: Mutex::new(live.iter().map(|u| u.to_string()).collect()),
            delay,
            ..Self::default()
        }
    }

    pub fn set_live(&self, url: &str, live: bool) {
        let mut set = self.live.lock().unwrap();
        if live {
            set.insert(url.to_string());
        } else {
            set.remove(url);
        }
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamProbe for FakeProbe {
    async fn probe(&self, url: &str, _user_agent: &str, _referer: &str) -> ProbeResult<u16> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let live = self.live.lock().unwrap().contains(url);
        Ok(if live { 200 } else { 404 })
    }
}

pub fn channel(id: &str, country: &str, languages: &[&str], categories: &[&str]) -> Channel {
    Channel {
        id: id.to_string(),
        name: format!("{id} TV"),
        categories: categories.iter().map(|c| c.to_string()).collect(),
        languages: languages.iter().map(|l| l.to_string()).collect(),
        country: Some(country.to_string()),
        logo: Some(format!("http://logos/{id}.png")),
    }
}

pub fn stream(channel: &str, url: &str) -> StreamEntry {
    StreamEntry {
        channel: Some(channel.to_string()),
        url: url.to_string(),
        user_agent: None,
        http_referrer: None,
    }
}

pub fn orphan_stream(url: &str) -> StreamEntry {
    StreamEntry {
        channel: None,
        ..stream("", url)
    }
}

pub fn countries(include: &[&str]) -> FilterConfig {
    FilterConfig {
        include_countries: include.iter().map(|c| c.to_string()).collect(),
        ..FilterConfig::default()
    }
}

pub struct Harness {
    pub engine: Arc<AggregationEngine>,
    pub cache: Arc<CatalogCache>,
}

pub fn harness(
    feeds: Arc<FakeFeeds>,
    probe: Arc<FakeProbe>,
    filter: FilterConfig,
    max_concurrent_probes: usize,
) -> Harness {
    let cache = Arc::new(CatalogCache::default());
    let verifier = Arc::new(LivenessVerifier::new(probe, cache.clone(), "Mozilla/5.0"));
    let engine = Arc::new(AggregationEngine::new(
        feeds,
        verifier,
        cache.clone(),
        ChannelFilter::new(filter),
        max_concurrent_probes,
    ));
    Harness { engine, cache }
}
