//! Aggregation of the channel and stream feeds into the verified catalog
//!
//! One cycle fetches both feeds, joins each channel to its first stream
//! entry, applies the [`ChannelFilter`], probes the surviving stream URLs with
//! bounded concurrency and commits the live channels as the new catalog.
//!
//! Upstream failures never escape a cycle. A missing stream feed degrades to
//! cached or empty streams; a missing channel feed leaves the previously
//! committed catalog untouched.

use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::CatalogCache;
use crate::models::{CatalogEntry, Channel, StreamEntry};
use crate::services::{ChannelFilter, LivenessVerifier};
use crate::sources::FeedSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleMode {
    /// Serve a committed catalog if there is one, reuse cached streams
    Initial,
    /// Always recompute from freshly fetched feeds
    Refresh,
}

pub struct AggregationEngine {
    source: Arc<dyn FeedSource>,
    verifier: Arc<LivenessVerifier>,
    cache: Arc<CatalogCache>,
    filter: ChannelFilter,
    max_concurrent_probes: usize,
}

impl AggregationEngine {
    pub fn new(
        source: Arc<dyn FeedSource>,
        verifier: Arc<LivenessVerifier>,
        cache: Arc<CatalogCache>,
        filter: ChannelFilter,
        max_concurrent_probes: usize,
    ) -> Self {
        Self {
            source,
            verifier,
            cache,
            filter,
            max_concurrent_probes: max_concurrent_probes.max(1),
        }
    }

    /// Return the committed catalog, building it first if there is none.
    ///
    /// Repeated calls after a successful build perform no network I/O.
    pub async fn aggregate(&self) -> Arc<Vec<CatalogEntry>> {
        let catalog = self.run_cycle(CycleMode::Initial).await;
        self.cache.mark_cycle_complete();
        catalog
    }

    /// Rebuild the catalog from fresh feeds, keeping memoized verdicts
    pub async fn refresh(&self) -> Arc<Vec<CatalogEntry>> {
        let catalog = self.run_cycle(CycleMode::Refresh).await;
        self.cache.mark_cycle_complete();
        catalog
    }

    async fn run_cycle(&self, mode: CycleMode) -> Arc<Vec<CatalogEntry>> {
        if mode == CycleMode::Initial {
            if let Some(catalog) = self.cache.catalog().await {
                debug!("Serving cached catalog with {} entries", catalog.len());
                return catalog;
            }
        }

        let started = Instant::now();
        let streams = self.load_streams(mode).await;

        let channels = match self.source.fetch_channels().await {
            Ok(channels) => self.cache.set_channels(channels).await,
            Err(e) => {
                warn!("Channel feed unavailable: {}", e);
                return match self.cache.catalog().await {
                    Some(previous) => {
                        info!("Keeping previous catalog with {} entries", previous.len());
                        previous
                    }
                    None => {
                        warn!("No channel list has ever been loaded, catalog is empty");
                        Arc::default()
                    }
                };
            }
        };

        let index = index_streams(&streams);
        let candidates: Vec<(&Channel, &StreamEntry)> = channels
            .iter()
            .filter(|channel| self.filter.matches(channel))
            .filter_map(|channel| {
                index
                    .get(channel.id.as_str())
                    .map(|stream| (channel, *stream))
            })
            .collect();
        debug!(
            "{} of {} channels passed filtering and have a stream",
            candidates.len(),
            channels.len()
        );

        let verdicts = self.verify_streams(&candidates).await;
        let entries: Vec<CatalogEntry> = candidates
            .into_iter()
            .filter(|(_, stream)| verdicts.get(stream.url.as_str()).copied().unwrap_or(false))
            .map(|(channel, stream)| CatalogEntry::from_channel(channel, stream))
            .collect();

        info!(
            "Aggregation cycle committed {} live channels in {:?}",
            entries.len(),
            started.elapsed()
        );
        self.cache.commit_catalog(entries).await
    }

    async fn load_streams(&self, mode: CycleMode) -> Arc<Vec<StreamEntry>> {
        if mode == CycleMode::Initial {
            if let Some(streams) = self.cache.streams().await {
                debug!("Reusing {} cached stream entries", streams.len());
                return streams;
            }
        }

        match self.source.fetch_streams().await {
            Ok(streams) => self.cache.set_streams(streams).await,
            Err(e) => {
                warn!("Stream feed unavailable: {}", e);
                match (mode, self.cache.streams().await) {
                    (CycleMode::Refresh, Some(cached)) => {
                        info!("Falling back to {} cached stream entries", cached.len());
                        cached
                    }
                    _ => Arc::default(),
                }
            }
        }
    }

    /// Probe each distinct stream URL once, at most `max_concurrent_probes`
    /// at a time, and wait for all of them
    async fn verify_streams(&self, candidates: &[(&Channel, &StreamEntry)]) -> HashMap<String, bool> {
        let mut seen = HashSet::new();
        let distinct: Vec<StreamEntry> = candidates
            .iter()
            .map(|(_, stream)| *stream)
            .filter(|stream| seen.insert(stream.url.as_str()))
            .cloned()
            .collect();

        debug!(
            "Verifying {} distinct stream URLs with up to {} concurrent probes",
            distinct.len(),
            self.max_concurrent_probes
        );

        stream::iter(distinct)
            .map(|stream| {
                let verifier = Arc::clone(&self.verifier);
                async move {
                    let live = verifier
                        .verify(
                            &stream.url,
                            stream.user_agent.as_deref(),
                            stream.http_referrer.as_deref(),
                        )
                        .await;
                    (stream.url, live)
                }
            })
            .buffer_unordered(self.max_concurrent_probes)
            .collect()
            .await
    }
}

/// Map channel id to the first stream entry listed for it
fn index_streams(streams: &[StreamEntry]) -> HashMap<&str, &StreamEntry> {
    let mut index = HashMap::new();
    for stream in streams {
        if let Some(channel) = stream.channel.as_deref() {
            index.entry(channel).or_insert(stream);
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(channel: Option<&str>, url: &str) -> StreamEntry {
        StreamEntry {
            channel: channel.map(str::to_string),
            url: url.to_string(),
            user_agent: None,
            http_referrer: None,
        }
    }

    #[test]
    fn test_index_keeps_first_entry_per_channel() {
        let streams = vec![
            stream(Some("bbc"), "http://first"),
            stream(None, "http://orphan"),
            stream(Some("bbc"), "http://second"),
            stream(Some("ert"), "http://ert"),
        ];

        let index = index_streams(&streams);
        assert_eq!(index.len(), 2);
        assert_eq!(index["bbc"].url, "http://first");
        assert_eq!(index["ert"].url, "http://ert");
    }
}
