//! Process-wide store for fetched feeds, the derived catalog and verdicts
//!
//! Every slot is either empty or holds the most recent successfully derived
//! value. Lists are shared as `Arc<Vec<_>>` so a commit is a pointer swap and
//! readers never observe a half-built catalog.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tracing::debug;

use crate::models::{CatalogEntry, Channel, StreamEntry};

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

/// Addressable slots of the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Channels,
    Streams,
    Catalog,
    Verdict(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerdictRecord {
    pub live: bool,
    pub checked_at: DateTime<Utc>,
}

/// Snapshot of the store, reported by the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub channels: Option<usize>,
    pub streams: Option<usize>,
    pub catalog_entries: Option<usize>,
    pub verdicts: usize,
    pub live_verdicts: usize,
    pub completed_cycles: u64,
    pub last_commit_at: Option<DateTime<Utc>>,
}

pub struct CatalogCache {
    channels: RwLock<Option<Arc<Vec<Channel>>>>,
    streams: RwLock<Option<Arc<Vec<StreamEntry>>>>,
    catalog: RwLock<Option<Arc<Vec<CatalogEntry>>>>,
    last_commit_at: RwLock<Option<DateTime<Utc>>>,
    verdicts: RwLock<HashMap<String, VerdictRecord>>,
    verdict_ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
    cycles: watch::Sender<u64>,
}

impl CatalogCache {
    /// Create an empty store; verdicts never expire unless a TTL is given
    pub fn new(verdict_ttl: Option<Duration>) -> Self {
        Self::with_clock(verdict_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(verdict_ttl: Option<Duration>, clock: Arc<dyn Clock>) -> Self {
        let (cycles, _) = watch::channel(0);
        Self {
            channels: RwLock::new(None),
            streams: RwLock::new(None),
            catalog: RwLock::new(None),
            last_commit_at: RwLock::new(None),
            verdicts: RwLock::new(HashMap::new()),
            verdict_ttl,
            clock,
            cycles,
        }
    }

    pub async fn channels(&self) -> Option<Arc<Vec<Channel>>> {
        self.channels.read().await.clone()
    }

    pub async fn set_channels(&self, channels: Vec<Channel>) -> Arc<Vec<Channel>> {
        let channels = Arc::new(channels);
        *self.channels.write().await = Some(channels.clone());
        channels
    }

    pub async fn streams(&self) -> Option<Arc<Vec<StreamEntry>>> {
        self.streams.read().await.clone()
    }

    pub async fn set_streams(&self, streams: Vec<StreamEntry>) -> Arc<Vec<StreamEntry>> {
        let streams = Arc::new(streams);
        *self.streams.write().await = Some(streams.clone());
        streams
    }

    /// The last committed catalog
    pub async fn catalog(&self) -> Option<Arc<Vec<CatalogEntry>>> {
        self.catalog.read().await.clone()
    }

    /// Replace the committed catalog in one step
    pub async fn commit_catalog(&self, entries: Vec<CatalogEntry>) -> Arc<Vec<CatalogEntry>> {
        let entries = Arc::new(entries);
        *self.catalog.write().await = Some(entries.clone());
        *self.last_commit_at.write().await = Some(self.clock.now());
        debug!("Committed catalog with {} entries", entries.len());
        entries
    }

    /// Cached verdict for `url`, ignoring one older than the verdict TTL
    pub async fn verdict(&self, url: &str) -> Option<bool> {
        let verdicts = self.verdicts.read().await;
        let record = verdicts.get(url)?;
        self.is_fresh(record).then_some(record.live)
    }

    pub async fn record_verdict(&self, url: &str, live: bool) {
        let record = VerdictRecord {
            live,
            checked_at: self.clock.now(),
        };
        self.verdicts.write().await.insert(url.to_string(), record);
    }

    pub async fn contains(&self, key: &CacheKey) -> bool {
        match key {
            CacheKey::Channels => self.channels.read().await.is_some(),
            CacheKey::Streams => self.streams.read().await.is_some(),
            CacheKey::Catalog => self.catalog.read().await.is_some(),
            CacheKey::Verdict(url) => self.verdict(url).await.is_some(),
        }
    }

    /// Record the end of an aggregation cycle, committed or not
    pub fn mark_cycle_complete(&self) -> u64 {
        let mut completed = 0;
        self.cycles.send_modify(|count| {
            *count += 1;
            completed = *count;
        });
        completed
    }

    pub fn completed_cycles(&self) -> u64 {
        *self.cycles.borrow()
    }

    /// Wait until at least one cycle has completed.
    ///
    /// Returns `false` when `timeout` elapses first.
    pub async fn wait_for_first_cycle(&self, timeout: Duration) -> bool {
        let mut cycles = self.cycles.subscribe();
        matches!(
            tokio::time::timeout(timeout, cycles.wait_for(|count| *count > 0)).await,
            Ok(Ok(_))
        )
    }

    pub async fn stats(&self) -> CacheStats {
        let (verdicts, live_verdicts) = {
            let verdicts = self.verdicts.read().await;
            (verdicts.len(), verdicts.values().filter(|v| v.live).count())
        };

        CacheStats {
            channels: self.channels.read().await.as_ref().map(|c| c.len()),
            streams: self.streams.read().await.as_ref().map(|s| s.len()),
            catalog_entries: self.catalog.read().await.as_ref().map(|c| c.len()),
            verdicts,
            live_verdicts,
            completed_cycles: self.completed_cycles(),
            last_commit_at: *self.last_commit_at.read().await,
        }
    }

    fn is_fresh(&self, record: &VerdictRecord) -> bool {
        let Some(ttl) = self.verdict_ttl else {
            return true;
        };
        match (self.clock.now() - record.checked_at).to_std() {
            Ok(age) => age < ttl,
            // Clock moved backwards
            Err(_) => true,
        }
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(None)
    }
}
