//! Read-only queries over the last committed catalog

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::cache::CatalogCache;
use crate::models::{CatalogEntry, StreamInfo};

/// Query facade used by the web layer
///
/// Never triggers a fetch. Before the first aggregation cycle has completed a
/// query waits for it, up to `cold_start_wait`, and then answers from
/// whatever is committed (possibly nothing).
#[derive(Clone)]
pub struct CatalogService {
    cache: Arc<CatalogCache>,
    cold_start_wait: Duration,
}

impl CatalogService {
    pub fn new(cache: Arc<CatalogCache>, cold_start_wait: Duration) -> Self {
        Self {
            cache,
            cold_start_wait,
        }
    }

    /// Entries tagged with `locale`, narrowed to those sharing at least one
    /// of `genres` when any are given
    pub async fn list_catalog(&self, locale: &str, genres: &[String]) -> Vec<CatalogEntry> {
        self.snapshot()
            .await
            .iter()
            .filter(|entry| entry.has_genre(locale))
            .filter(|entry| genres.is_empty() || genres.iter().any(|g| entry.has_genre(g)))
            .cloned()
            .collect()
    }

    pub async fn get_meta(&self, entry_id: &str) -> Option<CatalogEntry> {
        self.snapshot()
            .await
            .iter()
            .find(|entry| entry.id == entry_id)
            .cloned()
    }

    pub async fn get_stream(&self, entry_id: &str) -> Option<StreamInfo> {
        self.snapshot()
            .await
            .iter()
            .find(|entry| entry.id == entry_id)
            .map(|entry| entry.stream_info.clone())
    }

    async fn snapshot(&self) -> Arc<Vec<CatalogEntry>> {
        if self.cache.completed_cycles() == 0
            && !self.cache.wait_for_first_cycle(self.cold_start_wait).await
        {
            warn!(
                "No aggregation cycle completed within {:?}, answering from an empty catalog",
                self.cold_start_wait
            );
        }
        self.cache.catalog().await.unwrap_or_default()
    }
}
