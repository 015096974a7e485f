//! Feed source abstraction

use async_trait::async_trait;

use crate::errors::FetchResult;
use crate::models::{Channel, StreamEntry};

/// Upstream provider of the channel and stream feeds
///
/// The two feeds are independent; a failure of one says nothing about the
/// other. Implementations must bound every call with a timeout.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the full channel list
    async fn fetch_channels(&self) -> FetchResult<Vec<Channel>>;

    /// Fetch the full stream list
    async fn fetch_streams(&self) -> FetchResult<Vec<StreamEntry>>;
}
