//! Upstream feed sources
//!
//! The aggregation engine only sees the [`FeedSource`] trait, so tests can
//! swap the HTTP implementation for an in-memory one.

pub mod iptv_org;
pub mod traits;

pub use iptv_org::IptvOrgSource;
pub use traits::FeedSource;
