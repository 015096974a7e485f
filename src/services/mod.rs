//! Services layer
//!
//! Filtering rules, stream liveness verification and the read-only catalog
//! queries served over HTTP.

pub mod catalog;
pub mod channel_filter;
pub mod verifier;

pub use catalog::CatalogService;
pub use channel_filter::ChannelFilter;
pub use verifier::{HttpStreamProbe, LivenessVerifier, StreamProbe};
