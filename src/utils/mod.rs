//! Utility modules for the IPTV catalog service
//!
//! Reusable HTTP and URL helpers shared by the feed sources and the
//! liveness verifier.

pub mod http_client;
pub mod proxy;
pub mod url;

// Re-export commonly used types for convenience
pub use http_client::StandardHttpClient;
pub use proxy::{ProxyKind, ProxyTarget};
pub use url::UrlUtils;
