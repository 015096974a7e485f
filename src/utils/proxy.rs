//! Forward proxy configuration for liveness probes
//!
//! A proxy URL whose scheme starts with `socks` is routed through SOCKS,
//! anything else is used as a plain HTTP forward proxy.

use reqwest::Proxy;
use std::fmt;
use url::Url;

use crate::errors::ConfigError;
use crate::utils::url::UrlUtils;

/// Proxy flavour derived from the URL scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    Http,
    Socks,
}

impl fmt::Display for ProxyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyKind::Http => f.write_str("http"),
            ProxyKind::Socks => f.write_str("socks"),
        }
    }
}

/// A validated forward proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    pub kind: ProxyKind,
    /// Normalized URL handed to the HTTP client
    pub url: String,
}

impl ProxyTarget {
    /// Parse and classify a proxy URL
    ///
    /// Bare `host:port` values get an `http://` scheme, and a bare `socks://`
    /// scheme is read as SOCKS5.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let normalized = UrlUtils::normalize_scheme(raw);
        let lowered = normalized.to_ascii_lowercase();

        let (kind, url) = if lowered.starts_with("socks://") {
            (
                ProxyKind::Socks,
                format!("socks5://{}", &normalized["socks://".len()..]),
            )
        } else if lowered.starts_with("socks") {
            (ProxyKind::Socks, normalized)
        } else {
            (ProxyKind::Http, normalized)
        };

        let parsed = Url::parse(&url).map_err(|e| ConfigError::InvalidProxy {
            url: UrlUtils::obfuscate_credentials(raw),
            message: e.to_string(),
        })?;
        if parsed.host_str().is_none() {
            return Err(ConfigError::InvalidProxy {
                url: UrlUtils::obfuscate_credentials(raw),
                message: "missing host".to_string(),
            });
        }

        Ok(Self { kind, url })
    }

    /// Build the reqwest proxy, applied to every request scheme
    pub fn to_reqwest(&self) -> Result<Proxy, ConfigError> {
        Proxy::all(&self.url).map_err(|e| ConfigError::InvalidProxy {
            url: UrlUtils::obfuscate_credentials(&self.url),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socks_schemes() {
        let proxy = ProxyTarget::parse("socks5://127.0.0.1:9050").unwrap();
        assert_eq!(proxy.kind, ProxyKind::Socks);
        assert_eq!(proxy.url, "socks5://127.0.0.1:9050");

        let proxy = ProxyTarget::parse("socks5h://user:pw@proxy.example.com:1080").unwrap();
        assert_eq!(proxy.kind, ProxyKind::Socks);

        let proxy = ProxyTarget::parse("socks://127.0.0.1:1080").unwrap();
        assert_eq!(proxy.kind, ProxyKind::Socks);
        assert_eq!(proxy.url, "socks5://127.0.0.1:1080");
    }

    #[test]
    fn test_http_proxy() {
        let proxy = ProxyTarget::parse("http://proxy.example.com:3128").unwrap();
        assert_eq!(proxy.kind, ProxyKind::Http);
        assert_eq!(proxy.url, "http://proxy.example.com:3128");

        let proxy = ProxyTarget::parse("proxy.example.com:3128").unwrap();
        assert_eq!(proxy.kind, ProxyKind::Http);
        assert_eq!(proxy.url, "http://proxy.example.com:3128");
    }

    #[test]
    fn test_builds_reqwest_proxy() {
        let proxy = ProxyTarget::parse("socks5://127.0.0.1:9050").unwrap();
        assert!(proxy.to_reqwest().is_ok());

        let proxy = ProxyTarget::parse("http://127.0.0.1:3128").unwrap();
        assert!(proxy.to_reqwest().is_ok());
    }

    #[test]
    fn test_invalid_proxy() {
        assert!(matches!(
            ProxyTarget::parse("http://"),
            Err(ConfigError::InvalidProxy { .. })
        ));
    }
}
