use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::errors::ConfigError;
use crate::utils::proxy::ProxyTarget;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub verifier: VerifierConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long a query waits for the first aggregation cycle on cold start
    #[serde(default = "default_cold_start_wait", with = "duration_serde::duration")]
    pub cold_start_wait: Duration,
}

/// Remote feed locations and the timeout applied to every outbound request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_channels_url")]
    pub channels_url: String,
    #[serde(default = "default_streams_url")]
    pub streams_url: String,
    /// Applies to feed fetches and liveness probes alike
    #[serde(default = "default_request_timeout", with = "duration_serde::duration")]
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Forward proxy for probes. `socks*://` goes through SOCKS, anything else
    /// is treated as a plain HTTP proxy.
    #[serde(default)]
    pub proxy_url: Option<String>,
    /// User agent sent when a stream entry does not carry its own
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,
    /// Age after which a verdict is probed again. Unset keeps verdicts for
    /// the life of the process.
    #[serde(default, with = "duration_serde::option_duration")]
    pub verdict_ttl: Option<Duration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_refresh_interval", with = "duration_serde::duration")]
    pub interval: Duration,
}

/// Channel inclusion/exclusion rules, fixed for the life of the process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_include_countries")]
    pub include_countries: Vec<String>,
    #[serde(default)]
    pub exclude_countries: Vec<String>,
    #[serde(default)]
    pub include_languages: Vec<String>,
    #[serde(default)]
    pub exclude_languages: Vec<String>,
    #[serde(default)]
    pub exclude_categories: Vec<String>,
}

// Web defaults
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_cold_start_wait() -> Duration {
    Duration::from_secs(DEFAULT_COLD_START_WAIT_SECS)
}

// Upstream defaults
fn default_channels_url() -> String {
    DEFAULT_CHANNELS_URL.to_string()
}

fn default_streams_url() -> String {
    DEFAULT_STREAMS_URL.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS)
}

// Verifier defaults
fn default_user_agent() -> String {
    DEFAULT_PROBE_USER_AGENT.to_string()
}

fn default_max_concurrent_probes() -> usize {
    DEFAULT_MAX_CONCURRENT_PROBES
}

fn default_refresh_interval() -> Duration {
    Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS)
}

fn default_include_countries() -> Vec<String> {
    DEFAULT_INCLUDE_COUNTRIES
        .iter()
        .map(|c| c.to_string())
        .collect()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cold_start_wait: default_cold_start_wait(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            channels_url: default_channels_url(),
            streams_url: default_streams_url(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            proxy_url: None,
            user_agent: default_user_agent(),
            max_concurrent_probes: default_max_concurrent_probes(),
            verdict_ttl: None,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: default_refresh_interval(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            include_countries: default_include_countries(),
            exclude_countries: Vec::new(),
            include_languages: Vec::new(),
            exclude_languages: Vec::new(),
            exclude_categories: Vec::new(),
        }
    }
}

impl Config {
    /// Load the layered configuration.
    ///
    /// Order of precedence, lowest first: built-in defaults, the TOML file
    /// (skipped when it does not exist), `IPTV_<SECTION>__<KEY>` variables,
    /// then the flat variables (`FETCH_INTERVAL`, `PROXY_URL`, ...).
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = config_file {
            if path.exists() {
                info!("Loading configuration from: {}", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        let mut config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Extract(e.to_string()))?;

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document on top of the defaults (useful for testing)
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::string(toml_str))
            .extract()
            .map_err(|e| ConfigError::Extract(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply the flat environment variables.
    ///
    /// Millisecond values that are zero or fail to parse are ignored, as are
    /// empty values. List values are comma separated.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(interval) = lookup_millis(&lookup, ENV_FETCH_INTERVAL) {
            self.refresh.interval = interval;
        }
        if let Some(timeout) = lookup_millis(&lookup, ENV_FETCH_TIMEOUT) {
            self.upstream.request_timeout = timeout;
        }
        if let Some(proxy) = lookup(ENV_PROXY_URL).map(|v| v.trim().to_string()) {
            if !proxy.is_empty() {
                self.verifier.proxy_url = Some(proxy);
            }
        }

        let filter = &mut self.filter;
        for (key, target) in [
            (ENV_INCLUDE_LANGUAGES, &mut filter.include_languages),
            (ENV_INCLUDE_COUNTRIES, &mut filter.include_countries),
            (ENV_EXCLUDE_LANGUAGES, &mut filter.exclude_languages),
            (ENV_EXCLUDE_COUNTRIES, &mut filter.exclude_countries),
            (ENV_EXCLUDE_CATEGORIES, &mut filter.exclude_categories),
        ] {
            if let Some(list) = lookup(key).and_then(|raw| split_list(&raw)) {
                *target = list;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.verifier.max_concurrent_probes == 0 {
            return Err(ConfigError::Invalid {
                field: "verifier.max_concurrent_probes".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.refresh.interval.is_zero() {
            return Err(ConfigError::Invalid {
                field: "refresh.interval".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if let Some(proxy_url) = &self.verifier.proxy_url {
            ProxyTarget::parse(proxy_url)?;
        }
        Ok(())
    }
}

fn lookup_millis<F>(lookup: &F, key: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(0) => None,
        Ok(millis) => Some(Duration::from_millis(millis)),
        Err(_) => {
            warn!("Ignoring {}='{}': expected milliseconds", key, raw);
            None
        }
    }
}

fn split_list(raw: &str) -> Option<Vec<String>> {
    if raw.trim().is_empty() {
        return None;
    }
    Some(
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
    )
}
