/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Upstream feed defaults
pub const DEFAULT_CHANNELS_URL: &str = "https://iptv-org.github.io/api/channels.json";
pub const DEFAULT_STREAMS_URL: &str = "https://iptv-org.github.io/api/streams.json";
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

// Refresh defaults
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 86_400_000; // 1 day

// Verifier defaults
pub const DEFAULT_PROBE_USER_AGENT: &str = "Mozilla/5.0";
pub const DEFAULT_MAX_CONCURRENT_PROBES: usize = 32;

// Filter defaults
pub const DEFAULT_INCLUDE_COUNTRIES: &[&str] = &["GR"];

// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 7000;
pub const DEFAULT_COLD_START_WAIT_SECS: u64 = 120;

// Flat environment variables honoured on top of the layered config
pub const ENV_FETCH_INTERVAL: &str = "FETCH_INTERVAL";
pub const ENV_PROXY_URL: &str = "PROXY_URL";
pub const ENV_FETCH_TIMEOUT: &str = "FETCH_TIMEOUT";
pub const ENV_INCLUDE_LANGUAGES: &str = "INCLUDE_LANGUAGES";
pub const ENV_INCLUDE_COUNTRIES: &str = "INCLUDE_COUNTRIES";
pub const ENV_EXCLUDE_LANGUAGES: &str = "EXCLUDE_LANGUAGES";
pub const ENV_EXCLUDE_COUNTRIES: &str = "EXCLUDE_COUNTRIES";
pub const ENV_EXCLUDE_CATEGORIES: &str = "EXCLUDE_CATEGORIES";

// Structured environment overrides, e.g. IPTV_WEB__PORT=8080
pub const ENV_PREFIX: &str = "IPTV_";
