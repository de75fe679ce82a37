//! Graph search configuration.
//!
//! Configuration via environment variables (see [`GraphSearchConfig::from_env`]):
//!
//! - `SLP_GS_HOST` - gs++ host (default: `https://gs.fountainhead.cash`)
//! - `SLP_GS_CONNECT_TIMEOUT_SECS` - connect timeout (default: 60)
//! - `SLP_GS_READ_TIMEOUT_SECS` - longest wait for each chunk of a response (default: 60)
//! - `SLP_GS_PROGRESS_INTERVAL_MS` - minimum gap between progress updates (default: 2000)
//! - `SLP_GS_CACHE_CAPACITY` - per-job transaction cache entries (default: 10,000,000)
//! - `SLP_GS_CACHE_TTL_SECS` - per-job transaction cache time-to-live (default: 1800)
//! - `SLP_GS_SWEEP_INTERVAL_SECS` - how often the worker drops expired transactions (default: 60)
//! - `SLP_GS_THREAD_NAME` - worker thread name prefix (default: `GraphSearch`)

use std::time::Duration;

use slp_transport::resolve_gs_host;
use slp_types::env_utils::{env_millis_or, env_secs_or, env_string_or, env_var_or};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000_000;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(1800);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_THREAD_NAME: &str = "GraphSearch";

#[derive(Debug, Clone)]
pub struct GraphSearchConfig {
    /// gs++ host used when a validation job does not name one.
    pub host: String,
    pub connect_timeout: Duration,
    /// Idle limit per socket read; a silent server fails the job.
    pub read_timeout: Duration,
    /// Progress callbacks fire at most once per interval while streaming.
    pub progress_interval: Duration,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    pub sweep_interval: Duration,
    /// Worker thread name prefix; the thread is named `<prefix>/search`.
    pub thread_name: String,
}

impl Default for GraphSearchConfig {
    fn default() -> Self {
        Self {
            host: slp_transport::DEFAULT_GS_HOST.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: DEFAULT_CACHE_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl GraphSearchConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: resolve_gs_host(None),
            connect_timeout: env_secs_or("SLP_GS_CONNECT_TIMEOUT_SECS", defaults.connect_timeout),
            read_timeout: env_secs_or("SLP_GS_READ_TIMEOUT_SECS", defaults.read_timeout),
            progress_interval: env_millis_or(
                "SLP_GS_PROGRESS_INTERVAL_MS",
                defaults.progress_interval,
            ),
            cache_capacity: env_var_or("SLP_GS_CACHE_CAPACITY", defaults.cache_capacity),
            cache_ttl: env_secs_or("SLP_GS_CACHE_TTL_SECS", defaults.cache_ttl),
            sweep_interval: env_secs_or("SLP_GS_SWEEP_INTERVAL_SECS", defaults.sweep_interval),
            thread_name: env_string_or("SLP_GS_THREAD_NAME", &defaults.thread_name),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GraphSearchConfig::default();
        assert_eq!(config.cache_ttl, Duration::from_secs(1800));
        assert_eq!(config.cache_capacity, 10_000_000);
        assert_eq!(config.connect_timeout, Duration::from_secs(60));
        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert_eq!(config.progress_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_from_env_overrides() {
        std::env::set_var("SLP_GS_CACHE_TTL_SECS", "5");
        std::env::set_var("SLP_GS_PROGRESS_INTERVAL_MS", "100");
        let config = GraphSearchConfig::from_env();
        assert_eq!(config.cache_ttl, Duration::from_secs(5));
        assert_eq!(config.progress_interval, Duration::from_millis(100));
        std::env::remove_var("SLP_GS_CACHE_TTL_SECS");
        std::env::remove_var("SLP_GS_PROGRESS_INTERVAL_MS");
    }
}
