//! Environment variable parsing utilities.
//!
//! Typed lookups with defaults, used by the `from_env` configuration
//! constructors across the workspace.
//!
//! # Example
//!
//! ```
//! use slp_types::env_utils::{env_var, env_var_or};
//!
//! let timeout: u64 = env_var_or("SLP_GS_CONNECT_TIMEOUT_SECS", 60);
//! let capacity: Option<usize> = env_var("SLP_GS_CACHE_CAPACITY");
//! ```

use std::str::FromStr;
use std::time::Duration;

/// Parse an environment variable into a type that implements `FromStr`.
///
/// Returns `None` if the variable is not set or cannot be parsed.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Parse an environment variable with a default value.
pub fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).unwrap_or(default)
}

/// Check if an environment variable is set to "1", "true", "yes" or "on".
pub fn env_bool(key: &str) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Get a non-empty string variable, falling back to `default`.
pub fn env_string_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

/// Parse a whole-second duration.
pub fn env_secs_or(key: &str, default: Duration) -> Duration {
    env_var::<u64>(key)
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// Parse a millisecond duration.
pub fn env_millis_or(key: &str, default: Duration) -> Duration {
    env_var::<u64>(key)
        .map(Duration::from_millis)
        .unwrap_or(default)
}
