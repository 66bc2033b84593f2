//! Client configuration read from the environment.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the service lives and how long a round-trip may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Read `CLUSTER_API_URL` and `CLUSTER_API_TIMEOUT_SECS`, falling back to
    /// the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let base_url = lookup("CLUSTER_API_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.base_url);
        let timeout = match lookup("CLUSTER_API_TIMEOUT_SECS").map(|s| s.parse::<u64>()) {
            Some(Ok(secs)) if secs > 0 => Duration::from_secs(secs),
            Some(_) => {
                log::warn!("ignoring invalid CLUSTER_API_TIMEOUT_SECS");
                defaults.timeout
            }
            None => defaults.timeout,
        };
        Self { base_url, timeout }
    }
}
