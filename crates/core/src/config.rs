//! Runtime configuration, with environment overrides.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_DISCOVERY_TIMEOUT_MS: &str = "VREPO_DISCOVERY_TIMEOUT_MS";
pub const ENV_TRANSFER_TIMEOUT_MS: &str = "VREPO_TRANSFER_TIMEOUT_MS";
pub const ENV_SHUTDOWN_GRACE_MS: &str = "VREPO_SHUTDOWN_GRACE_MS";
pub const ENV_WORKER_THREADS: &str = "VREPO_WORKER_THREADS";

pub const DEFAULT_DISCOVERY_IDLE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(3 * 60);
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrConfig {
    /// Longest wait for the next discovery task to complete.
    #[serde(with = "serde_millis")]
    pub discovery_idle_timeout: Duration,
    /// Ceiling on the wait for a single retrieval or publication.
    #[serde(with = "serde_millis")]
    pub transfer_timeout: Duration,
    /// How long shutdown waits for in-flight work.
    #[serde(with = "serde_millis")]
    pub shutdown_grace: Duration,
    /// Worker threads of the shared pool; `None` keeps the tokio default.
    pub worker_threads: Option<usize>,
}

impl Default for VrConfig {
    fn default() -> Self {
        Self {
            discovery_idle_timeout: DEFAULT_DISCOVERY_IDLE_TIMEOUT,
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            worker_threads: None,
        }
    }
}

impl VrConfig {
    /// Defaults overridden by `VREPO_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `VREPO_*` keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(ms) = parse::<u64>(&lookup, ENV_DISCOVERY_TIMEOUT_MS) {
            config.discovery_idle_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse::<u64>(&lookup, ENV_TRANSFER_TIMEOUT_MS) {
            config.transfer_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse::<u64>(&lookup, ENV_SHUTDOWN_GRACE_MS) {
            config.shutdown_grace = Duration::from_millis(ms);
        }
        if let Some(threads) = parse::<usize>(&lookup, ENV_WORKER_THREADS) {
            config.worker_threads = Some(threads.max(1));
        }

        config
    }

    pub fn with_discovery_idle_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_idle_timeout = timeout;
        self
    }

    pub fn with_transfer_timeout(mut self, timeout: Duration) -> Self {
        self.transfer_timeout = timeout;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads.max(1));
        self
    }
}

fn parse<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("ignoring unparsable value {:?} for {}", raw, key);
            None
        }
    }
}

pub(crate) mod serde_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
