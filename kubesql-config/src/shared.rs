use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::load::Config;
use crate::secret::SerializableSecretString;

/// Default poll interval for the traffic metrics table, in seconds.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// Default timeout for the initial watch listing, in seconds.
const DEFAULT_INITIAL_SYNC_TIMEOUT_SECS: u64 = 60;

/// Default capacity of the per-subscription event channel.
const DEFAULT_EVENT_BUFFER_SIZE: usize = 1024;

/// Errors raised when validating a [`KubesqlConfig`].
///
/// A validation failure is fatal at startup: running with a half-initialized
/// source client is worse than not running at all.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("the cluster API URL must be a non-empty http(s) URL")]
    InvalidClusterApiUrl,

    #[error("the Prometheus URL must be a non-empty http(s) URL")]
    InvalidPrometheusUrl,

    #[error("the metrics poll interval must be greater than zero")]
    PollIntervalZero,

    #[error("the initial sync timeout must be greater than zero")]
    InitialSyncTimeoutZero,
}

/// Top-level configuration for a kubesql deployment.
///
/// Contains the connection settings for the watched cluster, the pull-based
/// metrics endpoint, and the tunables of the sync engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KubesqlConfig {
    /// Connection settings for the cluster whose state is mirrored.
    pub cluster: ClusterConfig,
    /// Settings for the pull-based traffic metrics table.
    pub metrics: MetricsConfig,
    /// Sync engine tunables.
    #[serde(default)]
    pub sync: SyncConfig,
}

impl KubesqlConfig {
    /// Validates the configuration.
    ///
    /// Checks that both upstream endpoints look usable and that the engine
    /// tunables are non-degenerate.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_http_url(&self.cluster.api_url) {
            return Err(ValidationError::InvalidClusterApiUrl);
        }

        if !is_http_url(&self.metrics.prometheus_url) {
            return Err(ValidationError::InvalidPrometheusUrl);
        }

        if self.metrics.poll_interval_secs == 0 {
            return Err(ValidationError::PollIntervalZero);
        }

        if self.sync.initial_sync_timeout_secs == 0 {
            return Err(ValidationError::InitialSyncTimeoutZero);
        }

        Ok(())
    }
}

impl Config for KubesqlConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}

/// Connection settings for the watched cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Base URL of the cluster API server.
    pub api_url: String,
    /// Optional bearer token used to authenticate against the API server.
    pub token: Option<SerializableSecretString>,
}

/// Settings for the pull-based traffic metrics table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Base URL of the Prometheus-compatible query endpoint.
    pub prometheus_url: String,
    /// Seconds between two refresh cycles of the traffic table.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Query set to run each cycle. When empty, the engine's built-in
    /// query set is used.
    #[serde(default)]
    pub queries: Vec<MetricQueryConfig>,
}

/// One named metric query run each refresh cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricQueryConfig {
    /// Series name written into the `metric` column.
    pub name: String,
    /// Query expression sent to the metrics endpoint.
    pub expr: String,
}

/// Sync engine tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds to wait for a watch subscription's initial full listing
    /// before giving up on that table.
    #[serde(default = "default_initial_sync_timeout_secs")]
    pub initial_sync_timeout_secs: u64,
    /// Capacity of the per-subscription event channel.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            initial_sync_timeout_secs: DEFAULT_INITIAL_SYNC_TIMEOUT_SECS,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_initial_sync_timeout_secs() -> u64 {
    DEFAULT_INITIAL_SYNC_TIMEOUT_SECS
}

fn default_event_buffer_size() -> usize {
    DEFAULT_EVENT_BUFFER_SIZE
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> KubesqlConfig {
        KubesqlConfig {
            cluster: ClusterConfig {
                api_url: "https://cluster.local:6443".to_string(),
                token: None,
            },
            metrics: MetricsConfig {
                prometheus_url: "http://prometheus.istio-system:9090".to_string(),
                poll_interval_secs: 300,
                queries: Vec::new(),
            },
            sync: SyncConfig::default(),
        }
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn rejects_non_http_cluster_url() {
        let mut config = valid_config();
        config.cluster.api_url = "cluster.local".to_string();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidClusterApiUrl)
        ));
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let mut config = valid_config();
        config.metrics.poll_interval_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::PollIntervalZero)
        ));
    }

    #[test]
    fn sync_defaults_are_applied() {
        let json = r#"{
            "cluster": {"api_url": "https://cluster.local:6443", "token": null},
            "metrics": {"prometheus_url": "http://prometheus:9090"}
        }"#;
        let config: KubesqlConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.metrics.poll_interval_secs, 300);
        assert_eq!(config.sync.initial_sync_timeout_secs, 60);
        assert_eq!(config.sync.event_buffer_size, 1024);
    }
}
