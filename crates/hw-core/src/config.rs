//! Configuration for the hostwatch gateway

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Configuration for the gateway process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address to bind the WebSocket listener to
    pub bind_address: String,

    /// Settings applied to every supervised host session
    pub watch: WatchSettings,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            watch: WatchSettings::default(),
        }
    }
}

/// Per-session watch settings shared by all supervisors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    /// SSH port on the watched hosts
    pub ssh_port: u16,

    /// Timeout for a single connect attempt (also bounds one probe)
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Interval between liveness probes on a live session
    #[serde(with = "duration_secs")]
    pub probe_interval: Duration,

    /// Reconnect backoff schedule
    pub backoff: BackoffConfig,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            ssh_port: 22,
            connect_timeout: Duration::from_secs(20),
            probe_interval: Duration::from_secs(30),
            backoff: BackoffConfig::default(),
        }
    }
}

/// Reconnect backoff configuration.
///
/// Delays are applied in order on consecutive failures; once the last entry
/// is reached it repeats for every further failure until a connect succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Ordered reconnect delays
    #[serde(with = "duration_secs_list")]
    pub delays: Vec<Duration>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            delays: [5, 10, 30, 60, 600, 3600]
                .into_iter()
                .map(Duration::from_secs)
                .collect(),
        }
    }
}

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hostwatch")
}

/// Get the default configuration file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("gateway.toml")
}

/// Load configuration from a file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to a file
pub fn save_config<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConfigError::Invalid(format!("Failed to create config dir: {}", e)))?;
    }

    std::fs::write(path, content)
        .map_err(|e| ConfigError::Invalid(format!("Failed to write config: {}", e)))?;

    Ok(())
}

// Helper module for Duration serialization as whole seconds
mod duration_secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Same, for a list of Durations
mod duration_secs_list {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(delays: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(delays.iter().map(|d| d.as_secs()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Vec::<u64>::deserialize(deserializer)?;
        Ok(secs.into_iter().map(Duration::from_secs).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.bind_address, "0.0.0.0:5000");
        assert_eq!(config.watch.ssh_port, 22);
        assert_eq!(config.watch.connect_timeout, Duration::from_secs(20));
        assert_eq!(config.watch.probe_interval, Duration::from_secs(30));
        assert_eq!(
            config.watch.backoff.delays,
            vec![
                Duration::from_secs(5),
                Duration::from_secs(10),
                Duration::from_secs(30),
                Duration::from_secs(60),
                Duration::from_secs(600),
                Duration::from_secs(3600),
            ]
        );
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");

        let mut config = GatewayConfig::default();
        config.bind_address = "127.0.0.1:9000".to_string();
        config.watch.probe_interval = Duration::from_secs(5);

        save_config(&path, &config).unwrap();
        let loaded: GatewayConfig = load_config(&path).unwrap();

        assert_eq!(loaded.bind_address, "127.0.0.1:9000");
        assert_eq!(loaded.watch.probe_interval, Duration::from_secs(5));
        assert_eq!(loaded.watch.backoff.delays, config.watch.backoff.delays);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: GatewayConfig = toml::from_str("bind_address = \"0.0.0.0:8080\"").unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.watch.ssh_port, 22);
    }

    #[test]
    fn test_load_missing_file() {
        let result: Result<GatewayConfig, _> = load_config(Path::new("/nonexistent/gateway.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
