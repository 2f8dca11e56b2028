//! Configuration system for gtledd.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $GTLED_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/gtled/config.toml
//!   3. ~/.config/gtled/config.toml

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::wire::{DEFAULT_PORT, DEFAULT_STREAM_CHUNK_SIZE};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub network: NetworkConfig,
    pub leds: LedConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address the control socket binds to.
    pub bind_addr: IpAddr,
    /// UDP port for the control protocol.
    pub port: u16,
    /// Station address reported by discovery. Empty = probe the routing table.
    pub station_ip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedConfig {
    /// Number of pixels on the strip. Also bounds sparse index lists.
    pub count: usize,
    /// Payload bytes per StreamFrame chunk, agreed with senders.
    pub stream_chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file holding the device record.
    pub device_config_path: PathBuf,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            station_ip: String::new(),
        }
    }
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            count: 300,
            stream_chunk_size: DEFAULT_STREAM_CHUNK_SIZE,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            device_config_path: data_dir().join("device.json"),
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("gtled")
}

pub fn data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".local").join("share"))
        .join("gtled")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl DaemonConfig {
    /// Load config: env vars → file → defaults, then validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            Self::from_toml(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            DaemonConfig::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("GTLED_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&DaemonConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Socket address the daemon listens on.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.network.bind_addr, self.network.port)
    }

    /// Statically configured station address, if any.
    pub fn station_ip(&self) -> Result<Option<Ipv4Addr>, ConfigError> {
        let raw = self.network.station_ip.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(|_| ConfigError::Invalid {
            key: "network.station_ip",
            reason: format!("{raw:?} is not an IPv4 address"),
        })
    }

    /// Size in bytes of one full RGB frame.
    pub fn frame_len(&self) -> usize {
        self.leds.count * 3
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.leds.count == 0 || self.leds.count > u16::MAX as usize {
            return Err(ConfigError::Invalid {
                key: "leds.count",
                reason: format!("{} is outside 1..=65535", self.leds.count),
            });
        }
        if self.leds.stream_chunk_size == 0 || self.leds.stream_chunk_size > self.frame_len() {
            return Err(ConfigError::Invalid {
                key: "leds.stream_chunk_size",
                reason: format!(
                    "{} is outside 1..={} (one full frame)",
                    self.leds.stream_chunk_size,
                    self.frame_len()
                ),
            });
        }
        self.station_ip()?;
        Ok(())
    }

    /// Apply GTLED_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("GTLED_NETWORK__BIND_ADDR") {
            if let Ok(addr) = v.parse() {
                self.network.bind_addr = addr;
            }
        }
        if let Ok(v) = std::env::var("GTLED_NETWORK__PORT") {
            if let Ok(p) = v.parse() {
                self.network.port = p;
            }
        }
        if let Ok(v) = std::env::var("GTLED_NETWORK__STATION_IP") {
            self.network.station_ip = v;
        }
        if let Ok(v) = std::env::var("GTLED_LEDS__COUNT") {
            if let Ok(n) = v.parse() {
                self.leds.count = n;
            }
        }
        if let Ok(v) = std::env::var("GTLED_LEDS__STREAM_CHUNK_SIZE") {
            if let Ok(n) = v.parse() {
                self.leds.stream_chunk_size = n;
            }
        }
        if let Ok(v) = std::env::var("GTLED_STORAGE__DEVICE_CONFIG_PATH") {
            self.storage.device_config_path = PathBuf::from(v);
        }
    }
}
