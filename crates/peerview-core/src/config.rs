//! Configuration system for peerview.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $PEERVIEW_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/peerview/config.toml
//!   3. ~/.config/peerview/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerviewConfig {
    pub network: NetworkConfig,
    pub pairing: PairingConfig,
    pub signaling: SignalingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address the signaling HTTP server binds to.
    pub bind_addr: String,
    /// TCP port for the signaling HTTP server. 0 = OS-assigned.
    pub port: u16,
}

/// Pairing behaviour for server-role requesters.
///
/// Fixed at startup and copied into the view computer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Servers durably claim clients instead of seeing the whole client list.
    pub enabled: bool,
    /// Honour per-server capacity. When false every server claims at most one client.
    pub respect_capacity: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalingConfig {
    /// How long a /wait request is held open before timing out.
    pub wait_timeout_secs: u64,
    /// Max messages buffered per peer while it is not waiting.
    pub mailbox_limit: usize,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            wait_timeout_secs: 30,
            mailbox_limit: 64,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
        .join("peerview")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

fn parse_flag(v: &str) -> bool {
    let v = v.trim();
    v == "1" || v.eq_ignore_ascii_case("true")
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
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl PeerviewConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            PeerviewConfig::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("PEERVIEW_CONFIG")
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
            let text = toml::to_string_pretty(&PeerviewConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply PEERVIEW_* overrides, then the legacy names the signaling
    /// server has always read (`PORT`, `WEBRTC_PEERID_*`).
    ///
    /// `lookup` resolves a variable name; `load` passes the process env.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("PEERVIEW_NETWORK__BIND_ADDR") {
            self.network.bind_addr = v;
        }
        for key in ["PEERVIEW_NETWORK__PORT", "PORT"] {
            if let Some(p) = lookup(key).and_then(|v| v.trim().parse().ok()) {
                self.network.port = p;
                break;
            }
        }
        for key in ["PEERVIEW_PAIRING__ENABLED", "WEBRTC_PEERID_PAIRING"] {
            if let Some(v) = lookup(key) {
                self.pairing.enabled = parse_flag(&v);
                break;
            }
        }
        for key in [
            "PEERVIEW_PAIRING__RESPECT_CAPACITY",
            "WEBRTC_PEERID_RESPECT_CAPACITY",
        ] {
            if let Some(v) = lookup(key) {
                self.pairing.respect_capacity = parse_flag(&v);
                break;
            }
        }
        if let Some(secs) =
            lookup("PEERVIEW_SIGNALING__WAIT_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok())
        {
            self.signaling.wait_timeout_secs = secs;
        }
    }
}
