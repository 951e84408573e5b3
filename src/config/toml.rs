//! TOML configuration file parsing

use crate::config::AppConfig;
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;

/// TOML configuration structure
#[derive(Debug, Default, Deserialize)]
pub struct TomlConfig {
    pub checkpoint_dir: Option<PathBuf>,
    pub logging: Option<LoggingConfig>,
    pub docker: Option<DockerConfig>,
    pub uplink: Option<TomlUplinkConfig>,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// Docker configuration
#[derive(Debug, Deserialize)]
pub struct DockerConfig {
    pub socket: Option<String>,
}

/// Uplink configuration
#[derive(Debug, Deserialize)]
pub struct TomlUplinkConfig {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub vlan_id: Option<u16>,
    pub mtu: Option<u32>,
}

impl TomlConfig {
    /// Apply file values over base configuration
    pub fn apply_to_config(self, mut base_config: AppConfig) -> AppConfig {
        if let Some(dir) = self.checkpoint_dir {
            base_config.checkpoint_dir = dir;
        }

        if let Some(level) = self.logging.and_then(|l| l.level) {
            base_config.log_level = level;
        }

        if let Some(socket) = self.docker.and_then(|d| d.socket) {
            base_config.docker_socket = socket;
        }

        if let Some(uplink) = self.uplink {
            if let Some(primary) = uplink.primary {
                base_config.uplink.primary = primary;
            }
            if let Some(secondary) = uplink.secondary {
                base_config.uplink.secondary = secondary;
            }
            if let Some(vlan_id) = uplink.vlan_id {
                base_config.uplink.vlan_id = vlan_id;
            }
            if let Some(mtu) = uplink.mtu {
                base_config.uplink.mtu = mtu;
            }
        }

        base_config
    }
}

/// Load configuration from TOML file
pub fn load_toml_config(path: &str) -> Result<TomlConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_string(),
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
}
