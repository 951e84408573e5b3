//! Configuration management module
//!
//! Handles loading configuration from multiple sources with proper precedence:
//! CLI arguments > environment variables > TOML files > defaults

use crate::error::ConfigError;
use std::path::PathBuf;

pub mod cli;
pub mod env;
pub mod toml;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub checkpoint_dir: PathBuf,
    pub docker_socket: String,
    pub log_level: String,
    pub uplink: UplinkConfig,
}

/// Physical uplinks and VLAN shared by every repaired container on the host
#[derive(Debug, Clone, PartialEq)]
pub struct UplinkConfig {
    /// Preferred parent NIC
    pub primary: String,
    /// Parent used when the primary does not exist
    pub secondary: String,
    pub vlan_id: u16,
    pub mtu: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: PathBuf::from("/home/work/cni-plugins/checkpoints"),
            docker_socket: "/var/run/docker.sock".to_string(),
            log_level: "info".to_string(),
            uplink: UplinkConfig::default(),
        }
    }
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            primary: "bond4".to_string(),
            secondary: "eth0".to_string(),
            vlan_id: 3,
            mtu: 1500,
        }
    }
}

impl AppConfig {
    /// Build the effective configuration from every source
    pub fn load(cli: &cli::CliArgs) -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(ref path) = cli.config {
            let file = toml::load_toml_config(path)?;
            config = file.apply_to_config(config);
        }

        let config = env::apply_env_config(config)?;
        let config = cli.apply_to_config(config);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checkpoint_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "checkpoint_dir must not be empty".to_string(),
            ));
        }
        if self.uplink.primary.trim().is_empty() || self.uplink.secondary.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "uplink names must not be empty".to_string(),
            ));
        }
        if !(1..=4094).contains(&self.uplink.vlan_id) {
            return Err(ConfigError::ValidationError(format!(
                "vlan_id {} out of range 1-4094",
                self.uplink.vlan_id
            )));
        }
        if !(68..=65535).contains(&self.uplink.mtu) {
            return Err(ConfigError::ValidationError(format!(
                "mtu {} out of range 68-65535",
                self.uplink.mtu
            )));
        }
        Ok(())
    }
}
