//! Environment variable configuration handling

use crate::config::AppConfig;
use crate::error::ConfigError;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable prefix
const ENV_PREFIX: &str = "MACVLAN_REPAIR_";

/// Apply environment variable configuration over base configuration
pub fn apply_env_config(base_config: AppConfig) -> Result<AppConfig, ConfigError> {
    apply_env_from(base_config, |key| env::var(key).ok())
}

/// Apply configuration from an arbitrary variable source
fn apply_env_from<F>(mut base_config: AppConfig, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

    if let Some(dir) = var("CHECKPOINT_DIR") {
        base_config.checkpoint_dir = PathBuf::from(dir);
    }

    if let Some(socket) = var("DOCKER_SOCKET") {
        base_config.docker_socket = socket;
    }

    if let Some(level) = var("LOG_LEVEL") {
        base_config.log_level = level;
    }

    if let Some(primary) = var("PRIMARY_UPLINK") {
        base_config.uplink.primary = primary;
    }

    if let Some(secondary) = var("SECONDARY_UPLINK") {
        base_config.uplink.secondary = secondary;
    }

    if let Some(vlan_id) = var("VLAN_ID") {
        base_config.uplink.vlan_id = parse_number("VLAN_ID", &vlan_id)?;
    }

    if let Some(mtu) = var("MTU") {
        base_config.uplink.mtu = parse_number("MTU", &mtu)?;
    }

    Ok(base_config)
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| {
        ConfigError::InvalidFormat(format!(
            "Invalid value '{}' for {}{}",
            value, ENV_PREFIX, name
        ))
    })
}
