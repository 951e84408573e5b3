//! Command-line argument parsing

use crate::config::AppConfig;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Command-line arguments structure
#[derive(Parser, Debug)]
#[command(name = "macvlan-repair")]
#[command(about = "Restore macvlan container networking from CNI checkpoints")]
#[command(version)]
pub struct CliArgs {
    /// Verify that every networked container has a checkpoint file
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        help = "Check that a checkpoint exists for every running container"
    )]
    pub check: bool,

    /// Rebuild container interfaces from their checkpoints
    #[arg(
        long,
        default_value_t = false,
        action = ArgAction::Set,
        help = "Repair container interfaces"
    )]
    pub fix: bool,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, help = "Set the logging level")]
    pub log_level: Option<String>,

    #[arg(long, help = "Directory holding per-container checkpoint files")]
    pub checkpoint_dir: Option<PathBuf>,

    /// Docker socket path
    #[arg(long, help = "Path to Docker socket")]
    pub docker_socket: Option<String>,

    #[arg(long, help = "Preferred parent interface for the VLAN uplink")]
    pub primary_uplink: Option<String>,

    #[arg(long, help = "Fallback parent interface when the primary is absent")]
    pub secondary_uplink: Option<String>,

    #[arg(long, help = "VLAN tag of the shared uplink")]
    pub vlan_id: Option<u16>,

    #[arg(long, help = "MTU of recreated macvlan interfaces")]
    pub mtu: Option<u32>,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit without touching containers")]
    pub validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    pub print_default_config: bool,
}

impl CliArgs {
    /// Apply CLI arguments over base configuration
    pub fn apply_to_config(&self, mut base_config: AppConfig) -> AppConfig {
        if let Some(ref level) = self.log_level {
            base_config.log_level = level.clone();
        }

        if let Some(ref dir) = self.checkpoint_dir {
            base_config.checkpoint_dir = dir.clone();
        }

        if let Some(ref socket) = self.docker_socket {
            base_config.docker_socket = socket.clone();
        }

        if let Some(ref primary) = self.primary_uplink {
            base_config.uplink.primary = primary.clone();
        }

        if let Some(ref secondary) = self.secondary_uplink {
            base_config.uplink.secondary = secondary.clone();
        }

        if let Some(vlan_id) = self.vlan_id {
            base_config.uplink.vlan_id = vlan_id;
        }

        if let Some(mtu) = self.mtu {
            base_config.uplink.mtu = mtu;
        }

        base_config
    }
}

/// Print default configuration in TOML format
pub fn print_default_config() {
    let default_config = AppConfig::default();

    println!("# Macvlan Repair Configuration");
    println!("# This is the default configuration with all available options");
    println!();
    println!("# Directory holding one checkpoint file per container short id");
    println!(
        "checkpoint_dir = \"{}\"",
        default_config.checkpoint_dir.display()
    );
    println!();
    println!("[logging]");
    println!("# Log level: trace, debug, info, warn, error");
    println!("level = \"{}\"", default_config.log_level);
    println!();
    println!("[docker]");
    println!("# Path to Docker socket");
    println!("socket = \"{}\"", default_config.docker_socket);
    println!();
    println!("[uplink]");
    println!("# The VLAN link <parent>.<vlan_id> is created on the primary NIC,");
    println!("# or on the secondary one when the primary does not exist");
    println!("primary = \"{}\"", default_config.uplink.primary);
    println!("secondary = \"{}\"", default_config.uplink.secondary);
    println!("vlan_id = {}", default_config.uplink.vlan_id);
    println!("mtu = {}", default_config.uplink.mtu);
}
