//! Macvlan Repair - rebuild container networking from CNI checkpoints
//!
//! After a host loses the kernel state created by the macvlan CNI plugin, the
//! containers keep running without a network interface. This library reads the
//! checkpoint the plugin left for each container and recreates the VLAN uplink,
//! the macvlan interface with its original MAC, and its addresses.

pub mod checkpoint;
pub mod config;
pub mod docker;
pub mod error;
pub mod network;
pub mod repair;

#[cfg(test)]
pub(crate) mod testing;

pub use error::AppError;
