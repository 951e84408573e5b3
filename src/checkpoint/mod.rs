//! Checkpoint records written by the CNI plugin at ADD time
//!
//! A checkpoint describes the namespace, interface name and CNI result the
//! plugin produced for a container. The repair reads it and never writes it.

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

pub mod store;

pub use store::CheckpointStore;

/// Persisted description of a container's network setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub netns: String,
    #[serde(default)]
    pub podname: String,
    #[serde(default)]
    pub sandbox: String,
    pub ifname: String,
    pub result: CniResult,
}

/// CNI "current" result as stored in the checkpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CniResult {
    #[serde(rename = "cniVersion", default, skip_serializing_if = "Option::is_none")]
    pub cni_version: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<Interface>,
    #[serde(default)]
    pub ips: Vec<IpConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mac: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sandbox: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub address: IpNetwork,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub dst: IpNetwork,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gw: Option<IpAddr>,
}

impl IpConfig {
    /// Whether this assignment is IPv4, preferring the recorded version tag
    pub fn is_ipv4(&self) -> bool {
        match self.version.as_deref() {
            Some(version) => version == "4",
            None => self.address.is_ipv4(),
        }
    }
}

impl CheckpointRecord {
    /// Hardware address recorded for the container interface, if any
    pub fn recorded_mac(&self) -> Option<&str> {
        self.result
            .interfaces
            .first()
            .map(|iface| iface.mac.as_str())
            .filter(|mac| !mac.is_empty())
    }
}
