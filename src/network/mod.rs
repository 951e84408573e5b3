//! Network operations module
//!
//! Kernel-facing seams used by the repair: link operations over netlink,
//! namespace-scoped operations, and the backend that hands out both.

use crate::error::NetworkError;
use ipnetwork::IpNetwork;
use std::net::{IpAddr, Ipv4Addr};
use std::os::fd::RawFd;
use std::path::Path;

pub mod arp;
pub mod ipam;
pub mod namespace;
pub mod netlink;
pub mod sysctl;

pub use mac_address::MacAddress;

/// Parse a hardware address in colon or dash notation
pub fn parse_mac(s: &str) -> Result<MacAddress, NetworkError> {
    s.parse::<MacAddress>()
        .map_err(|e| NetworkError::InvalidMac(format!("{s:?}: {e}")))
}

/// Lowercase colon notation, the form CNI results record
pub fn format_mac(mac: &MacAddress) -> String {
    mac.to_string().to_lowercase()
}

/// Attributes of a link as observed in the kernel
#[derive(Debug, Clone, PartialEq)]
pub struct LinkInfo {
    pub index: u32,
    pub name: String,
    pub mac: Option<MacAddress>,
}

/// Link, address and route operations within one network namespace
///
/// Implementations are bound to the namespace they were opened in.
#[allow(async_fn_in_trait)]
pub trait LinkOps {
    /// Look up a link by name; `Ok(None)` means the kernel reported no such device
    async fn link_by_name(&self, name: &str) -> Result<Option<LinkInfo>, NetworkError>;
    async fn add_vlan(&self, name: &str, parent_index: u32, vlan_id: u16)
        -> Result<(), NetworkError>;
    /// Create a bridge-mode macvlan and move it into the namespace behind `netns_fd`
    async fn add_macvlan(
        &self,
        name: &str,
        parent_index: u32,
        mtu: u32,
        netns_fd: RawFd,
    ) -> Result<(), NetworkError>;
    async fn set_up(&self, index: u32) -> Result<(), NetworkError>;
    async fn rename(&self, index: u32, name: &str) -> Result<(), NetworkError>;
    async fn set_hardware_addr(&self, index: u32, mac: MacAddress) -> Result<(), NetworkError>;
    async fn delete(&self, index: u32) -> Result<(), NetworkError>;
    async fn add_address(&self, index: u32, address: IpNetwork) -> Result<(), NetworkError>;
    /// Add a route via `gateway`, or a link-scoped one when there is none
    async fn add_route(
        &self,
        index: u32,
        destination: IpNetwork,
        gateway: Option<IpAddr>,
    ) -> Result<(), NetworkError>;
}

/// Operations that must run while the thread is inside the container namespace
pub trait NamespaceOps {
    /// Path identifying the namespace
    fn path(&self) -> &Path;
    /// Descriptor usable as `IFLA_NET_NS_FD`
    fn raw_fd(&self) -> RawFd;
    fn set_sysctl(&self, key: &str, value: &str) -> Result<(), NetworkError>;
    /// Broadcast a gratuitous ARP for `ip` out of `ifindex`
    fn announce(&self, ifindex: u32, mac: MacAddress, ip: Ipv4Addr) -> Result<(), NetworkError>;
}

/// Source of host and container network handles
pub trait NetworkBackend {
    type Links: LinkOps;
    type Netns: NamespaceOps;

    /// Links of the namespace this process runs in
    fn host(&self) -> &Self::Links;

    /// Open a container namespace together with a link handle bound to it
    fn open_netns(&self, path: &str) -> Result<(Self::Netns, Self::Links), NetworkError>;
}
