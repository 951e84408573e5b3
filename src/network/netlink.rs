//! Link management using rtnetlink

use crate::error::NetworkError;
use crate::network::{LinkInfo, LinkOps, MacAddress};
use futures_util::TryStreamExt;
use ipnetwork::IpNetwork;
use rtnetlink::packet_route::link::{LinkAttribute, LinkMessage, MacVlanMode};
use rtnetlink::packet_route::route::RouteScope;
use rtnetlink::{new_connection, Handle, LinkMacVlan, LinkUnspec, LinkVlan, RouteMessageBuilder};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::os::fd::RawFd;
use tracing::debug;

/// Link operations over an rtnetlink socket
///
/// The socket belongs to the namespace the thread was in when it was opened.
pub struct RtNetlinkLinks {
    handle: Handle,
}

impl RtNetlinkLinks {
    /// Open a netlink connection in the current thread's namespace
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect() -> Result<Self, NetworkError> {
        let (connection, handle, _) =
            new_connection().map_err(|e| NetworkError::netlink("open netlink socket", e))?;

        // Spawn the connection handler
        tokio::spawn(connection);

        Ok(Self { handle })
    }
}

impl LinkOps for RtNetlinkLinks {
    async fn link_by_name(&self, name: &str) -> Result<Option<LinkInfo>, NetworkError> {
        let mut links = self
            .handle
            .link()
            .get()
            .match_name(name.to_string())
            .execute();

        match links.try_next().await {
            Ok(Some(msg)) => Ok(Some(link_info(&msg))),
            Ok(None) => Ok(None),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(NetworkError::netlink(format!("failed to lookup {name}"), e)),
        }
    }

    async fn add_vlan(
        &self,
        name: &str,
        parent_index: u32,
        vlan_id: u16,
    ) -> Result<(), NetworkError> {
        debug!(name, parent_index, vlan_id, "adding vlan link");
        self.handle
            .link()
            .add(LinkVlan::new(name, parent_index, vlan_id).build())
            .execute()
            .await
            .map_err(|e| NetworkError::netlink(format!("failed to add vlan {name}"), e))
    }

    async fn add_macvlan(
        &self,
        name: &str,
        parent_index: u32,
        mtu: u32,
        netns_fd: RawFd,
    ) -> Result<(), NetworkError> {
        debug!(name, parent_index, mtu, "adding macvlan link");
        let message = LinkMacVlan::new(name, parent_index, MacVlanMode::Bridge)
            .mtu(mtu)
            .setns_by_fd(netns_fd)
            .build();

        self.handle
            .link()
            .add(message)
            .execute()
            .await
            .map_err(|e| NetworkError::netlink("failed to create macvlan", e))
    }

    async fn set_up(&self, index: u32) -> Result<(), NetworkError> {
        self.handle
            .link()
            .set(LinkUnspec::new_with_index(index).up().build())
            .execute()
            .await
            .map_err(|e| NetworkError::netlink(format!("failed to set link {index} up"), e))
    }

    async fn rename(&self, index: u32, name: &str) -> Result<(), NetworkError> {
        self.handle
            .link()
            .set(LinkUnspec::new_with_index(index).name(name.to_string()).build())
            .execute()
            .await
            .map_err(|e| NetworkError::netlink(format!("failed to rename link to {name:?}"), e))
    }

    async fn set_hardware_addr(&self, index: u32, mac: MacAddress) -> Result<(), NetworkError> {
        self.handle
            .link()
            .set(
                LinkUnspec::new_with_index(index)
                    .address(mac.bytes().to_vec())
                    .build(),
            )
            .execute()
            .await
            .map_err(|e| NetworkError::netlink("failed to change macvlan mac", e))
    }

    async fn delete(&self, index: u32) -> Result<(), NetworkError> {
        self.handle
            .link()
            .del(index)
            .execute()
            .await
            .map_err(|e| NetworkError::netlink(format!("failed to delete link {index}"), e))
    }

    async fn add_address(&self, index: u32, address: IpNetwork) -> Result<(), NetworkError> {
        self.handle
            .address()
            .add(index, address.ip(), address.prefix())
            .execute()
            .await
            .map_err(|e| NetworkError::netlink(format!("failed to add IP addr {address}"), e))
    }

    async fn add_route(
        &self,
        index: u32,
        destination: IpNetwork,
        gateway: Option<IpAddr>,
    ) -> Result<(), NetworkError> {
        let mismatch = |gw: IpAddr| {
            NetworkError::OperationFailed(format!(
                "route {destination} via {gw}: address family mismatch"
            ))
        };
        let message = match destination {
            IpNetwork::V4(dst) => {
                let builder = RouteMessageBuilder::<Ipv4Addr>::new()
                    .destination_prefix(dst.network(), dst.prefix())
                    .output_interface(index);
                match gateway {
                    Some(IpAddr::V4(gw)) => builder.gateway(gw).build(),
                    Some(gw) => return Err(mismatch(gw)),
                    None => builder.scope(RouteScope::Link).build(),
                }
            }
            IpNetwork::V6(dst) => {
                let builder = RouteMessageBuilder::<Ipv6Addr>::new()
                    .destination_prefix(dst.network(), dst.prefix())
                    .output_interface(index);
                match gateway {
                    Some(IpAddr::V6(gw)) => builder.gateway(gw).build(),
                    Some(gw) => return Err(mismatch(gw)),
                    None => builder.scope(RouteScope::Link).build(),
                }
            }
        };

        let via = gateway.map_or_else(|| "on-link".to_string(), |gw| format!("via {gw}"));
        self.handle
            .route()
            .add(message)
            .execute()
            .await
            .map_err(|e| NetworkError::netlink(format!("failed to add route {destination} {via}"), e))
    }
}

fn link_info(msg: &LinkMessage) -> LinkInfo {
    let mut info = LinkInfo {
        index: msg.header.index,
        name: String::new(),
        mac: None,
    };
    for attr in &msg.attributes {
        match attr {
            LinkAttribute::IfName(name) => info.name = name.clone(),
            LinkAttribute::Address(bytes) => {
                info.mac = <[u8; 6]>::try_from(bytes.as_slice())
                    .ok()
                    .map(MacAddress::new)
            }
            _ => {}
        }
    }
    info
}

/// The kernel answers a lookup of a missing link with ENODEV
fn is_not_found(err: &rtnetlink::Error) -> bool {
    match err {
        rtnetlink::Error::NetlinkError(msg) => {
            msg.code.map(|code| code.get().abs()) == Some(libc::ENODEV)
        }
        _ => false,
    }
}
