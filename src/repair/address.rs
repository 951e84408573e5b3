//! Re-applying recorded addresses to the rebuilt interface

use crate::checkpoint::{CniResult, Interface};
use crate::error::NetworkError;
use crate::network::{ipam, LinkOps, NamespaceOps};
use std::net::IpAddr;
use tracing::{debug, info};

/// Point every IP of `result` at `iface`, the only interface of the repair
pub fn attach_to_interface(result: &mut CniResult, iface: Interface) {
    result.interfaces = vec![iface];
    for ip in &mut result.ips {
        ip.interface = Some(0);
    }
}

/// Configure `ifname` from `result` and announce its IPv4 addresses
///
/// Address and route errors abort the restoration. Announcements are best
/// effort: a failed gratuitous ARP is logged and skipped.
pub async fn restore_addresses<L, N>(
    links: &L,
    netns: &N,
    ifname: &str,
    mut result: CniResult,
    iface: Interface,
) -> Result<CniResult, NetworkError>
where
    L: LinkOps,
    N: NamespaceOps,
{
    attach_to_interface(&mut result, iface);
    ipam::configure_iface(links, ifname, &result).await?;

    let link = links
        .link_by_name(ifname)
        .await?
        .ok_or_else(|| NetworkError::LinkNotFound {
            name: ifname.to_string(),
        })?;
    let Some(mac) = link.mac else {
        debug!(ifname, "interface has no hardware address, skipping announcements");
        return Ok(result);
    };

    for ip in result.ips.iter().filter(|ip| ip.is_ipv4()) {
        if let IpAddr::V4(addr) = ip.address.ip() {
            match netns.announce(link.index, mac, addr) {
                Ok(()) => info!(ifname, %addr, "sent gratuitous ARP"),
                Err(e) => debug!(ifname, %addr, error = %e, "gratuitous ARP failed"),
            }
        }
    }

    Ok(result)
}
