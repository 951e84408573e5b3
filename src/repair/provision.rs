//! Macvlan creation inside a container namespace
//!
//! The interface is created under a random name and only renamed once it is
//! inside the container namespace, so it never collides with a host link
//! carrying the final name. Once the link exists, every failure deletes it
//! before the error is returned.

use crate::checkpoint::Interface;
use crate::error::NetworkError;
use crate::network::{format_mac, parse_mac, sysctl, LinkInfo, LinkOps, NamespaceOps};
use tracing::{debug, warn};

/// Random `vethXXXXXXXX` name for the not-yet-renamed interface
pub fn temporary_link_name() -> String {
    let bytes: [u8; 4] = rand::random();
    format!(
        "veth{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3]
    )
}

/// What to build inside the container namespace
#[derive(Debug, Clone, Copy)]
pub struct MacvlanSpec<'a> {
    /// Final interface name inside the namespace
    pub ifname: &'a str,
    pub mtu: u32,
    /// Hardware address to apply; the kernel's choice is kept when `None`
    pub mac: Option<&'a str>,
}

/// Create a bridge-mode macvlan on `uplink` inside `netns`
///
/// `host` must be bound to the namespace owning `uplink` and `container` to
/// `netns`. Returns the interface as observed after configuration.
pub async fn create_macvlan<H, C, N>(
    host: &H,
    container: &C,
    netns: &N,
    uplink: &LinkInfo,
    spec: MacvlanSpec<'_>,
) -> Result<Interface, NetworkError>
where
    H: LinkOps,
    C: LinkOps,
    N: NamespaceOps,
{
    let tmp_name = temporary_link_name();

    host.add_macvlan(&tmp_name, uplink.index, spec.mtu, netns.raw_fd())
        .await?;

    match configure(container, netns, &tmp_name, spec).await {
        Ok(iface) => Ok(iface),
        Err(err) => {
            remove_leftover(container, &tmp_name, spec.ifname).await;
            Err(err)
        }
    }
}

/// Delete the link under whichever name it carries after a failed configure
///
/// The lookup that failed may have been the one locating the link, so it is
/// searched again. The final name is only tried once the kernel reports the
/// temporary name gone, i.e. the rename went through.
async fn remove_leftover<C: LinkOps>(container: &C, tmp_name: &str, ifname: &str) {
    let found = match container.link_by_name(tmp_name).await {
        Ok(None) => container.link_by_name(ifname).await,
        other => other,
    };
    match found {
        Ok(Some(link)) => {
            if let Err(e) = container.delete(link.index).await {
                warn!(tmp_name, error = %e, "failed to remove macvlan after error");
            }
        }
        Ok(None) => warn!(tmp_name, "macvlan not found for removal"),
        Err(e) => warn!(tmp_name, error = %e, "failed to look up macvlan for removal"),
    }
}

/// Steps run against the freshly created link; the caller rolls back on error
async fn configure<C, N>(
    container: &C,
    netns: &N,
    tmp_name: &str,
    spec: MacvlanSpec<'_>,
) -> Result<Interface, NetworkError>
where
    C: LinkOps,
    N: NamespaceOps,
{
    let created = refetch(container, tmp_name).await?;
    debug!(tmp_name, index = created.index, "macvlan created in container namespace");

    // TODO: set net.ipv6.conf.<if>.proxy_ndp too once IPv6 announcements are supported
    netns.set_sysctl(&sysctl::proxy_arp_key(tmp_name), "1")?;

    let mac = spec.mac.map(parse_mac).transpose()?;

    container.rename(created.index, spec.ifname).await?;

    let mut link = refetch(container, spec.ifname).await?;
    if let Some(mac) = mac {
        container.set_hardware_addr(link.index, mac).await?;
        link = refetch(container, spec.ifname).await?;
    }

    Ok(Interface {
        name: link.name,
        mac: link.mac.as_ref().map(format_mac).unwrap_or_default(),
        sandbox: netns.path().display().to_string(),
    })
}

async fn refetch<C: LinkOps>(container: &C, ifname: &str) -> Result<LinkInfo, NetworkError> {
    container
        .link_by_name(ifname)
        .await?
        .ok_or_else(|| NetworkError::LinkNotFound {
            name: ifname.to_string(),
        })
}
