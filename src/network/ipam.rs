//! Applying a CNI result's addresses and routes to an interface

use crate::checkpoint::CniResult;
use crate::error::NetworkError;
use crate::network::LinkOps;
use std::net::IpAddr;
use tracing::debug;

/// Configure `ifname` with the IPs and routes of `result`
///
/// The interface is looked up through `links`, so the handle must belong to
/// the namespace holding it. Only IPs whose interface index resolves to an
/// interface named `ifname` are applied.
pub async fn configure_iface<L: LinkOps>(
    links: &L,
    ifname: &str,
    result: &CniResult,
) -> Result<(), NetworkError> {
    if result.interfaces.is_empty() {
        return Err(NetworkError::OperationFailed(
            "no interfaces to configure".to_string(),
        ));
    }

    let ips: Vec<_> = result
        .ips
        .iter()
        .filter(|ip| {
            ip.interface
                .and_then(|i| result.interfaces.get(i))
                .is_some_and(|iface| iface.name == ifname)
        })
        .collect();
    if ips.is_empty() && !result.ips.is_empty() {
        return Err(NetworkError::OperationFailed(format!(
            "no IP addresses reference interface {ifname:?}"
        )));
    }

    let link = links
        .link_by_name(ifname)
        .await?
        .ok_or_else(|| NetworkError::LinkNotFound {
            name: ifname.to_string(),
        })?;

    links.set_up(link.index).await?;

    for ip in &ips {
        debug!(ifname, address = %ip.address, "adding address");
        links.add_address(link.index, ip.address).await?;
    }

    for route in &result.routes {
        // Without any gateway of the family the route is installed on-link
        let gateway = route
            .gw
            .or_else(|| default_gateway(result, route.dst.is_ipv4()));
        debug!(ifname, dst = %route.dst, ?gateway, "adding route");
        links.add_route(link.index, route.dst, gateway).await?;
    }

    Ok(())
}

/// Gateway of the first IP of the requested family
fn default_gateway(result: &CniResult, ipv4: bool) -> Option<IpAddr> {
    result
        .ips
        .iter()
        .filter_map(|ip| ip.gateway)
        .find(|gw| gw.is_ipv4() == ipv4)
}
