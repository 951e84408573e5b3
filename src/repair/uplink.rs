//! VLAN uplink shared by all macvlan interfaces on the host

use crate::config::UplinkConfig;
use crate::error::NetworkError;
use crate::network::{LinkInfo, LinkOps};
use tracing::{debug, info};

/// Name of the VLAN link on `parent` for `vlan_id`
pub fn vlan_link_name(parent: &str, vlan_id: u16) -> String {
    format!("{parent}.{vlan_id}")
}

/// Return the `<parent>.<vlan_id>` link, creating and raising it if absent
///
/// The primary uplink is preferred; the secondary is used only when the kernel
/// reports the primary does not exist. An existing VLAN link is returned
/// untouched, so repeated calls create it at most once.
pub async fn ensure_vlan<L: LinkOps>(
    links: &L,
    uplink: &UplinkConfig,
) -> Result<LinkInfo, NetworkError> {
    let parent = match links.link_by_name(&uplink.primary).await? {
        Some(_) => uplink.primary.as_str(),
        None => {
            debug!(
                primary = %uplink.primary,
                secondary = %uplink.secondary,
                "primary uplink not found, falling back"
            );
            uplink.secondary.as_str()
        }
    };

    let vlan_name = vlan_link_name(parent, uplink.vlan_id);
    if let Some(vlan) = links.link_by_name(&vlan_name).await? {
        return Ok(vlan);
    }

    let master = links
        .link_by_name(parent)
        .await?
        .ok_or_else(|| NetworkError::LinkNotFound {
            name: parent.to_string(),
        })?;

    links
        .add_vlan(&vlan_name, master.index, uplink.vlan_id)
        .await?;

    let vlan = links
        .link_by_name(&vlan_name)
        .await?
        .ok_or_else(|| NetworkError::LinkNotFound {
            name: vlan_name.clone(),
        })?;
    links.set_up(vlan.index).await?;

    info!(vlan = %vlan_name, parent, "created vlan uplink");
    Ok(vlan)
}
