//! Running container listing through the Docker API

use crate::docker::{short_id, ContainerInventory, ContainerRef};
use crate::error::DockerError;
use bollard::models::ContainerSummary;
use bollard::query_parameters::ListContainersOptions;
use bollard::Docker;
use tracing::debug;

/// Container inventory backed by bollard
pub struct BollardInventory {
    docker: Docker,
}

impl BollardInventory {
    /// Connect through a Docker Unix socket
    pub fn with_socket(socket_path: &str) -> Result<Self, DockerError> {
        let docker = Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)
            .map_err(|e| {
                DockerError::ConnectionFailed(format!(
                    "Failed to connect to Docker socket {}: {}",
                    socket_path, e
                ))
            })?;
        Ok(Self { docker })
    }
}

impl ContainerInventory for BollardInventory {
    async fn list_containers(&self) -> Result<Vec<ContainerRef>, DockerError> {
        let containers = self
            .docker
            .list_containers(None::<ListContainersOptions>)
            .await
            .map_err(|e| DockerError::ApiError(e.to_string()))?;

        debug!("Docker reported {} running containers", containers.len());
        Ok(containers.iter().filter_map(container_ref).collect())
    }
}

fn container_ref(summary: &ContainerSummary) -> Option<ContainerRef> {
    let id = summary.id.as_deref()?;
    let has_networks = summary
        .network_settings
        .as_ref()
        .and_then(|settings| settings.networks.as_ref())
        .is_some_and(|networks| !networks.is_empty());

    Some(ContainerRef {
        id: short_id(id).to_string(),
        has_networks,
    })
}
