//! Docker API integration module
//!
//! Lists the running containers whose network the repair may have to rebuild

use crate::error::DockerError;

pub mod inventory;

pub use inventory::BollardInventory;

/// Length of the short container id used to key checkpoint files
pub const SHORT_ID_LEN: usize = 12;

/// Running container as seen by the inventory
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerRef {
    /// Short (12 character) container id
    pub id: String,
    /// Whether the container is attached to at least one network
    pub has_networks: bool,
}

/// Container inventory trait
#[allow(async_fn_in_trait)]
pub trait ContainerInventory {
    async fn list_containers(&self) -> Result<Vec<ContainerRef>, DockerError>;
}

/// Truncate a full container id to its short form
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}
