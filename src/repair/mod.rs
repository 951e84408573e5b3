//! Container network repair
//!
//! Checks that every networked container has a checkpoint and, in fix mode,
//! rebuilds each container's macvlan interface from it. Containers are
//! processed one at a time; a failure is logged and the batch moves on.

use crate::checkpoint::{CheckpointStore, Interface};
use crate::config::UplinkConfig;
use crate::docker::ContainerInventory;
use crate::error::{DockerError, RepairError};
use crate::network::{LinkOps, NetworkBackend};
use tracing::{error, info, info_span, warn, Instrument};

pub mod address;
pub mod provision;
pub mod uplink;

pub use address::restore_addresses;
pub use provision::{create_macvlan, MacvlanSpec};
pub use uplink::ensure_vlan;

/// Result of the checkpoint presence check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Missing,
}

/// Result of one container's repair attempt
#[derive(Debug)]
pub enum RepairOutcome {
    Repaired(Interface),
    /// The interface already exists in the namespace; nothing was changed
    Intact,
    Failed(RepairError),
}

/// Everything a run found and did
#[derive(Debug, Default)]
pub struct RepairReport {
    pub checked: Vec<(String, CheckStatus)>,
    /// Fix phase skipped because checkpoints are missing and checking is on
    pub gated: bool,
    pub repairs: Vec<(String, RepairOutcome)>,
}

impl RepairReport {
    pub fn missing(&self) -> Vec<&str> {
        self.checked
            .iter()
            .filter(|(_, status)| *status == CheckStatus::Missing)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn repaired(&self) -> usize {
        self.count(|o| matches!(o, RepairOutcome::Repaired(_)))
    }

    pub fn intact(&self) -> usize {
        self.count(|o| matches!(o, RepairOutcome::Intact))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RepairOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&RepairOutcome) -> bool) -> usize {
        self.repairs.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Operator-facing result of the check phase
///
/// Missing ids are listed one per line whether or not the check gates the fix.
pub fn check_summary(missing: &[&str], check: bool) -> String {
    match (missing.is_empty(), check) {
        (true, _) => "checkpoint files of containers are ok".to_string(),
        (false, true) => format!(
            "{} \ncheckpoint file not exist, check it manually",
            missing.join("\n")
        ),
        (false, false) => format!(
            "{} \ncheckpoint file not exist, check disabled, repairing the rest",
            missing.join("\n")
        ),
    }
}

/// Drives the check and fix phases
pub struct Repairer<I, B> {
    inventory: I,
    backend: B,
    store: CheckpointStore,
    uplink: UplinkConfig,
}

impl<I, B> Repairer<I, B>
where
    I: ContainerInventory,
    B: NetworkBackend,
{
    pub fn new(inventory: I, backend: B, store: CheckpointStore, uplink: UplinkConfig) -> Self {
        Self {
            inventory,
            backend,
            store,
            uplink,
        }
    }

    /// Run the check phase and, when `fix` is set and the check allows it, the repair
    ///
    /// Only a failure to list containers is returned as an error.
    pub async fn run(&self, check: bool, fix: bool) -> Result<RepairReport, DockerError> {
        let ids: Vec<String> = self
            .inventory
            .list_containers()
            .await?
            .into_iter()
            .filter(|c| c.has_networks)
            .map(|c| c.id)
            .collect();

        let mut report = RepairReport::default();
        for id in &ids {
            let status = if self.store.exists(id) {
                CheckStatus::Ok
            } else {
                CheckStatus::Missing
            };
            report.checked.push((id.clone(), status));
        }

        let missing = report.missing();
        println!("{}", check_summary(&missing, check));
        if check && !missing.is_empty() {
            report.gated = true;
            return Ok(report);
        }
        if !missing.is_empty() {
            warn!(
                "checkpoint check disabled, {} containers have no checkpoint",
                missing.len()
            );
        }

        if !fix {
            return Ok(report);
        }

        for id in ids {
            let span = info_span!("repair", container = %id);
            let outcome = match self.repair_container(&id).instrument(span).await {
                Ok(Some(iface)) => RepairOutcome::Repaired(iface),
                Ok(None) => RepairOutcome::Intact,
                Err(e) => {
                    error!(
                        "repair of container {} failed at {} stage, checkpoint file {}: {}",
                        id,
                        e.stage(),
                        self.store.path_for(&id).display(),
                        e
                    );
                    RepairOutcome::Failed(e)
                }
            };
            report.repairs.push((id, outcome));
        }

        Ok(report)
    }

    /// Rebuild one container's interface; `Ok(None)` when it is already present
    async fn repair_container(&self, id: &str) -> Result<Option<Interface>, RepairError> {
        let file = self.store.path_for(id);
        let record = self.store.load(id)?;

        let namespace_error = |source| RepairError::Namespace {
            path: record.netns.clone(),
            source,
        };
        let (netns, links) = self
            .backend
            .open_netns(&record.netns)
            .map_err(namespace_error)?;

        if links
            .link_by_name(&record.ifname)
            .await
            .map_err(namespace_error)?
            .is_some()
        {
            info!(ifname = %record.ifname, "interface already present, skipping");
            return Ok(None);
        }

        let uplink = ensure_vlan(self.backend.host(), &self.uplink)
            .await
            .map_err(RepairError::Uplink)?;

        let spec = MacvlanSpec {
            ifname: &record.ifname,
            mtu: self.uplink.mtu,
            mac: record.recorded_mac(),
        };
        let iface = create_macvlan(self.backend.host(), &links, &netns, &uplink, spec)
            .await
            .map_err(RepairError::Provision)?;
        info!(
            "create macvlanInterface success! id {} file {} => name {} mac {}({}) sandbox {}",
            id,
            file.display(),
            iface.name,
            iface.mac,
            record.recorded_mac().unwrap_or(""),
            iface.sandbox
        );

        restore_addresses(
            &links,
            &netns,
            &record.ifname,
            record.result.clone(),
            iface.clone(),
        )
        .await
        .map_err(RepairError::Address)?;

        info!(pod = %record.podname, sandbox = %record.sandbox, "container network restored");
        Ok(Some(iface))
    }
}
