//! In-memory kernel for unit tests
//!
//! Models links per namespace, records every mutation and lets tests make
//! individual operations fail.

use crate::docker::{ContainerInventory, ContainerRef};
use crate::error::{DockerError, NetworkError};
use crate::network::{LinkInfo, LinkOps, MacAddress, NamespaceOps, NetworkBackend};
use ipnetwork::IpNetwork;
use std::net::{IpAddr, Ipv4Addr};
use std::os::fd::RawFd;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

pub type NsId = usize;

pub const HOST: NsId = 0;
const FD_BASE: RawFd = 1000;

#[derive(Debug, Clone, PartialEq)]
pub enum LinkKind {
    Physical,
    Vlan { parent: u32, vlan_id: u16 },
    Macvlan { parent: u32, mtu: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeLink {
    pub index: u32,
    pub ns: NsId,
    pub name: String,
    pub mac: MacAddress,
    pub kind: LinkKind,
    pub up: bool,
    pub addresses: Vec<IpNetwork>,
}

/// Kernel mutation or namespace-scoped side effect
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    AddVlan { name: String, parent: u32, vlan_id: u16 },
    AddMacvlan { name: String, parent: u32, ns: NsId },
    SetUp { index: u32 },
    Rename { index: u32, name: String },
    SetMac { index: u32, mac: MacAddress },
    Delete { index: u32, name: String },
    AddAddress { index: u32, address: IpNetwork },
    AddRoute { index: u32, dst: IpNetwork, gw: Option<IpAddr> },
    Sysctl { ns: NsId, key: String, value: String },
    Announce { ns: NsId, ifindex: u32, ip: Ipv4Addr },
}

/// Operation forced to fail
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    /// Every lookup of exactly this name fails
    Lookup(String),
    /// The first lookup of a name starting with this prefix fails
    LookupOnce(String),
    AddVlan,
    AddMacvlan,
    Sysctl,
    Rename,
    SetMac,
    AddAddress,
    Announce,
}

#[derive(Default)]
struct State {
    next_index: u32,
    namespaces: Vec<PathBuf>,
    links: Vec<FakeLink>,
    routes: Vec<(NsId, IpNetwork, Option<IpAddr>)>,
    faults: Vec<Fault>,
    ops: Vec<Op>,
}

#[derive(Clone)]
pub struct FakeKernel {
    state: Arc<Mutex<State>>,
}

fn refused(what: &str) -> NetworkError {
    NetworkError::netlink(what, "operation not permitted (injected)")
}

impl FakeKernel {
    pub fn new() -> Self {
        let state = State {
            next_index: 1,
            namespaces: vec![PathBuf::from("/proc/1/ns/net")],
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn add_namespace(&self, path: &str) -> NsId {
        let mut state = self.lock();
        state.namespaces.push(PathBuf::from(path));
        state.namespaces.len() - 1
    }

    pub fn add_host_link(&self, name: &str) -> u32 {
        self.add_link_in(HOST, name)
    }

    pub fn add_link_in(&self, ns: NsId, name: &str) -> u32 {
        self.lock().insert(ns, name, LinkKind::Physical)
    }

    pub fn inject(&self, fault: Fault) {
        self.lock().faults.push(fault);
    }

    pub fn links(&self, ns: NsId) -> FakeLinks {
        FakeLinks {
            kernel: self.clone(),
            ns,
        }
    }

    pub fn netns(&self, ns: NsId) -> FakeNetns {
        let path = self.lock().namespaces[ns].clone();
        FakeNetns {
            kernel: self.clone(),
            ns,
            path,
        }
    }

    pub fn backend(&self) -> FakeBackend {
        FakeBackend {
            kernel: self.clone(),
            host: self.links(HOST),
        }
    }

    pub fn link(&self, index: u32) -> Option<FakeLink> {
        self.lock().links.iter().find(|l| l.index == index).cloned()
    }

    pub fn link_named(&self, ns: NsId, name: &str) -> Option<FakeLink> {
        self.lock().find(ns, name).cloned()
    }

    pub fn links_in(&self, ns: NsId) -> Vec<FakeLink> {
        self.lock()
            .links
            .iter()
            .filter(|l| l.ns == ns)
            .cloned()
            .collect()
    }

    pub fn routes(&self, ns: NsId) -> Vec<(IpNetwork, Option<IpAddr>)> {
        self.lock()
            .routes
            .iter()
            .filter(|(n, _, _)| *n == ns)
            .map(|(_, dst, gw)| (*dst, *gw))
            .collect()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.lock().ops.clone()
    }
}

impl State {
    fn insert(&mut self, ns: NsId, name: &str, kind: LinkKind) -> u32 {
        let index = self.next_index;
        self.next_index += 1;
        self.links.push(FakeLink {
            index,
            ns,
            name: name.to_string(),
            mac: MacAddress::new([0x02, 0, 0, 0, (index >> 8) as u8, index as u8]),
            kind,
            up: false,
            addresses: Vec::new(),
        });
        index
    }

    fn find(&self, ns: NsId, name: &str) -> Option<&FakeLink> {
        self.links.iter().find(|l| l.ns == ns && l.name == name)
    }

    fn get_mut(&mut self, ns: NsId, index: u32) -> Result<&mut FakeLink, NetworkError> {
        self.links
            .iter_mut()
            .find(|l| l.ns == ns && l.index == index)
            .ok_or_else(|| NetworkError::netlink(format!("link {index}"), "no such device"))
    }

    fn faulty(&self, fault: &Fault) -> bool {
        self.faults.contains(fault)
    }
}

pub struct FakeLinks {
    kernel: FakeKernel,
    ns: NsId,
}

impl LinkOps for FakeLinks {
    async fn link_by_name(&self, name: &str) -> Result<Option<LinkInfo>, NetworkError> {
        let mut state = self.kernel.lock();
        let once = state
            .faults
            .iter()
            .position(|f| matches!(f, Fault::LookupOnce(prefix) if name.starts_with(prefix.as_str())));
        if let Some(pos) = once {
            state.faults.remove(pos);
            return Err(refused(&format!("failed to lookup {name}")));
        }
        if state.faulty(&Fault::Lookup(name.to_string())) {
            return Err(refused(&format!("failed to lookup {name}")));
        }
        Ok(state.find(self.ns, name).map(|l| LinkInfo {
            index: l.index,
            name: l.name.clone(),
            mac: Some(l.mac),
        }))
    }

    async fn add_vlan(
        &self,
        name: &str,
        parent_index: u32,
        vlan_id: u16,
    ) -> Result<(), NetworkError> {
        let mut state = self.kernel.lock();
        if state.faulty(&Fault::AddVlan) {
            return Err(refused("failed to add vlan"));
        }
        if state.find(self.ns, name).is_some() {
            return Err(NetworkError::netlink("failed to add vlan", "file exists"));
        }
        state.get_mut(self.ns, parent_index)?;
        state.insert(
            self.ns,
            name,
            LinkKind::Vlan {
                parent: parent_index,
                vlan_id,
            },
        );
        state.ops.push(Op::AddVlan {
            name: name.to_string(),
            parent: parent_index,
            vlan_id,
        });
        Ok(())
    }

    async fn add_macvlan(
        &self,
        name: &str,
        parent_index: u32,
        mtu: u32,
        netns_fd: RawFd,
    ) -> Result<(), NetworkError> {
        let mut state = self.kernel.lock();
        if state.faulty(&Fault::AddMacvlan) {
            return Err(refused("failed to create macvlan"));
        }
        let target = (netns_fd - FD_BASE) as NsId;
        if target >= state.namespaces.len() {
            return Err(NetworkError::netlink("failed to create macvlan", "bad fd"));
        }
        state.get_mut(self.ns, parent_index)?;
        if state.find(target, name).is_some() {
            return Err(NetworkError::netlink("failed to create macvlan", "file exists"));
        }
        state.insert(
            target,
            name,
            LinkKind::Macvlan {
                parent: parent_index,
                mtu,
            },
        );
        state.ops.push(Op::AddMacvlan {
            name: name.to_string(),
            parent: parent_index,
            ns: target,
        });
        Ok(())
    }

    async fn set_up(&self, index: u32) -> Result<(), NetworkError> {
        let mut state = self.kernel.lock();
        state.get_mut(self.ns, index)?.up = true;
        state.ops.push(Op::SetUp { index });
        Ok(())
    }

    async fn rename(&self, index: u32, name: &str) -> Result<(), NetworkError> {
        let mut state = self.kernel.lock();
        if state.faulty(&Fault::Rename) || state.find(self.ns, name).is_some() {
            return Err(refused(&format!("failed to rename link to {name:?}")));
        }
        state.get_mut(self.ns, index)?.name = name.to_string();
        state.ops.push(Op::Rename {
            index,
            name: name.to_string(),
        });
        Ok(())
    }

    async fn set_hardware_addr(&self, index: u32, mac: MacAddress) -> Result<(), NetworkError> {
        let mut state = self.kernel.lock();
        if state.faulty(&Fault::SetMac) {
            return Err(refused("failed to change macvlan mac"));
        }
        state.get_mut(self.ns, index)?.mac = mac;
        state.ops.push(Op::SetMac { index, mac });
        Ok(())
    }

    async fn delete(&self, index: u32) -> Result<(), NetworkError> {
        let mut state = self.kernel.lock();
        let name = state.get_mut(self.ns, index)?.name.clone();
        state.links.retain(|l| l.index != index);
        state.ops.push(Op::Delete { index, name });
        Ok(())
    }

    async fn add_address(&self, index: u32, address: IpNetwork) -> Result<(), NetworkError> {
        let mut state = self.kernel.lock();
        if state.faulty(&Fault::AddAddress) {
            return Err(refused(&format!("failed to add IP addr {address}")));
        }
        state.get_mut(self.ns, index)?.addresses.push(address);
        state.ops.push(Op::AddAddress { index, address });
        Ok(())
    }

    async fn add_route(
        &self,
        index: u32,
        destination: IpNetwork,
        gateway: Option<IpAddr>,
    ) -> Result<(), NetworkError> {
        let mut state = self.kernel.lock();
        state.get_mut(self.ns, index)?;
        let ns = self.ns;
        state.routes.push((ns, destination, gateway));
        state.ops.push(Op::AddRoute {
            index,
            dst: destination,
            gw: gateway,
        });
        Ok(())
    }
}

pub struct FakeNetns {
    kernel: FakeKernel,
    ns: NsId,
    path: PathBuf,
}

impl NamespaceOps for FakeNetns {
    fn path(&self) -> &Path {
        &self.path
    }

    fn raw_fd(&self) -> RawFd {
        FD_BASE + self.ns as RawFd
    }

    fn set_sysctl(&self, key: &str, value: &str) -> Result<(), NetworkError> {
        let mut state = self.kernel.lock();
        if state.faulty(&Fault::Sysctl) {
            return Err(NetworkError::Sysctl {
                key: key.to_string(),
                source: std::io::Error::other("injected"),
            });
        }
        state.ops.push(Op::Sysctl {
            ns: self.ns,
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn announce(&self, ifindex: u32, _mac: MacAddress, ip: Ipv4Addr) -> Result<(), NetworkError> {
        let mut state = self.kernel.lock();
        state.ops.push(Op::Announce {
            ns: self.ns,
            ifindex,
            ip,
        });
        if state.faulty(&Fault::Announce) {
            return Err(NetworkError::Announce(std::io::Error::other("injected")));
        }
        Ok(())
    }
}

pub struct FakeBackend {
    kernel: FakeKernel,
    host: FakeLinks,
}

impl NetworkBackend for FakeBackend {
    type Links = FakeLinks;
    type Netns = FakeNetns;

    fn host(&self) -> &FakeLinks {
        &self.host
    }

    fn open_netns(&self, path: &str) -> Result<(FakeNetns, FakeLinks), NetworkError> {
        let ns = self
            .kernel
            .lock()
            .namespaces
            .iter()
            .position(|p| p == Path::new(path))
            .filter(|ns| *ns != HOST)
            .ok_or_else(|| NetworkError::NamespaceAccess {
                path: path.to_string(),
                reason: "No such file or directory".to_string(),
            })?;
        Ok((self.kernel.netns(ns), self.kernel.links(ns)))
    }
}

/// Inventory returning a fixed container list
pub struct FakeInventory {
    pub containers: Result<Vec<ContainerRef>, String>,
}

impl FakeInventory {
    pub fn with(ids: &[&str]) -> Self {
        Self {
            containers: Ok(ids
                .iter()
                .map(|id| ContainerRef {
                    id: id.to_string(),
                    has_networks: true,
                })
                .collect()),
        }
    }
}

impl ContainerInventory for FakeInventory {
    async fn list_containers(&self) -> Result<Vec<ContainerRef>, DockerError> {
        self.containers
            .clone()
            .map_err(DockerError::ConnectionFailed)
    }
}
