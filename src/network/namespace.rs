//! Network namespace operations
//!
//! Namespace membership is per thread. Everything that must happen inside a
//! container namespace goes through [`ContainerNetns::run`], which enters the
//! namespace on the calling thread, runs a synchronous block and switches back
//! before returning. Sockets opened inside the block stay bound to the
//! container namespace afterwards.

use crate::error::NetworkError;
use crate::network::arp::ArpSocket;
use crate::network::netlink::RtNetlinkLinks;
use crate::network::{sysctl, MacAddress, NamespaceOps, NetworkBackend};
use netns_rs::NetNs;
use std::fs::File;
use std::net::Ipv4Addr;
use std::os::fd::{AsRawFd, RawFd};
use std::path::Path;
use tracing::debug;

/// Handle on a container's network namespace
pub struct ContainerNetns {
    ns: NetNs,
    path: String,
    file: File,
}

impl ContainerNetns {
    /// Open the namespace behind `path` (e.g. `/proc/<pid>/ns/net`)
    pub fn open(path: &str) -> Result<Self, NetworkError> {
        let access = |e: &dyn std::fmt::Display| NetworkError::NamespaceAccess {
            path: path.to_string(),
            reason: e.to_string(),
        };

        let ns = NetNs::get(path).map_err(|e| access(&e))?;
        let file = File::open(path).map_err(|e| access(&e))?;

        Ok(Self {
            ns,
            path: path.to_string(),
            file,
        })
    }

    /// Run `func` with the current thread inside this namespace
    pub fn run<F, R>(&self, func: F) -> Result<R, NetworkError>
    where
        F: FnOnce() -> R,
    {
        self.ns
            .run(|_| func())
            .map_err(|e| NetworkError::NamespaceAccess {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }

    /// Open a netlink handle whose socket lives in this namespace
    pub fn links(&self) -> Result<RtNetlinkLinks, NetworkError> {
        self.run(RtNetlinkLinks::connect)?
    }
}

impl NamespaceOps for ContainerNetns {
    fn path(&self) -> &Path {
        Path::new(&self.path)
    }

    fn raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    fn set_sysctl(&self, key: &str, value: &str) -> Result<(), NetworkError> {
        debug!(netns = %self.path, key, value, "setting sysctl");
        self.run(|| sysctl::set(key, value))?
    }

    fn announce(&self, ifindex: u32, mac: MacAddress, ip: Ipv4Addr) -> Result<(), NetworkError> {
        let socket = self
            .run(ArpSocket::open)?
            .map_err(NetworkError::Announce)?;
        socket
            .announce(ifindex, mac, ip)
            .map_err(NetworkError::Announce)
    }
}

/// Backend talking to the running kernel
pub struct KernelBackend {
    host: RtNetlinkLinks,
}

impl KernelBackend {
    /// Connect to the host namespace; must be called from within a tokio runtime
    pub fn connect() -> Result<Self, NetworkError> {
        Ok(Self {
            host: RtNetlinkLinks::connect()?,
        })
    }
}

impl NetworkBackend for KernelBackend {
    type Links = RtNetlinkLinks;
    type Netns = ContainerNetns;

    fn host(&self) -> &RtNetlinkLinks {
        &self.host
    }

    fn open_netns(&self, path: &str) -> Result<(ContainerNetns, RtNetlinkLinks), NetworkError> {
        let netns = ContainerNetns::open(path)?;
        let links = netns.links()?;
        Ok((netns, links))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_namespace() {
        let result = ContainerNetns::open("/proc/999999999/ns/net");
        assert!(matches!(
            result,
            Err(NetworkError::NamespaceAccess { .. })
        ));
    }
}
