//! Kernel parameters under /proc/sys
//!
//! Keys use sysctl(8) notation: components separated by `.`, with `/` standing
//! for a literal `.` inside a component (e.g. `net.ipv4.conf.eth0/3.proxy_arp`).
//! Network keys resolve against the namespace of the calling thread.

use crate::error::NetworkError;
use std::path::PathBuf;

const PROC_SYS: &str = "/proc/sys";

/// Key enabling proxy ARP on an interface
pub fn proxy_arp_key(ifname: &str) -> String {
    format!("net.ipv4.conf.{}.proxy_arp", ifname.replace('.', "/"))
}

/// Filesystem path backing a sysctl key
pub fn sysctl_path(key: &str) -> PathBuf {
    let mut path = PathBuf::from(PROC_SYS);
    for component in key.split('.') {
        path.push(component.replace('/', "."));
    }
    path
}

/// Write a sysctl value
pub fn set(key: &str, value: &str) -> Result<(), NetworkError> {
    std::fs::write(sysctl_path(key), value).map_err(|source| NetworkError::Sysctl {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_arp_path() {
        assert_eq!(
            sysctl_path(&proxy_arp_key("veth1a2b3c4d")),
            PathBuf::from("/proc/sys/net/ipv4/conf/veth1a2b3c4d/proxy_arp")
        );
    }

    #[test]
    fn test_dotted_interface_name() {
        assert_eq!(proxy_arp_key("bond4.3"), "net.ipv4.conf.bond4/3.proxy_arp");
        assert_eq!(
            sysctl_path(&proxy_arp_key("bond4.3")),
            PathBuf::from("/proc/sys/net/ipv4/conf/bond4.3/proxy_arp")
        );
    }

    #[test]
    fn test_set_unknown_key_fails() {
        let result = set("net.ipv4.conf.no-such-iface-xyz.proxy_arp", "1");
        assert!(matches!(result, Err(NetworkError::Sysctl { .. })));
    }
}
