//! Gratuitous ARP announcements over an AF_PACKET socket

use crate::network::MacAddress;
use std::io;
use std::net::Ipv4Addr;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

const ETH_P_ARP: u16 = 0x0806;
const ETH_P_IP: u16 = 0x0800;
const ARPHRD_ETHER: u16 = 1;
const ARPOP_REQUEST: u16 = 1;
const BROADCAST: [u8; 6] = [0xff; 6];

/// Ethernet header (14) + ARP payload for IPv4 over Ethernet (28)
pub const FRAME_LEN: usize = 42;

/// Build a broadcast ARP request announcing `ip` at `mac`
///
/// Sender and target protocol addresses are both `ip`, which makes
/// neighbours refresh their cache entry without answering.
pub fn gratuitous_frame(mac: MacAddress, ip: Ipv4Addr) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    let sender = mac.bytes();
    let addr = ip.octets();

    frame[0..6].copy_from_slice(&BROADCAST);
    frame[6..12].copy_from_slice(&sender);
    frame[12..14].copy_from_slice(&ETH_P_ARP.to_be_bytes());

    frame[14..16].copy_from_slice(&ARPHRD_ETHER.to_be_bytes());
    frame[16..18].copy_from_slice(&ETH_P_IP.to_be_bytes());
    frame[18] = 6;
    frame[19] = 4;
    frame[20..22].copy_from_slice(&ARPOP_REQUEST.to_be_bytes());
    frame[22..28].copy_from_slice(&sender);
    frame[28..32].copy_from_slice(&addr);
    frame[32..38].copy_from_slice(&BROADCAST);
    frame[38..42].copy_from_slice(&addr);
    frame
}

/// Raw packet socket bound to the namespace it was opened in
pub struct ArpSocket {
    fd: OwnedFd,
}

impl ArpSocket {
    pub fn open() -> io::Result<Self> {
        let fd = unsafe {
            libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                ETH_P_ARP.to_be() as libc::c_int,
            )
        };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: fd was just returned by socket(2) and is owned by nobody else
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(Self { fd })
    }

    /// Send one gratuitous ARP for `ip` out of interface `ifindex`
    pub fn announce(&self, ifindex: u32, mac: MacAddress, ip: Ipv4Addr) -> io::Result<()> {
        let frame = gratuitous_frame(mac, ip);

        let mut addr: libc::sockaddr_ll = unsafe { std::mem::zeroed() };
        addr.sll_family = libc::AF_PACKET as libc::c_ushort;
        addr.sll_protocol = ETH_P_ARP.to_be();
        addr.sll_ifindex = ifindex as libc::c_int;
        addr.sll_halen = 6;
        addr.sll_addr[..6].copy_from_slice(&BROADCAST);

        let sent = unsafe {
            libc::sendto(
                self.fd.as_raw_fd(),
                frame.as_ptr() as *const libc::c_void,
                frame.len(),
                0,
                &addr as *const libc::sockaddr_ll as *const libc::sockaddr,
                std::mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            )
        };
        if sent < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}
