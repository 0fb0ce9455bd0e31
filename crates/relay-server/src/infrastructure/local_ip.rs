//! Advertised-address discovery.
//!
//! The address registered with the manager must be reachable by clients, so
//! `0.0.0.0` and loopback are useless. The classic trick: connect a UDP
//! socket toward a public address (no packet is sent) and read back the
//! local address the kernel picked for that route.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use tracing::warn;

/// Returns the IPv4 address this host would use to reach the wider network,
/// falling back to loopback when no route exists (single-machine setups).
pub fn advertised_ipv4() -> Ipv4Addr {
    match route_probe() {
        Some(ip) => ip,
        None => {
            warn!("could not determine an outbound address, advertising 127.0.0.1");
            Ipv4Addr::LOCALHOST
        }
    }
}

fn route_probe() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect(("8.8.8.8", 53)).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() => Some(ip),
        _ => None,
    }
}
