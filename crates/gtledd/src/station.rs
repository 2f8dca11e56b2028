//! Station address lookup for discovery replies.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

use gtled_services::StationAddress;

/// Where the probe socket pretends to send. Connecting a UDP socket only
/// consults the routing table; nothing goes on the wire.
const PROBE_TARGET: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::new(192, 0, 2, 1), 9);

/// Reports the configured address if there is one, otherwise the local
/// address the kernel would use for outbound IPv4 traffic.
#[derive(Debug, Clone, Copy)]
pub struct ProbedStation {
    configured: Option<Ipv4Addr>,
    target: SocketAddrV4,
}

impl ProbedStation {
    pub fn new(configured: Option<Ipv4Addr>) -> Self {
        Self {
            configured,
            target: PROBE_TARGET,
        }
    }

    /// Probe the route towards `target` instead of the default.
    pub fn with_target(configured: Option<Ipv4Addr>, target: SocketAddrV4) -> Self {
        Self { configured, target }
    }

    fn probe(&self) -> Option<Ipv4Addr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
        if let Err(e) = socket.connect(self.target) {
            tracing::debug!(target = %self.target, error = %e, "no route for station probe");
            return None;
        }
        match socket.local_addr().ok()? {
            SocketAddr::V4(v4) if !v4.ip().is_unspecified() => Some(*v4.ip()),
            _ => None,
        }
    }
}

impl StationAddress for ProbedStation {
    fn current_station_ip(&self) -> Option<Ipv4Addr> {
        self.configured.or_else(|| self.probe())
    }
}
