use std::io;
use std::net::{IpAddr, SocketAddr, UdpSocket};

use tracing::warn;

use crate::constants::ROUTE_PROBE_ADDR;

/// The local IP the OS would route outbound traffic from. Connecting a UDP
/// socket sends nothing.
pub fn outbound_ip() -> io::Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect(ROUTE_PROBE_ADDR)?;
    Ok(socket.local_addr()?.ip())
}

/// The `host:port` this node tells its peers about.
///
/// An explicit `advertise` wins. Otherwise the listen address is used, with an
/// unspecified IP (`0.0.0.0`) replaced by the outbound interface.
pub fn advertised_address(listen: SocketAddr, advertise: Option<&str>) -> String {
    if let Some(address) = advertise {
        return address.to_string();
    }
    if !listen.ip().is_unspecified() {
        return listen.to_string();
    }
    match outbound_ip() {
        Ok(ip) => SocketAddr::new(ip, listen.port()).to_string(),
        Err(err) => {
            warn!(error = %err, "could not determine outbound ip");
            listen.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_address_wins() {
        let listen: SocketAddr = "0.0.0.0:5000".parse().unwrap();
        assert_eq!(
            advertised_address(listen, Some("203.0.113.5:5000")),
            "203.0.113.5:5000"
        );
    }

    #[test]
    fn concrete_listen_address_is_used_as_is() {
        let listen: SocketAddr = "192.0.2.7:5001".parse().unwrap();
        assert_eq!(advertised_address(listen, None), "192.0.2.7:5001");
    }

    #[test]
    fn unspecified_listen_keeps_port() {
        let listen: SocketAddr = "0.0.0.0:5002".parse().unwrap();
        assert!(advertised_address(listen, None).ends_with(":5002"));
    }
}
