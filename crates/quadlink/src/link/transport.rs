// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UDP endpoint for the control link.
//!
//! One unicast socket bound to an ephemeral local port, connected logically
//! to the flight controller's well-known port. Receives carry a bounded read
//! timeout so the receive loop can observe the stop flag.

use crate::config::RECV_POLL_INTERVAL;
use crate::error::{Error, Result};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Bound UDP socket plus the resolved remote address.
pub(crate) struct UdpEndpoint {
    socket: UdpSocket,
    remote: SocketAddr,
}

impl UdpEndpoint {
    /// Resolve `host:port` (IPv4 preferred, mDNS names allowed) and bind an
    /// ephemeral local socket. Resolution or bind failure is fatal.
    pub(crate) fn open(host: &str, port: u16) -> Result<Self> {
        let remote = (host, port)
            .to_socket_addrs()
            .map_err(|e| Error::Connection(format!("cannot resolve {}:{}: {}", host, port, e)))?
            .find(SocketAddr::is_ipv4)
            .ok_or_else(|| {
                Error::Connection(format!("{}:{} has no IPv4 address", host, port))
            })?;

        let socket2 = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|e| Error::Connection(format!("socket create failed: {}", e)))?;
        let bind_addr: SocketAddr = "0.0.0.0:0"
            .parse()
            .map_err(|e| Error::Connection(format!("bad bind address: {}", e)))?;
        socket2
            .bind(&bind_addr.into())
            .map_err(|e| Error::Connection(format!("bind failed: {}", e)))?;

        let socket: UdpSocket = socket2.into();
        // Bounded blocking reads; close() relies on the receiver waking up.
        socket
            .set_read_timeout(Some(RECV_POLL_INTERVAL))
            .map_err(|e| Error::Connection(format!("set read timeout failed: {}", e)))?;

        log::debug!(
            "[LINK] endpoint local={} remote={}",
            socket
                .local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "?".into()),
            remote
        );
        Ok(Self { socket, remote })
    }

    /// Resolved address of the flight controller.
    pub(crate) fn remote(&self) -> SocketAddr {
        self.remote
    }

    /// Send one datagram to the flight controller.
    pub(crate) fn send(&self, frame: &[u8]) -> Result<()> {
        self.socket.send_to(frame, self.remote)?;
        Ok(())
    }

    /// Receive one datagram into `buf`. Returns the payload length, or
    /// `Ok(None)` when the read timed out with nothing arriving.
    pub(crate) fn recv(&self, buf: &mut [u8]) -> Result<Option<usize>> {
        match self.socket.recv_from(buf) {
            Ok((len, _from)) => Ok(Some(len)),
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Ok(None)
            }
            Err(e) => Err(Error::Transport(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_resolves_ipv4_literal() {
        let ep = UdpEndpoint::open("127.0.0.1", 25565).expect("open");
        assert_eq!(ep.remote().to_string(), "127.0.0.1:25565");
    }

    #[test]
    fn test_open_rejects_garbage_host() {
        let err = UdpEndpoint::open("definitely-not-a-host.invalid", 25565);
        assert!(matches!(err, Err(Error::Connection(_))));
    }

    #[test]
    fn test_recv_times_out_with_none() {
        let ep = UdpEndpoint::open("127.0.0.1", 1).expect("open");
        let mut buf = [0u8; 16];
        // Nothing is sending to us; the bounded read returns empty-handed.
        assert!(matches!(ep.recv(&mut buf), Ok(None)));
    }

    #[test]
    fn test_send_and_recv_loopback() {
        let peer = UdpSocket::bind("127.0.0.1:0").expect("peer bind");
        let peer_port = peer.local_addr().expect("peer addr").port();

        let ep = UdpEndpoint::open("127.0.0.1", peer_port).expect("open");
        ep.send(&[1, 2, 3]).expect("send");

        let mut buf = [0u8; 16];
        let (len, from) = peer.recv_from(&mut buf).expect("peer recv");
        assert_eq!(&buf[..len], &[1, 2, 3]);

        // Reply to the ephemeral port the endpoint bound.
        peer.send_to(&[9, 8], from).expect("peer send");
        let len = ep
            .recv(&mut buf)
            .expect("recv")
            .expect("datagram before timeout");
        assert_eq!(&buf[..len], &[9, 8]);
    }
}
