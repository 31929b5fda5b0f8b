//! UDP transport implementation for the SDK control channel

use crate::transport::traits::DatagramTransport;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;

/// UDP socket wrapper implementing DatagramTransport
pub struct UdpTransport {
    inner: UdpSocket,
}

impl UdpTransport {
    /// Bind on all interfaces of the same family as `peer`; port 0 lets
    /// the OS choose
    pub async fn bind_for(peer: SocketAddr, local_port: u16) -> Result<Self> {
        Self::bind_addr(wildcard_for(peer, local_port)).await
    }

    /// Bind on an explicit local address
    pub async fn bind_addr(addr: SocketAddr) -> Result<Self> {
        let inner = UdpSocket::bind(addr)
            .await
            .with_context(|| format!("failed to bind UDP socket on {}", addr))?;
        Ok(Self { inner })
    }
}

fn wildcard_for(peer: SocketAddr, port: u16) -> SocketAddr {
    let ip: IpAddr = match peer {
        SocketAddr::V4(_) => Ipv4Addr::UNSPECIFIED.into(),
        SocketAddr::V6(_) => Ipv6Addr::UNSPECIFIED.into(),
    };
    SocketAddr::new(ip, port)
}

#[async_trait]
impl DatagramTransport for UdpTransport {
    async fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<usize> {
        let sent = self
            .inner
            .send_to(payload, target)
            .await
            .with_context(|| format!("failed to send datagram to {}", target))?;
        Ok(sent)
    }

    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        Ok(self.inner.recv_from(buf).await?)
    }

    fn try_recv_from(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>> {
        match self.inner.try_recv_from(buf) {
            Ok(received) => Ok(Some(received)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.inner.local_addr()?)
    }

    fn name(&self) -> &'static str {
        "UDP"
    }
}
