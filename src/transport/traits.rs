//! Transport trait abstraction for datagram backends

use anyhow::Result;
use async_trait::async_trait;
use std::net::SocketAddr;

/// A connectionless transport that moves whole datagrams
#[async_trait]
pub trait DatagramTransport: Send + Sync {
    /// Send one datagram to `target`
    async fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<usize>;

    /// Wait for the next datagram
    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)>;

    /// Take an already-queued datagram without waiting
    fn try_recv_from(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>>;

    /// Local address the transport is bound to
    fn local_addr(&self) -> Result<SocketAddr>;

    /// Human-readable name for this transport
    fn name(&self) -> &'static str;
}
