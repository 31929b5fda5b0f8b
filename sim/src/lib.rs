//! Mock Tello drone
//!
//! Answers SDK datagrams from a reply table so the pilot can be exercised
//! without hardware. Every received command is recorded in arrival order.

use anyhow::Result;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tello_shared::{codec, sdk, Command};
use tokio::net::UdpSocket;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Reply behaviour of the mock drone
#[derive(Debug, Clone)]
pub struct MockDroneConfig {
    /// Address to serve on
    pub bind_addr: SocketAddr,
    /// Reply for commands without a table entry (`None` = stay silent)
    pub default_reply: Option<String>,
    /// Exact command text -> reply
    pub replies: HashMap<String, String>,
    /// Delay before each reply is sent
    pub reply_delay: Duration,
}

impl Default for MockDroneConfig {
    fn default() -> Self {
        let replies = [
            ("battery?", "87"),
            ("height?", "0dm"),
            ("time?", "0s"),
            ("speed?", "0"),
            ("temp?", "60~62C"),
            ("wifi?", "90"),
            ("attitude?", "pitch:0;roll:0;yaw:0;"),
            ("acceleration?", "agx:-8.00;agy:3.00;agz:-998.00;"),
            ("baro?", "112.5"),
            ("tof?", "100mm"),
        ]
        .into_iter()
        .map(|(cmd, reply)| (cmd.to_string(), reply.to_string()))
        .collect();

        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            default_reply: Some("ok".into()),
            replies,
            reply_delay: Duration::ZERO,
        }
    }
}

impl MockDroneConfig {
    /// Serve on a specific address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Answer `command` with `reply`
    pub fn reply(mut self, command: &str, reply: &str) -> Self {
        self.replies.insert(command.into(), reply.into());
        self
    }

    /// Answer anything without a table entry with `reply`
    pub fn default_reply(mut self, reply: &str) -> Self {
        self.default_reply = Some(reply.into());
        self
    }

    /// Never answer anything
    pub fn silent(mut self) -> Self {
        self.default_reply = None;
        self.replies.clear();
        self
    }

    /// Hold every reply back for `delay`
    pub fn delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    fn reply_for(&self, command: &str) -> Option<&str> {
        self.replies
            .get(command)
            .map(String::as_str)
            .or(self.default_reply.as_deref())
    }
}

/// A bound mock drone, ready to serve
pub struct MockDrone {
    config: MockDroneConfig,
    socket: UdpSocket,
    received: Arc<RwLock<Vec<String>>>,
}

impl MockDrone {
    /// Bind the mock drone's control socket
    pub async fn bind(config: MockDroneConfig) -> Result<Self> {
        let socket = UdpSocket::bind(config.bind_addr).await?;
        Ok(Self {
            config,
            socket,
            received: Arc::new(RwLock::new(Vec::new())),
        })
    }

    /// Address commands should be sent to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Serve until an I/O error occurs
    pub async fn run(self) -> Result<()> {
        let mut buf = vec![0u8; sdk::MAX_DATAGRAM_SIZE];

        loop {
            let (n, peer) = self.socket.recv_from(&mut buf).await?;
            let text = codec::decode_reply(&buf[..n]);
            debug!("[SIM] <<< {} from {}", text, peer);

            if let Err(e) = text.parse::<Command>() {
                warn!("[SIM] Unrecognised command {:?}: {}", text, e);
            }

            self.received.write().await.push(text.clone());

            let Some(reply) = self.config.reply_for(&text) else {
                debug!("[SIM] (silent)");
                continue;
            };

            if !self.config.reply_delay.is_zero() {
                tokio::time::sleep(self.config.reply_delay).await;
            }

            self.socket.send_to(reply.as_bytes(), peer).await?;
            debug!("[SIM] >>> {} to {}", reply, peer);
        }
    }

    /// Serve on a background task
    pub fn spawn(self) -> Result<MockDroneHandle> {
        let addr = self.local_addr()?;
        let received = self.received.clone();

        let task = tokio::spawn(async move {
            if let Err(e) = self.run().await {
                warn!("[SIM] Mock drone stopped: {}", e);
            }
        });

        info!("[SIM] Mock drone serving on {}", addr);
        Ok(MockDroneHandle {
            addr,
            received,
            task,
        })
    }
}

/// Handle to a running mock drone; the task is aborted on drop
pub struct MockDroneHandle {
    addr: SocketAddr,
    received: Arc<RwLock<Vec<String>>>,
    task: JoinHandle<()>,
}

impl MockDroneHandle {
    /// Address commands should be sent to
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Commands received so far, in arrival order
    pub async fn received(&self) -> Vec<String> {
        self.received.read().await.clone()
    }
}

impl Drop for MockDroneHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Bind and spawn a mock drone in one step
pub async fn spawn_mock(config: MockDroneConfig) -> Result<MockDroneHandle> {
    MockDrone::bind(config).await?.spawn()
}
