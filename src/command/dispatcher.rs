//! Command dispatcher for sending SDK commands to one drone

use super::DispatcherConfig;
use crate::transport::{DatagramTransport, UdpTransport};
use anyhow::{bail, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tello_shared::{codec, require_ok, sdk, Command};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

/// Sends one command at a time to a drone and waits for its reply.
///
/// The dispatcher exclusively owns its transport. Every send takes
/// `&mut self`, so a second command cannot be issued while one is still
/// waiting for its reply. Dropping the dispatcher closes the socket.
pub struct CommandDispatcher<T: DatagramTransport = UdpTransport> {
    config: DispatcherConfig,
    transport: T,
    commands_sent: u64,
}

impl CommandDispatcher<UdpTransport> {
    /// Bind the local socket described by `config`
    pub async fn open(config: DispatcherConfig) -> Result<Self> {
        let transport = UdpTransport::bind_for(config.drone_addr, config.local_port).await?;
        let dispatcher = Self::with_transport(config, transport);

        info!(
            "Dispatcher open: {} -> {} via {}",
            dispatcher.local_addr()?,
            dispatcher.config.drone_addr,
            dispatcher.transport.name()
        );

        Ok(dispatcher)
    }
}

impl<T: DatagramTransport> CommandDispatcher<T> {
    /// Create a dispatcher over an already-bound transport
    pub fn with_transport(config: DispatcherConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            commands_sent: 0,
        }
    }

    /// The drone endpoint this dispatcher talks to
    pub fn drone_addr(&self) -> SocketAddr {
        self.config.drone_addr
    }

    /// The local address replies arrive on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The configuration this dispatcher was opened with
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Number of datagrams sent so far
    pub fn commands_sent(&self) -> u64 {
        self.commands_sent
    }

    /// Send `text` and wait up to `timeout` for the reply, then pause for
    /// `post_delay`.
    ///
    /// Returns the trimmed reply, or `None` when nothing arrived in time.
    /// Transport failures are returned as errors. Nothing is retried.
    pub async fn send_command(
        &mut self,
        text: &str,
        timeout: Duration,
        post_delay: Duration,
    ) -> Result<Option<String>> {
        if timeout.is_zero() {
            bail!("timeout for {:?} must be positive", text);
        }

        let payload = codec::encode_command(text)?;
        let text = std::str::from_utf8(&payload)?;

        self.discard_stale()?;

        self.transport.send_to(&payload, self.config.drone_addr).await?;
        self.commands_sent += 1;
        info!(">>> {}", text);

        let reply = self.await_reply(timeout).await?;
        match &reply {
            Some(line) => info!("<<< {}", line),
            None => warn!("<<< (no response after {:?})", timeout),
        }

        if !post_delay.is_zero() {
            tokio::time::sleep(post_delay).await;
        }

        Ok(reply)
    }

    /// Send `text` exactly as given, with the configured default timeout
    /// and post-delay.
    ///
    /// Text that parses as a known command has its advisories logged; the
    /// datagram is never rewritten into canonical form.
    pub async fn send(&mut self, text: &str) -> Result<Option<String>> {
        match text.parse::<Command>() {
            Ok(command) => {
                for note in command.advisories() {
                    warn!("Advisory: {}", note);
                }
            }
            Err(e) => warn!("Not in the known vocabulary ({}), sending verbatim", e),
        }

        let timeout = self.config.default_timeout;
        let post_delay = self.config.default_post_delay;
        self.send_command(text, timeout, post_delay).await
    }

    /// Send `text` and fail unless the drone answers exactly `ok`
    pub async fn send_required(
        &mut self,
        text: &str,
        timeout: Duration,
        post_delay: Duration,
    ) -> Result<()> {
        let reply = self.send_command(text, timeout, post_delay).await?;
        require_ok(reply.as_deref(), text)?;
        Ok(())
    }

    /// Close the socket explicitly
    pub fn close(self) {
        debug!(
            "Dispatcher for {} closed after {} command(s)",
            self.config.drone_addr, self.commands_sent
        );
    }

    /// Wait for a reply from the drone until the deadline
    async fn await_reply(&self, timeout: Duration) -> Result<Option<String>> {
        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; sdk::MAX_DATAGRAM_SIZE];

        loop {
            let (n, from) = match timeout_at(deadline, self.transport.recv_from(&mut buf)).await {
                Ok(received) => received?,
                Err(_) => return Ok(None),
            };

            if self.config.verify_sender && from != self.config.drone_addr {
                warn!(
                    "Ignoring datagram from {} (expected {})",
                    from, self.config.drone_addr
                );
                continue;
            }

            return Ok(Some(codec::decode_reply(&buf[..n])));
        }
    }

    /// Drop replies that arrived after an earlier command timed out
    fn discard_stale(&self) -> Result<()> {
        let mut buf = [0u8; sdk::MAX_DATAGRAM_SIZE];

        while let Some((n, from)) = self.transport.try_recv_from(&mut buf)? {
            debug!(
                "Discarding stale datagram from {}: {:?}",
                from,
                codec::decode_reply(&buf[..n])
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tello_sim::{spawn_mock, MockDroneConfig};
    use tokio::net::UdpSocket;

    fn config_for(addr: SocketAddr) -> DispatcherConfig {
        DispatcherConfig::for_drone(addr)
    }

    /// Transport that counts outbound datagrams and never receives
    struct CountingTransport {
        sent: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DatagramTransport for CountingTransport {
        async fn send_to(&self, payload: &[u8], _target: SocketAddr) -> Result<usize> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(payload.len())
        }

        async fn recv_from(&self, _buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
            std::future::pending().await
        }

        fn try_recv_from(&self, _buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>> {
            Ok(None)
        }

        fn local_addr(&self) -> Result<SocketAddr> {
            Ok(SocketAddr::from(([127, 0, 0, 1], 9000)))
        }

        fn name(&self) -> &'static str {
            "Counting"
        }
    }

    #[tokio::test]
    async fn test_no_reply_waits_full_timeout() {
        let drone = spawn_mock(MockDroneConfig::default().silent()).await.unwrap();
        let mut dispatcher = CommandDispatcher::open(config_for(drone.addr())).await.unwrap();

        let timeout = Duration::from_millis(200);
        let started = Instant::now();
        let reply = dispatcher
            .send_command("command", timeout, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(reply, None);
        assert!(started.elapsed() >= timeout);
    }

    #[tokio::test]
    async fn test_one_datagram_per_call() {
        let sent = Arc::new(AtomicUsize::new(0));
        let transport = CountingTransport { sent: sent.clone() };
        let mut dispatcher =
            CommandDispatcher::with_transport(DispatcherConfig::default(), transport);

        for text in ["command", "takeoff", "land"] {
            let reply = dispatcher
                .send_command(text, Duration::from_millis(20), Duration::ZERO)
                .await
                .unwrap();
            assert_eq!(reply, None);
        }

        assert_eq!(sent.load(Ordering::SeqCst), 3);
        assert_eq!(dispatcher.commands_sent(), 3);
    }

    #[tokio::test]
    async fn test_silent_drone_receives_single_copy() {
        let drone = spawn_mock(MockDroneConfig::default().silent()).await.unwrap();
        let mut dispatcher = CommandDispatcher::open(config_for(drone.addr())).await.unwrap();

        dispatcher
            .send_command("takeoff", Duration::from_millis(100), Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(drone.received().await, vec!["takeoff"]);
    }

    #[tokio::test]
    async fn test_scripted_sequence_against_ok_responder() {
        let drone = spawn_mock(MockDroneConfig::default()).await.unwrap();
        let mut dispatcher = CommandDispatcher::open(config_for(drone.addr())).await.unwrap();

        for text in ["command", "takeoff", "up 40", "land"] {
            dispatcher
                .send_required(text, Duration::from_secs(1), Duration::ZERO)
                .await
                .unwrap();
        }

        assert_eq!(
            drone.received().await,
            vec!["command", "takeoff", "up 40", "land"]
        );
    }

    #[tokio::test]
    async fn test_telemetry_passed_through_verbatim() {
        let drone = spawn_mock(MockDroneConfig::default().reply("battery?", "76"))
            .await
            .unwrap();
        let mut dispatcher = CommandDispatcher::open(config_for(drone.addr())).await.unwrap();

        let reply = dispatcher
            .send_command("battery?", Duration::from_secs(1), Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(reply.as_deref(), Some("76"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_reply_inside_deadline() {
        let drone = spawn_mock(MockDroneConfig::default().delay(Duration::from_millis(9500)))
            .await
            .unwrap();
        let mut dispatcher = CommandDispatcher::open(config_for(drone.addr())).await.unwrap();

        let started = Instant::now();
        let reply = dispatcher
            .send_command("forward 100", Duration::from_secs(10), Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(reply.as_deref(), Some("ok"));
        assert!(started.elapsed() >= Duration::from_millis(9500));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_rejection_fails_required_send() {
        let drone = spawn_mock(MockDroneConfig::default().default_reply("error"))
            .await
            .unwrap();
        let mut dispatcher = CommandDispatcher::open(config_for(drone.addr())).await.unwrap();

        let err = dispatcher
            .send_required("takeoff", Duration::from_secs(1), Duration::ZERO)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("takeoff"));
        assert!(err.to_string().contains("error"));
    }

    #[tokio::test]
    async fn test_dispatchers_are_isolated() {
        let slow = spawn_mock(MockDroneConfig::default().delay(Duration::from_millis(300)))
            .await
            .unwrap();
        let fast = spawn_mock(MockDroneConfig::default().reply("battery?", "76"))
            .await
            .unwrap();

        let mut a = CommandDispatcher::open(config_for(slow.addr())).await.unwrap();
        let mut b = CommandDispatcher::open(config_for(fast.addr())).await.unwrap();
        assert_ne!(a.local_addr().unwrap(), b.local_addr().unwrap());

        let (a_reply, b_reply) = tokio::join!(
            a.send_command("takeoff", Duration::from_millis(100), Duration::ZERO),
            b.send_command("battery?", Duration::from_secs(1), Duration::ZERO),
        );
        assert_eq!(a_reply.unwrap(), None);
        assert_eq!(b_reply.unwrap().as_deref(), Some("76"));

        // Let the slow drone's late "ok" land in a's socket only
        tokio::time::sleep(Duration::from_millis(400)).await;

        let b_reply = b
            .send_command("battery?", Duration::from_secs(1), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(b_reply.as_deref(), Some("76"));

        // The stale "ok" is discarded; a gets the answer to its new query
        let a_reply = a
            .send_command("battery?", Duration::from_secs(1), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(a_reply.as_deref(), Some("87"));
    }

    #[tokio::test]
    async fn test_foreign_sender_is_ignored() {
        let drone = spawn_mock(MockDroneConfig::default().silent()).await.unwrap();
        let mut dispatcher = CommandDispatcher::open(config_for(drone.addr())).await.unwrap();
        let port = dispatcher.local_addr().unwrap().port();

        let stray = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let spoof = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            stray
                .send_to(b"ok", SocketAddr::from(([127, 0, 0, 1], port)))
                .await
                .unwrap();
        });

        let reply = dispatcher
            .send_command("takeoff", Duration::from_millis(300), Duration::ZERO)
            .await
            .unwrap();
        spoof.await.unwrap();

        assert_eq!(reply, None);
    }

    #[tokio::test]
    async fn test_foreign_sender_accepted_when_unverified() {
        let drone = spawn_mock(MockDroneConfig::default().silent()).await.unwrap();
        let config = DispatcherConfig {
            verify_sender: false,
            ..config_for(drone.addr())
        };
        let mut dispatcher = CommandDispatcher::open(config).await.unwrap();
        let port = dispatcher.local_addr().unwrap().port();

        let stray = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = stray
                .send_to(b"ok", SocketAddr::from(([127, 0, 0, 1], port)))
                .await;
        });

        let reply = dispatcher
            .send_command("takeoff", Duration::from_secs(1), Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(reply.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_post_delay_is_applied() {
        let drone = spawn_mock(MockDroneConfig::default()).await.unwrap();
        let mut dispatcher = CommandDispatcher::open(config_for(drone.addr())).await.unwrap();

        let started = Instant::now();
        dispatcher
            .send_command("command", Duration::from_secs(1), Duration::from_millis(150))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_send_keeps_text_as_typed() {
        let drone = spawn_mock(MockDroneConfig::default()).await.unwrap();
        let config = DispatcherConfig {
            default_timeout: Duration::from_secs(1),
            ..config_for(drone.addr())
        };
        let mut dispatcher = CommandDispatcher::open(config).await.unwrap();

        for text in ["forward 0100", "cw +90", "up 040", "mystery 1"] {
            assert_eq!(dispatcher.send(text).await.unwrap().as_deref(), Some("ok"));
        }

        assert_eq!(
            drone.received().await,
            vec!["forward 0100", "cw +90", "up 040", "mystery 1"]
        );
    }

    #[tokio::test]
    async fn test_open_on_explicit_port() {
        let free_port = UdpSocket::bind("0.0.0.0:0")
            .await
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let config = DispatcherConfig {
            local_port: free_port,
            ..config_for(SocketAddr::from(([127, 0, 0, 1], sdk::CONTROL_PORT)))
        };
        let dispatcher = CommandDispatcher::open(config).await.unwrap();

        assert_eq!(dispatcher.local_addr().unwrap().port(), free_port);
    }

    #[tokio::test]
    async fn test_open_fails_when_port_taken() {
        let occupied = UdpSocket::bind("0.0.0.0:0").await.unwrap();
        let port = occupied.local_addr().unwrap().port();

        let config = DispatcherConfig {
            local_port: port,
            ..config_for(SocketAddr::from(([127, 0, 0, 1], sdk::CONTROL_PORT)))
        };
        let err = CommandDispatcher::open(config).await.err().unwrap();

        assert!(format!("{:#}", err).contains("failed to bind"), "{:#}", err);
    }

    #[tokio::test]
    async fn test_invalid_inputs_are_errors() {
        let mut dispatcher =
            CommandDispatcher::with_transport(DispatcherConfig::default(), CountingTransport {
                sent: Arc::new(AtomicUsize::new(0)),
            });

        assert!(dispatcher
            .send_command("takeoff", Duration::ZERO, Duration::ZERO)
            .await
            .is_err());
        assert!(dispatcher
            .send_command("   ", Duration::from_millis(10), Duration::ZERO)
            .await
            .is_err());
        assert_eq!(dispatcher.commands_sent(), 0);
    }
}
