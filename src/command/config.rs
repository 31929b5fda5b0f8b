//! Dispatcher configuration

use std::net::SocketAddr;
use std::time::Duration;
use tello_shared::sdk;

/// Configuration for a command dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Drone control endpoint (fixed for the dispatcher's lifetime)
    pub drone_addr: SocketAddr,
    /// Local UDP port for replies (0 = OS-assigned)
    pub local_port: u16,
    /// Reply timeout used by [`send`](super::CommandDispatcher::send)
    pub default_timeout: Duration,
    /// Settle time used by [`send`](super::CommandDispatcher::send)
    pub default_post_delay: Duration,
    /// Discard datagrams that do not come from `drone_addr`
    pub verify_sender: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            drone_addr: sdk::default_control_addr(),
            local_port: 0,
            default_timeout: sdk::DEFAULT_TIMEOUT,
            default_post_delay: Duration::ZERO,
            verify_sender: true,
        }
    }
}

impl DispatcherConfig {
    /// Config targeting a specific drone, everything else default
    pub fn for_drone(drone_addr: SocketAddr) -> Self {
        Self {
            drone_addr,
            ..Default::default()
        }
    }
}
