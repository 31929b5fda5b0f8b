//! Command-line interface

use crate::command::DispatcherConfig;
use clap::{Parser, Subcommand};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tello_shared::{sdk, Query};

#[derive(Parser, Debug)]
#[command(author, version, about = "Fly a Tello over its UDP SDK", long_about = None)]
pub struct Cli {
    /// Drone control address (`ip` or `ip:port`); repeat for `status`
    #[arg(long = "drone", global = true, value_parser = parse_drone_addr)]
    pub drones: Vec<SocketAddr>,

    /// Local UDP port for replies (0 = any free port)
    #[arg(long, global = true, default_value_t = 0)]
    pub local_port: u16,

    /// Reply timeout in milliseconds
    #[arg(long, global = true, default_value_t = 5000)]
    pub timeout_ms: u64,

    /// Accept replies from any address
    #[arg(long, global = true)]
    pub no_verify_sender: bool,

    #[command(subcommand)]
    pub action: Action,
}

#[derive(Subcommand, Debug)]
pub enum Action {
    /// Fly the indoor demo sequence
    Fly,
    /// Send one raw command and print the reply
    Send {
        /// Command text, e.g. `battery?` or `cw 90`
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Pause after the reply in milliseconds
        #[arg(long, default_value_t = 0)]
        post_delay_ms: u64,
    },
    /// Print a telemetry snapshot for each drone
    Status {
        /// Only poll these queries (e.g. `battery` or `tof?`); repeatable
        #[arg(long = "query", value_parser = parse_query)]
        queries: Vec<Query>,
    },
    /// Switch the drone to station mode on an existing network
    JoinWifi { ssid: String, password: String },
}

impl Cli {
    /// Drone endpoints, defaulting to the direct-connect address
    pub fn drone_addrs(&self) -> Vec<SocketAddr> {
        if self.drones.is_empty() {
            vec![sdk::default_control_addr()]
        } else {
            self.drones.clone()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Dispatcher config for one drone.
    ///
    /// With several drones each dispatcher needs its own socket, so an
    /// explicit local port only applies when a single drone is targeted.
    pub fn dispatcher_config(&self, drone_addr: SocketAddr) -> DispatcherConfig {
        let local_port = if self.drone_addrs().len() > 1 {
            0
        } else {
            self.local_port
        };

        DispatcherConfig {
            local_port,
            default_timeout: self.timeout(),
            verify_sender: !self.no_verify_sender,
            ..DispatcherConfig::for_drone(drone_addr)
        }
    }
}

fn parse_drone_addr(value: &str) -> Result<SocketAddr, String> {
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Ok(addr);
    }
    value
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, sdk::CONTROL_PORT))
        .map_err(|_| format!("invalid drone address: {}", value))
}

fn parse_query(value: &str) -> Result<Query, String> {
    let token = if value.ends_with('?') {
        value.to_string()
    } else {
        format!("{}?", value)
    };
    Query::from_token(&token).ok_or_else(|| format!("unknown telemetry query: {}", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_drone_addr() {
        assert_eq!(
            parse_drone_addr("192.168.1.20").unwrap().to_string(),
            "192.168.1.20:8889"
        );
        assert_eq!(
            parse_drone_addr("10.0.0.5:9999").unwrap().to_string(),
            "10.0.0.5:9999"
        );
        assert_eq!(
            parse_drone_addr("fe80::1").unwrap().to_string(),
            "[fe80::1]:8889"
        );
        assert!(parse_drone_addr("drone").is_err());
    }

    #[test]
    fn test_status_queries() {
        let cli = Cli::try_parse_from([
            "tello-pilot",
            "status",
            "--query",
            "battery",
            "--query",
            "tof?",
        ])
        .unwrap();

        match cli.action {
            Action::Status { queries } => assert_eq!(queries, vec![Query::Battery, Query::Tof]),
            other => panic!("unexpected action: {:?}", other),
        }

        assert!(Cli::try_parse_from(["tello-pilot", "status", "--query", "fuel"]).is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["tello-pilot", "fly"]).unwrap();
        assert_eq!(cli.drone_addrs(), vec![sdk::default_control_addr()]);

        let config = cli.dispatcher_config(cli.drone_addrs()[0]);
        assert_eq!(config.default_timeout, Duration::from_secs(5));
        assert!(config.verify_sender);
    }

    #[test]
    fn test_multiple_drones_use_ephemeral_ports() {
        let cli = Cli::try_parse_from([
            "tello-pilot",
            "status",
            "--drone",
            "192.168.1.20",
            "--drone",
            "192.168.1.21",
            "--local-port",
            "9000",
        ])
        .unwrap();

        assert_eq!(cli.drone_addrs().len(), 2);
        assert_eq!(cli.dispatcher_config(cli.drone_addrs()[0]).local_port, 0);
    }

    #[test]
    fn test_send_joins_words() {
        let cli = Cli::try_parse_from(["tello-pilot", "send", "cw", "90"]).unwrap();
        match cli.action {
            Action::Send { text, .. } => assert_eq!(text.join(" "), "cw 90"),
            other => panic!("unexpected action: {:?}", other),
        }
    }
}
