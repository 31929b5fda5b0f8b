//! Tello Shared Protocol Types
//!
//! This crate provides the protocol types and codec for the Tello SDK text
//! protocol, shared between the pilot binary and the mock drone.

pub mod codec;
pub mod command;
pub mod response;
pub mod telemetry;

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

// Re-export commonly used types at crate root
pub use codec::CodecError;
pub use command::{Command, FlipDirection, MoveDirection, ParseCommandError, Query, Rotation};
pub use response::{require_ok, AckError, Response};
pub use telemetry::{Attitude, Acceleration, TelemetryError};

/// Protocol parameters fixed by the drone firmware
pub mod sdk {
    use super::*;

    /// Drone address when directly connected to its access point
    pub const DRONE_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 10, 1);

    /// UDP port the drone listens on for SDK commands
    pub const CONTROL_PORT: u16 = 8889;

    /// UDP port the raw video stream is pushed to after `streamon`
    pub const VIDEO_PORT: u16 = 11111;

    /// Largest reply datagram we expect from the drone
    pub const MAX_DATAGRAM_SIZE: usize = 1024;

    /// Default time to wait for a reply
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Default control endpoint (`192.168.10.1:8889`)
    pub fn default_control_addr() -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(DRONE_IP, CONTROL_PORT))
    }
}

/// Advisory parameter ranges documented for the SDK
pub mod limits {
    use std::ops::RangeInclusive;

    /// Linear move distance in cm
    pub const DISTANCE_CM: RangeInclusive<u32> = 20..=500;

    /// Rotation angle in degrees
    pub const ANGLE_DEG: RangeInclusive<u32> = 1..=360;

    /// Cruise speed in cm/s
    pub const SPEED_CM_S: RangeInclusive<u32> = 10..=100;

    /// Coordinate component for `go` and `curve`
    pub const COORD_CM: RangeInclusive<i32> = -500..=500;

    /// Speed for `go` and `curve` in cm/s
    pub const PATH_SPEED_CM_S: RangeInclusive<u32> = 10..=60;
}
