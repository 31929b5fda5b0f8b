//! Flight plan steps

use std::time::Duration;
use tello_shared::{Command, MoveDirection, Rotation};

/// One command in a flight sequence
#[derive(Debug, Clone)]
pub struct FlightStep {
    pub command: Command,
    /// How long to wait for the reply
    pub timeout: Duration,
    /// Settle time after the reply (or timeout)
    pub post_delay: Duration,
    /// Abort the sequence unless the drone answers `ok`
    pub required: bool,
}

impl FlightStep {
    /// A step that must be acknowledged with `ok`
    pub fn required(command: Command, post_delay: Duration) -> Self {
        Self {
            timeout: reply_timeout(&command),
            command,
            post_delay,
            required: true,
        }
    }
}

#[cfg(test)]
impl FlightStep {
    /// A step whose reply is logged but not checked
    pub fn optional(command: Command, post_delay: Duration) -> Self {
        Self {
            required: false,
            ..Self::required(command, post_delay)
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The drone only replies once a maneuver finishes, so motion gets longer
fn reply_timeout(command: &Command) -> Duration {
    match command {
        Command::Takeoff | Command::Land => Duration::from_secs(20),
        Command::Move { .. }
        | Command::Rotate { .. }
        | Command::Flip(_)
        | Command::Curve { .. }
        | Command::Go { .. } => Duration::from_secs(10),
        _ => Duration::from_secs(5),
    }
}

/// Short indoor demo: up, out 1 m, turn around, back, land
pub fn demo_plan() -> Vec<FlightStep> {
    let secs = Duration::from_secs;

    vec![
        FlightStep::required(Command::EnterSdk, secs(1)),
        FlightStep::required(Command::Speed { cm_s: 50 }, secs(3)),
        FlightStep::required(Command::Takeoff, secs(4)),
        // Roughly 1.5 m total height indoors
        FlightStep::required(
            Command::Move {
                direction: MoveDirection::Up,
                cm: 40,
            },
            secs(3),
        ),
        FlightStep::required(
            Command::Move {
                direction: MoveDirection::Forward,
                cm: 100,
            },
            secs(4),
        ),
        FlightStep::required(
            Command::Rotate {
                rotation: Rotation::Clockwise,
                degrees: 180,
            },
            secs(5),
        ),
        FlightStep::required(
            Command::Move {
                direction: MoveDirection::Forward,
                cm: 100,
            },
            secs(7),
        ),
        FlightStep::required(Command::Land, secs(3)),
    ]
}
