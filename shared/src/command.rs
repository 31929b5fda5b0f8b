//! SDK command vocabulary
//!
//! Every command the drone accepts is a single ASCII line. [`Command`] gives
//! that vocabulary a typed shape; `Display` renders the exact wire text and
//! `FromStr` parses it back. Parameter ranges are advisory only: a command
//! outside the documented range is still rendered and sent unchanged.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::limits;

/// Errors that can occur while parsing a command line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("Empty command line")]
    Empty,

    #[error("Unknown command: {0}")]
    UnknownVerb(String),

    #[error("{verb}: expected {expected} argument(s), got {found}")]
    ArgCount {
        verb: String,
        expected: usize,
        found: usize,
    },

    #[error("{verb}: invalid argument {value:?}")]
    InvalidArgument { verb: String, value: String },
}

/// Linear move directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
    Left,
    Right,
    Forward,
    Back,
}

impl MoveDirection {
    pub fn token(self) -> &'static str {
        match self {
            MoveDirection::Up => "up",
            MoveDirection::Down => "down",
            MoveDirection::Left => "left",
            MoveDirection::Right => "right",
            MoveDirection::Forward => "forward",
            MoveDirection::Back => "back",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "up" => MoveDirection::Up,
            "down" => MoveDirection::Down,
            "left" => MoveDirection::Left,
            "right" => MoveDirection::Right,
            "forward" => MoveDirection::Forward,
            "back" => MoveDirection::Back,
            _ => return None,
        })
    }
}

/// Yaw rotation sense
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    pub fn token(self) -> &'static str {
        match self {
            Rotation::Clockwise => "cw",
            Rotation::CounterClockwise => "ccw",
        }
    }
}

/// Flip directions (`flip l|r|f|b`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipDirection {
    Left,
    Right,
    Forward,
    Back,
}

impl FlipDirection {
    pub fn token(self) -> &'static str {
        match self {
            FlipDirection::Left => "l",
            FlipDirection::Right => "r",
            FlipDirection::Forward => "f",
            FlipDirection::Back => "b",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "l" => FlipDirection::Left,
            "r" => FlipDirection::Right,
            "f" => FlipDirection::Forward,
            "b" => FlipDirection::Back,
            _ => return None,
        })
    }
}

/// Telemetry queries; the reply is a value rather than `ok`/`error`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Battery,
    Height,
    Time,
    Speed,
    Temp,
    Wifi,
    Attitude,
    Acceleration,
    Baro,
    Tof,
}

impl Query {
    /// All queries, in the order a status poll issues them
    pub const ALL: [Query; 10] = [
        Query::Battery,
        Query::Height,
        Query::Time,
        Query::Speed,
        Query::Temp,
        Query::Wifi,
        Query::Attitude,
        Query::Acceleration,
        Query::Baro,
        Query::Tof,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Query::Battery => "battery?",
            Query::Height => "height?",
            Query::Time => "time?",
            Query::Speed => "speed?",
            Query::Temp => "temp?",
            Query::Wifi => "wifi?",
            Query::Attitude => "attitude?",
            Query::Acceleration => "acceleration?",
            Query::Baro => "baro?",
            Query::Tof => "tof?",
        }
    }

    /// Look up a query by its wire token, e.g. `battery?`
    pub fn from_token(token: &str) -> Option<Self> {
        Query::ALL.into_iter().find(|q| q.token() == token)
    }
}

/// A single SDK command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Enter SDK mode (`command`)
    EnterSdk,
    Takeoff,
    Land,
    /// Stop all motors immediately
    Emergency,
    Move { direction: MoveDirection, cm: u32 },
    Rotate { rotation: Rotation, degrees: u32 },
    Speed { cm_s: u32 },
    Flip(FlipDirection),
    Query(Query),
    StreamOn,
    StreamOff,
    /// Join an existing Wi-Fi network as a client (station mode)
    Ap { ssid: String, password: String },
    Curve {
        x1: i32,
        y1: i32,
        z1: i32,
        x2: i32,
        y2: i32,
        z2: i32,
        speed: u32,
    },
    Go { x: i32, y: i32, z: i32, speed: u32 },
}

impl Command {
    /// Whether the reply is a telemetry value rather than `ok`/`error`
    pub fn is_query(&self) -> bool {
        matches!(self, Command::Query(_))
    }

    /// Range advisories for this command's parameters.
    ///
    /// An empty list means every parameter is inside the documented range.
    /// The drone is the authority: it answers `error` for values it refuses.
    pub fn advisories(&self) -> Vec<String> {
        let mut notes = Vec::new();

        match self {
            Command::Move { direction, cm } => {
                if !limits::DISTANCE_CM.contains(cm) {
                    notes.push(format!(
                        "{} {} cm outside {:?}",
                        direction.token(),
                        cm,
                        limits::DISTANCE_CM
                    ));
                }
            }
            Command::Rotate { rotation, degrees } => {
                if !limits::ANGLE_DEG.contains(degrees) {
                    notes.push(format!(
                        "{} {} deg outside {:?}",
                        rotation.token(),
                        degrees,
                        limits::ANGLE_DEG
                    ));
                }
            }
            Command::Speed { cm_s } => {
                if !limits::SPEED_CM_S.contains(cm_s) {
                    notes.push(format!("speed {} cm/s outside {:?}", cm_s, limits::SPEED_CM_S));
                }
            }
            Command::Curve {
                x1,
                y1,
                z1,
                x2,
                y2,
                z2,
                speed,
            } => {
                for coord in [x1, y1, z1, x2, y2, z2] {
                    if !limits::COORD_CM.contains(coord) {
                        notes.push(format!("curve coordinate {} outside {:?}", coord, limits::COORD_CM));
                    }
                }
                if !limits::PATH_SPEED_CM_S.contains(speed) {
                    notes.push(format!(
                        "curve speed {} outside {:?}",
                        speed,
                        limits::PATH_SPEED_CM_S
                    ));
                }
            }
            Command::Go { x, y, z, speed } => {
                for coord in [x, y, z] {
                    if !limits::COORD_CM.contains(coord) {
                        notes.push(format!("go coordinate {} outside {:?}", coord, limits::COORD_CM));
                    }
                }
                if !limits::PATH_SPEED_CM_S.contains(speed) {
                    notes.push(format!(
                        "go speed {} outside {:?}",
                        speed,
                        limits::PATH_SPEED_CM_S
                    ));
                }
            }
            _ => {}
        }

        notes
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::EnterSdk => write!(f, "command"),
            Command::Takeoff => write!(f, "takeoff"),
            Command::Land => write!(f, "land"),
            Command::Emergency => write!(f, "emergency"),
            Command::Move { direction, cm } => write!(f, "{} {}", direction.token(), cm),
            Command::Rotate { rotation, degrees } => write!(f, "{} {}", rotation.token(), degrees),
            Command::Speed { cm_s } => write!(f, "speed {}", cm_s),
            Command::Flip(dir) => write!(f, "flip {}", dir.token()),
            Command::Query(q) => write!(f, "{}", q.token()),
            Command::StreamOn => write!(f, "streamon"),
            Command::StreamOff => write!(f, "streamoff"),
            Command::Ap { ssid, password } => write!(f, "ap {} {}", ssid, password),
            Command::Curve {
                x1,
                y1,
                z1,
                x2,
                y2,
                z2,
                speed,
            } => write!(f, "curve {} {} {} {} {} {} {}", x1, y1, z1, x2, y2, z2, speed),
            Command::Go { x, y, z, speed } => write!(f, "go {} {} {} {}", x, y, z, speed),
        }
    }
}

fn expect_args(verb: &str, args: &[&str], expected: usize) -> Result<(), ParseCommandError> {
    if args.len() != expected {
        return Err(ParseCommandError::ArgCount {
            verb: verb.into(),
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

fn parse_arg<T: FromStr>(verb: &str, value: &str) -> Result<T, ParseCommandError> {
    value.parse().map_err(|_| ParseCommandError::InvalidArgument {
        verb: verb.into(),
        value: value.into(),
    })
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let verb = tokens.next().ok_or(ParseCommandError::Empty)?;
        let args: Vec<&str> = tokens.collect();

        if let Some(query) = Query::from_token(verb) {
            expect_args(verb, &args, 0)?;
            return Ok(Command::Query(query));
        }

        if let Some(direction) = MoveDirection::from_token(verb) {
            expect_args(verb, &args, 1)?;
            return Ok(Command::Move {
                direction,
                cm: parse_arg(verb, args[0])?,
            });
        }

        let command = match verb {
            "command" | "takeoff" | "land" | "emergency" | "streamon" | "streamoff" => {
                expect_args(verb, &args, 0)?;
                match verb {
                    "command" => Command::EnterSdk,
                    "takeoff" => Command::Takeoff,
                    "land" => Command::Land,
                    "emergency" => Command::Emergency,
                    "streamon" => Command::StreamOn,
                    _ => Command::StreamOff,
                }
            }
            "cw" | "ccw" => {
                expect_args(verb, &args, 1)?;
                let rotation = if verb == "cw" {
                    Rotation::Clockwise
                } else {
                    Rotation::CounterClockwise
                };
                Command::Rotate {
                    rotation,
                    degrees: parse_arg(verb, args[0])?,
                }
            }
            "speed" => {
                expect_args(verb, &args, 1)?;
                Command::Speed {
                    cm_s: parse_arg(verb, args[0])?,
                }
            }
            "flip" => {
                expect_args(verb, &args, 1)?;
                let dir = FlipDirection::from_token(args[0]).ok_or_else(|| {
                    ParseCommandError::InvalidArgument {
                        verb: verb.into(),
                        value: args[0].into(),
                    }
                })?;
                Command::Flip(dir)
            }
            "ap" => {
                expect_args(verb, &args, 2)?;
                Command::Ap {
                    ssid: args[0].into(),
                    password: args[1].into(),
                }
            }
            "curve" => {
                expect_args(verb, &args, 7)?;
                Command::Curve {
                    x1: parse_arg(verb, args[0])?,
                    y1: parse_arg(verb, args[1])?,
                    z1: parse_arg(verb, args[2])?,
                    x2: parse_arg(verb, args[3])?,
                    y2: parse_arg(verb, args[4])?,
                    z2: parse_arg(verb, args[5])?,
                    speed: parse_arg(verb, args[6])?,
                }
            }
            "go" => {
                expect_args(verb, &args, 4)?;
                Command::Go {
                    x: parse_arg(verb, args[0])?,
                    y: parse_arg(verb, args[1])?,
                    z: parse_arg(verb, args[2])?,
                    speed: parse_arg(verb, args[3])?,
                }
            }
            other => return Err(ParseCommandError::UnknownVerb(other.into())),
        };

        Ok(command)
    }
}
