//! Command dispatch over the SDK control channel
//!
//! This module handles:
//! - Owning the UDP socket for one drone
//! - Sending one command at a time and waiting for its reply
//! - Discarding stale or foreign datagrams
//! - Turning replies into pass/fail verdicts

mod config;
mod dispatcher;

pub use config::DispatcherConfig;
pub use dispatcher::CommandDispatcher;
