//! Scripted flight sequences
//!
//! This module handles:
//! - Describing a flight as an ordered list of steps
//! - Running the steps through a dispatcher, one at a time
//! - Aborting the whole sequence on the first unacknowledged required step

mod plan;
mod runner;

pub use plan::{demo_plan, FlightStep};
pub use runner::{FlightPhase, FlightRunner};
