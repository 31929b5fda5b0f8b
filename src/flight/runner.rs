//! Flight runner - sends plan steps and enforces acknowledgments

use super::FlightStep;
use crate::command::CommandDispatcher;
use crate::transport::DatagramTransport;
use anyhow::{Context, Result};
use std::time::Duration;
use tello_shared::{require_ok, Command};
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Where the drone is believed to be, based on acknowledged commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightPhase {
    /// SDK mode not confirmed yet
    Idle,
    /// `command` acknowledged
    SdkMode,
    /// `takeoff` acknowledged
    Airborne,
    /// `land` or `emergency` acknowledged
    Landed,
}

impl FlightPhase {
    fn after(self, command: &Command) -> Self {
        match command {
            Command::EnterSdk if self == FlightPhase::Idle => FlightPhase::SdkMode,
            Command::Takeoff => FlightPhase::Airborne,
            Command::Land | Command::Emergency => FlightPhase::Landed,
            _ => self,
        }
    }
}

/// Result of one executed step
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub command: String,
    pub reply: Option<String>,
}

/// Summary of a completed flight
#[derive(Debug, Clone)]
pub struct FlightReport {
    pub steps: Vec<StepOutcome>,
    pub phase: FlightPhase,
    pub elapsed: Duration,
}

/// Runs flight plans through a dispatcher
pub struct FlightRunner<'a, T: DatagramTransport> {
    dispatcher: &'a mut CommandDispatcher<T>,
    phase: FlightPhase,
}

impl<'a, T: DatagramTransport> FlightRunner<'a, T> {
    pub fn new(dispatcher: &'a mut CommandDispatcher<T>) -> Self {
        Self {
            dispatcher,
            phase: FlightPhase::Idle,
        }
    }

    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    /// Run every step in order.
    ///
    /// The first required step that is not answered with `ok` aborts the
    /// run; nothing further is sent, including any landing command.
    pub async fn run(&mut self, plan: &[FlightStep]) -> Result<FlightReport> {
        let started = Instant::now();
        let mut steps = Vec::with_capacity(plan.len());

        info!("Starting flight: {} step(s)", plan.len());

        for (index, step) in plan.iter().enumerate() {
            let text = step.command.to_string();
            let label = format!("step {}/{} ({})", index + 1, plan.len(), text);

            for note in step.command.advisories() {
                warn!("[{}] Advisory: {}", label, note);
            }

            let reply = self
                .dispatcher
                .send_command(&text, step.timeout, step.post_delay)
                .await
                .with_context(|| format!("transport failure at {}", label))?;

            if step.required {
                if let Err(e) = require_ok(reply.as_deref(), &label) {
                    error!("Flight aborted: {} (phase: {:?})", e, self.phase);
                    return Err(e).context(format!("flight aborted in phase {:?}", self.phase));
                }
                self.phase = self.phase.after(&step.command);
            } else if reply.is_none() {
                warn!("[{}] no reply, continuing", label);
            }

            steps.push(StepOutcome {
                command: text,
                reply,
            });
        }

        let report = FlightReport {
            steps,
            phase: self.phase,
            elapsed: started.elapsed(),
        };

        info!(
            "Flight complete: {} step(s) in {:.1}s",
            report.steps.len(),
            report.elapsed.as_secs_f64()
        );

        Ok(report)
    }
}
