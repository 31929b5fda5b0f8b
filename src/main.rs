mod cli;
mod command;
mod flight;
mod station;
mod telemetry;
mod transport;

use anyhow::{bail, Result};
use clap::Parser;
use cli::{Action, Cli};
use command::{CommandDispatcher, DispatcherConfig};
use flight::{demo_plan, FlightPhase, FlightRunner};
use std::net::SocketAddr;
use std::time::Duration;
use tello_shared::Query;
use telemetry::{TelemetryReader, TelemetrySnapshot};

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    match &cli.action {
        Action::Fly => fly(&cli).await,
        Action::Send {
            text,
            post_delay_ms,
        } => send(&cli, &text.join(" "), Duration::from_millis(*post_delay_ms)).await,
        Action::Status { queries } => status(&cli, queries).await,
        Action::JoinWifi { ssid, password } => join_wifi(&cli, ssid, password).await,
    }
}

fn single_drone(cli: &Cli) -> Result<SocketAddr> {
    match cli.drone_addrs().as_slice() {
        [addr] => Ok(*addr),
        addrs => bail!("this action targets one drone, got {}", addrs.len()),
    }
}

async fn fly(cli: &Cli) -> Result<()> {
    let drone = single_drone(cli)?;
    let mut dispatcher = CommandDispatcher::open(cli.dispatcher_config(drone)).await?;
    info!("Flying demo sequence on {}", dispatcher.drone_addr());

    let mut runner = FlightRunner::new(&mut dispatcher);
    let result = runner.run(&demo_plan()).await;
    let phase = runner.phase();
    let sent = dispatcher.commands_sent();
    dispatcher.close();

    match result {
        Ok(report) => {
            for step in &report.steps {
                info!(
                    "  {:<14} {}",
                    step.command,
                    step.reply.as_deref().unwrap_or("(no response)")
                );
            }
            info!(
                "Flight finished in phase {:?} after {:.1}s ({} command(s) sent)",
                report.phase,
                report.elapsed.as_secs_f64(),
                sent
            );
            Ok(())
        }
        Err(e) => {
            error!("{:#}", e);
            if phase == FlightPhase::Airborne {
                warn!("Drone may still be airborne; land it manually");
            }
            Err(e)
        }
    }
}

async fn send(cli: &Cli, text: &str, post_delay: Duration) -> Result<()> {
    let drone = single_drone(cli)?;
    let config = DispatcherConfig {
        default_post_delay: post_delay,
        ..cli.dispatcher_config(drone)
    };
    let mut dispatcher = CommandDispatcher::open(config).await?;
    let reply = dispatcher.send(text).await?;

    println!("{}", reply.as_deref().unwrap_or("(no response)"));
    Ok(())
}

/// One dispatcher per drone, each on its own task
async fn status(cli: &Cli, queries: &[Query]) -> Result<()> {
    let reader = if queries.is_empty() {
        TelemetryReader::new(cli.timeout())
    } else {
        TelemetryReader::new(cli.timeout()).with_queries(queries)
    };

    let polls = cli.drone_addrs().into_iter().map(|drone| {
        let config = cli.dispatcher_config(drone);
        let reader = reader.clone();
        tokio::spawn(async move { (drone, poll_drone(config, reader).await) })
    });

    let mut failures = 0;
    for joined in futures::future::join_all(polls).await {
        let (drone, result) = joined?;
        match result {
            Ok(snapshot) => print!(
                "{} ({}/{} answered)\n{}",
                drone,
                snapshot.answered(),
                snapshot.raw.len(),
                snapshot
            ),
            Err(e) => {
                failures += 1;
                error!("{}: {:#}", drone, e);
            }
        }
    }

    if failures > 0 {
        bail!("{} drone(s) could not be polled", failures);
    }
    Ok(())
}

async fn poll_drone(
    config: DispatcherConfig,
    reader: TelemetryReader,
) -> Result<TelemetrySnapshot> {
    let mut dispatcher = CommandDispatcher::open(config).await?;
    let timeout = dispatcher.config().default_timeout;
    dispatcher
        .send_required("command", timeout, Duration::ZERO)
        .await?;
    reader.snapshot(&mut dispatcher).await
}

async fn join_wifi(cli: &Cli, ssid: &str, password: &str) -> Result<()> {
    let drone = single_drone(cli)?;
    let mut dispatcher = CommandDispatcher::open(cli.dispatcher_config(drone)).await?;

    let outcome = station::join_network(&mut dispatcher, ssid, password).await?;
    println!("{}", outcome.explain());
    Ok(())
}
