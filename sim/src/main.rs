use std::net::SocketAddr;
use tello_shared::sdk;
use tello_sim::{MockDrone, MockDroneConfig};

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .init();

    let addr = SocketAddr::from(([127, 0, 0, 1], sdk::CONTROL_PORT));
    let drone = MockDrone::bind(MockDroneConfig::default().bind(addr)).await?;

    info!("Mock drone listening on {}", drone.local_addr()?);
    drone.run().await
}
