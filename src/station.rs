//! Station mode join
//!
//! Asks the drone to leave its own access point and join an existing
//! Wi-Fi network as a client. On success the drone reboots its radio, so
//! the reply to `ap` is the last thing heard on the current link.

use crate::command::CommandDispatcher;
use crate::transport::DatagramTransport;
use anyhow::{bail, Result};
use std::time::Duration;
use tello_shared::{Command, Response};
use tracing::{info, warn};

const SDK_TIMEOUT: Duration = Duration::from_secs(3);
const AP_TIMEOUT: Duration = Duration::from_secs(8);

/// How the drone answered the join request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// `ok`: the drone will drop its access point and try the network
    Joining,
    /// `error`: typically a model or firmware without station mode
    Refused,
    /// Anything other than `ok`/`error`
    Unexpected(String),
    /// Nothing came back
    NoResponse,
}

impl JoinOutcome {
    fn from_reply(reply: Option<&str>) -> Self {
        match reply.map(Response::classify) {
            Some(Response::Ok) => JoinOutcome::Joining,
            Some(Response::Error) => JoinOutcome::Refused,
            Some(Response::Value(v)) => JoinOutcome::Unexpected(v),
            None => JoinOutcome::NoResponse,
        }
    }

    /// One-line explanation for the operator
    pub fn explain(&self) -> String {
        match self {
            JoinOutcome::Joining => {
                "Sent OK. The drone should drop its Wi-Fi and attempt to join the network.".into()
            }
            JoinOutcome::Refused => {
                "Drone replied ERROR. This model or firmware likely does not support station mode."
                    .into()
            }
            JoinOutcome::Unexpected(reply) => format!("Unexpected reply: {:?}", reply),
            JoinOutcome::NoResponse => {
                "No response. Either not in SDK mode, not on the drone's Wi-Fi, or command unsupported."
                    .into()
            }
        }
    }
}

/// Enter SDK mode, then send `ap <ssid> <password>`.
///
/// The SDK-mode reply is only logged; the verdict comes from the `ap` reply.
pub async fn join_network<T: DatagramTransport>(
    dispatcher: &mut CommandDispatcher<T>,
    ssid: &str,
    password: &str,
) -> Result<JoinOutcome> {
    for (name, value) in [("ssid", ssid), ("password", password)] {
        if value.is_empty() || value.contains(char::is_whitespace) {
            bail!("{} must be non-empty and contain no whitespace", name);
        }
    }

    let sdk = dispatcher
        .send_command(&Command::EnterSdk.to_string(), SDK_TIMEOUT, Duration::ZERO)
        .await?;
    if sdk.as_deref() != Some("ok") {
        warn!("SDK mode not confirmed ({:?}), sending ap anyway", sdk);
    }

    let ap = Command::Ap {
        ssid: ssid.into(),
        password: password.into(),
    };
    let reply = dispatcher
        .send_command(&ap.to_string(), AP_TIMEOUT, Duration::ZERO)
        .await?;

    let outcome = JoinOutcome::from_reply(reply.as_deref());
    info!("Station join for {:?}: {:?}", ssid, outcome);
    Ok(outcome)
}
