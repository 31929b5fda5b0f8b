//! Telemetry Reader
//!
//! Polls the drone's telemetry queries one at a time and collects the
//! replies into a snapshot.

use crate::command::CommandDispatcher;
use crate::transport::DatagramTransport;
use anyhow::Result;
use std::fmt;
use std::time::Duration;
use tello_shared::telemetry::parse_scalar;
use tello_shared::{Acceleration, Attitude, Query};
use tracing::debug;

/// One poll of every telemetry query
#[derive(Debug, Clone, Default)]
pub struct TelemetrySnapshot {
    /// Battery charge in percent
    pub battery_percent: Option<f64>,
    /// Height as reported (decimetres on current firmware)
    pub height: Option<f64>,
    /// Motor-on time in seconds
    pub flight_time_s: Option<f64>,
    pub speed: Option<f64>,
    /// Mean of the reported temperature range in °C
    pub temperature_c: Option<f64>,
    pub wifi_snr: Option<f64>,
    pub attitude: Option<Attitude>,
    pub acceleration: Option<Acceleration>,
    /// Barometer altitude in metres
    pub barometer_m: Option<f64>,
    /// Time-of-flight distance as reported
    pub tof: Option<f64>,
    /// Raw reply per query, `None` on timeout
    pub raw: Vec<(Query, Option<String>)>,
}

impl TelemetrySnapshot {
    fn record(&mut self, query: Query, reply: Option<String>) {
        if let Some(value) = reply.as_deref() {
            self.apply(query, value);
        }
        self.raw.push((query, reply));
    }

    fn apply(&mut self, query: Query, value: &str) {
        let scalar = || match parse_scalar(value) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!("{}: {}", query.token(), e);
                None
            }
        };

        match query {
            Query::Battery => self.battery_percent = scalar(),
            Query::Height => self.height = scalar(),
            Query::Time => self.flight_time_s = scalar(),
            Query::Speed => self.speed = scalar(),
            Query::Temp => self.temperature_c = scalar(),
            Query::Wifi => self.wifi_snr = scalar(),
            Query::Baro => self.barometer_m = scalar(),
            Query::Tof => self.tof = scalar(),
            Query::Attitude => self.attitude = Attitude::parse(value).ok(),
            Query::Acceleration => self.acceleration = Acceleration::parse(value).ok(),
        }
    }

    /// Number of queries that got any reply
    pub fn answered(&self) -> usize {
        self.raw.iter().filter(|(_, r)| r.is_some()).count()
    }
}

impl fmt::Display for TelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (query, reply) in &self.raw {
            let shown = reply.as_deref().unwrap_or("(no response)");
            writeln!(f, "  {:<14} {}", query.token(), shown)?;
        }
        Ok(())
    }
}

/// Reads telemetry through a dispatcher
#[derive(Debug, Clone)]
pub struct TelemetryReader {
    timeout: Duration,
    queries: Vec<Query>,
}

impl Default for TelemetryReader {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

impl TelemetryReader {
    /// Create a reader that issues every query with `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            queries: Query::ALL.to_vec(),
        }
    }

    /// Restrict the poll to `queries`
    pub fn with_queries(mut self, queries: &[Query]) -> Self {
        self.queries = queries.to_vec();
        self
    }

    /// Issue one query and return the verbatim reply
    pub async fn query<T: DatagramTransport>(
        &self,
        dispatcher: &mut CommandDispatcher<T>,
        query: Query,
    ) -> Result<Option<String>> {
        dispatcher
            .send_command(query.token(), self.timeout, Duration::ZERO)
            .await
    }

    /// Poll every configured query in order.
    ///
    /// Timeouts leave the field empty; transport failures abort the poll.
    pub async fn snapshot<T: DatagramTransport>(
        &self,
        dispatcher: &mut CommandDispatcher<T>,
    ) -> Result<TelemetrySnapshot> {
        let mut snapshot = TelemetrySnapshot::default();

        for &query in &self.queries {
            let reply = self.query(dispatcher, query).await?;
            snapshot.record(query, reply);
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::DispatcherConfig;
    use tello_sim::{spawn_mock, MockDroneConfig};

    #[tokio::test]
    async fn test_snapshot_parses_every_query() {
        let drone = spawn_mock(MockDroneConfig::default()).await.unwrap();
        let mut dispatcher = CommandDispatcher::open(DispatcherConfig::for_drone(drone.addr()))
            .await
            .unwrap();

        let snapshot = TelemetryReader::default()
            .snapshot(&mut dispatcher)
            .await
            .unwrap();

        assert_eq!(snapshot.answered(), Query::ALL.len());
        assert_eq!(snapshot.battery_percent, Some(87.0));
        assert_eq!(snapshot.temperature_c, Some(61.0));
        assert_eq!(snapshot.tof, Some(100.0));
        assert_eq!(snapshot.attitude.map(|a| a.yaw), Some(0.0));
        assert_eq!(snapshot.acceleration.map(|a| a.z), Some(-998.0));
    }

    #[tokio::test]
    async fn test_timeout_leaves_field_empty() {
        let config = MockDroneConfig::default().silent().reply("battery?", "76");
        let drone = spawn_mock(config).await.unwrap();
        let mut dispatcher = CommandDispatcher::open(DispatcherConfig::for_drone(drone.addr()))
            .await
            .unwrap();

        let snapshot = TelemetryReader::new(Duration::from_millis(100))
            .with_queries(&[Query::Battery, Query::Height])
            .snapshot(&mut dispatcher)
            .await
            .unwrap();

        assert_eq!(snapshot.battery_percent, Some(76.0));
        assert_eq!(snapshot.height, None);
        assert_eq!(snapshot.answered(), 1);
        assert!(snapshot.to_string().contains("(no response)"));
    }

    #[test]
    fn test_unparsable_value_kept_raw() {
        let mut snapshot = TelemetrySnapshot::default();
        snapshot.record(Query::Battery, Some("n/a".into()));

        assert_eq!(snapshot.battery_percent, None);
        assert_eq!(snapshot.answered(), 1);
    }
}
