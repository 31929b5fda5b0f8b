//! Telemetry value parsing
//!
//! Query replies are passed through the dispatcher verbatim; these helpers
//! turn them into numbers when a caller wants them. Firmware versions differ
//! in formatting, so the parsers accept:
//! - bare numbers: `76`, `-12.5`
//! - numbers with a unit suffix: `10dm`, `45s`, `30cm`
//! - temperature ranges: `60~62C` (mean of the two ends)
//! - tuples separated by `,` or `;`, optionally labelled: `pitch:1;roll:-2;yaw:90;`

use thiserror::Error;

/// Errors that can occur while parsing a telemetry reply
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("Unparsable telemetry value: {0:?}")]
    Unparsable(String),

    #[error("Expected {expected} components, got {found} in {raw:?}")]
    Arity {
        expected: usize,
        found: usize,
        raw: String,
    },
}

/// Aircraft attitude in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attitude {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

/// Acceleration components (firmware units, 0.001 g)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Attitude {
    pub fn parse(raw: &str) -> Result<Self, TelemetryError> {
        let [pitch, roll, yaw] = parse_triple(raw)?;
        Ok(Self { pitch, roll, yaw })
    }
}

impl Acceleration {
    pub fn parse(raw: &str) -> Result<Self, TelemetryError> {
        let [x, y, z] = parse_triple(raw)?;
        Ok(Self { x, y, z })
    }
}

/// Parse a scalar reply, ignoring a trailing unit
pub fn parse_scalar(raw: &str) -> Result<f64, TelemetryError> {
    let value = raw.trim();

    if let Some((low, high)) = value.split_once('~') {
        let low = leading_number(low).ok_or_else(|| TelemetryError::Unparsable(raw.into()))?;
        let high = leading_number(high).ok_or_else(|| TelemetryError::Unparsable(raw.into()))?;
        return Ok((low + high) / 2.0);
    }

    leading_number(value).ok_or_else(|| TelemetryError::Unparsable(raw.into()))
}

/// Parse a three-component tuple
pub fn parse_triple(raw: &str) -> Result<[f64; 3], TelemetryError> {
    let parts: Vec<&str> = raw
        .split([',', ';'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if parts.len() != 3 {
        return Err(TelemetryError::Arity {
            expected: 3,
            found: parts.len(),
            raw: raw.into(),
        });
    }

    let mut out = [0.0; 3];
    for (slot, part) in out.iter_mut().zip(parts) {
        // Drop an optional `label:` prefix
        let value = part.rsplit_once(':').map(|(_, v)| v).unwrap_or(part);
        *slot = parse_scalar(value)?;
    }
    Ok(out)
}

fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let end = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text[..end].parse().ok()
}
