//! Datagram codec for the SDK text protocol
//!
//! Each command is one UDP datagram:
//! ```text
//! [ N bytes: ASCII command line, no trailing newline ]
//! ```
//! Each reply is one datagram holding a single UTF-8 line. Datagram
//! boundaries are the message boundaries, so no framing is added.

use bytes::Bytes;
use thiserror::Error;

use crate::sdk::MAX_DATAGRAM_SIZE;

/// Errors that can occur while encoding a command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Command is empty")]
    Empty,

    #[error("Command too large: {0} bytes (max: {MAX_DATAGRAM_SIZE})")]
    TooLarge(usize),

    #[error("Command contains non-ASCII byte at offset {0}")]
    NonAscii(usize),

    #[error("Command spans more than one line")]
    MultiLine,
}

/// Encode a command line into a datagram payload
///
/// Surrounding whitespace is trimmed; the text itself is sent verbatim.
pub fn encode_command(text: &str) -> Result<Bytes, CodecError> {
    let line = text.trim();

    if line.is_empty() {
        return Err(CodecError::Empty);
    }

    if line.len() > MAX_DATAGRAM_SIZE {
        return Err(CodecError::TooLarge(line.len()));
    }

    if let Some(pos) = line.bytes().position(|b| !b.is_ascii()) {
        return Err(CodecError::NonAscii(pos));
    }

    if line.contains(['\n', '\r']) {
        return Err(CodecError::MultiLine);
    }

    Ok(Bytes::copy_from_slice(line.as_bytes()))
}

/// Decode a reply datagram into a trimmed line
///
/// Invalid UTF-8 sequences are replaced rather than rejected; the drone
/// occasionally pads replies with stray bytes.
pub fn decode_reply(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload).trim().to_string()
}
