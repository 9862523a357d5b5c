//! Deadline-bounded request/response exchange with the decision service.
//!
//! One exchange walks `WaitingForChannel → Connected → Written →
//! ReadingResponse` and ends in exactly one [`ExchangeOutcome`]. Every
//! blocking step is bounded by the same [`Deadline`], and the stream is owned
//! by the exchange scope so it is released on every exit path.

use std::fmt;
use std::io;

use crate::channel::{Channel, ChannelStream};
use crate::deadline::Deadline;
use crate::encoder::{EncodedMessage, LINE_TERMINATOR};

/// Bytes requested per read.
const READ_CHUNK: usize = 256;

/// Upper bound on an unterminated response before the exchange gives up.
pub const MAX_RESPONSE_BYTES: usize = 64 * 1024;

/// Result of one exchange with the decision service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// A non-empty response line was received
    Decoded(String),
    /// The deadline had passed, or the channel did not become available in time
    ChannelUnavailable,
    /// The channel existed but could not be opened
    ConnectFailed,
    /// The request could not be written in full
    WriteFailed,
    /// The deadline passed before a terminated response arrived
    ReadTimedOut,
    /// The response line was empty
    EmptyResponse,
    /// The request could not be encoded; the channel was never touched
    EncodeFailed,
    /// Reading failed with an error other than a timeout
    ReadFailed,
    /// The response grew past [`MAX_RESPONSE_BYTES`] without a terminator
    Oversized,
}

impl ExchangeOutcome {
    /// Stable label used in log events and tooling output.
    pub fn label(&self) -> &'static str {
        match self {
            ExchangeOutcome::Decoded(_) => "decoded",
            ExchangeOutcome::ChannelUnavailable => "channel_unavailable",
            ExchangeOutcome::ConnectFailed => "connect_failed",
            ExchangeOutcome::WriteFailed => "write_failed",
            ExchangeOutcome::ReadTimedOut => "read_timed_out",
            ExchangeOutcome::EmptyResponse => "empty_response",
            ExchangeOutcome::EncodeFailed => "encode_failed",
            ExchangeOutcome::ReadFailed => "read_failed",
            ExchangeOutcome::Oversized => "oversized",
        }
    }

    /// Returns true for every outcome other than a decoded response.
    pub fn is_failure(&self) -> bool {
        !matches!(self, ExchangeOutcome::Decoded(_))
    }
}

impl fmt::Display for ExchangeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Performs one request/response round trip, bounded by `deadline`.
///
/// Never retries: a single attempt is made and its outcome returned.
pub fn exchange<C: Channel>(
    channel: &C,
    message: &EncodedMessage,
    deadline: Deadline,
) -> ExchangeOutcome {
    let Some(remaining) = deadline.remaining() else {
        return ExchangeOutcome::ChannelUnavailable;
    };
    if channel.wait_available(remaining).is_err() {
        return ExchangeOutcome::ChannelUnavailable;
    }

    let Some(remaining) = deadline.remaining() else {
        return ExchangeOutcome::ConnectFailed;
    };
    let mut stream = match channel.open(remaining) {
        Ok(stream) => stream,
        Err(_) => return ExchangeOutcome::ConnectFailed,
    };

    if write_request(&mut stream, message, deadline).is_err() {
        return ExchangeOutcome::WriteFailed;
    }

    read_response(&mut stream, deadline)
    // `stream` is dropped here and on each early return above.
}

fn write_request<S: ChannelStream>(
    stream: &mut S,
    message: &EncodedMessage,
    deadline: Deadline,
) -> io::Result<()> {
    let remaining = deadline
        .remaining()
        .ok_or_else(|| io::Error::from(io::ErrorKind::TimedOut))?;
    stream.set_write_timeout(remaining)?;
    stream.write_all(message.expose_bytes())?;
    stream.flush()
}

fn read_response<S: ChannelStream>(stream: &mut S, deadline: Deadline) -> ExchangeOutcome {
    let mut response: Vec<u8> = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let Some(remaining) = deadline.remaining() else {
            return ExchangeOutcome::ReadTimedOut;
        };
        if stream.set_read_timeout(remaining).is_err() {
            return ExchangeOutcome::ReadFailed;
        }

        match stream.read(&mut chunk) {
            // Peer closed: what arrived so far is the whole response.
            Ok(0) => break,
            Ok(n) => {
                let scanned = response.len();
                response.extend_from_slice(&chunk[..n]);
                if let Some(offset) = response[scanned..]
                    .iter()
                    .position(|byte| *byte == LINE_TERMINATOR)
                {
                    response.truncate(scanned + offset);
                    break;
                }
                if response.len() > MAX_RESPONSE_BYTES {
                    return ExchangeOutcome::Oversized;
                }
            }
            Err(e) if is_transient(&e) => continue,
            Err(_) => return ExchangeOutcome::ReadFailed,
        }
    }

    if response.is_empty() {
        ExchangeOutcome::EmptyResponse
    } else {
        ExchangeOutcome::Decoded(String::from_utf8_lossy(&response).into_owned())
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}
