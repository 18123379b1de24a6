use std::{fmt, io};

use crate::device::SessionState;

/// Errors surfaced by the UBX transceiver and the session controller.
///
/// NMEA malformation never appears here: a bad sentence is absorbed as a
/// [`crate::SentenceOutcome`] value and the navigation record is left alone.
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Serial(serialport::Error),
    /// No complete UBX response arrived within the response window.
    AckTimeout,
    /// The declared payload length cannot fit the receive budget.
    FrameTooLarge { len: u16, limit: usize },
    /// The receive budget filled before a frame completed.
    BufferOverflow { limit: usize },
    InvalidChecksum { expect: u16, got: u16 },
    /// A response carried a class/id the current exchange did not ask for.
    UnexpectedFrame { class: u8, id: u8 },
    /// All send attempts exhausted without a matching acknowledgement.
    NoAck { class: u8, id: u8 },
    /// Operation not legal in the session's current state.
    InvalidTransition {
        op: &'static str,
        state: SessionState,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "serial I/O error: {e}"),
            Error::Serial(e) => write!(f, "serial port error: {e}"),
            Error::AckTimeout => f.write_str("timed out waiting for UBX response"),
            Error::FrameTooLarge { len, limit } => write!(
                f,
                "UBX payload of {len} bytes does not fit receive budget of {limit}"
            ),
            Error::BufferOverflow { limit } => {
                write!(f, "receive budget of {limit} bytes filled mid-frame")
            },
            Error::InvalidChecksum { expect, got } => write!(
                f,
                "not valid packet's checksum, expect {expect:x}, got {got:x}"
            ),
            Error::UnexpectedFrame { class, id } => {
                write!(f, "unexpected UBX packet {class:#04x}/{id:#04x}")
            },
            Error::NoAck { class, id } => {
                write!(f, "no acknowledgement for {class:#04x}/{id:#04x}")
            },
            Error::InvalidTransition { op, state } => {
                write!(f, "{op} not allowed while session is {state}")
            },
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}

impl From<serialport::Error> for Error {
    fn from(error: serialport::Error) -> Self {
        Error::Serial(error)
    }
}

/// Error converting navigation fix fields to a calendar date/time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeError {
    InvalidDate,
    InvalidTime,
}

impl fmt::Display for DateTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateTimeError::InvalidDate => f.write_str("invalid date"),
            DateTimeError::InvalidTime => f.write_str("invalid time"),
        }
    }
}

impl std::error::Error for DateTimeError {}
