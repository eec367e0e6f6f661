use crate::constants::{ACK, CR, NAK, STX};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single command/response transaction.
///
/// The satellite answers in one of two shapes: a bare control byte
/// (`ACK`/`NAK`) or an `STX`-prefixed data frame whose end is signaled by
/// read exhaustion rather than a terminator. `Empty` covers both "nothing
/// came back before the timeout" and a transport fault swallowed at the
/// transaction boundary, so callers treat it as the universal failure
/// signal. A local guard rejection (e.g. renumber above 89) is reported as
/// `Nak`, indistinguishable from a device rejection on purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Device acknowledged the command (single 0x06 byte)
    Ack,
    /// Device rejected the command, or a local guard did (single 0x15 byte)
    Nak,
    /// Data frame, including its leading STX byte
    Data(Vec<u8>),
    /// No usable response (timeout or transport fault)
    Empty,
}

impl Response {
    /// Classify raw received bytes by their first byte only.
    pub fn classify(raw: Vec<u8>) -> Self {
        match raw.first() {
            None => Response::Empty,
            Some(&ACK) if raw.len() == 1 => Response::Ack,
            Some(&NAK) if raw.len() == 1 => Response::Nak,
            _ => Response::Data(raw),
        }
    }

    pub fn is_ack(&self) -> bool {
        matches!(self, Response::Ack)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Response::Empty)
    }

    /// Payload bytes of a data frame, without the leading STX.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Response::Data(raw) if raw.first() == Some(&STX) => Some(&raw[1..]),
            Response::Data(raw) => Some(raw),
            _ => None,
        }
    }
}

/// Pump rotation direction, encoded as the sign of the speed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// `+` prefix on the wire
    Clockwise,
    /// `-` prefix on the wire
    CounterClockwise,
}

/// Decoded reply to an S (request motor speed) command.
///
/// The drive reports speed as a signed fixed-point field such as `+004.0`
/// or `-0100`, embedded in a payload like `S+004.0` (some firmware echoes
/// the `Pnn` address prefix as well).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorSpeed {
    /// Signed speed in rpm; positive is clockwise
    pub rpm: f64,
}

impl MotorSpeed {
    /// Decode a motor speed from a raw S-response frame.
    ///
    /// Returns `None` if the frame carries no parseable signed value.
    pub fn parse(frame: &[u8]) -> Option<Self> {
        let mut body = frame;
        if body.first() == Some(&STX) {
            body = &body[1..];
        }
        while body.last() == Some(&CR) {
            body = &body[..body.len() - 1];
        }
        // The speed field is always signed, so the sign character marks
        // where the echoed command/address prefix ends.
        let start = body.iter().position(|b| matches!(b, b'+' | b'-'))?;
        let text = std::str::from_utf8(&body[start..]).ok()?;
        let rpm: f64 = text.trim().parse().ok()?;
        Some(MotorSpeed { rpm })
    }

    pub fn direction(&self) -> Direction {
        if self.rpm < 0.0 {
            Direction::CounterClockwise
        } else {
            Direction::Clockwise
        }
    }

    /// Speed magnitude in rpm, sign stripped.
    pub fn magnitude(&self) -> f64 {
        self.rpm.abs()
    }
}

/// State of one auxiliary output, as the B and O commands encode it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuxOutput {
    Off,
    On,
}

impl fmt::Display for AuxOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuxOutput::Off => write!(f, "0"),
            AuxOutput::On => write!(f, "1"),
        }
    }
}
