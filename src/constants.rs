//! Protocol constants for Masterflex L/S satellite communication.
//!
//! This module defines the control bytes of the drive's ASCII protocol,
//! the serial line configuration it requires, and the numeric limits the
//! protocol documents for addresses, speeds and revolution counts.

/// Start-of-frame byte for standard commands and data responses
pub const STX: u8 = 0x02;

/// Carriage return, terminates every outbound command frame
pub const CR: u8 = 0x0D;

/// Positive acknowledgment, returned alone as a single-byte response
pub const ACK: u8 = 0x06;

/// Negative acknowledgment (request rejected), returned alone
pub const NAK: u8 = 0x15;

/// Enquire byte, sent bare to ask which satellite has data pending
pub const ENQ: u8 = 0x05;

/// Cancel byte, sent bare to abort an in-progress input line on the drive
pub const CAN: u8 = 0x18;

/// Baud rate (4800 bps)
pub const BAUD_RATE: u32 = 4800;

/// Word size (7 data bits required by the drive)
pub const DATA_BITS: serialport::DataBits = serialport::DataBits::Seven;

/// Parity configuration (odd)
pub const PARITY: serialport::Parity = serialport::Parity::Odd;

/// Per-byte read timeout in milliseconds; also bounds end-of-frame
/// detection, since a data response ends when a read yields nothing
pub const TIMEOUT_MS: u64 = 1000;

/// Highest satellite address the protocol can address
pub const MAX_ADDRESS: u8 = 99;

/// Highest address a satellite may be renumbered to; the U command
/// reserves 90..=99 and must not be sent a target in that range
pub const MAX_ASSIGNABLE_ADDRESS: u8 = 89;

/// Motor speed magnitude (rpm) at or below which a Go command would
/// start a motionless run; the client substitutes Halt instead
pub const MIN_RUN_SPEED: f64 = 0.1;

/// Magnitude limit for the V (set revolutions) command parameter
pub const MAX_REVOLUTIONS: f64 = 99999.99;

/// Candidate address probed by discovery when none are supplied
pub const DEFAULT_PROBE_ADDRESS: u8 = 1;
