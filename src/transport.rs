//! Transport session: byte-level serial exchange and response framing.
//!
//! The satellite protocol has no length field and no end-of-frame byte on
//! data responses; a frame is over when a read attempt comes back empty
//! within the configured timeout. That rule lives here, behind the
//! [`Transport`] trait so tests can drive frame boundaries deterministically
//! instead of depending on wall-clock serial timing.

use crate::constants::{BAUD_RATE, DATA_BITS, PARITY, STX, TIMEOUT_MS};
use crate::error::{map_open_error, Result};
use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::Duration;

/// Serial line configuration for a satellite connection.
///
/// Defaults match the drive's documented requirements: 7 data bits,
/// 4800 baud, odd parity, 1 second read timeout.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: serialport::DataBits,
    pub parity: serialport::Parity,
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            baud_rate: BAUD_RATE,
            data_bits: DATA_BITS,
            parity: PARITY,
            timeout: Duration::from_millis(TIMEOUT_MS),
        }
    }
}

/// Byte-level link to one satellite.
///
/// `read_byte` must return `Ok(None)` when no byte arrives within the
/// link's timeout; that is how [`Session::receive_frame`] detects the end
/// of a data frame.
pub trait Transport {
    /// Write raw bytes to the line.
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read a single byte, or `None` on timeout/exhaustion.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

impl Transport for Box<dyn SerialPort> {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// One open connection to a satellite; owns the transport handle.
///
/// The transport is released when the session is dropped, on every exit
/// path.
pub struct Session {
    link: Box<dyn Transport>,
}

impl Session {
    /// Open a serial port with the given configuration.
    pub fn open(port_name: &str, config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(port_name, config.baud_rate)
            .data_bits(config.data_bits)
            .parity(config.parity)
            .timeout(config.timeout)
            .open()
            .map_err(map_open_error)?;
        Ok(Session::from_transport(Box::new(port)))
    }

    /// Wrap an already-open transport (used for custom links and tests).
    pub fn from_transport(link: Box<dyn Transport>) -> Self {
        Session { link }
    }

    /// Write one outbound frame; no response handling here.
    pub fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.link.send(frame)?;
        Ok(())
    }

    /// Read one inbound response, or `None` if nothing arrived.
    ///
    /// Single-byte lookahead: if the first byte is STX the response is a
    /// data frame, accumulated until a read yields no byte and returned
    /// including the STX. Any other first byte (the ACK/NAK case) is the
    /// whole response on its own.
    pub fn receive_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let first = match self.link.read_byte()? {
            Some(byte) => byte,
            None => return Ok(None),
        };
        if first != STX {
            return Ok(Some(vec![first]));
        }
        let mut frame = vec![first];
        while let Some(byte) = self.link.read_byte()? {
            frame.push(byte);
        }
        Ok(Some(frame))
    }
}
