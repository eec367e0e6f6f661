//! Error types for Masterflex protocol operations.

use thiserror::Error;

/// Result type alias for Masterflex operations.
pub type Result<T> = std::result::Result<T, MasterflexError>;

/// Error types for Masterflex satellite communication.
///
/// Note that expected protocol outcomes (device NAK, empty reply) are not
/// errors: they are carried in [`Response`](crate::Response) so callers can
/// tell "device said no" apart from "wire broke". These variants cover the
/// remaining faults, which surface during construction and discovery.
#[derive(Error, Debug)]
pub enum MasterflexError {
    /// Port exists but is held by another process
    #[error("Port busy: {0}")]
    PortBusy(String),

    /// Serial port communication error
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Satellite address outside the protocol's 0..=99 range
    #[error("Address out of range: {0} (max 99)")]
    AddressOutOfRange(u8),
}

impl MasterflexError {
    /// True when the error means the port is held by another process.
    ///
    /// Discovery uses this to keep sweeping instead of aborting.
    pub fn is_port_busy(&self) -> bool {
        matches!(self, MasterflexError::PortBusy(_))
    }
}

/// Classify a serial open failure, pulling out the "resource in use" case.
pub(crate) fn map_open_error(err: serialport::Error) -> MasterflexError {
    let busy = match &err.kind {
        serialport::ErrorKind::Io(kind) => {
            matches!(kind, std::io::ErrorKind::PermissionDenied)
                || err.description.to_lowercase().contains("busy")
        }
        _ => err.description.to_lowercase().contains("busy"),
    };
    if busy {
        MasterflexError::PortBusy(err.description)
    } else {
        MasterflexError::SerialPort(err)
    }
}
