//! # Masterflex Protocol Library
//!
//! A Rust library for controlling Masterflex L/S peristaltic pump drives
//! ("satellites") over a multi-drop serial bus. It builds the drive's ASCII
//! command frames, runs half-duplex send/receive transactions, and
//! classifies the framed replies.
//!
//! ## Features
//!
//! - Every documented satellite command, from motor speed to auxiliary
//!   output control
//! - Startup addressing handshake and renumbering with local guard rules
//! - Tri-state transaction results: data / ACK / NAK, with "nothing came
//!   back" kept distinct from a device rejection
//! - Discovery sweep over all local serial ports
//! - Pluggable transport seam for testing without hardware
//!
//! ## Example
//!
//! ```no_run
//! use masterflex_protocol::{Masterflex, Response};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut pump = Masterflex::new("/dev/ttyUSB0", 1)?;
//!     pump.set_motor_speed("+050.0");
//!     if pump.go() == Response::Ack {
//!         println!("Pumping at 50 rpm");
//!     }
//!     pump.halt();
//!     Ok(())
//! }
//! ```

pub mod constants;
pub mod discovery;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod types;

pub use discovery::{find_pumps, DiscoveredPump};
pub use error::{MasterflexError, Result};
pub use protocol::{standard_command, Masterflex};
pub use transport::{SerialConfig, Session, Transport};
pub use types::*;
