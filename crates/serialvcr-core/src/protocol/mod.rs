//! Serial Protocol Communication
//!
//! Implements the JVC-style RS-232C VCR control protocol.
//!
//! Commands are single opcode bytes. Replies carry no length or checksum;
//! their size is fixed per command.

mod clock;
pub mod commands;
mod connection;
mod error;
pub mod serial;
pub mod status;
pub mod timecode;
mod transport;

use std::time::Duration;

pub use clock::{Clock, SystemClock};
pub use commands::{Command, Table, ACK, ERROR, NAK};
pub use connection::{Vcr, VcrConfig, MOTION_START_TIMEOUT};
pub use error::ProtocolError;
pub use serial::SerialTransport;
pub use status::{SpeedCode, Status, StatusFlag};
pub use timecode::TapeTimeCode;
pub use transport::Transport;

/// Default baud rate for the deck's RS-232C port
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default transport read timeout in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 2000;

/// Minimum quiet time after a reply before the next command may be sent
pub const QUIESCENT_INTERVAL: Duration = Duration::from_millis(5);

/// Interval between status polls while waiting for a mode
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
