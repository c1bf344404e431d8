//! Protocol errors

use thiserror::Error;

/// Errors that can occur while talking to the deck
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A single-byte exchange did not come back as the expected code.
    #[error("Bad response: expected {expected:#04X}, got {got:#04X}")]
    BadResponse { expected: u8, got: u8 },

    /// The first byte of a multi-byte reply was NAK or ERROR; the rest of
    /// the reply will never arrive.
    #[error("Device rejected command while reading reply: got {got:#04X}")]
    ErrorWhileReading { got: u8 },

    #[error("Transport failure: {0}")]
    TransportFailure(#[from] std::io::Error),

    #[error("Invalid time code: {0}")]
    InvalidTimeCode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serialport::Error> for ProtocolError {
    fn from(err: serialport::Error) -> Self {
        ProtocolError::TransportFailure(err.into())
    }
}

impl ProtocolError {
    /// True when the transport gave up waiting for bytes.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ProtocolError::TransportFailure(e) if e.kind() == std::io::ErrorKind::TimedOut
        )
    }
}
