//! # serialvcr Core Library
//!
//! Host-side driver for videotape transports that speak the JVC-style
//! RS-232C control protocol.

#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Command encoding with per-command reply lengths
//! - Reply validation, including early NAK/ERROR detection
//! - STATUS_SENSE bit-field and speed code decoding
//! - CTL/LTC time code decoding
//! - Tape motion helpers that poll the deck until it stops
//!
//! ## Example
//!
//! ```rust,ignore
//! use serialvcr_core::protocol::{Vcr, VcrConfig};
//!
//! let mut vcr = Vcr::open(&VcrConfig::new("/dev/ttyUSB0"))?;
//! if vcr.is_a_vcr()? {
//!     vcr.power_on()?;
//!     println!("{}", vcr.status_sense()?);
//!     vcr.rewind_to_beginning()?;
//! }
//! ```

pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::protocol::{
        Command, ProtocolError, Status, StatusFlag, TapeTimeCode, Transport, Vcr, VcrConfig,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
