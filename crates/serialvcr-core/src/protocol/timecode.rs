//! Tape time codes
//!
//! CURRENT_CTL_SENSE and CURRENT_LTC_SENSE both answer with eight ASCII
//! digits, `HHMMSSFF`.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use super::ProtocolError;

/// NTSC frame rate, derived from the colour subcarrier (~29.97 fps)
pub const NTSC_FRAME_RATE: f64 = 10_000_000.0 * 63.0 / 88.0 / 455.0 / 525.0;

/// Duration of one NTSC frame in milliseconds
pub const FRAME_DURATION_MS: f64 = 1000.0 / NTSC_FRAME_RATE;

/// A position read from the CTL or LTC track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TapeTimeCode {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u8,
}

impl TapeTimeCode {
    /// Parse the eight-digit reply
    pub fn parse(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() != 8 {
            return Err(ProtocolError::InvalidTimeCode(format!(
                "expected 8 digits, got {} bytes",
                data.len()
            )));
        }
        if let Some(bad) = data.iter().find(|b| !b.is_ascii_digit()) {
            return Err(ProtocolError::InvalidTimeCode(format!(
                "non-digit byte {:#04X} in {}",
                bad,
                hex(data)
            )));
        }

        let field = |i: usize| (data[i] - b'0') * 10 + (data[i + 1] - b'0');
        Ok(Self {
            hours: field(0),
            minutes: field(2),
            seconds: field(4),
            frames: field(6),
        })
    }

    /// Elapsed time from the start of the count
    pub fn to_duration(&self) -> Duration {
        let whole = Duration::from_secs(
            self.hours as u64 * 3600 + self.minutes as u64 * 60 + self.seconds as u64,
        );
        whole + Duration::from_secs_f64(self.frames as f64 * FRAME_DURATION_MS / 1000.0)
    }
}

impl fmt::Display for TapeTimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}.{:02}",
            self.hours, self.minutes, self.seconds, self.frames
        )
    }
}

pub(crate) fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02X}", b)).collect()
}
