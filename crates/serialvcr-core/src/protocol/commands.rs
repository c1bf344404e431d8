//! Protocol commands
//!
//! Every command is a single raw opcode byte. The reply is never
//! self-describing, so each command also carries the number of bytes the deck
//! answers with.

use serde::{Deserialize, Serialize};

/// Positive acknowledgement
pub const ACK: u8 = 0x0A;
/// Negative acknowledgement
pub const NAK: u8 = 0x0B;
/// The deck could not execute the command
pub const ERROR: u8 = 0x02;

/// Commands understood by the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Clear a latched ERROR condition
    ClearError,
    Clear,
    Enter,
    Play,
    Stop,
    Still,
    FastForward,
    Rewind,
    Eject,
    CassetteOut,
    CounterReset,
    PowerOn,
    PowerOff,
    /// Switch to table 1 addressing
    Table1,
    /// Switch to table 2 addressing
    Table2,
    /// Is this device a VCR? Answers ACK if so.
    VcrInquiry,
    DeviceTypeRequest,
    RomVersionRequest,
    StatusSense,
    CurrentCtlSense,
    CurrentLtcSense,
}

impl Command {
    /// All known commands, in opcode table order
    pub const ALL: [Command; 21] = [
        Command::ClearError,
        Command::Clear,
        Command::Enter,
        Command::Play,
        Command::Stop,
        Command::Still,
        Command::FastForward,
        Command::Rewind,
        Command::Eject,
        Command::CassetteOut,
        Command::CounterReset,
        Command::PowerOn,
        Command::PowerOff,
        Command::Table1,
        Command::Table2,
        Command::VcrInquiry,
        Command::DeviceTypeRequest,
        Command::RomVersionRequest,
        Command::StatusSense,
        Command::CurrentCtlSense,
        Command::CurrentLtcSense,
    ];

    /// The opcode byte sent on the wire
    pub fn opcode(&self) -> u8 {
        match self {
            Command::ClearError => 0x41,
            Command::Clear => 0x56,
            Command::Enter => 0x40,
            Command::Play => 0x3A,
            Command::Stop => 0x3F,
            Command::Still => 0x4F,
            Command::FastForward => 0xAB,
            Command::Rewind => 0xAC,
            Command::Eject => 0xA3,
            Command::CassetteOut => 0x03,
            Command::CounterReset => 0xE2,
            Command::PowerOn => 0x7B,
            Command::PowerOff => 0x7C,
            Command::Table1 => 0xF6,
            Command::Table2 => 0xF7,
            Command::VcrInquiry => 0xFB,
            Command::DeviceTypeRequest => 0xD1,
            Command::RomVersionRequest => 0x72,
            Command::StatusSense => 0xD7,
            Command::CurrentCtlSense => 0xE8,
            Command::CurrentLtcSense => 0xE9,
        }
    }

    /// Look up the command for an opcode byte
    pub fn from_opcode(byte: u8) -> Option<Command> {
        Self::ALL.iter().copied().find(|c| c.opcode() == byte)
    }

    /// Number of bytes the deck sends back for this command
    pub fn reply_len(&self) -> usize {
        match self {
            Command::DeviceTypeRequest => 4,
            Command::RomVersionRequest => 3,
            Command::StatusSense => 5,
            Command::CurrentCtlSense | Command::CurrentLtcSense => 8,
            _ => 1,
        }
    }

    /// Whether the first reply byte should be checked for NAK/ERROR before
    /// reading the rest.
    ///
    /// Time-code sense fails legitimately when the deck is stopped with no
    /// tape, and in that case only a single error byte comes back.
    pub fn sniffs_errors(&self) -> bool {
        matches!(self, Command::CurrentCtlSense | Command::CurrentLtcSense)
    }

    /// Name as printed in the service manual
    pub fn name(&self) -> &'static str {
        match self {
            Command::ClearError => "CLEAR_ERROR",
            Command::Clear => "CLEAR",
            Command::Enter => "ENTER",
            Command::Play => "PLAY",
            Command::Stop => "STOP",
            Command::Still => "STILL",
            Command::FastForward => "FF",
            Command::Rewind => "REW",
            Command::Eject => "EJECT",
            Command::CassetteOut => "CASSETTE_OUT",
            Command::CounterReset => "COUNTER_RESET",
            Command::PowerOn => "POWER_ON",
            Command::PowerOff => "POWER_OFF",
            Command::Table1 => "JVC_TABLE_1",
            Command::Table2 => "JVC_TABLE_2",
            Command::VcrInquiry => "VCR_INQ",
            Command::DeviceTypeRequest => "DEVICE_TYPE_REQUEST",
            Command::RomVersionRequest => "ROM_VER_REQUEST",
            Command::StatusSense => "STATUS_SENSE",
            Command::CurrentCtlSense => "CURRENT_CTL_SENSE",
            Command::CurrentLtcSense => "CURRENT_LTC_SENSE",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:02X})", self.name(), self.opcode())
    }
}

/// Command addressing table selected on the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Table {
    One,
    Two,
}

impl Table {
    pub fn command(&self) -> Command {
        match self {
            Table::One => Command::Table1,
            Table::Two => Command::Table2,
        }
    }
}
