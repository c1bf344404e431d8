//! STATUS_SENSE decoding
//!
//! The deck answers STATUS_SENSE with five bytes. Each byte has a fixed table
//! of up to eight named bits (pages 38-39 of the service manual); the low
//! nibble of byte 5 is a playback speed code instead.

use serde::Serialize;
use std::fmt;

/// Named status bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatusFlag {
    /// An unacceptable command was received; later commands have no effect
    /// until CLEAR_ERROR is sent.
    Error,
    /// No cassette is loaded
    CassetteOut,
    /// The loaded cassette has no protective tab
    RecInhibit,
    /// Entered after detecting the beginning or end of tape
    ShortFfRew,
    TapeEnd,
    TapeBegin,
    Warning,
    AudioMute,
    VideoMute,
    A1EeMode,
    EeMode,
    SearchMode,
    RepeatMode,
    Repeat,
    AudioDub,
    Rec,
    /// The cassette is being ejected
    Eject,
    Standby,
    Stop,
    Rew,
    Ff,
    /// Also set in STILL, REC, ASSEMBLE, INSERT and AUDIODUB
    Play,
    ShuttleRev,
    ShuttleFwd,
    /// Tape protection pause
    LongPause,
    Pause,
}

impl StatusFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFlag::Error => "ERROR",
            StatusFlag::CassetteOut => "CASSETTE OUT",
            StatusFlag::RecInhibit => "REC INHIBIT",
            StatusFlag::ShortFfRew => "SHORT FF/REW",
            StatusFlag::TapeEnd => "TAPE END",
            StatusFlag::TapeBegin => "TAPE BEGIN",
            StatusFlag::Warning => "WARNING",
            StatusFlag::AudioMute => "AUDIO MUTE",
            StatusFlag::VideoMute => "VIDEO MUTE",
            StatusFlag::A1EeMode => "A1 EE MODE",
            StatusFlag::EeMode => "EE MODE",
            StatusFlag::SearchMode => "SEARCH MODE",
            StatusFlag::RepeatMode => "REPEAT MODE",
            StatusFlag::Repeat => "REPEAT",
            StatusFlag::AudioDub => "AUDIODUB",
            StatusFlag::Rec => "REC",
            StatusFlag::Eject => "EJECT",
            StatusFlag::Standby => "STANDBY",
            StatusFlag::Stop => "STOP",
            StatusFlag::Rew => "REW",
            StatusFlag::Ff => "FF",
            StatusFlag::Play => "PLAY",
            StatusFlag::ShuttleRev => "SHUTTLE REV",
            StatusFlag::ShuttleFwd => "SHUTTLE FWD",
            StatusFlag::LongPause => "LONG PAUSE",
            StatusFlag::Pause => "PAUSE",
        }
    }
}

impl fmt::Display for StatusFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use StatusFlag as F;

/// Bit tables for the five status bytes, bit 0 first. `None` marks bits that
/// are undefined, constant, or not available on RS-232C.
pub const STATUS_SENSE_MODE_BITS: [[Option<StatusFlag>; 8]; 5] = [
    // Byte 1: bit 2 is SERVO LOCK (always 1), bits 6/7 are constant
    [
        Some(F::Error),
        None,
        None,
        Some(F::CassetteOut),
        Some(F::RecInhibit),
        Some(F::ShortFfRew),
        None,
        None,
    ],
    // Byte 2: bit 2 is DEW, not available
    [
        Some(F::TapeEnd),
        Some(F::TapeBegin),
        None,
        Some(F::Warning),
        Some(F::AudioMute),
        Some(F::VideoMute),
        Some(F::A1EeMode),
        Some(F::EeMode),
    ],
    // Byte 3: COUNTER SEARCH and the timer bits are not available
    [
        None,
        Some(F::SearchMode),
        Some(F::RepeatMode),
        None,
        Some(F::Repeat),
        None,
        None,
        None,
    ],
    // Byte 4
    [
        Some(F::AudioDub),
        Some(F::Rec),
        Some(F::Eject),
        Some(F::Standby),
        Some(F::Stop),
        Some(F::Rew),
        Some(F::Ff),
        Some(F::Play),
    ],
    // Byte 5: bits 0-3 are the speed code
    [
        None,
        None,
        None,
        None,
        Some(F::ShuttleRev),
        Some(F::ShuttleFwd),
        Some(F::LongPause),
        Some(F::Pause),
    ],
];

/// Playback speed reported in the low nibble of status byte 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SpeedCode {
    Still,
    OneThirtieth,
    OneEighteenth,
    OneSixth,
    Normal,
    /// +2x forward, -3x reverse
    Double,
    X5,
    X7,
    X11,
    X15,
    /// x24 or more
    X24,
    /// A code the manual leaves undefined
    Invalid(u8),
}

/// Speed codes indexed by the 4-bit value. Code 4 is reserved by the manual
/// and stays undefined; the defined speeds resume at code 5.
pub const SPEED_TABLE: [SpeedCode; 16] = [
    SpeedCode::Still,
    SpeedCode::OneThirtieth,
    SpeedCode::OneEighteenth,
    SpeedCode::OneSixth,
    SpeedCode::Invalid(0x4),
    SpeedCode::Normal,
    SpeedCode::Double,
    SpeedCode::X5,
    SpeedCode::X7,
    SpeedCode::X11,
    SpeedCode::X15,
    SpeedCode::X24,
    SpeedCode::Invalid(0xC),
    SpeedCode::Invalid(0xD),
    SpeedCode::Invalid(0xE),
    SpeedCode::Invalid(0xF),
];

impl SpeedCode {
    /// Resolve a speed code. Only the low four bits are used, so every input
    /// maps to an entry.
    pub fn from_nibble(value: u8) -> SpeedCode {
        SPEED_TABLE[(value & 0x0F) as usize]
    }

    pub fn label(&self) -> String {
        match self {
            SpeedCode::Still => "STILL".to_string(),
            SpeedCode::OneThirtieth => "1/30".to_string(),
            SpeedCode::OneEighteenth => "1/18".to_string(),
            SpeedCode::OneSixth => "1/6".to_string(),
            SpeedCode::Normal => "1".to_string(),
            SpeedCode::Double => "2(-3)".to_string(),
            SpeedCode::X5 => "5".to_string(),
            SpeedCode::X7 => "7".to_string(),
            SpeedCode::X11 => "11".to_string(),
            SpeedCode::X15 => "15".to_string(),
            SpeedCode::X24 => "24".to_string(),
            SpeedCode::Invalid(code) => format!("INVALID({:X})", code),
        }
    }
}

impl fmt::Display for SpeedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Decoded STATUS_SENSE reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Raw reply bytes
    pub raw: [u8; 5],
    /// Set flags, byte-major then bit-ascending
    pub flags: Vec<StatusFlag>,
    /// Speed from the low nibble of byte 5
    pub speed: SpeedCode,
}

impl Status {
    /// Decode the five status bytes
    pub fn decode(raw: [u8; 5]) -> Self {
        let mut flags = Vec::new();
        for (byte, table) in raw.iter().zip(STATUS_SENSE_MODE_BITS.iter()) {
            flags.extend(translate_bits(*byte, table));
        }
        Self {
            raw,
            flags,
            speed: SpeedCode::from_nibble(raw[4]),
        }
    }

    pub fn contains(&self, flag: StatusFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Flag names followed by the speed label
    pub fn labels(&self) -> Vec<String> {
        self.flags
            .iter()
            .map(|f| f.as_str().to_string())
            .chain(std::iter::once(self.speed.label()))
            .collect()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.labels().join(", "))
    }
}

fn translate_bits(
    byte: u8,
    table: &[Option<StatusFlag>; 8],
) -> impl Iterator<Item = StatusFlag> + '_ {
    table
        .iter()
        .enumerate()
        .filter(move |&(bit, _)| (byte >> bit) & 1 == 1)
        .filter_map(|(_, flag)| *flag)
}
