//! MIDI clock messages

use std::fmt;

pub const STATUS_CLOCK: u8 = 0xF8;
pub const STATUS_START: u8 = 0xFA;
pub const STATUS_CONTINUE: u8 = 0xFB;
pub const STATUS_STOP: u8 = 0xFC;

/// The system real-time messages the metronome reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMessage {
    Tick,
    Start,
    Continue,
    Stop,
}

impl ClockMessage {
    /// Maps a status byte to a clock message; every other status is ignored.
    pub fn from_status(status: u8) -> Option<Self> {
        match status {
            STATUS_CLOCK => Some(ClockMessage::Tick),
            STATUS_START => Some(ClockMessage::Start),
            STATUS_CONTINUE => Some(ClockMessage::Continue),
            STATUS_STOP => Some(ClockMessage::Stop),
            _ => None,
        }
    }

    pub fn status(self) -> u8 {
        match self {
            ClockMessage::Tick => STATUS_CLOCK,
            ClockMessage::Start => STATUS_START,
            ClockMessage::Continue => STATUS_CONTINUE,
            ClockMessage::Stop => STATUS_STOP,
        }
    }
}

impl fmt::Display for ClockMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClockMessage::Tick => "clock",
            ClockMessage::Start => "start",
            ClockMessage::Continue => "continue",
            ClockMessage::Stop => "stop",
        };
        f.write_str(name)
    }
}
