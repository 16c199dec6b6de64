//! Capture replay
//!
//! Feeds recorded BLE-MIDI traffic through the transport handlers. One entry
//! per line:
//!
//! ```text
//! # comment
//! connect
//! 80 80 FA          # packet, hex bytes
//! 0x80 0x8A 0xF8    # 0x prefixes are fine too
//! wait 20           # pause for 20 ms
//! disconnect
//! ```

use super::transport::{TransportEvent, TransportHandlers};
use log::debug;
use std::error::Error;
use std::fmt;
use std::io::{self, BufRead};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayEntry {
    Event(TransportEvent),
    Wait(Duration),
}

#[derive(Debug)]
pub enum ReplayError {
    Io(io::Error),
    InvalidByte { line: usize, token: String },
    InvalidWait { line: usize, value: String },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::Io(e) => write!(f, "replay read error: {}", e),
            ReplayError::InvalidByte { line, token } => {
                write!(f, "line {}: '{}' is not a hex byte", line, token)
            }
            ReplayError::InvalidWait { line, value } => {
                write!(f, "line {}: '{}' is not a wait in milliseconds", line, value)
            }
        }
    }
}

impl Error for ReplayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReplayError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ReplayError {
    fn from(e: io::Error) -> Self {
        ReplayError::Io(e)
    }
}

fn parse_byte(token: &str) -> Option<u8> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    if digits.is_empty() || digits.len() > 2 {
        return None;
    }
    u8::from_str_radix(digits, 16).ok()
}

/// Parses one line; `Ok(None)` for blank lines and comments.
pub fn parse_line(text: &str, line: usize) -> Result<Option<ReplayEntry>, ReplayError> {
    let content = text.split('#').next().unwrap_or_default().trim();
    if content.is_empty() {
        return Ok(None);
    }

    let mut tokens = content.split_whitespace();
    match tokens.next() {
        Some("connect") => Ok(Some(ReplayEntry::Event(TransportEvent::Connected))),
        Some("disconnect") => Ok(Some(ReplayEntry::Event(TransportEvent::Disconnected))),
        Some("wait") => {
            let value = tokens.next().unwrap_or_default();
            let millis = value.parse::<u64>().map_err(|_| ReplayError::InvalidWait {
                line,
                value: value.to_string(),
            })?;
            Ok(Some(ReplayEntry::Wait(Duration::from_millis(millis))))
        }
        _ => {
            let packet = content
                .split_whitespace()
                .map(|token| {
                    parse_byte(token).ok_or_else(|| ReplayError::InvalidByte {
                        line,
                        token: token.to_string(),
                    })
                })
                .collect::<Result<Vec<u8>, _>>()?;
            Ok(Some(ReplayEntry::Event(TransportEvent::Write(packet))))
        }
    }
}

/// Reads every entry from `reader`, stopping at the first bad line.
pub fn read_entries<R: BufRead>(reader: R) -> Result<Vec<ReplayEntry>, ReplayError> {
    let mut entries = Vec::new();
    for (index, text) in reader.lines().enumerate() {
        if let Some(entry) = parse_line(&text?, index + 1)? {
            entries.push(entry);
        }
    }
    Ok(entries)
}

/// Streams `reader` through `handlers`, honouring `wait` lines.
///
/// Lines are dispatched as they are read, so a pipe on stdin acts as a live
/// transport. Returns the number of transport events dispatched.
pub fn run_replay<R: BufRead>(reader: R, handlers: &TransportHandlers) -> Result<usize, ReplayError> {
    let mut dispatched = 0;
    for (index, text) in reader.lines().enumerate() {
        match parse_line(&text?, index + 1)? {
            Some(ReplayEntry::Event(event)) => {
                handlers.dispatch(&event);
                dispatched += 1;
            }
            Some(ReplayEntry::Wait(duration)) => thread::sleep(duration),
            None => {}
        }
    }
    debug!("Replay finished after {} events", dispatched);
    Ok(dispatched)
}
