//! BLE-MIDI packet framing
//!
//! A packet is one header byte followed by one or more timestamped MIDI
//! messages:
//!
//! ```text
//! [1 0 hhhhhh] [1 lllllll] [status] [data...] [1 lllllll] [status] [data...] ...
//! ```
//!
//! The header carries the six high bits of a 13-bit millisecond timestamp,
//! every message carries its own seven low bits. When a message's low bits go
//! backwards compared to the previous message in the same packet, the low
//! counter has wrapped and the high bits are bumped by one from there on.

use super::timestamp::BleTimestamp;
use std::error::Error;
use std::fmt;
use std::iter::FusedIterator;

/// Anything shorter cannot hold a header plus one timestamp and status.
pub const MIN_PACKET_LEN: usize = 3;

const MARKER: u8 = 0x80;

fn is_marked(byte: u8) -> bool {
    byte & MARKER != 0
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// Fewer than three bytes (keep-alive or garbage)
    TooShort { len: usize },
    /// First byte is missing its high bit
    MalformedHeader { byte: u8 },
    /// A timestamp or status byte is missing its high bit, or the packet ends
    /// between a timestamp and its status
    MalformedSubmessage { offset: usize, byte: Option<u8> },
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketError::TooShort { len } => write!(f, "packet too short: {} bytes", len),
            PacketError::MalformedHeader { byte } => {
                write!(f, "invalid packet header: {:#04x}", byte)
            }
            PacketError::MalformedSubmessage {
                offset,
                byte: Some(byte),
            } => write!(f, "invalid byte {:#04x} at offset {}", byte, offset),
            PacketError::MalformedSubmessage { offset, byte: None } => {
                write!(f, "packet truncated at offset {}", offset)
            }
        }
    }
}

impl Error for PacketError {}

/// One MIDI message pulled out of a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BleMidiEvent<'a> {
    pub timestamp: BleTimestamp,
    pub status: u8,
    /// Data bytes following the status, up to the next timestamp byte
    pub data: &'a [u8],
}

/// Walks the messages of one packet.
///
/// Yields at most one error, after which the rest of the packet is dropped.
#[derive(Debug)]
pub struct PacketReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    high: u16,
    previous_low: Option<u8>,
    failed: bool,
}

impl<'a> PacketReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self, PacketError> {
        if bytes.len() < MIN_PACKET_LEN {
            return Err(PacketError::TooShort { len: bytes.len() });
        }

        let header = bytes[0];
        if !is_marked(header) {
            return Err(PacketError::MalformedHeader { byte: header });
        }

        Ok(PacketReader {
            bytes,
            pos: 1,
            high: u16::from(header & 0x3F),
            previous_low: None,
            failed: false,
        })
    }

    fn read_marked(&mut self) -> Result<u8, PacketError> {
        match self.bytes.get(self.pos) {
            Some(&byte) if is_marked(byte) => {
                self.pos += 1;
                Ok(byte)
            }
            byte => Err(PacketError::MalformedSubmessage {
                offset: self.pos,
                byte: byte.copied(),
            }),
        }
    }

    fn read_event(&mut self) -> Result<BleMidiEvent<'a>, PacketError> {
        let low = self.read_marked()? & 0x7F;
        if let Some(previous) = self.previous_low {
            if low < previous {
                self.high = self.high.wrapping_add(1);
            }
        }
        self.previous_low = Some(low);
        let timestamp = BleTimestamp::from_parts(self.high, low);

        let status = self.read_marked()?;

        let start = self.pos;
        while self.bytes.get(self.pos).is_some_and(|&b| !is_marked(b)) {
            self.pos += 1;
        }

        Ok(BleMidiEvent {
            timestamp,
            status,
            data: &self.bytes[start..self.pos],
        })
    }
}

impl<'a> Iterator for PacketReader<'a> {
    type Item = Result<BleMidiEvent<'a>, PacketError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.bytes.len() {
            return None;
        }

        match self.read_event() {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for PacketReader<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses(bytes: &[u8]) -> Vec<(u16, u8)> {
        PacketReader::new(bytes)
            .unwrap()
            .map(|e| e.unwrap())
            .map(|e| (e.timestamp.value(), e.status))
            .collect()
    }

    #[test]
    fn test_rejects_short_packets() {
        assert_eq!(
            PacketReader::new(&[0x80, 0x80]).unwrap_err(),
            PacketError::TooShort { len: 2 }
        );
        assert_eq!(
            PacketReader::new(&[]).unwrap_err(),
            PacketError::TooShort { len: 0 }
        );
    }

    #[test]
    fn test_rejects_header_without_marker() {
        assert_eq!(
            PacketReader::new(&[0x00, 0x80, 0xF8]).unwrap_err(),
            PacketError::MalformedHeader { byte: 0x00 }
        );
    }

    #[test]
    fn test_single_message() {
        assert_eq!(statuses(&[0x81, 0x85, 0xFA]), vec![(133, 0xFA)]);
    }

    #[test]
    fn test_multiple_messages_share_header() {
        assert_eq!(
            statuses(&[0x80, 0x81, 0xF8, 0x8B, 0xF8, 0x95, 0xF8]),
            vec![(1, 0xF8), (11, 0xF8), (21, 0xF8)]
        );
    }

    #[test]
    fn test_low_rollover_bumps_high_for_the_rest_of_the_packet() {
        // 0x7E -> 0x02 wraps; everything after lives one high step later
        assert_eq!(
            statuses(&[0x82, 0xFE, 0xF8, 0x82, 0xF8, 0x85, 0xF8]),
            vec![(256 + 126, 0xF8), (384 + 2, 0xF8), (384 + 5, 0xF8)]
        );
    }

    #[test]
    fn test_each_decrease_adds_exactly_one() {
        assert_eq!(
            statuses(&[0x80, 0xF0, 0xF8, 0x90, 0xF8, 0x88, 0xF8]),
            vec![(112, 0xF8), (128 + 16, 0xF8), (256 + 8, 0xF8)]
        );
    }

    #[test]
    fn test_equal_low_does_not_bump() {
        assert_eq!(
            statuses(&[0x80, 0x90, 0xF8, 0x90, 0xF8]),
            vec![(16, 0xF8), (16, 0xF8)]
        );
    }

    #[test]
    fn test_data_bytes_are_attached_and_skipped() {
        let bytes = [0x80, 0x80, 0x90, 0x3C, 0x64, 0x81, 0xFA];
        let events: Vec<_> = PacketReader::new(&bytes)
            .unwrap()
            .map(|e| e.unwrap())
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].status, 0x90);
        assert_eq!(events[0].data, &[0x3C, 0x64]);
        assert_eq!(events[1].status, 0xFA);
        assert!(events[1].data.is_empty());
    }

    #[test]
    fn test_trailing_data_at_end_is_not_an_error() {
        assert_eq!(statuses(&[0x80, 0x80, 0xB0, 0x07, 0x7F]), vec![(0, 0xB0)]);
    }

    #[test]
    fn test_first_timestamp_is_never_skipped() {
        let mut reader = PacketReader::new(&[0x80, 0x05, 0xFA]).unwrap();
        assert_eq!(
            reader.next(),
            Some(Err(PacketError::MalformedSubmessage {
                offset: 1,
                byte: Some(0x05)
            }))
        );
        assert_eq!(reader.next(), None);
    }

    #[test]
    fn test_missing_status_aborts_after_earlier_messages() {
        let mut reader = PacketReader::new(&[0x80, 0x80, 0xFA, 0x81, 0x81]).unwrap();
        assert!(matches!(reader.next(), Some(Ok(e)) if e.status == 0xFA));
        // 0x81 is read as a status: a legal (if meaningless) message
        assert!(matches!(reader.next(), Some(Ok(e)) if e.status == 0x81));
        assert_eq!(reader.next(), None);

        let mut reader = PacketReader::new(&[0x80, 0x80, 0xFA, 0x81]).unwrap();
        assert!(matches!(reader.next(), Some(Ok(_))));
        assert_eq!(
            reader.next(),
            Some(Err(PacketError::MalformedSubmessage {
                offset: 4,
                byte: None
            }))
        );
        assert_eq!(reader.next(), None);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            PacketError::TooShort { len: 1 }.to_string(),
            "packet too short: 1 bytes"
        );
        assert_eq!(
            PacketError::MalformedHeader { byte: 0x12 }.to_string(),
            "invalid packet header: 0x12"
        );
        assert_eq!(
            PacketError::MalformedSubmessage {
                offset: 3,
                byte: Some(0x7f)
            }
            .to_string(),
            "invalid byte 0x7f at offset 3"
        );
    }
}
