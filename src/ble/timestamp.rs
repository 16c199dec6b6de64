use crate::config::TIMESTAMP_MODULUS;
use std::fmt;

/// A BLE-MIDI timestamp: milliseconds modulo 8192.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BleTimestamp(u16);

impl BleTimestamp {
    pub const fn new(millis: u16) -> Self {
        BleTimestamp(millis % TIMESTAMP_MODULUS)
    }

    /// Composes the header's high bits with a sub-message's low bits.
    pub fn from_parts(high: u16, low: u8) -> Self {
        Self::new(((high & 0x3F) << 7) | u16::from(low & 0x7F))
    }

    pub fn from_elapsed_millis(millis: u128) -> Self {
        Self::new((millis % u128::from(TIMESTAMP_MODULUS)) as u16)
    }

    pub fn value(self) -> u16 {
        self.0
    }

    /// The six bits carried in a packet header.
    pub fn high(self) -> u8 {
        ((self.0 >> 7) & 0x3F) as u8
    }

    pub fn low(self) -> u8 {
        (self.0 & 0x7F) as u8
    }

    /// Milliseconds from `earlier` to `self`, allowing for one wrap of the counter.
    pub fn elapsed_since(self, earlier: BleTimestamp) -> u16 {
        if earlier.0 > self.0 {
            self.0 + TIMESTAMP_MODULUS - earlier.0
        } else {
            self.0 - earlier.0
        }
    }
}

impl fmt::Display for BleTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_from_parts() {
        assert_eq!(BleTimestamp::from_parts(0, 0x05).value(), 5);
        assert_eq!(BleTimestamp::from_parts(1, 0x00).value(), 128);
        assert_eq!(BleTimestamp::from_parts(0x3F, 0x7F).value(), 8191);
    }

    #[test]
    fn test_header_increment_past_top_wraps() {
        // high bits bumped to 64 by an in-packet rollover land back at zero
        assert_eq!(BleTimestamp::from_parts(0x40, 0x03).value(), 3);
    }

    #[test]
    fn test_split_into_high_and_low() {
        let ts = BleTimestamp::new(8100);
        assert_eq!(ts.high(), 63);
        assert_eq!(ts.low(), 36);
        assert_eq!(BleTimestamp::from_parts(u16::from(ts.high()), ts.low()), ts);
    }

    #[test]
    fn test_elapsed_without_wrap() {
        assert_eq!(BleTimestamp::new(240).elapsed_since(BleTimestamp::new(0)), 240);
        assert_eq!(BleTimestamp::new(77).elapsed_since(BleTimestamp::new(77)), 0);
    }

    #[test]
    fn test_elapsed_across_wrap() {
        assert_eq!(BleTimestamp::new(50).elapsed_since(BleTimestamp::new(8100)), 142);
    }

    #[test]
    fn test_from_elapsed_millis() {
        assert_eq!(BleTimestamp::from_elapsed_millis(8192 + 17).value(), 17);
    }
}
