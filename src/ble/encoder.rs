use super::timestamp::BleTimestamp;
use crate::midi::ClockMessage;

/// Builds a BLE-MIDI packet.
///
/// The header takes its high bits from the timestamp the builder is created
/// with. Later messages only carry low bits, so they must fall within the same
/// high step or the next one (the receiver detects the latter from the low
/// bits going backwards).
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    bytes: Vec<u8>,
}

impl PacketBuilder {
    pub fn new(timestamp: BleTimestamp) -> Self {
        PacketBuilder {
            bytes: vec![0x80 | timestamp.high()],
        }
    }

    pub fn message(mut self, timestamp: BleTimestamp, status: u8, data: &[u8]) -> Self {
        self.bytes.push(0x80 | timestamp.low());
        self.bytes.push(status);
        self.bytes.extend(data.iter().map(|b| b & 0x7F));
        self
    }

    pub fn clock(self, timestamp: BleTimestamp, message: ClockMessage) -> Self {
        self.message(timestamp, message.status(), &[])
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// A packet holding a single clock message.
pub fn clock_packet(timestamp: BleTimestamp, message: ClockMessage) -> Vec<u8> {
    PacketBuilder::new(timestamp).clock(timestamp, message).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::packet::PacketReader;

    #[test]
    fn test_single_clock_packet_bytes() {
        let packet = clock_packet(BleTimestamp::new(300), ClockMessage::Start);
        // 300 = 2 << 7 | 44
        assert_eq!(packet, vec![0x82, 0x80 | 44, 0xFA]);
    }

    #[test]
    fn test_built_packet_reads_back_across_low_rollover() {
        let first = BleTimestamp::new(250);
        let second = BleTimestamp::new(260);
        let packet = PacketBuilder::new(first)
            .clock(first, ClockMessage::Tick)
            .message(second, 0x90, &[60, 100])
            .build();

        let events: Vec<_> = PacketReader::new(&packet)
            .unwrap()
            .map(|e| e.unwrap())
            .collect();
        assert_eq!(events[0].timestamp, first);
        assert_eq!(events[1].timestamp, second);
        assert_eq!(events[1].data, &[60, 100]);
    }
}
