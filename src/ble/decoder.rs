use super::packet::{BleMidiEvent, PacketError, PacketReader};
use crate::audio::PulseSink;
use crate::config::TICK_TONE;
use crate::midi::ClockMessage;
use crate::state::SharedState;
use log::{debug, info, trace};
use std::sync::Arc;

/// Turns inbound BLE-MIDI packets into clock state changes.
///
/// Decoding is best effort: messages before a malformed byte keep their
/// effect, the rest of the packet is dropped. Nothing here blocks.
pub struct PacketDecoder {
    state: SharedState,
    sink: Arc<dyn PulseSink>,
}

impl PacketDecoder {
    pub fn new(state: SharedState, sink: Arc<dyn PulseSink>) -> Self {
        PacketDecoder { state, sink }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Transport entry point, called once per characteristic write.
    pub fn on_packet_received(&self, packet: &[u8]) {
        trace!("Packet: {:02X?}", packet);
        if let Err(e) = self.decode(packet) {
            debug!("Dropping rest of packet: {}", e);
        }
    }

    /// Applies every message in `packet` and returns how many were decoded.
    pub fn decode(&self, packet: &[u8]) -> Result<usize, PacketError> {
        let mut decoded = 0;
        for event in PacketReader::new(packet)? {
            self.handle_event(event?);
            decoded += 1;
        }
        Ok(decoded)
    }

    fn handle_event(&self, event: BleMidiEvent<'_>) {
        trace!(
            "timestamp={} status={:02X}",
            event.timestamp,
            event.status
        );

        let Some(message) = ClockMessage::from_status(event.status) else {
            return;
        };

        match message {
            ClockMessage::Start | ClockMessage::Continue => {
                self.state.start();
                // lands out of phase with the steady ticks that follow
                self.sink.emit(TICK_TONE);
                info!("Clock {}", message);
            }
            ClockMessage::Stop => {
                self.state.stop();
                info!("Clock stopped");
            }
            ClockMessage::Tick => {
                if let Some(interval) = self.state.clock_pulse(event.timestamp) {
                    debug!("Quarter note measured: {} ms", interval);
                }
            }
        }
    }
}
