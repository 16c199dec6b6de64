//! BLE-MIDI: packet framing, decoding, and the transport side
//!
//! - [`PacketReader`] splits a packet into timestamped MIDI messages
//! - [`PacketDecoder`] applies clock messages to the shared [`ClockState`](crate::state::ClockState)
//! - [`TransportHandlers`] connects a packet source to the decoder
//! - [`replay`] and [`ClockSimulator`] are packet sources for running without a BLE stack

mod decoder;
pub mod encoder;
pub mod packet;
pub mod replay;
mod simulator;
pub mod timestamp;
mod transport;

pub use decoder::PacketDecoder;
pub use encoder::{clock_packet, PacketBuilder};
pub use packet::{BleMidiEvent, PacketError, PacketReader};
pub use simulator::ClockSimulator;
pub use timestamp::BleTimestamp;
pub use transport::{TransportEvent, TransportHandlers};
