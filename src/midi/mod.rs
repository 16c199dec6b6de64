//! MIDI pieces: clock messages in, notes out

mod clock;
mod output;

pub use clock::{ClockMessage, STATUS_CLOCK, STATUS_CONTINUE, STATUS_START, STATUS_STOP};
pub use output::{list_output_ports, MidiError, MidiMessage, MidiOutputManager, Result};
