use super::{PulseSink, Tone};
use crate::midi::{MidiMessage, MidiOutputManager};
use crossbeam::channel::{unbounded, Receiver, Sender};
use log::{error, info, trace};
use std::io;
use std::thread;

/// Renders pulses as MIDI notes on an output port.
///
/// Pulses are queued to a dedicated output thread, so callers never wait on
/// MIDI I/O or on the note length.
pub struct MidiPulseSink {
    tx: Sender<Tone>,
}

impl MidiPulseSink {
    pub fn spawn(output: MidiOutputManager, channel: u8, velocity: u8) -> io::Result<Self> {
        let (tx, rx) = unbounded();
        thread::Builder::new()
            .name("midi-pulse".to_string())
            .spawn(move || render_pulses(output, rx, channel, velocity))?;
        Ok(MidiPulseSink { tx })
    }
}

impl PulseSink for MidiPulseSink {
    fn emit_pulse(&self, frequency_hz: u32, duration_ms: u32) {
        if self.tx.send(Tone::new(frequency_hz, duration_ms)).is_err() {
            error!("MIDI pulse thread is gone, dropping pulse");
        }
    }
}

fn render_pulses(mut output: MidiOutputManager, rx: Receiver<Tone>, channel: u8, velocity: u8) {
    info!("MIDI pulse thread started");

    for tone in rx.iter() {
        let note = tone.midi_note();
        trace!("Rendering {} as note {}", tone, note);

        if let Err(e) = output.send(MidiMessage::NoteOn {
            channel,
            note,
            velocity,
        }) {
            error!("Failed to send MIDI note on: {}", e);
            continue;
        }
        thread::sleep(tone.duration());
        if let Err(e) = output.send(MidiMessage::NoteOff { channel, note }) {
            error!("Failed to send MIDI note off: {}", e);
        }
    }

    let _ = output.send(MidiMessage::AllNotesOff { channel });
    info!("MIDI pulse thread stopping");
}
