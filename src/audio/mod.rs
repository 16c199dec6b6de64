//! Audio pulse capability
//!
//! The metronome only ever asks for "a tone of this pitch for this long".
//! How that becomes sound is up to the [`PulseSink`] behind it; every sink
//! must return immediately and queue the work if rendering takes time.

mod midi_sink;

pub use midi_sink::MidiPulseSink;

use log::info;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// A fixed-frequency pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration_ms: u32,
}

impl Tone {
    pub const fn new(frequency_hz: u32, duration_ms: u32) -> Self {
        Tone {
            frequency_hz,
            duration_ms,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.duration_ms))
    }

    /// Nearest equal-tempered MIDI note (A4 = 440 Hz = 69).
    pub fn midi_note(&self) -> u8 {
        if self.frequency_hz == 0 {
            return 0;
        }
        let note = 69.0 + 12.0 * (f64::from(self.frequency_hz) / 440.0).log2();
        note.round().clamp(0.0, 127.0) as u8
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz for {} ms", self.frequency_hz, self.duration_ms)
    }
}

/// Fire-and-forget tone output.
pub trait PulseSink: Send + Sync {
    fn emit_pulse(&self, frequency_hz: u32, duration_ms: u32);

    fn emit(&self, tone: Tone) {
        self.emit_pulse(tone.frequency_hz, tone.duration_ms);
    }
}

impl<T: PulseSink + ?Sized> PulseSink for Arc<T> {
    fn emit_pulse(&self, frequency_hz: u32, duration_ms: u32) {
        (**self).emit_pulse(frequency_hz, duration_ms);
    }
}

/// Headless sink: every pulse becomes a log line.
#[derive(Debug, Default)]
pub struct LogPulseSink;

impl LogPulseSink {
    pub fn new() -> Self {
        LogPulseSink
    }
}

impl PulseSink for LogPulseSink {
    fn emit_pulse(&self, frequency_hz: u32, duration_ms: u32) {
        info!("Pulse: {}", Tone::new(frequency_hz, duration_ms));
    }
}

/// Keeps every pulse it is asked for.
#[derive(Debug, Default)]
pub struct RecordingPulseSink {
    pulses: Mutex<Vec<(Instant, Tone)>>,
}

impl RecordingPulseSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pulses(&self) -> Vec<Tone> {
        self.lock().iter().map(|(_, tone)| *tone).collect()
    }

    /// Emission instants, in order.
    pub fn instants(&self) -> Vec<Instant> {
        self.lock().iter().map(|(at, _)| *at).collect()
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Polls until at least `count` pulses were recorded or `timeout` passes.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.count() >= count {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        self.count() >= count
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Instant, Tone)>> {
        // a panicking test thread must not hide what was recorded
        self.pulses.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PulseSink for RecordingPulseSink {
    fn emit_pulse(&self, frequency_hz: u32, duration_ms: u32) {
        self.lock()
            .push((Instant::now(), Tone::new(frequency_hz, duration_ms)));
    }
}
