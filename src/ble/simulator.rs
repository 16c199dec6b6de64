use super::encoder::clock_packet;
use super::timestamp::BleTimestamp;
use super::transport::TransportEvent;
use crate::config::PULSES_PER_QUARTER_NOTE;
use crate::midi::ClockMessage;
use crossbeam::channel::{unbounded, Receiver, Sender};
use log::{info, trace};
use std::io;
use std::thread;
use std::time::{Duration, Instant};

/// Plays the part of a BLE-MIDI clock master (a DAW or drum machine) at a fixed tempo.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockSimulator {
    bpm: f64,
    beats: Option<u32>,
}

impl ClockSimulator {
    pub fn new(bpm: f64) -> Self {
        ClockSimulator { bpm, beats: None }
    }

    /// Stop and disconnect after this many quarter notes.
    pub fn with_beats(mut self, beats: u32) -> Self {
        self.beats = Some(beats);
        self
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn pulse_interval(&self) -> Duration {
        Duration::from_secs_f64(60.0 / (self.bpm * f64::from(PULSES_PER_QUARTER_NOTE)))
    }

    /// Starts the simulated master on its own thread.
    pub fn spawn(self) -> io::Result<Receiver<TransportEvent>> {
        let (tx, rx) = unbounded();
        thread::Builder::new()
            .name("clock-simulator".to_string())
            .spawn(move || self.run(tx))?;
        Ok(rx)
    }

    fn run(self, tx: Sender<TransportEvent>) {
        info!("Simulating BLE-MIDI clock at {} BPM", self.bpm);
        let interval = self.pulse_interval();
        let start_time = Instant::now();
        let send = |message: ClockMessage| {
            let timestamp = BleTimestamp::from_elapsed_millis(start_time.elapsed().as_millis());
            tx.send(TransportEvent::Write(clock_packet(timestamp, message)))
        };

        if tx.send(TransportEvent::Connected).is_err() || send(ClockMessage::Start).is_err() {
            return;
        }

        let total_pulses = self
            .beats
            .map(|beats| u64::from(beats) * u64::from(PULSES_PER_QUARTER_NOTE));
        let mut pulses: u64 = 0;

        while total_pulses.map_or(true, |total| pulses < total) {
            pulses += 1;
            // schedule against the start so sleep overshoot does not accumulate
            let deadline = start_time + interval.mul_f64(pulses as f64);
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            }

            if send(ClockMessage::Tick).is_err() {
                trace!("Transport receiver dropped, simulator exiting");
                return;
            }
        }

        let _ = send(ClockMessage::Stop);
        let _ = tx.send(TransportEvent::Disconnected);
        info!("Simulated clock finished after {} pulses", pulses);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulse_interval() {
        let sim = ClockSimulator::new(125.0);
        assert_eq!(sim.pulse_interval(), Duration::from_millis(20));
    }

    #[test]
    fn test_finite_run_event_sequence() {
        // 1500 BPM keeps a one-beat run short: 24 pulses at 1.67 ms
        let rx = ClockSimulator::new(1500.0).with_beats(1).spawn().unwrap();
        let events: Vec<_> = rx.iter().collect();

        assert_eq!(events.len(), 1 + 1 + 24 + 1 + 1);
        assert_eq!(events[0], TransportEvent::Connected);
        assert!(matches!(&events[1], TransportEvent::Write(p) if p[2] == 0xFA));
        assert!(events[2..26]
            .iter()
            .all(|e| matches!(e, TransportEvent::Write(p) if p[2] == 0xF8)));
        assert!(matches!(&events[26], TransportEvent::Write(p) if p[2] == 0xFC));
        assert_eq!(events[27], TransportEvent::Disconnected);
    }
}
