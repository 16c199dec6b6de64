use crate::ble::timestamp::BleTimestamp;
use std::sync::atomic::{AtomicU16, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

const RUNNING_BIT: u64 = 1 << 32;
const INTERVAL_MASK: u64 = 0xFFFF_FFFF;

/// One consistent view of the fields the tick scheduler cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockSnapshot {
    pub running: bool,
    pub interval_ms: u32,
}

impl ClockSnapshot {
    fn pack(self) -> u64 {
        let running = if self.running { RUNNING_BIT } else { 0 };
        running | u64::from(self.interval_ms)
    }

    fn unpack(word: u64) -> Self {
        Self {
            running: word & RUNNING_BIT != 0,
            interval_ms: (word & INTERVAL_MASK) as u32,
        }
    }

    /// Tempo implied by the measured quarter note, if one has been measured.
    pub fn bpm(&self) -> Option<f64> {
        if self.interval_ms == 0 {
            None
        } else {
            Some(60_000.0 / f64::from(self.interval_ms))
        }
    }
}

/// Process-wide clock state shared by the packet decoder and the tick scheduler.
///
/// `running` and `interval_ms` live in one atomic word so a reader never sees
/// a fresh running flag paired with an interval from before a Stop/Start
/// cycle. The pulse counter and anchor are only ever written by the decoder.
#[derive(Debug, Default)]
pub struct ClockState {
    snapshot: AtomicU64,
    pulse_count: AtomicU8,
    anchor: AtomicU16,
}

impl ClockState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot::unpack(self.snapshot.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.snapshot().running
    }

    pub fn interval_ms(&self) -> u32 {
        self.snapshot().interval_ms
    }

    pub fn pulse_count(&self) -> u8 {
        self.pulse_count.load(Ordering::SeqCst)
    }

    pub fn anchor(&self) -> BleTimestamp {
        BleTimestamp::new(self.anchor.load(Ordering::SeqCst))
    }

    /// Start or Continue: clears the measurement and sets running in one store.
    pub fn start(&self) {
        self.pulse_count.store(0, Ordering::SeqCst);
        self.snapshot.store(
            ClockSnapshot {
                running: true,
                interval_ms: 0,
            }
            .pack(),
            Ordering::SeqCst,
        );
    }

    /// Stop keeps the last interval so a later Continue has something to tick with.
    pub fn stop(&self) {
        self.snapshot.fetch_and(!RUNNING_BIT, Ordering::SeqCst);
        self.pulse_count.store(0, Ordering::SeqCst);
    }

    /// Advances the 24-pulse group. Returns the new interval when a group completes.
    pub fn clock_pulse(&self, timestamp: BleTimestamp) -> Option<u32> {
        match self.pulse_count.load(Ordering::SeqCst) {
            0 => {
                self.anchor.store(timestamp.value(), Ordering::SeqCst);
                self.pulse_count.store(1, Ordering::SeqCst);
                None
            }
            count if count >= crate::config::PULSES_PER_QUARTER_NOTE => {
                let interval = u32::from(timestamp.elapsed_since(self.anchor()));
                self.set_interval(interval);
                self.pulse_count.store(0, Ordering::SeqCst);
                Some(interval)
            }
            count => {
                self.pulse_count.store(count + 1, Ordering::SeqCst);
                None
            }
        }
    }

    fn set_interval(&self, interval_ms: u32) {
        let mut current = self.snapshot.load(Ordering::SeqCst);
        loop {
            let next = (current & RUNNING_BIT) | u64::from(interval_ms);
            match self.snapshot.compare_exchange_weak(
                current,
                next,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }

    /// Back to the power-on state: stopped, unmeasured.
    pub fn reset(&self) {
        self.snapshot.store(0, Ordering::SeqCst);
        self.pulse_count.store(0, Ordering::SeqCst);
        self.anchor.store(0, Ordering::SeqCst);
    }
}

pub type SharedState = Arc<ClockState>;

pub fn create_shared_state() -> SharedState {
    Arc::new(ClockState::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_packing() {
        let snapshot = ClockSnapshot {
            running: true,
            interval_ms: 500,
        };
        assert_eq!(ClockSnapshot::unpack(snapshot.pack()), snapshot);
        assert_eq!(
            ClockSnapshot::unpack(0),
            ClockSnapshot {
                running: false,
                interval_ms: 0
            }
        );
    }

    #[test]
    fn test_interval_update_keeps_running_flag() {
        let state = ClockState::new();
        state.start();
        state.set_interval(480);
        assert!(state.is_running());
        assert_eq!(state.interval_ms(), 480);

        state.stop();
        state.set_interval(300);
        assert!(!state.is_running());
        assert_eq!(state.interval_ms(), 300);
    }

    #[test]
    fn test_bpm_from_interval() {
        let snapshot = ClockSnapshot {
            running: true,
            interval_ms: 500,
        };
        assert_eq!(snapshot.bpm(), Some(120.0));
        assert_eq!(ClockSnapshot::default().bpm(), None);
    }
}
