//! Tick scheduling and the wiring between transport, decoder and audio

use crate::audio::PulseSink;
use crate::ble::{PacketDecoder, TransportHandlers};
use crate::config::{
    CONNECT_TONE, DISCONNECT_TONE, IDLE_POLL, RESET_TONE, TICK_JITTER_COMPENSATION, TICK_TONE,
};
use crate::scheduler::Scheduler;
use crate::state::SharedState;
use log::{info, trace};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Emits one tick per measured quarter note while the clock is running.
pub struct TickScheduler {
    state: SharedState,
    sink: Arc<dyn PulseSink>,
}

impl TickScheduler {
    pub fn new(state: SharedState, sink: Arc<dyn PulseSink>) -> Self {
        TickScheduler { state, sink }
    }

    /// One loop iteration: maybe tick, then report how long to sleep.
    pub fn step(&self) -> Duration {
        let snapshot = self.state.snapshot();
        if !snapshot.running || snapshot.interval_ms == 0 {
            return IDLE_POLL;
        }

        trace!("Tick, interval {} ms", snapshot.interval_ms);
        self.sink.emit(TICK_TONE);
        Duration::from_millis(u64::from(snapshot.interval_ms))
            .saturating_sub(TICK_JITTER_COMPENSATION)
    }

    pub fn run(self) -> ! {
        info!("Tick scheduler running");
        loop {
            let wait = self.step();
            thread::sleep(wait);
        }
    }

    /// Runs the loop on its own thread, away from packet handling.
    pub fn spawn<S: Scheduler>(self, scheduler: &S) {
        scheduler.spawn_named("tick-scheduler", move || self.run());
    }
}

/// The decoder, the tick scheduler and the confirmation tones around one clock state.
pub struct Metronome {
    state: SharedState,
    sink: Arc<dyn PulseSink>,
    decoder: Arc<PacketDecoder>,
}

impl Metronome {
    pub fn new(state: SharedState, sink: Arc<dyn PulseSink>) -> Self {
        let decoder = Arc::new(PacketDecoder::new(state.clone(), sink.clone()));
        Metronome {
            state,
            sink,
            decoder,
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Plays the reset tone and starts ticking.
    pub fn start<S: Scheduler>(&self, scheduler: &S) {
        self.sink.emit(RESET_TONE);
        TickScheduler::new(self.state.clone(), self.sink.clone()).spawn(scheduler);
        info!("Metronome started");
    }

    /// Connect and disconnect play their tones; a disconnect also stops the clock.
    pub fn transport_handlers(&self) -> TransportHandlers {
        let connect_sink = self.sink.clone();
        let disconnect_sink = self.sink.clone();
        let disconnect_state = self.state.clone();
        let decoder = self.decoder.clone();

        TransportHandlers::new()
            .on_connect(move || connect_sink.emit(CONNECT_TONE))
            .on_disconnect(move || {
                disconnect_state.stop();
                disconnect_sink.emit(DISCONNECT_TONE);
            })
            .on_write(move |packet| decoder.on_packet_received(packet))
    }
}
