#[cfg(test)]
mod tests {
    use blemetronome::audio::RecordingPulseSink;
    use blemetronome::ble::{clock_packet, BleTimestamp, TransportEvent};
    use blemetronome::config::{
        CONNECT_TONE, DISCONNECT_TONE, IDLE_POLL, RESET_TONE, TICK_TONE,
    };
    use blemetronome::midi::ClockMessage;
    use blemetronome::{create_scheduler, create_shared_state, Metronome, TickScheduler};
    use std::{sync::Arc, thread, time::Duration};

    fn write(timestamp: u16, message: ClockMessage) -> TransportEvent {
        TransportEvent::Write(clock_packet(BleTimestamp::new(timestamp), message))
    }

    /// Start plus one measured group of 24 periods `period_ms` apart
    fn measured_run(period_ms: u16) -> Vec<TransportEvent> {
        let mut events = vec![write(0, ClockMessage::Start)];
        events.extend((0..25).map(|i| write(i * period_ms, ClockMessage::Tick)));
        events
    }

    #[test]
    fn test_idle_while_stopped_or_unmeasured() {
        let state = create_shared_state();
        let sink = Arc::new(RecordingPulseSink::new());
        let ticker = TickScheduler::new(state.clone(), sink.clone());

        // power-on state
        assert_eq!(ticker.step(), IDLE_POLL);

        // running, nothing measured yet
        state.start();
        assert_eq!(ticker.step(), IDLE_POLL);

        // measured, but stopped
        for i in 0..25 {
            state.clock_pulse(BleTimestamp::new(i * 20));
        }
        state.stop();
        assert_eq!(state.interval_ms(), 480);
        assert_eq!(ticker.step(), IDLE_POLL);

        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_tick_and_wait_when_running() {
        let state = create_shared_state();
        let sink = Arc::new(RecordingPulseSink::new());
        let ticker = TickScheduler::new(state.clone(), sink.clone());

        state.start();
        for i in 0..25 {
            state.clock_pulse(BleTimestamp::new(i * 20));
        }

        assert_eq!(ticker.step(), Duration::from_millis(478));
        assert_eq!(ticker.step(), Duration::from_millis(478));
        assert_eq!(sink.pulses(), vec![TICK_TONE, TICK_TONE]);
    }

    #[test]
    fn test_wait_is_clamped_at_zero() {
        let state = create_shared_state();
        let sink = Arc::new(RecordingPulseSink::new());
        let ticker = TickScheduler::new(state.clone(), sink.clone());

        state.start();
        state.clock_pulse(BleTimestamp::new(100));
        for _ in 0..24 {
            state.clock_pulse(BleTimestamp::new(101));
        }
        assert_eq!(state.interval_ms(), 1);

        assert_eq!(ticker.step(), Duration::ZERO);
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn test_metronome_start_plays_reset_tone() {
        let sink = Arc::new(RecordingPulseSink::new());
        let metronome = Metronome::new(create_shared_state(), sink.clone());

        metronome.start(&create_scheduler());
        thread::sleep(Duration::from_millis(20));

        // nothing is running, so the scheduler thread stays quiet
        assert_eq!(sink.pulses(), vec![RESET_TONE]);
    }

    #[test]
    fn test_metronome_ticks_at_measured_interval() {
        let sink = Arc::new(RecordingPulseSink::new());
        let metronome = Metronome::new(create_shared_state(), sink.clone());
        metronome.start(&create_scheduler());

        let handlers = metronome.transport_handlers();
        handlers.pump(measured_run(2));
        assert_eq!(metronome.state().interval_ms(), 48);

        // reset tone, start tick, then at least three scheduled ticks
        assert!(sink.wait_for(5, Duration::from_secs(2)));
        let pulses = sink.pulses();
        assert_eq!(pulses[0], RESET_TONE);
        assert!(pulses[1..].iter().all(|tone| *tone == TICK_TONE));

        let instants = sink.instants();
        let gap = instants[4].duration_since(instants[3]);
        assert!(
            gap >= Duration::from_millis(40),
            "ticks came too fast: {:?}",
            gap
        );

        handlers.dispatch(&write(600, ClockMessage::Stop));
        thread::sleep(Duration::from_millis(100));
        sink.clear();
        thread::sleep(Duration::from_millis(200));
        assert_eq!(sink.count(), 0, "no ticks after stop");
    }

    #[test]
    fn test_connection_tones_and_disconnect_stops() {
        let sink = Arc::new(RecordingPulseSink::new());
        let metronome = Metronome::new(create_shared_state(), sink.clone());
        let handlers = metronome.transport_handlers();

        handlers.dispatch(&TransportEvent::Connected);
        handlers.pump(measured_run(10));
        assert!(metronome.state().is_running());

        handlers.dispatch(&TransportEvent::Disconnected);
        assert!(!metronome.state().is_running());
        assert_eq!(metronome.state().interval_ms(), 240);
        assert_eq!(sink.pulses(), vec![CONNECT_TONE, TICK_TONE, DISCONNECT_TONE]);
    }
}
