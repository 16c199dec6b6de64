//! Transport event plumbing
//!
//! Whatever delivers BLE-MIDI (a BLE stack, a capture replay, the simulator)
//! reports three things: a central connected, it went away, or it wrote a
//! packet to the MIDI characteristic. The metronome registers one closure per
//! event.

use log::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    Write(Vec<u8>),
}

type LifecycleHandler = Box<dyn Fn() + Send + Sync>;
type WriteHandler = Box<dyn Fn(&[u8]) + Send + Sync>;

#[derive(Default)]
pub struct TransportHandlers {
    on_connect: Option<LifecycleHandler>,
    on_disconnect: Option<LifecycleHandler>,
    on_write: Option<WriteHandler>,
}

impl TransportHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_connect<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_connect = Some(Box::new(f));
        self
    }

    pub fn on_disconnect<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_disconnect = Some(Box::new(f));
        self
    }

    pub fn on_write<F>(mut self, f: F) -> Self
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        self.on_write = Some(Box::new(f));
        self
    }

    pub fn dispatch(&self, event: &TransportEvent) {
        match event {
            TransportEvent::Connected => {
                info!("Central connected");
                if let Some(handler) = &self.on_connect {
                    handler();
                }
            }
            TransportEvent::Disconnected => {
                info!("Central disconnected");
                if let Some(handler) = &self.on_disconnect {
                    handler();
                }
            }
            TransportEvent::Write(packet) => {
                if let Some(handler) = &self.on_write {
                    handler(packet);
                }
            }
        }
    }

    /// Dispatches events until the stream ends; returns how many were handled.
    pub fn pump<I>(&self, events: I) -> usize
    where
        I: IntoIterator<Item = TransportEvent>,
    {
        let mut handled = 0;
        for event in events {
            self.dispatch(&event);
            handled += 1;
        }
        debug!("Transport stream ended after {} events", handled);
        handled
    }
}
