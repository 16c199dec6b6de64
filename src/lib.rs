pub mod audio;
pub mod ble;
pub mod cli;
pub mod config;
pub mod logging;
pub mod metronome;
pub mod midi;
pub mod scheduler;
pub mod state;
pub mod ui;

// Re-export commonly used items
pub use cli::{validate_output, Args};
pub use metronome::{Metronome, TickScheduler};
pub use scheduler::{create_scheduler, Scheduler, ThreadScheduler};
pub use state::{create_shared_state, ClockSnapshot, ClockState, SharedState};
