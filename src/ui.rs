// ui.rs

use crate::state::{ClockSnapshot, SharedState};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::thread;
use std::time::Duration;

const REFRESH: Duration = Duration::from_millis(100);

fn create_clock_spinner() -> ProgressBar {
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix("Clock");
    pb
}

pub fn format_status(snapshot: &ClockSnapshot) -> String {
    let transport = if snapshot.running { "running" } else { "stopped" };
    match snapshot.bpm() {
        Some(bpm) => format!(
            "{} | quarter note {} ms | {:.1} BPM",
            transport, snapshot.interval_ms, bpm
        ),
        None => format!("{} | waiting for a full quarter note", transport),
    }
}

/// Redraws the clock state on stderr until the process exits.
pub fn run_status_display(state: SharedState) {
    let spinner = create_clock_spinner();
    loop {
        thread::sleep(REFRESH);
        spinner.set_message(format_status(&state.snapshot()));
        spinner.tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_before_measurement() {
        let snapshot = ClockSnapshot {
            running: true,
            interval_ms: 0,
        };
        assert_eq!(
            format_status(&snapshot),
            "running | waiting for a full quarter note"
        );
    }

    #[test]
    fn test_status_with_measurement() {
        let snapshot = ClockSnapshot {
            running: false,
            interval_ms: 500,
        };
        assert_eq!(
            format_status(&snapshot),
            "stopped | quarter note 500 ms | 120.0 BPM"
        );
    }
}
