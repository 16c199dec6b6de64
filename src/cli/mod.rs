use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Replay a BLE-MIDI capture file ("-" reads stdin)
    #[arg(long, value_name = "FILE", conflicts_with = "simulate_bpm")]
    pub replay: Option<PathBuf>,

    /// Simulate a BLE-MIDI clock master at this tempo
    #[arg(long, value_name = "BPM", value_parser = parse_bpm)]
    pub simulate_bpm: Option<f64>,

    /// Stop the simulated master after this many quarter notes
    #[arg(long, requires = "simulate_bpm")]
    pub beats: Option<u32>,

    /// Render pulses on this MIDI output port
    #[arg(long, value_name = "DEVICE")]
    pub midi_output: Option<String>,

    /// Pick the MIDI output port interactively
    #[arg(long, conflicts_with = "midi_output")]
    pub choose_output: bool,

    /// List available MIDI output ports
    #[arg(long)]
    pub list_outputs: bool,

    /// Log pulses instead of playing them
    #[arg(long)]
    pub headless: bool,

    /// Show a live clock status line
    #[arg(long)]
    pub status: bool,

    /// Settings file (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level for the log file (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = 300.0;

pub fn parse_bpm(value: &str) -> Result<f64, String> {
    let bpm: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if !(MIN_BPM..=MAX_BPM).contains(&bpm) {
        return Err(format!(
            "tempo must be between {} and {} BPM",
            MIN_BPM, MAX_BPM
        ));
    }
    Ok(bpm)
}

pub fn validate_output(device_name: &str, devices: &[String]) -> Result<(), String> {
    if !devices.iter().any(|d| d.contains(device_name)) {
        let mut error_msg = format!(
            "Error: MIDI output '{}' not found in available ports:\n",
            device_name
        );
        for device in devices {
            error_msg.push_str(&format!("  - {}\n", device));
        }
        return Err(error_msg);
    }
    Ok(())
}
