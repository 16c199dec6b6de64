// config.rs

use crate::audio::Tone;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// MIDI standard PPQN (pulses per quarter note)
pub const PULSES_PER_QUARTER_NOTE: u8 = 24;

/// BLE-MIDI timestamps are 13 bits of milliseconds
pub const TIMESTAMP_MODULUS: u16 = 8192;

pub const TICK_TONE: Tone = Tone::new(1400, 10);
pub const RESET_TONE: Tone = Tone::new(800, 200);
pub const CONNECT_TONE: Tone = Tone::new(1200, 200);
pub const DISCONNECT_TONE: Tone = Tone::new(500, 200);

/// Subtracted from every tick wait to cover thread wake-up latency.
pub const TICK_JITTER_COMPENSATION: Duration = Duration::from_millis(2);

/// Poll period of the tick scheduler while stopped or unmeasured.
pub const IDLE_POLL: Duration = Duration::from_millis(1);

pub const DEFAULT_CONFIG_FILE: &str = "blemetronome.toml";
pub const ENV_PREFIX: &str = "BLEMETRONOME";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name (or part of the name) of the MIDI output port that renders pulses
    pub midi_output: Option<String>,
    pub midi_channel: u8,
    pub velocity: u8,
    pub log_level: String,
    /// Show the live status spinner
    pub status: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            midi_output: None,
            midi_channel: 0,
            velocity: 100,
            log_level: "debug".to_string(),
            status: false,
        }
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "output={} channel={} velocity={} log_level={} status={}",
            self.midi_output.as_deref().unwrap_or("<first available>"),
            self.midi_channel,
            self.velocity,
            self.log_level,
            self.status
        )
    }
}

impl Settings {
    /// Loads defaults, then the optional settings file, then `BLEMETRONOME_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;

        if settings.midi_channel > 15 {
            return Err(format!(
                "midi_channel must be between 0 and 15, got {}",
                settings.midi_channel
            )
            .into());
        }
        if settings.velocity > 127 {
            return Err(format!(
                "velocity must be between 0 and 127, got {}",
                settings.velocity
            )
            .into());
        }

        Ok(settings)
    }
}
