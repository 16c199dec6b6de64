use log::{debug, error, info};
use midir::{MidiOutput, MidiOutputConnection};
use std::error::Error;
use std::fmt;

const CLIENT_NAME: &str = "blemetronome-output";
const CONNECTION_NAME: &str = "blemetronome-output-conn";

/// Custom error type for MIDI output operations
#[derive(Debug)]
pub enum MidiError {
    /// Error when sending a MIDI message
    SendError(String),
    /// Error when opening the MIDI client or connecting to a port
    ConnectionError(String),
    /// No output port matched the requested name
    DeviceNotFound(String),
    /// Sending before a port was connected
    NotConnected,
}

impl fmt::Display for MidiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MidiError::SendError(msg) => write!(f, "MIDI send error: {}", msg),
            MidiError::ConnectionError(msg) => write!(f, "MIDI connection error: {}", msg),
            MidiError::DeviceNotFound(name) => {
                write!(f, "MIDI output device '{}' not found", name)
            }
            MidiError::NotConnected => write!(f, "MIDI output not connected"),
        }
    }
}

impl Error for MidiError {}

impl From<midir::InitError> for MidiError {
    fn from(e: midir::InitError) -> Self {
        MidiError::ConnectionError(e.to_string())
    }
}

impl From<midir::PortInfoError> for MidiError {
    fn from(e: midir::PortInfoError) -> Self {
        MidiError::ConnectionError(e.to_string())
    }
}

impl<T> From<midir::ConnectError<T>> for MidiError {
    fn from(e: midir::ConnectError<T>) -> Self {
        MidiError::ConnectionError(e.kind().to_string())
    }
}

impl From<midir::SendError> for MidiError {
    fn from(e: midir::SendError) -> Self {
        MidiError::SendError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MidiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
    AllNotesOff { channel: u8 },
}

impl MidiMessage {
    pub fn to_bytes(self) -> [u8; 3] {
        match self {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => [0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            MidiMessage::NoteOff { channel, note } => [0x80 | (channel & 0x0F), note & 0x7F, 0],
            MidiMessage::AllNotesOff { channel } => [0xB0 | (channel & 0x0F), 123, 0],
        }
    }
}

#[derive(Default)]
pub struct MidiOutputManager {
    connection: Option<MidiOutputConnection>,
}

impl MidiOutputManager {
    pub fn new() -> Self {
        MidiOutputManager { connection: None }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn connect_to_first_available(&mut self) -> Result<String> {
        let midi_out = MidiOutput::new(CLIENT_NAME)?;

        let out_ports = midi_out.ports();
        let port = out_ports
            .first()
            .ok_or_else(|| MidiError::DeviceNotFound("<any>".to_string()))?;
        let port_name = midi_out.port_name(port)?;

        info!("Connecting to MIDI output port: {}", port_name);
        let connection = midi_out.connect(port, CONNECTION_NAME)?;
        self.connection = Some(connection);
        Ok(port_name)
    }

    pub fn connect_to_device(&mut self, device_name: &str) -> Result<String> {
        let midi_out = MidiOutput::new(CLIENT_NAME)?;

        let out_ports = midi_out.ports();
        let port = out_ports
            .iter()
            .find(|p| {
                midi_out
                    .port_name(p)
                    .unwrap_or_default()
                    .contains(device_name)
            })
            .ok_or_else(|| {
                error!("MIDI output device '{}' not found", device_name);
                MidiError::DeviceNotFound(device_name.to_string())
            })?;

        let port_name = midi_out.port_name(port)?;
        info!("Connecting to MIDI output port: {}", port_name);

        let connection = midi_out.connect(port, CONNECTION_NAME)?;
        self.connection = Some(connection);
        Ok(port_name)
    }

    pub fn send(&mut self, message: MidiMessage) -> Result<()> {
        let conn = self.connection.as_mut().ok_or(MidiError::NotConnected)?;
        debug!("Sending MIDI message: {:?}", message);
        conn.send(&message.to_bytes())?;
        Ok(())
    }
}

#[cfg(not(feature = "test-mock"))]
pub fn list_output_ports() -> Result<Vec<String>> {
    let midi_out = MidiOutput::new("blemetronome-port-lister")?;
    let ports = midi_out.ports();
    let port_names = ports
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect();
    Ok(port_names)
}

#[cfg(feature = "test-mock")]
pub fn list_output_ports() -> Result<Vec<String>> {
    Ok(vec!["Mock Device 1".to_string(), "Mock Device 2".to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_bytes() {
        assert_eq!(
            MidiMessage::NoteOn {
                channel: 9,
                note: 76,
                velocity: 100
            }
            .to_bytes(),
            [0x99, 76, 100]
        );
        assert_eq!(
            MidiMessage::NoteOff {
                channel: 0,
                note: 60
            }
            .to_bytes(),
            [0x80, 60, 0]
        );
        assert_eq!(
            MidiMessage::AllNotesOff { channel: 2 }.to_bytes(),
            [0xB2, 123, 0]
        );
    }

    #[test]
    fn test_send_without_connection_fails() {
        let mut manager = MidiOutputManager::new();
        assert!(!manager.is_connected());
        let err = manager
            .send(MidiMessage::AllNotesOff { channel: 0 })
            .unwrap_err();
        assert_eq!(err.to_string(), "MIDI output not connected");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            MidiError::DeviceNotFound("IAC".to_string()).to_string(),
            "MIDI output device 'IAC' not found"
        );
        assert_eq!(
            MidiError::SendError("boom".to_string()).to_string(),
            "MIDI send error: boom"
        );
    }
}
