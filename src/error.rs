use crate::notes::MidiByte;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlarmError {
    #[error("no transition row for pitch {pitch}")]
    InvalidState { pitch: MidiByte },
    #[error("no MIDI output port available")]
    NoMidiOutput,
    #[error("audio device error: {0}")]
    Device(String),
}
