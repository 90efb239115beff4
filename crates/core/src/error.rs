use thiserror::Error;

/// Errors raised at the edges of the surface driver.
///
/// The control state machines never return these to their callers; they
/// cover the transport and configuration plumbing around them.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("MIDI port matching '{0}' not found")]
    PortNotFound(String),

    #[error("MIDI initialisation failed: {0}")]
    MidiInit(String),

    #[error("MIDI connection failed: {0}")]
    MidiConnect(String),

    #[error("MIDI send failed: {0}")]
    MidiSend(String),

    #[error("MIDI output not connected")]
    OutputClosed,

    #[error("Failed to read config file: {0}")]
    ConfigRead(String),

    #[error("Failed to write config file: {0}")]
    ConfigWrite(String),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(String),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(String),

    #[error("Config validation errors: {}", .0.join(", "))]
    ConfigValidation(Vec<String>),
}
