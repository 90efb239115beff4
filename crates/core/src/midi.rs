//! MIDI messages exchanged with the surface.
//!
//! Outbound traffic is limited to LED feedback: note-on for button LEDs and
//! control-change for encoder rings. Inbound traffic is parsed into
//! [`MidiEvent`]s for demultiplexing to the owning control.

use crate::SurfaceError;

const STATUS_NOTE_OFF: u8 = 0x80;
const STATUS_NOTE_ON: u8 = 0x90;
const STATUS_CONTROL_CHANGE: u8 = 0xB0;

/// Outbound message to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Button LED update (note, velocity)
    NoteOn { note: u8, velocity: u8 },
    /// Encoder ring update (controller, value)
    ControlChange { controller: u8, value: u8 },
}

impl MidiMessage {
    pub fn note_on(note: u8, velocity: u8) -> Self {
        Self::NoteOn {
            note: note & 0x7F,
            velocity: velocity & 0x7F,
        }
    }

    pub fn control_change(controller: u8, value: u8) -> Self {
        Self::ControlChange {
            controller: controller & 0x7F,
            value: value & 0x7F,
        }
    }

    /// Raw bytes on channel 1.
    pub fn to_bytes(&self) -> [u8; 3] {
        match *self {
            Self::NoteOn { note, velocity } => [STATUS_NOTE_ON, note, velocity],
            Self::ControlChange { controller, value } => {
                [STATUS_CONTROL_CHANGE, controller, value]
            }
        }
    }
}

/// Inbound event from the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NotePressed(u8),
    NoteReleased(u8),
    ControlChange(u8, u8), // (controller number, value)
}

impl MidiEvent {
    /// Parse raw MIDI bytes. Note-on with velocity 0 counts as a release.
    pub fn parse(message: &[u8]) -> Option<Self> {
        if message.len() < 3 {
            return None;
        }

        match message[0] & 0xF0 {
            STATUS_NOTE_ON => {
                if message[2] > 0 {
                    Some(Self::NotePressed(message[1]))
                } else {
                    Some(Self::NoteReleased(message[1]))
                }
            }
            STATUS_NOTE_OFF => Some(Self::NoteReleased(message[1])),
            STATUS_CONTROL_CHANGE => Some(Self::ControlChange(message[1], message[2])),
            _ => None,
        }
    }
}

/// Delivers outbound messages to the hardware.
pub trait MidiSink: Send + Sync {
    fn send(&self, message: MidiMessage) -> Result<(), SurfaceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_bytes() {
        assert_eq!(MidiMessage::note_on(3, 2).to_bytes(), [0x90, 3, 2]);
        assert_eq!(
            MidiMessage::control_change(10, 28).to_bytes(),
            [0xB0, 10, 28]
        );
    }

    #[test]
    fn test_parse_note_events() {
        assert_eq!(
            MidiEvent::parse(&[0x90, 35, 127]),
            Some(MidiEvent::NotePressed(35))
        );
        assert_eq!(
            MidiEvent::parse(&[0x90, 35, 0]),
            Some(MidiEvent::NoteReleased(35))
        );
        assert_eq!(
            MidiEvent::parse(&[0x80, 35, 64]),
            Some(MidiEvent::NoteReleased(35))
        );
    }

    #[test]
    fn test_parse_ignores_other_messages() {
        assert_eq!(
            MidiEvent::parse(&[0xB0, 12, 70]),
            Some(MidiEvent::ControlChange(12, 70))
        );
        assert_eq!(MidiEvent::parse(&[0xC0, 1, 0]), None);
        assert_eq!(MidiEvent::parse(&[0xF8]), None);
        assert_eq!(MidiEvent::parse(&[]), None);
    }
}
