//! X-Touch Mini MIDI mapping.
//!
//! Address table for the surface in its default (non-MC) mode:
//!
//! ```text
//! Layer A:
//!   Buttons 1-16       notes   8-23   LEDs notes 0-15
//!   Encoder pushes 1-8 notes   0-7
//!   Encoder turns 1-8  CC      1-8    rings CC 9-16
//!
//! Layer B:
//!   Buttons 17-32      notes  32-47   LEDs notes 0-15
//!   Encoder pushes 9-16 notes 24-31
//!   Encoder turns 9-16 CC     11-18   rings CC 9-16
//! ```
//!
//! LED addresses are shared between layers; only the active layer's values
//! are sent to the hardware.

/// Which control an inbound address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAddress {
    /// Push-button by 1-based index
    Button(u8),
    /// Encoder push switch by 1-based index
    EncoderPush(u8),
    /// Encoder turn by 1-based index
    EncoderTurn(u8),
}

/// X-Touch Mini mapping constants and address lookup.
pub struct SurfaceMapping;

impl SurfaceMapping {
    pub const BUTTONS_PER_LAYER: u8 = 16;
    pub const ENCODERS_PER_LAYER: u8 = 8;
    pub const BUTTON_COUNT: u8 = Self::BUTTONS_PER_LAYER * 2;
    pub const ENCODER_COUNT: u8 = Self::ENCODERS_PER_LAYER * 2;

    // === Button notes ===
    pub const BUTTON_NOTE_A_FIRST: u8 = 8;
    pub const BUTTON_NOTE_A_LAST: u8 = 23;
    pub const BUTTON_NOTE_B_FIRST: u8 = 32;
    pub const BUTTON_NOTE_B_LAST: u8 = 47;

    // === Encoder push notes ===
    pub const ENCODER_NOTE_A_FIRST: u8 = 0;
    pub const ENCODER_NOTE_A_LAST: u8 = 7;
    pub const ENCODER_NOTE_B_FIRST: u8 = 24;
    pub const ENCODER_NOTE_B_LAST: u8 = 31;

    // === Encoder turn CCs ===
    pub const ENCODER_CC_A_FIRST: u8 = 1;
    pub const ENCODER_CC_A_LAST: u8 = 8;
    pub const ENCODER_CC_B_FIRST: u8 = 11;
    pub const ENCODER_CC_B_LAST: u8 = 18;

    /// Find the control that sends `note`.
    pub fn locate_note(note: u8) -> Option<ControlAddress> {
        match note {
            Self::BUTTON_NOTE_A_FIRST..=Self::BUTTON_NOTE_A_LAST => {
                Some(ControlAddress::Button(note - Self::BUTTON_NOTE_A_FIRST + 1))
            }
            Self::BUTTON_NOTE_B_FIRST..=Self::BUTTON_NOTE_B_LAST => Some(ControlAddress::Button(
                note - Self::BUTTON_NOTE_B_FIRST + Self::BUTTONS_PER_LAYER + 1,
            )),
            Self::ENCODER_NOTE_A_FIRST..=Self::ENCODER_NOTE_A_LAST => Some(
                ControlAddress::EncoderPush(note - Self::ENCODER_NOTE_A_FIRST + 1),
            ),
            Self::ENCODER_NOTE_B_FIRST..=Self::ENCODER_NOTE_B_LAST => {
                Some(ControlAddress::EncoderPush(
                    note - Self::ENCODER_NOTE_B_FIRST + Self::ENCODERS_PER_LAYER + 1,
                ))
            }
            _ => None,
        }
    }

    /// Find the encoder that sends turns on `cc`.
    pub fn locate_cc(cc: u8) -> Option<ControlAddress> {
        match cc {
            Self::ENCODER_CC_A_FIRST..=Self::ENCODER_CC_A_LAST => {
                Some(ControlAddress::EncoderTurn(cc - Self::ENCODER_CC_A_FIRST + 1))
            }
            Self::ENCODER_CC_B_FIRST..=Self::ENCODER_CC_B_LAST => Some(ControlAddress::EncoderTurn(
                cc - Self::ENCODER_CC_B_FIRST + Self::ENCODERS_PER_LAYER + 1,
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_notes() {
        assert_eq!(SurfaceMapping::locate_note(8), Some(ControlAddress::Button(1)));
        assert_eq!(SurfaceMapping::locate_note(23), Some(ControlAddress::Button(16)));
        assert_eq!(SurfaceMapping::locate_note(32), Some(ControlAddress::Button(17)));
        assert_eq!(SurfaceMapping::locate_note(35), Some(ControlAddress::Button(20)));
        assert_eq!(SurfaceMapping::locate_note(47), Some(ControlAddress::Button(32)));
    }

    #[test]
    fn test_encoder_notes() {
        assert_eq!(
            SurfaceMapping::locate_note(0),
            Some(ControlAddress::EncoderPush(1))
        );
        assert_eq!(
            SurfaceMapping::locate_note(25),
            Some(ControlAddress::EncoderPush(10))
        );
        assert_eq!(SurfaceMapping::locate_note(48), None);
        assert_eq!(SurfaceMapping::locate_note(127), None);
    }

    #[test]
    fn test_encoder_ccs() {
        assert_eq!(
            SurfaceMapping::locate_cc(1),
            Some(ControlAddress::EncoderTurn(1))
        );
        assert_eq!(
            SurfaceMapping::locate_cc(12),
            Some(ControlAddress::EncoderTurn(10))
        );
        assert_eq!(SurfaceMapping::locate_cc(9), None);
        assert_eq!(SurfaceMapping::locate_cc(10), None);
        assert_eq!(SurfaceMapping::locate_cc(0), None);
    }
}
