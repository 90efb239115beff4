//! Core of the cockpit panel driver.
//!
//! Translates MIDI from a two-layer bank of push-buttons and rotary encoders
//! into press, short-press, long-press and turn events, and drives LED
//! feedback back to the surface. Every control serves one role on layer A
//! and another on layer B; the [`ActiveLayerRegistry`] decides which half is
//! currently visible.

pub use config::{ConfigFile, ConfigManager, ConfigOption, ConfigSchema, Settings};
pub use control::{Callback, ControlContext, PressHandler, PushButton, RotaryEncoder};
pub use error::SurfaceError;
pub use layer::{ActiveLayerRegistry, LayerId};
pub use midi::{MidiEvent, MidiMessage, MidiSink};

pub mod control;
pub mod layer;
pub mod midi;

mod config;
mod error;
