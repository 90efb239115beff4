//! Behringer X-Touch Mini integration for the cockpit panel.
//!
//! This crate provides:
//! - The address map for the surface's two layers
//! - A [`Surface`] holding every button and encoder, routing inbound MIDI
//! - A midir transport for port discovery, input and LED output
//!
//! # Layout
//!
//! The X-Touch Mini has 8 encoders and 16 buttons per layer. Layer A and
//! layer B report on different notes and CCs but share the same LEDs, so
//! the surface's layer switch decides which half is shown.

pub mod mapping;
pub mod surface;
pub mod transport;

pub use mapping::{ControlAddress, SurfaceMapping};
pub use surface::{ControlKind, ControlSummary, Surface};
pub use transport::{run, MidiTransport, MidirSink, PortListing};
