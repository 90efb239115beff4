//! The full bank of controls on one X-Touch Mini.

use std::fmt;
use std::sync::Arc;

use cockpit_core::{
    ActiveLayerRegistry, ControlContext, LayerId, MidiEvent, PushButton, RotaryEncoder, Settings,
};

use crate::mapping::{ControlAddress, SurfaceMapping};

/// Kind of control, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Button,
    Encoder,
}

/// Identity and bindings of one control.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSummary {
    pub kind: ControlKind,
    pub index: u8,
    pub layer: LayerId,
    pub note: u8,
    pub cc: Option<u8>,
    pub simvar: Option<String>,
    pub mobiflight_simvar: Option<String>,
}

impl fmt::Display for ControlSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ControlKind::Button => "BTN",
            ControlKind::Encoder => "ENC",
        };
        write!(f, "{} {:>2} [{}] note {:>3}", kind, self.index, self.layer, self.note)?;
        if let Some(cc) = self.cc {
            write!(f, " cc {:>3}", cc)?;
        }
        if let Some(simvar) = &self.simvar {
            write!(f, " simvar {}", simvar)?;
        }
        if let Some(simvar) = &self.mobiflight_simvar {
            write!(f, " mobiflight {}", simvar)?;
        }
        Ok(())
    }
}

/// All 32 buttons and 16 encoders of the surface, sharing one layer registry.
///
/// Routes inbound MIDI to the owning control and fans simulator values out
/// to every control bound to them.
pub struct Surface {
    registry: Arc<ActiveLayerRegistry>,
    buttons: Vec<Arc<PushButton>>,
    encoders: Vec<Arc<RotaryEncoder>>,
}

impl Surface {
    /// Create every control with default settings.
    pub fn new(context: ControlContext) -> Self {
        Self::with_settings(context, &Settings::default())
    }

    pub fn with_settings(context: ControlContext, settings: &Settings) -> Self {
        let buttons: Vec<_> = (1..=SurfaceMapping::BUTTON_COUNT)
            .map(|index| Arc::new(PushButton::new(index, context.clone())))
            .collect();

        let encoders: Vec<_> = (1..=SurfaceMapping::ENCODER_COUNT)
            .map(|index| {
                Arc::new(
                    RotaryEncoder::new(index, context.clone())
                        .with_turn_warning_threshold(settings.turn_warning_threshold),
                )
            })
            .collect();

        let surface = Self {
            registry: context.registry().clone(),
            buttons,
            encoders,
        };
        surface.set_long_press_timeout(settings.long_press_timeout_secs);

        tracing::debug!(
            "Surface created with {} buttons and {} encoders",
            surface.buttons.len(),
            surface.encoders.len()
        );
        surface
    }

    pub fn registry(&self) -> &Arc<ActiveLayerRegistry> {
        &self.registry
    }

    /// Button by 1-based index.
    pub fn button(&self, index: u8) -> Option<&Arc<PushButton>> {
        self.buttons.get(usize::from(index).checked_sub(1)?)
    }

    /// Encoder by 1-based index.
    pub fn encoder(&self, index: u8) -> Option<&Arc<RotaryEncoder>> {
        self.encoders.get(usize::from(index).checked_sub(1)?)
    }

    pub fn buttons(&self) -> &[Arc<PushButton>] {
        &self.buttons
    }

    pub fn encoders(&self) -> &[Arc<RotaryEncoder>] {
        &self.encoders
    }

    /// Parse and route raw MIDI bytes. Returns false if nothing handled them.
    pub fn handle_midi_message(&self, message: &[u8]) -> bool {
        match MidiEvent::parse(message) {
            Some(event) => self.handle_event(event),
            None => {
                tracing::trace!("Ignoring MIDI message {:02X?}", message);
                false
            }
        }
    }

    /// Route an inbound event to the control that sent it.
    pub fn handle_event(&self, event: MidiEvent) -> bool {
        let address = match event {
            MidiEvent::NotePressed(note) | MidiEvent::NoteReleased(note) => {
                SurfaceMapping::locate_note(note)
            }
            MidiEvent::ControlChange(cc, _) => SurfaceMapping::locate_cc(cc),
        };

        let Some(address) = address else {
            tracing::debug!("No control for {:?}", event);
            return false;
        };

        match address {
            ControlAddress::Button(index) => {
                let Some(button) = self.button(index) else {
                    return false;
                };
                match event {
                    MidiEvent::NotePressed(_) => button.on_note_press(),
                    MidiEvent::NoteReleased(_) => button.on_note_release(),
                    MidiEvent::ControlChange(..) => return false,
                }
            }
            ControlAddress::EncoderPush(index) => {
                let Some(encoder) = self.encoder(index) else {
                    return false;
                };
                match event {
                    MidiEvent::NotePressed(_) => encoder.on_note_press(),
                    MidiEvent::NoteReleased(_) => encoder.on_note_release(),
                    MidiEvent::ControlChange(..) => return false,
                }
            }
            ControlAddress::EncoderTurn(index) => {
                let (Some(encoder), MidiEvent::ControlChange(_, value)) =
                    (self.encoder(index), event)
                else {
                    return false;
                };
                encoder.on_cc_data(value);
            }
        }

        true
    }

    /// Forward a simulator value to every control bound to `name`.
    /// Returns how many controls received it.
    pub fn on_simvar_data(&self, name: &str, value: f64) -> usize {
        let mut delivered = 0;
        for button in &self.buttons {
            if button.bound_simvar().as_deref() == Some(name) {
                button.on_simvar_data(value);
                delivered += 1;
            }
        }
        for encoder in &self.encoders {
            if encoder.bound_simvar().as_deref() == Some(name) {
                encoder.on_simvar_data(value);
                delivered += 1;
            }
        }
        delivered
    }

    /// Forward a MobiFlight variable value to every control bound to `name`.
    pub fn on_mobiflight_simvar_data(&self, name: &str, value: f64) -> usize {
        let mut delivered = 0;
        for button in &self.buttons {
            if button.bound_mobiflight_simvar().as_deref() == Some(name) {
                button.on_mobiflight_simvar_data(value);
                delivered += 1;
            }
        }
        for encoder in &self.encoders {
            if encoder.bound_mobiflight_simvar().as_deref() == Some(name) {
                encoder.on_mobiflight_simvar_data(value);
                delivered += 1;
            }
        }
        delivered
    }

    /// Every distinct simulator variable name currently bound.
    pub fn bound_simvars(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .buttons
            .iter()
            .filter_map(|b| b.bound_simvar())
            .chain(self.encoders.iter().filter_map(|e| e.bound_simvar()))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn set_long_press_timeout(&self, seconds: f64) {
        for button in &self.buttons {
            button.set_long_press_timeout(seconds);
        }
        for encoder in &self.encoders {
            encoder.set_long_press_timeout(seconds);
        }
    }

    pub fn reset_configuration(&self) {
        for button in &self.buttons {
            button.reset_configuration();
        }
        for encoder in &self.encoders {
            encoder.reset_configuration();
        }
    }

    /// Re-send cached LED values for the active layer.
    pub fn refresh_leds(&self) {
        let active = self.registry.active();
        for button in &self.buttons {
            button.on_layer_changed(active);
        }
        for encoder in &self.encoders {
            encoder.on_layer_changed(active);
        }
    }

    /// Identity and bindings of every control.
    pub fn summaries(&self) -> Vec<ControlSummary> {
        let buttons = self.buttons.iter().map(|button| ControlSummary {
            kind: ControlKind::Button,
            index: button.index(),
            layer: button.layer(),
            note: button.button_note(),
            cc: None,
            simvar: button.bound_simvar(),
            mobiflight_simvar: button.bound_mobiflight_simvar(),
        });

        let encoders = self.encoders.iter().map(|encoder| ControlSummary {
            kind: ControlKind::Encoder,
            index: encoder.index(),
            layer: encoder.layer(),
            note: encoder.button_note(),
            cc: Some(encoder.rotary_control_channel()),
            simvar: encoder.bound_simvar(),
            mobiflight_simvar: encoder.bound_mobiflight_simvar(),
        });

        buttons.chain(encoders).collect()
    }
}
