use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{simvar_is_on, Callback, ControlContext, LedAddress, LedFeedback, PressHandler};
use crate::layer::LayerId;

/// LED velocities understood by the surface.
pub mod led {
    pub const OFF: u8 = 0;
    pub const ON: u8 = 1;
    pub const BLINK: u8 = 2;
}

/// Buttons above this index live on layer B.
const LAYER_A_BUTTONS: u8 = 16;

#[derive(Default)]
struct ButtonBindings {
    simvar: Option<String>,
    mobiflight_simvar: Option<String>,
}

/// A push-button with a single LED.
///
/// Buttons 1-16 sit on layer A and buttons 17-32 on layer B. Both halves
/// share the same physical LEDs, so the LED value is cached and only sent
/// while the button's layer is active.
pub struct PushButton {
    index: u8,
    receive_note: u8,
    led_note: u8,
    layer: LayerId,
    context: ControlContext,
    press: PressHandler,
    bindings: Mutex<ButtonBindings>,
    led: Arc<LedFeedback>,
}

impl PushButton {
    /// Create button `index` (1-based) and subscribe it to layer changes.
    pub fn new(index: u8, context: ControlContext) -> Self {
        let mut receive_note = index.wrapping_add(7);
        let mut led_note = index.wrapping_sub(1);
        let mut layer = LayerId::A;

        if index > LAYER_A_BUTTONS {
            receive_note = receive_note.wrapping_add(8);
            led_note = led_note.wrapping_sub(16);
            layer = LayerId::B;
        }

        let led = LedFeedback::new(layer, LedAddress::Note(led_note), context.output().clone());
        led.attach(context.registry());

        Self {
            index,
            receive_note,
            led_note,
            layer,
            press: PressHandler::new(format!("BTN {}", index), context.runtime().clone()),
            context,
            bindings: Mutex::new(ButtonBindings::default()),
            led,
        }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// Note the surface sends for this button.
    pub fn button_note(&self) -> u8 {
        self.receive_note
    }

    /// Note used to drive this button's LED.
    pub fn led_note(&self) -> u8 {
        self.led_note
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }

    pub fn bound_simvar(&self) -> Option<String> {
        self.bindings.lock().simvar.clone()
    }

    pub fn bound_mobiflight_simvar(&self) -> Option<String> {
        self.bindings.lock().mobiflight_simvar.clone()
    }

    /// Cached LED value (0 off, 1 on, 2 blink).
    pub fn led_value(&self) -> u8 {
        self.led.value()
    }

    pub fn is_held(&self) -> bool {
        self.press.is_held()
    }

    pub fn long_press_timeout(&self) -> Duration {
        self.press.long_press_timeout()
    }

    /// Set the LED, sending it now if this button's layer is active.
    pub fn set_led_on_off(&self, on: bool, blink: bool) {
        let value = match (on, blink) {
            (false, _) => led::OFF,
            (true, false) => led::ON,
            (true, true) => led::BLINK,
        };
        self.led.store(value);

        self.context
            .registry()
            .with_active_layer(self.layer, || self.led.emit());
    }

    pub fn bind_led_to_simvar(&self, simvar: impl Into<String>) {
        self.bindings.lock().simvar = Some(simvar.into());
    }

    pub fn bind_led_to_mobiflight_simvar(&self, simvar: impl Into<String>) {
        self.bindings.lock().mobiflight_simvar = Some(simvar.into());
    }

    pub fn bind_press<F>(&self, event: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.press.bind_press(Some(Arc::new(event) as Callback));
    }

    pub fn bind_short_press<F>(&self, event: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.press.bind_short_press(Some(Arc::new(event) as Callback));
    }

    pub fn bind_long_press<F>(&self, event: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.press.bind_long_press(Some(Arc::new(event) as Callback));
    }

    pub fn set_long_press_timeout(&self, seconds: f64) {
        self.press
            .set_long_press_timeout(timeout_from_secs(seconds, self.index));
    }

    /// Drop all bindings and the cached LED value. Identity is kept.
    pub fn reset_configuration(&self) {
        *self.bindings.lock() = ButtonBindings::default();
        self.press.clear_bindings();
        self.led.store(led::OFF);
    }

    pub fn on_note_press(&self) {
        log::debug!("BTN {}: press", self.index);
        self.context.registry().set_active(self.layer);
        self.press.press();
    }

    pub fn on_note_release(&self) {
        log::debug!("BTN {}: release", self.index);
        self.context.registry().set_active(self.layer);
        self.press.release();
    }

    pub fn on_simvar_data(&self, value: f64) {
        self.set_led_on_off(simvar_is_on(value), false);
    }

    pub fn on_mobiflight_simvar_data(&self, value: f64) {
        self.set_led_on_off(simvar_is_on(value), false);
    }

    /// Re-send the cached LED value if `layer` is this button's layer.
    pub fn on_layer_changed(&self, layer: LayerId) {
        self.led.on_layer_changed(layer);
    }
}

/// Negative or non-finite timeouts collapse to zero.
pub(crate) fn timeout_from_secs(seconds: f64, index: u8) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or_else(|_| {
        log::warn!(
            "Control {}: invalid long press timeout {}, using 0",
            index,
            seconds
        );
        Duration::ZERO
    })
}
