use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::push_button::timeout_from_secs;
use super::{simvar_is_on, Callback, ControlContext, LedAddress, LedFeedback, PressHandler};
use crate::layer::LayerId;

/// LED ring values understood by the surface.
pub mod ring {
    /// Added to a ring position to make it blink.
    pub const BLINK_OFFSET: u8 = 13;
    pub const OFF: u8 = 0;
    pub const ALL_ON: u8 = 27;
    pub const ALL_BLINK: u8 = 28;
    /// Largest value a 7-bit control change can carry.
    pub const MAX_VALUE: u8 = 127;
}

/// Relative encoders report 64 for "no movement".
const CENTER: u8 = 64;

/// Turns with a larger magnitude are logged as suspicious.
pub const DEFAULT_TURN_WARNING_THRESHOLD: u8 = 10;

/// Encoders above this index live on layer B.
const LAYER_A_ENCODERS: u8 = 8;

#[derive(Default)]
struct EncoderBindings {
    simvar: Option<String>,
    mobiflight_simvar: Option<String>,
    up: Option<Callback>,
    down: Option<Callback>,
    alternate_up: Option<Callback>,
    alternate_down: Option<Callback>,
    alternate_active: bool,
}

/// A relative rotary encoder with a push switch and an LED ring.
///
/// Encoders 1-8 sit on layer A and 9-16 on layer B. Turns are decoded with
/// the center-64 convention and dispatched to the up/down callbacks, or to
/// the alternate pair while alternate mode is on.
pub struct RotaryEncoder {
    index: u8,
    receive_cc: u8,
    receive_note: u8,
    led_ring_cc: u8,
    layer: LayerId,
    turn_warning_threshold: u8,
    context: ControlContext,
    press: PressHandler,
    bindings: Mutex<EncoderBindings>,
    led: Arc<LedFeedback>,
}

impl RotaryEncoder {
    /// Create encoder `index` (1-based) and subscribe it to layer changes.
    pub fn new(index: u8, context: ControlContext) -> Self {
        let mut receive_cc = index;
        let mut receive_note = index.wrapping_sub(1);
        let mut led_ring_cc = index.wrapping_add(8);
        let mut layer = LayerId::A;

        if index > LAYER_A_ENCODERS {
            receive_cc = receive_cc.wrapping_add(2);
            receive_note = receive_note.wrapping_add(16);
            led_ring_cc = led_ring_cc.wrapping_sub(8);
            layer = LayerId::B;
        }

        let led = LedFeedback::new(
            layer,
            LedAddress::RingCc(led_ring_cc),
            context.output().clone(),
        );
        led.attach(context.registry());

        Self {
            index,
            receive_cc,
            receive_note,
            led_ring_cc,
            layer,
            turn_warning_threshold: DEFAULT_TURN_WARNING_THRESHOLD,
            press: PressHandler::new(format!("ENC {}", index), context.runtime().clone()),
            context,
            bindings: Mutex::new(EncoderBindings::default()),
            led,
        }
    }

    /// Override the magnitude above which a turn is logged as suspicious.
    pub fn with_turn_warning_threshold(mut self, threshold: u8) -> Self {
        self.turn_warning_threshold = threshold;
        self
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// Controller number the surface sends turns on.
    pub fn rotary_control_channel(&self) -> u8 {
        self.receive_cc
    }

    /// Note the surface sends for the push switch.
    pub fn button_note(&self) -> u8 {
        self.receive_note
    }

    /// Controller number used to drive the LED ring.
    pub fn led_ring_cc(&self) -> u8 {
        self.led_ring_cc
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

    pub fn led_ring_value(&self) -> u8 {
        self.led.value()
    }

    pub fn alternate_active(&self) -> bool {
        self.bindings.lock().alternate_active
    }

    pub fn is_held(&self) -> bool {
        self.press.is_held()
    }

    pub fn long_press_timeout(&self) -> Duration {
        self.press.long_press_timeout()
    }

    /// Set the ring position, sending it now if this encoder's layer is
    /// active. `blink` adds the blink offset. Values past the 7-bit range are
    /// clamped so the cached value is the one the surface receives.
    pub fn set_led_ring_value(&self, value: u8, blink: bool) {
        let requested = if blink {
            value.saturating_add(ring::BLINK_OFFSET)
        } else {
            value
        };
        let value = requested.min(ring::MAX_VALUE);
        if value != requested {
            log::warn!(
                "ENC {}: ring value {} out of range, clamped to {}",
                self.index,
                requested,
                value
            );
        }
        self.led.store(value);

        self.context
            .registry()
            .with_active_layer(self.layer, || self.led.emit());
    }

    /// Switch the whole ring on or off. Ignored, and not cached, while this
    /// encoder's layer is inactive.
    pub fn set_led_ring_on_off(&self, on: bool, blink: bool) {
        let value = match (on, blink) {
            (false, _) => ring::OFF,
            (true, false) => ring::ALL_ON,
            (true, true) => ring::ALL_BLINK,
        };
        self.context.registry().with_active_layer(self.layer, || {
            self.led.store(value);
            self.led.emit();
        });
    }

    pub fn bind_led_to_simvar(&self, simvar: impl Into<String>) {
        self.bindings.lock().simvar = Some(simvar.into());
    }

    pub fn bind_led_to_mobiflight_simvar(&self, simvar: impl Into<String>) {
        self.bindings.lock().mobiflight_simvar = Some(simvar.into());
    }

    pub fn bind_to_event<U, D>(&self, up: U, down: D)
    where
        U: Fn() + Send + Sync + 'static,
        D: Fn() + Send + Sync + 'static,
    {
        let mut bindings = self.bindings.lock();
        bindings.up = Some(Arc::new(up));
        bindings.down = Some(Arc::new(down));
    }

    pub fn bind_to_alternate_event<U, D>(&self, up: U, down: D)
    where
        U: Fn() + Send + Sync + 'static,
        D: Fn() + Send + Sync + 'static,
    {
        let mut bindings = self.bindings.lock();
        bindings.alternate_up = Some(Arc::new(up));
        bindings.alternate_down = Some(Arc::new(down));
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

    /// Drop all bindings, alternate mode and the cached ring value.
    /// Identity is kept.
    pub fn reset_configuration(&self) {
        *self.bindings.lock() = EncoderBindings::default();
        self.press.clear_bindings();
        self.led.store(ring::OFF);
    }

    /// Handle a relative turn.
    ///
    /// Values above 64 call `up` `value - 64` times; anything else calls
    /// `down` `64 - value` times, so 64 itself calls nothing.
    pub fn on_cc_data(&self, value: u8) {
        log::debug!("ENC {}: {}", self.index, value);

        let times = (i16::from(CENTER) - i16::from(value)).unsigned_abs();
        if times > u16::from(self.turn_warning_threshold) {
            log::warn!(
                "Either you're turning really fast, or encoder {} is not in relative mode",
                self.index
            );
        }

        self.led.emit();
        self.context.registry().set_active(self.layer);

        let (up, down) = {
            let bindings = self.bindings.lock();
            if bindings.alternate_active {
                (bindings.alternate_up.clone(), bindings.alternate_down.clone())
            } else {
                (bindings.up.clone(), bindings.down.clone())
            }
        };

        let event = match (value > CENTER, up, down) {
            (true, Some(up), _) => Some(up),
            (_, _, down) => down,
        };

        if let Some(event) = event {
            for _ in 0..times {
                event();
            }
        }
    }

    pub fn on_alternate(&self, enabled: bool) {
        self.bindings.lock().alternate_active = enabled;
    }

    pub fn on_alternate_toggle(&self) {
        let mut bindings = self.bindings.lock();
        bindings.alternate_active = !bindings.alternate_active;
    }

    pub fn on_note_press(&self) {
        log::debug!("ENC {}: press", self.index);
        self.context.registry().set_active(self.layer);
        self.press.press();
    }

    pub fn on_note_release(&self) {
        log::debug!("ENC {}: release", self.index);
        self.context.registry().set_active(self.layer);
        self.press.release();
    }

    pub fn on_simvar_data(&self, value: f64) {
        self.set_led_ring_on_off(simvar_is_on(value), false);
    }

    pub fn on_mobiflight_simvar_data(&self, value: f64) {
        self.set_led_ring_on_off(simvar_is_on(value), false);
    }

    /// Re-send the cached ring value if `layer` is this encoder's layer.
    pub fn on_layer_changed(&self, layer: LayerId) {
        self.led.on_layer_changed(layer);
    }
}
