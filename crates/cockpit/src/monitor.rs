//! Default wiring: every control logs its events and drives its own LEDs.
//!
//! Useful for checking a surface before any simulator bindings exist.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use cockpit_core::{PushButton, RotaryEncoder};
use cockpit_xtouch::Surface;

/// Highest ring position before the blink range starts.
const RING_POSITIONS: u8 = 13;

pub fn wire(surface: &Surface) {
    for button in surface.buttons() {
        wire_button(button);
    }
    for encoder in surface.encoders() {
        wire_encoder(encoder);
    }
}

fn wire_button(button: &Arc<PushButton>) {
    let index = button.index();
    let lit = Arc::new(AtomicBool::new(false));
    let weak: Weak<PushButton> = Arc::downgrade(button);

    button.bind_short_press(move || {
        let on = !lit.fetch_xor(true, Ordering::SeqCst);
        log::info!("BTN {}: short press (LED {})", index, if on { "on" } else { "off" });
        if let Some(button) = weak.upgrade() {
            button.set_led_on_off(on, false);
        }
    });

    let weak: Weak<PushButton> = Arc::downgrade(button);
    button.bind_long_press(move || {
        log::info!("BTN {}: long press (LED blink)", index);
        if let Some(button) = weak.upgrade() {
            button.set_led_on_off(true, true);
        }
    });
}

fn wire_encoder(encoder: &Arc<RotaryEncoder>) {
    let index = encoder.index();
    let position = Arc::new(AtomicU8::new(0));

    let step = |delta: i8, alternate: bool| {
        let position = position.clone();
        let weak: Weak<RotaryEncoder> = Arc::downgrade(encoder);
        move || {
            let next = position
                .load(Ordering::SeqCst)
                .saturating_add_signed(delta)
                .min(RING_POSITIONS);
            position.store(next, Ordering::SeqCst);
            log::info!(
                "ENC {}: {}{}",
                index,
                if delta > 0 { "up" } else { "down" },
                if alternate { " (alt)" } else { "" }
            );
            if let Some(encoder) = weak.upgrade() {
                encoder.set_led_ring_value(next, alternate);
            }
        }
    };

    encoder.bind_to_event(step(1, false), step(-1, false));
    encoder.bind_to_alternate_event(step(1, true), step(-1, true));

    let weak: Weak<RotaryEncoder> = Arc::downgrade(encoder);
    encoder.bind_short_press(move || {
        if let Some(encoder) = weak.upgrade() {
            encoder.on_alternate_toggle();
            log::info!(
                "ENC {}: alternate {}",
                index,
                if encoder.alternate_active() { "on" } else { "off" }
            );
        }
    });

    encoder.bind_long_press(move || log::info!("ENC {}: long press", index));
}
