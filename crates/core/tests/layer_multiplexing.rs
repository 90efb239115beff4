use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use cockpit_core::{
    ActiveLayerRegistry, ControlContext, LayerId, MidiMessage, MidiSink, PushButton,
    RotaryEncoder, SurfaceError,
};
use parking_lot::Mutex;
use tokio::runtime::Runtime;

#[derive(Default)]
struct RecordingSink {
    messages: Mutex<Vec<MidiMessage>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<MidiMessage> {
        std::mem::take(&mut *self.messages.lock())
    }
}

impl MidiSink for RecordingSink {
    fn send(&self, message: MidiMessage) -> Result<(), SurfaceError> {
        self.messages.lock().push(message);
        Ok(())
    }
}

/// Sink whose port has gone away.
struct ClosedSink;

impl MidiSink for ClosedSink {
    fn send(&self, _message: MidiMessage) -> Result<(), SurfaceError> {
        Err(SurfaceError::OutputClosed)
    }
}

struct Rig {
    runtime: Runtime,
    registry: Arc<ActiveLayerRegistry>,
    sink: Arc<RecordingSink>,
}

impl Rig {
    fn new() -> Self {
        Self {
            runtime: tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .unwrap(),
            registry: Arc::new(ActiveLayerRegistry::new()),
            sink: Arc::new(RecordingSink::default()),
        }
    }

    fn context(&self) -> ControlContext {
        ControlContext::new(
            self.registry.clone(),
            self.sink.clone(),
            self.runtime.handle().clone(),
        )
    }
}

fn counter() -> (Arc<Mutex<usize>>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(Mutex::new(0usize));
    let handle = count.clone();
    (count, move || *handle.lock() += 1)
}

#[test]
fn test_pressing_layer_b_button_resyncs_layer_b_leds() {
    let rig = Rig::new();
    let button_a = PushButton::new(4, rig.context());
    let button_b = PushButton::new(20, rig.context());
    let encoder_b = RotaryEncoder::new(10, rig.context());
    button_b.set_long_press_timeout(1.0);

    button_a.set_led_on_off(true, false);
    button_b.set_led_on_off(true, true);
    encoder_b.set_led_ring_value(3, true);
    assert_eq!(rig.sink.take(), vec![MidiMessage::note_on(3, 1)]);

    button_b.on_note_press();
    assert_eq!(rig.registry.active(), LayerId::B);
    assert_eq!(
        rig.sink.take(),
        vec![
            MidiMessage::note_on(3, 2),
            MidiMessage::control_change(10, 16),
        ]
    );

    // Release re-asserts layer B; nothing changes so nothing is re-sent.
    button_b.on_note_release();
    assert!(rig.sink.take().is_empty());

    button_a.on_note_press();
    button_a.on_note_release();
    assert_eq!(rig.sink.take(), vec![MidiMessage::note_on(3, 1)]);
}

#[test]
fn test_short_and_long_press_are_exclusive() {
    let rig = Rig::new();
    let button = PushButton::new(1, rig.context());
    let (short, short_cb) = counter();
    let (long, long_cb) = counter();
    button.bind_short_press(short_cb);
    button.bind_long_press(long_cb);
    button.set_long_press_timeout(0.1);

    button.on_note_press();
    sleep(Duration::from_millis(20));
    button.on_note_release();
    assert_eq!((*short.lock(), *long.lock()), (1, 0));

    button.on_note_press();
    sleep(Duration::from_millis(250));
    button.on_note_release();
    assert_eq!((*short.lock(), *long.lock()), (1, 1));

    sleep(Duration::from_millis(150));
    assert_eq!((*short.lock(), *long.lock()), (1, 1));
}

#[test]
fn test_companion_button_toggles_encoder_alternate() {
    let rig = Rig::new();
    let encoder = Arc::new(RotaryEncoder::new(1, rig.context()));
    let shift = PushButton::new(9, rig.context());
    shift.set_long_press_timeout(1.0);

    let (heading, heading_cb) = counter();
    let (altitude, altitude_cb) = counter();
    encoder.bind_to_event(heading_cb, || {});
    encoder.bind_to_alternate_event(altitude_cb, || {});

    let target = encoder.clone();
    shift.bind_press(move || target.on_alternate_toggle());

    encoder.on_cc_data(66);
    shift.on_note_press();
    shift.on_note_release();
    encoder.on_cc_data(67);

    assert!(encoder.alternate_active());
    assert_eq!(*heading.lock(), 2);
    assert_eq!(*altitude.lock(), 3);
}

#[test]
fn test_cached_led_emitted_once_on_activation() {
    let rig = Rig::new();
    let button = PushButton::new(32, rig.context());

    button.on_simvar_data(1.0);
    assert!(rig.sink.take().is_empty());

    rig.registry.set_active(LayerId::B);
    rig.registry.set_active(LayerId::B);
    assert_eq!(rig.sink.take(), vec![MidiMessage::note_on(15, 1)]);
}

#[test]
fn test_send_failures_do_not_propagate() {
    let rig = Rig::new();
    let context = ControlContext::new(
        rig.registry.clone(),
        Arc::new(ClosedSink),
        rig.runtime.handle().clone(),
    );
    let button = PushButton::new(2, context.clone());
    let encoder = RotaryEncoder::new(2, context);

    button.set_led_on_off(true, false);
    encoder.set_led_ring_on_off(true, false);
    encoder.on_cc_data(60);

    assert_eq!(button.led_value(), 1);
    assert_eq!(encoder.led_ring_value(), 27);
}

#[test]
fn test_hidden_layer_led_never_lands_after_resync() {
    let rig = Rig::new();
    let button_a = Arc::new(PushButton::new(4, rig.context()));
    let button_b = PushButton::new(20, rig.context());
    button_b.set_led_on_off(true, true);

    let stop = Arc::new(AtomicBool::new(false));
    let writer = {
        let button_a = button_a.clone();
        let stop = stop.clone();
        std::thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                button_a.set_led_on_off(true, false);
            }
        })
    };

    for _ in 0..500 {
        rig.registry.set_active(LayerId::A);
        rig.registry.set_active(LayerId::B);
        let sent = rig.sink.take();
        let resync = sent
            .iter()
            .rposition(|m| *m == MidiMessage::note_on(3, 2))
            .unwrap();
        assert!(!sent[resync..].contains(&MidiMessage::note_on(3, 1)));
    }

    stop.store(true, Ordering::SeqCst);
    writer.join().unwrap();
    sleep(Duration::from_millis(5));
    assert!(rig.sink.take().is_empty());
}
