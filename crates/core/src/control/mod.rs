//! Physical controls on the surface.
//!
//! Both control kinds share the same building blocks:
//! - [`ControlContext`]: the registry, output and timer runtime passed in at
//!   construction
//! - [`PressHandler`]: press / short-press / long-press disambiguation
//! - `LedFeedback`: the cached LED value and its layer-gated emission

mod press;
mod push_button;
mod rotary_encoder;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;

use crate::layer::{ActiveLayerRegistry, LayerId};
use crate::midi::{MidiMessage, MidiSink};

pub use press::PressHandler;
pub use push_button::{led, PushButton};
pub use rotary_encoder::{ring, RotaryEncoder, DEFAULT_TURN_WARNING_THRESHOLD};

/// Event callback bound to a control.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Shared collaborators handed to every control at construction.
#[derive(Clone)]
pub struct ControlContext {
    registry: Arc<ActiveLayerRegistry>,
    output: Arc<dyn MidiSink>,
    runtime: Handle,
}

impl ControlContext {
    /// `runtime` drives the press timers; it must have the time driver enabled.
    pub fn new(
        registry: Arc<ActiveLayerRegistry>,
        output: Arc<dyn MidiSink>,
        runtime: Handle,
    ) -> Self {
        Self {
            registry,
            output,
            runtime,
        }
    }

    pub fn registry(&self) -> &Arc<ActiveLayerRegistry> {
        &self.registry
    }

    pub fn output(&self) -> &Arc<dyn MidiSink> {
        &self.output
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }
}

/// Simulator values equal to exactly 1.0 switch an LED on.
pub(crate) fn simvar_is_on(value: f64) -> bool {
    value == 1.0
}

#[derive(Debug, Clone, Copy)]
enum LedAddress {
    Note(u8),
    RingCc(u8),
}

/// Cached LED value for one control, emitted only while its layer is active.
struct LedFeedback {
    layer: LayerId,
    address: LedAddress,
    value: AtomicU8,
    output: Arc<dyn MidiSink>,
}

impl LedFeedback {
    fn new(layer: LayerId, address: LedAddress, output: Arc<dyn MidiSink>) -> Arc<Self> {
        Arc::new(Self {
            layer,
            address,
            value: AtomicU8::new(0),
            output,
        })
    }

    /// Subscribe to layer changes for the lifetime of the registry.
    fn attach(self: &Arc<Self>, registry: &ActiveLayerRegistry) {
        let feedback = self.clone();
        registry.subscribe(move |layer| feedback.on_layer_changed(layer));
    }

    fn value(&self) -> u8 {
        self.value.load(Ordering::SeqCst)
    }

    fn store(&self, value: u8) {
        self.value.store(value, Ordering::SeqCst);
    }

    fn emit(&self) {
        let value = self.value();
        let message = match self.address {
            LedAddress::Note(note) => MidiMessage::note_on(note, value),
            LedAddress::RingCc(controller) => MidiMessage::control_change(controller, value),
        };

        if let Err(e) = self.output.send(message) {
            log::warn!("LED update {:?} failed: {}", message, e);
        }
    }

    fn on_layer_changed(&self, layer: LayerId) {
        if layer == self.layer {
            self.emit();
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use parking_lot::Mutex;
    use tokio::runtime::Runtime;

    use super::*;
    use crate::SurfaceError;

    /// Sink that records every outbound message.
    #[derive(Default)]
    pub struct RecordingSink {
        messages: Mutex<Vec<MidiMessage>>,
    }

    impl RecordingSink {
        pub fn take(&self) -> Vec<MidiMessage> {
            std::mem::take(&mut *self.messages.lock())
        }
    }

    impl MidiSink for RecordingSink {
        fn send(&self, message: MidiMessage) -> Result<(), SurfaceError> {
            self.messages.lock().push(message);
            Ok(())
        }
    }

    pub struct Harness {
        pub runtime: Runtime,
        pub registry: Arc<ActiveLayerRegistry>,
        pub sink: Arc<RecordingSink>,
    }

    impl Harness {
        pub fn new() -> Self {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .unwrap();

            Self {
                runtime,
                registry: Arc::new(ActiveLayerRegistry::new()),
                sink: Arc::new(RecordingSink::default()),
            }
        }

        pub fn context(&self) -> ControlContext {
            ControlContext::new(
                self.registry.clone(),
                self.sink.clone(),
                self.runtime.handle().clone(),
            )
        }
    }

    /// Counts invocations of a bound callback.
    pub fn counter() -> (Arc<Mutex<usize>>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(Mutex::new(0usize));
        let handle = count.clone();
        (count, move || *handle.lock() += 1)
    }
}
