//! Active layer state shared by every control on the surface.
//!
//! Each physical control serves two logical roles, one per layer. Exactly one
//! layer is active at a time; controls subscribe to layer changes so they can
//! re-sync their LEDs when their layer becomes visible again.

use std::panic::{self, AssertUnwindSafe};

use parking_lot::Mutex;

/// Layer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayerId {
    #[default]
    A,
    B,
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Callback invoked with the newly active layer.
pub type LayerSubscriber = Box<dyn Fn(LayerId) + Send + Sync>;

struct RegistryState {
    active: LayerId,
    subscribers: Vec<LayerSubscriber>,
}

/// Holds the currently active layer and notifies subscribers when it changes.
///
/// Get, set, notify and subscribe all serialize on a single lock, so a layer
/// switch is fully broadcast before any other caller observes the new value.
/// Subscribers run with that lock held and must not call back into the
/// registry.
pub struct ActiveLayerRegistry {
    state: Mutex<RegistryState>,
}

impl ActiveLayerRegistry {
    /// Create a registry with layer A active and no subscribers.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                active: LayerId::default(),
                subscribers: Vec::new(),
            }),
        }
    }

    /// Get the currently active layer.
    pub fn active(&self) -> LayerId {
        self.state.lock().active
    }

    /// Returns true if `layer` is the active layer.
    pub fn is_active(&self, layer: LayerId) -> bool {
        self.active() == layer
    }

    /// Run `f` only if `layer` is active, holding the registry lock so that no
    /// layer switch can start or finish while it runs.
    ///
    /// Returns true if `f` ran. Like a subscriber, `f` must not call back into
    /// the registry.
    pub fn with_active_layer<F>(&self, layer: LayerId, f: F) -> bool
    where
        F: FnOnce(),
    {
        let state = self.state.lock();
        if state.active != layer {
            return false;
        }
        f();
        drop(state);
        true
    }

    /// Set the active layer.
    ///
    /// Setting the current value is a no-op. Otherwise every subscriber is
    /// called once with the new layer, in subscription order, before this
    /// returns. A panicking subscriber aborts the process.
    pub fn set_active(&self, layer: LayerId) {
        let mut state = self.state.lock();
        if state.active == layer {
            return;
        }

        log::debug!("Active layer {} -> {}", state.active, layer);
        state.active = layer;

        for (position, subscriber) in state.subscribers.iter().enumerate() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| subscriber(layer)));
            if result.is_err() {
                log::error!(
                    "Layer subscriber #{} panicked while switching to layer {}; aborting",
                    position,
                    layer
                );
                std::process::abort();
            }
        }
    }

    /// Register a callback for layer changes. Duplicates are not filtered.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(LayerId) + Send + Sync + 'static,
    {
        self.state.lock().subscribers.push(Box::new(callback));
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }
}

impl Default for ActiveLayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
