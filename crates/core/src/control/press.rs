//! Press / short-press / long-press disambiguation.
//!
//! A press starts a one-shot timer task on the control's runtime. Whichever
//! side leaves the `Pending` phase first decides the outcome: a release
//! before the deadline is a short press and is dispatched on the releasing
//! thread; a deadline before the release is a long press and is dispatched
//! on the timer task. A release that lands while the long-press callback is
//! still running waits for it, so nothing fires after release returns.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio::runtime::Handle;
use tokio::sync::Notify;

use super::Callback;

#[derive(Default)]
struct PressBindings {
    press: Option<Callback>,
    short_press: Option<Callback>,
    long_press: Option<Callback>,
    long_press_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Firing,
    Done,
}

/// One press-release cycle shared between the control and its timer task.
struct PressCycle {
    pressed_at: Instant,
    phase: Mutex<Phase>,
    finished: Condvar,
    cancel: Notify,
}

impl PressCycle {
    fn new() -> Self {
        Self {
            pressed_at: Instant::now(),
            phase: Mutex::new(Phase::Pending),
            finished: Condvar::new(),
            cancel: Notify::new(),
        }
    }

    /// Claim the cycle as a short press. Fails if the timer got there first.
    fn resolve_short(&self) -> bool {
        let mut phase = self.phase.lock();
        if *phase == Phase::Pending {
            *phase = Phase::Done;
            true
        } else {
            false
        }
    }

    /// Claim the cycle as a long press. Fails if the release got there first.
    fn begin_long(&self) -> bool {
        let mut phase = self.phase.lock();
        if *phase == Phase::Pending {
            *phase = Phase::Firing;
            true
        } else {
            false
        }
    }

    fn finish(&self) {
        *self.phase.lock() = Phase::Done;
        self.finished.notify_all();
    }

    fn wait_finished(&self) {
        let mut phase = self.phase.lock();
        while *phase == Phase::Firing {
            self.finished.wait(&mut phase);
        }
    }
}

/// Marks the cycle finished even if the long-press callback panics.
struct FinishGuard<'a>(&'a PressCycle);

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// Press state machine shared by buttons and encoder push switches.
pub struct PressHandler {
    label: String,
    runtime: Handle,
    bindings: Arc<Mutex<PressBindings>>,
    cycle: Mutex<Option<Arc<PressCycle>>>,
}

impl PressHandler {
    /// `label` prefixes log lines, e.g. `BTN 3`.
    pub fn new(label: impl Into<String>, runtime: Handle) -> Self {
        Self {
            label: label.into(),
            runtime,
            bindings: Arc::new(Mutex::new(PressBindings::default())),
            cycle: Mutex::new(None),
        }
    }

    pub fn bind_press(&self, callback: Option<Callback>) {
        self.bindings.lock().press = callback;
    }

    pub fn bind_short_press(&self, callback: Option<Callback>) {
        self.bindings.lock().short_press = callback;
    }

    pub fn bind_long_press(&self, callback: Option<Callback>) {
        self.bindings.lock().long_press = callback;
    }

    /// Presses held longer than `timeout` are long presses. Zero, the
    /// default, makes every press long unless released before the timer
    /// task first runs.
    pub fn set_long_press_timeout(&self, timeout: Duration) {
        self.bindings.lock().long_press_timeout = timeout;
    }

    pub fn long_press_timeout(&self) -> Duration {
        self.bindings.lock().long_press_timeout
    }

    /// Clear callbacks. The timeout is part of the wiring and is kept.
    pub fn clear_bindings(&self) {
        let mut bindings = self.bindings.lock();
        bindings.press = None;
        bindings.short_press = None;
        bindings.long_press = None;
    }

    pub fn is_held(&self) -> bool {
        self.cycle.lock().is_some()
    }

    /// Time of the press that is currently held.
    pub fn pressed_at(&self) -> Option<Instant> {
        self.cycle.lock().as_ref().map(|cycle| cycle.pressed_at)
    }

    /// Start a press cycle and its timer. Ignored while already held.
    pub fn press(&self) {
        let mut current = self.cycle.lock();
        if current.is_some() {
            log::debug!("{}: press while already held, ignoring", self.label);
            return;
        }

        let cycle = Arc::new(PressCycle::new());
        *current = Some(cycle.clone());
        drop(current);

        let timeout = self.long_press_timeout();
        let bindings = self.bindings.clone();
        let label = self.label.clone();

        self.runtime.spawn(async move {
            let deadline = cycle.pressed_at.checked_add(timeout);
            let expired = async {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = expired => {}
                _ = cycle.cancel.notified() => return,
            }

            if !cycle.begin_long() {
                return;
            }
            let _guard = FinishGuard(&cycle);

            log::debug!("{}: long press", label);
            let callback = bindings.lock().long_press.clone();
            if let Some(callback) = callback {
                callback();
            }
        });
    }

    /// End the current press cycle.
    ///
    /// Dispatches the short press if the timer has not fired yet, otherwise
    /// waits until the long-press dispatch has completed.
    pub fn release(&self) {
        let Some(cycle) = self.cycle.lock().take() else {
            return;
        };

        if cycle.resolve_short() {
            cycle.cancel.notify_one();

            log::debug!("{}: short press", self.label);
            let callback = {
                let bindings = self.bindings.lock();
                bindings.press.clone().or_else(|| bindings.short_press.clone())
            };
            if let Some(callback) = callback {
                callback();
            }
        } else {
            cycle.wait_finished();
        }
    }
}
