//! Folds the properties panel of the active note once it has rendered.
//!
//! The host announces an opened note before the note's DOM exists. A
//! schedule cycle therefore probes once, and if the properties container is
//! not there yet it watches body mutations and probes again per batch until
//! the fold lands or the deadline releases the watch.
//!
//! ```text
//! Idle -> Probing -> Done
//!                 -> Watching -> Done   (settled batch | deadline | new cycle)
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::Serialize;
use tracing::{debug, warn};

use crate::host::{FoldHost, PaneProbe, WatchHandle};
use crate::settings::FoldSettings;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FoldOutcome {
    /// The fold command was dispatched.
    Folded,
    AlreadyFolded,
    /// The active pane or its properties container is not rendered yet.
    NotReady,
}

impl FoldOutcome {
    /// Whether the current cycle needs no further attempts.
    pub fn is_settled(self) -> bool {
        !matches!(self, FoldOutcome::NotReady)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Probing,
    Watching,
    Done,
}

struct Cycle<H: FoldHost> {
    id: u64,
    watch: H::Watch,
    _deadline: H::Deadline,
}

impl<H: FoldHost> Cycle<H> {
    fn release(mut self) {
        self.watch.disconnect();
    }
}

struct Inner<H: FoldHost> {
    host: H,
    settings: RefCell<FoldSettings>,
    cycle: RefCell<Option<Cycle<H>>>,
    phase: Cell<Phase>,
    last_cycle_id: Cell<u64>,
}

impl<H: FoldHost> Drop for Inner<H> {
    fn drop(&mut self) {
        if let Some(cycle) = self.cycle.get_mut().take() {
            cycle.release();
        }
    }
}

/// Owns at most one mutation watch at a time.
///
/// Cloning yields another handle to the same scheduler. Host callbacks only
/// hold weak references, so dropping the last handle releases any watch.
pub struct FoldScheduler<H: FoldHost> {
    inner: Rc<Inner<H>>,
}

impl<H: FoldHost> Clone for FoldScheduler<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: FoldHost> FoldScheduler<H> {
    pub fn new(host: H, settings: FoldSettings) -> Self {
        Self {
            inner: Rc::new(Inner {
                host,
                settings: RefCell::new(settings.normalized()),
                cycle: RefCell::new(None),
                phase: Cell::new(Phase::Idle),
                last_cycle_id: Cell::new(0),
            }),
        }
    }

    fn from_weak(weak: &Weak<Inner<H>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub fn settings(&self) -> FoldSettings {
        self.inner.settings.borrow().clone()
    }

    /// Applies from the next attempt on; a running cycle keeps its deadline.
    pub fn set_settings(&self, settings: FoldSettings) {
        *self.inner.settings.borrow_mut() = settings.normalized();
    }

    pub fn phase(&self) -> Phase {
        self.inner.phase.get()
    }

    pub fn is_watching(&self) -> bool {
        self.inner.cycle.borrow().is_some()
    }

    /// Starts a new cycle for a freshly opened note.
    pub fn schedule(&self) {
        self.cleanup();

        let id = self.inner.last_cycle_id.get() + 1;
        self.inner.last_cycle_id.set(id);
        self.inner.phase.set(Phase::Probing);

        let outcome = self.attempt();
        if outcome.is_settled() {
            debug!(cycle = id, ?outcome, "properties settled without watching");
            self.inner.phase.set(Phase::Done);
            return;
        }

        let weak = Rc::downgrade(&self.inner);
        let watch = self.inner.host.watch_body(Box::new(move || {
            if let Some(scheduler) = Self::from_weak(&weak) {
                scheduler.on_mutation_batch(id);
            }
        }));
        let watch = match watch {
            Ok(watch) => watch,
            Err(err) => {
                warn!(cycle = id, %err, "could not watch for properties, giving up this cycle");
                self.inner.phase.set(Phase::Done);
                return;
            }
        };

        let timeout_ms = self.inner.settings.borrow().timeout_ms;
        let weak = Rc::downgrade(&self.inner);
        let deadline = self.inner.host.arm_deadline(
            timeout_ms,
            Box::new(move || {
                if let Some(scheduler) = Self::from_weak(&weak) {
                    scheduler.expire(id);
                }
            }),
        );

        *self.inner.cycle.borrow_mut() = Some(Cycle {
            id,
            watch,
            _deadline: deadline,
        });
        self.inner.phase.set(Phase::Watching);
        debug!(cycle = id, timeout_ms, "watching for properties container");
    }

    /// Probes the active pane and folds its properties if they are expanded.
    pub fn attempt(&self) -> FoldOutcome {
        let probe = {
            let settings = self.inner.settings.borrow();
            self.inner.host.probe(&settings)
        };
        match probe {
            PaneProbe::NoActivePane | PaneProbe::NoContainer => FoldOutcome::NotReady,
            PaneProbe::Container { collapsed: true } => FoldOutcome::AlreadyFolded,
            PaneProbe::Container { collapsed: false } => {
                let command_id = self.inner.settings.borrow().command_id.clone();
                let found = self.inner.host.execute_command(&command_id);
                debug!(%command_id, found, "dispatched properties fold");
                FoldOutcome::Folded
            }
        }
    }

    /// Single best-effort attempt once the layout has settled.
    ///
    /// Returns `None` when layout-change folding is switched off.
    pub fn on_layout_change(&self) -> Option<FoldOutcome> {
        if !self.inner.settings.borrow().fold_on_layout_change {
            return None;
        }
        Some(self.attempt())
    }

    /// Releases the active watch, if any. Safe to call repeatedly.
    pub fn cleanup(&self) {
        let released = self.inner.cycle.borrow_mut().take();
        if let Some(cycle) = released {
            debug!(cycle = cycle.id, "releasing properties watch");
            cycle.release();
            self.inner.phase.set(Phase::Done);
        }
    }

    fn is_current(&self, id: u64) -> bool {
        self.inner
            .cycle
            .borrow()
            .as_ref()
            .is_some_and(|cycle| cycle.id == id)
    }

    fn on_mutation_batch(&self, id: u64) {
        if !self.is_current(id) {
            return;
        }
        if self.attempt().is_settled() {
            self.cleanup();
        }
    }

    fn expire(&self, id: u64) {
        if !self.is_current(id) {
            debug!(cycle = id, "ignoring deadline of a finished cycle");
            return;
        }
        debug!(cycle = id, "properties container never appeared");
        self.cleanup();
    }
}
