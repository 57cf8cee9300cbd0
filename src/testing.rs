//! Scripted stand-in for the host: a toggleable pane/container, a command log,
//! mutation watches that tests fire by hand, and a virtual clock for deadlines.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{PluginError, Result};
use crate::host::{FoldHost, PaneProbe, WatchHandle};
use crate::settings::FoldSettings;

struct WatchSlot {
    connected: Cell<bool>,
    on_batch: RefCell<Option<Box<dyn FnMut()>>>,
}

struct PendingDeadline {
    at_ms: u64,
    cancelled: Rc<Cell<bool>>,
    on_expire: Box<dyn FnOnce()>,
}

pub struct FakeDom {
    pane: Cell<bool>,
    /// `Some(collapsed)` once the properties container is rendered.
    container: Cell<Option<bool>>,
    pub folds_on_dispatch: Cell<bool>,
    pub fail_watch: Cell<bool>,
    /// When set, dropping a deadline handle does not cancel it.
    pub uncancellable_deadlines: Cell<bool>,
    dispatched: RefCell<Vec<String>>,
    watches: RefCell<Vec<Rc<WatchSlot>>>,
    peak_watches: Cell<usize>,
    disconnects: Cell<usize>,
    deadlines: RefCell<Vec<PendingDeadline>>,
    armed_timeouts: RefCell<Vec<u32>>,
    now_ms: Cell<u64>,
}

impl FakeDom {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            pane: Cell::new(false),
            container: Cell::new(None),
            folds_on_dispatch: Cell::new(true),
            fail_watch: Cell::new(false),
            uncancellable_deadlines: Cell::new(false),
            dispatched: RefCell::new(Vec::new()),
            watches: RefCell::new(Vec::new()),
            peak_watches: Cell::new(0),
            disconnects: Cell::new(0),
            deadlines: RefCell::new(Vec::new()),
            armed_timeouts: RefCell::new(Vec::new()),
            now_ms: Cell::new(0),
        })
    }

    pub fn host(self: &Rc<Self>) -> FakeHost {
        FakeHost { dom: self.clone() }
    }

    pub fn show_pane(&self) {
        self.pane.set(true);
    }

    pub fn render_container(&self, collapsed: bool) {
        self.pane.set(true);
        self.container.set(Some(collapsed));
        self.deliver_batch();
    }

    pub fn is_collapsed(&self) -> bool {
        self.container.get() == Some(true)
    }

    pub fn dispatched(&self) -> Vec<String> {
        self.dispatched.borrow().clone()
    }

    pub fn active_watches(&self) -> usize {
        self.watches
            .borrow()
            .iter()
            .filter(|slot| slot.connected.get())
            .count()
    }

    pub fn peak_watches(&self) -> usize {
        self.peak_watches.get()
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.get()
    }

    pub fn pending_deadlines(&self) -> usize {
        self.deadlines
            .borrow()
            .iter()
            .filter(|d| !d.cancelled.get())
            .count()
    }

    pub fn armed_timeouts(&self) -> Vec<u32> {
        self.armed_timeouts.borrow().clone()
    }

    /// Delivers one mutation batch to every connected watch.
    pub fn deliver_batch(&self) {
        let slots: Vec<Rc<WatchSlot>> = self.watches.borrow().clone();
        for slot in slots {
            if !slot.connected.get() {
                continue;
            }
            let taken = slot.on_batch.borrow_mut().take();
            if let Some(mut on_batch) = taken {
                on_batch();
                if slot.connected.get() {
                    *slot.on_batch.borrow_mut() = Some(on_batch);
                }
            }
        }
    }

    /// Moves the virtual clock forward, firing due deadlines in order.
    pub fn advance(&self, ms: u64) {
        let target = self.now_ms.get() + ms;
        loop {
            let due = {
                let mut deadlines = self.deadlines.borrow_mut();
                deadlines.retain(|d| !d.cancelled.get());
                let next = deadlines
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| d.at_ms <= target)
                    .min_by_key(|(_, d)| d.at_ms)
                    .map(|(idx, _)| idx);
                next.map(|idx| deadlines.remove(idx))
            };
            let Some(deadline) = due else { break };
            self.now_ms.set(deadline.at_ms);
            (deadline.on_expire)();
        }
        self.now_ms.set(target);
    }
}

pub struct FakeHost {
    dom: Rc<FakeDom>,
}

pub struct FakeWatch {
    slot: Rc<WatchSlot>,
    dom: Rc<FakeDom>,
}

impl WatchHandle for FakeWatch {
    fn disconnect(&mut self) {
        if self.slot.connected.replace(false) {
            self.slot.on_batch.borrow_mut().take();
            self.dom.disconnects.set(self.dom.disconnects.get() + 1);
        }
    }
}

pub struct FakeDeadline {
    cancelled: Rc<Cell<bool>>,
    cancel_on_drop: bool,
}

impl Drop for FakeDeadline {
    fn drop(&mut self) {
        if self.cancel_on_drop {
            self.cancelled.set(true);
        }
    }
}

impl FoldHost for FakeHost {
    type Watch = FakeWatch;
    type Deadline = FakeDeadline;

    fn probe(&self, _settings: &FoldSettings) -> PaneProbe {
        if !self.dom.pane.get() {
            return PaneProbe::NoActivePane;
        }
        match self.dom.container.get() {
            None => PaneProbe::NoContainer,
            Some(collapsed) => PaneProbe::Container { collapsed },
        }
    }

    fn execute_command(&self, command_id: &str) -> bool {
        self.dom.dispatched.borrow_mut().push(command_id.to_string());
        if self.dom.folds_on_dispatch.get() && self.dom.container.get() == Some(false) {
            self.dom.container.set(Some(true));
        }
        true
    }

    fn watch_body(&self, on_batch: Box<dyn FnMut()>) -> Result<FakeWatch> {
        if self.dom.fail_watch.get() {
            return Err(PluginError::MissingGlobal("document.body"));
        }
        let slot = Rc::new(WatchSlot {
            connected: Cell::new(true),
            on_batch: RefCell::new(Some(on_batch)),
        });
        self.dom.watches.borrow_mut().push(slot.clone());
        let active = self.dom.active_watches();
        self.dom
            .peak_watches
            .set(self.dom.peak_watches.get().max(active));
        Ok(FakeWatch {
            slot,
            dom: self.dom.clone(),
        })
    }

    fn arm_deadline(&self, timeout_ms: u32, on_expire: Box<dyn FnOnce()>) -> FakeDeadline {
        let cancelled = Rc::new(Cell::new(false));
        self.dom.armed_timeouts.borrow_mut().push(timeout_ms);
        self.dom.deadlines.borrow_mut().push(PendingDeadline {
            at_ms: self.dom.now_ms.get() + u64::from(timeout_ms),
            cancelled: cancelled.clone(),
            on_expire,
        });
        FakeDeadline {
            cancelled,
            cancel_on_drop: !self.dom.uncancellable_deadlines.get(),
        }
    }
}
