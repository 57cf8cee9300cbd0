//! The seam between the fold scheduler and the host application.
//!
//! In the browser this is backed by the DOM and the host's command registry
//! (see `dom.rs`); natively the tests drive a scripted fake.

use crate::error::Result;
use crate::settings::FoldSettings;

/// What a fresh lookup of the active pane found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaneProbe {
    NoActivePane,
    NoContainer,
    Container { collapsed: bool },
}

/// An active subscription to mutation batches on the document body.
pub trait WatchHandle {
    /// Stops delivery of further batches. Must tolerate repeated calls.
    fn disconnect(&mut self);
}

pub trait FoldHost: 'static {
    type Watch: WatchHandle;
    /// Dropping the deadline cancels it if the host supports cancellation.
    type Deadline;

    /// Looks up the active pane and its properties container. Never cached.
    fn probe(&self, settings: &FoldSettings) -> PaneProbe;

    /// Runs a host command by id; `false` when no such command exists.
    fn execute_command(&self, command_id: &str) -> bool;

    /// Observes child-list changes anywhere under the document body.
    fn watch_body(&self, on_batch: Box<dyn FnMut()>) -> Result<Self::Watch>;

    fn arm_deadline(&self, timeout_ms: u32, on_expire: Box<dyn FnOnce()>) -> Self::Deadline;
}
