//! Folds a note's properties panel whenever the note is opened.
//!
//! The host fires its "file opened" event before the note view has rendered,
//! so folding right away usually finds nothing. [`FoldScheduler`] retries on
//! DOM mutations until the properties container shows up or a deadline
//! passes.
//!
//! The scheduler only talks to the outside world through [`FoldHost`], so it
//! builds and is tested natively. The DOM host, logging, settings panel and
//! the exported plugin object exist on `wasm32` only.
//!
//! ```bash
//! wasm-pack build --target web --release
//! ```

#[cfg(target_arch = "wasm32")]
mod bindings;
#[cfg(target_arch = "wasm32")]
mod dom;
mod error;
pub mod host;
#[cfg(target_arch = "wasm32")]
mod logging;
#[cfg(target_arch = "wasm32")]
mod plugin;
pub mod scheduler;
pub mod settings;
#[cfg(target_arch = "wasm32")]
mod settings_view;
#[cfg(test)]
mod testing;

pub use error::{PluginError, Result};
pub use host::{FoldHost, PaneProbe, WatchHandle};
pub use scheduler::{FoldOutcome, FoldScheduler, Phase};
pub use settings::FoldSettings;

#[cfg(target_arch = "wasm32")]
pub use plugin::{wasm_init, FoldPropertiesPlugin};
