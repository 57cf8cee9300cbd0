use serde::{Deserialize, Serialize};

use crate::error::PluginError;

pub const DEFAULT_TIMEOUT_MS: u32 = 2000;
pub const MIN_TIMEOUT_MS: u32 = 100;
pub const MAX_TIMEOUT_MS: u32 = 30_000;

pub const DEFAULT_COMMAND_ID: &str = "editor:toggle-fold-properties";
pub const DEFAULT_ACTIVE_PANE_SELECTOR: &str = ".workspace-leaf.mod-active";
pub const DEFAULT_CONTAINER_SELECTOR: &str = ".metadata-container";
pub const DEFAULT_COLLAPSED_CLASS: &str = "is-collapsed";

/// User-tunable settings, persisted through the host's plugin data store.
///
/// Missing keys fall back to their defaults so older saved data keeps loading.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct FoldSettings {
    /// How long a schedule cycle waits for the properties container to render.
    pub timeout_ms: u32,
    pub command_id: String,
    pub active_pane_selector: String,
    pub container_selector: String,
    pub collapsed_class: String,
    pub fold_on_layout_change: bool,
}

impl Default for FoldSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            command_id: DEFAULT_COMMAND_ID.to_string(),
            active_pane_selector: DEFAULT_ACTIVE_PANE_SELECTOR.to_string(),
            container_selector: DEFAULT_CONTAINER_SELECTOR.to_string(),
            collapsed_class: DEFAULT_COLLAPSED_CLASS.to_string(),
            fold_on_layout_change: true,
        }
    }
}

impl FoldSettings {
    /// Parses saved plugin data. `null` (nothing saved yet) yields the defaults.
    pub fn from_json(json: &str) -> Result<Self, PluginError> {
        let saved: Option<FoldSettings> = serde_json::from_str(json)?;
        Ok(saved.unwrap_or_default().normalized())
    }

    pub fn to_json(&self) -> Result<String, PluginError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Clamps the timeout into a sane window and restores blanked-out strings.
    pub fn normalized(mut self) -> Self {
        self.timeout_ms = self.timeout_ms.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS);
        restore_if_blank(&mut self.command_id, DEFAULT_COMMAND_ID);
        restore_if_blank(&mut self.active_pane_selector, DEFAULT_ACTIVE_PANE_SELECTOR);
        restore_if_blank(&mut self.container_selector, DEFAULT_CONTAINER_SELECTOR);
        restore_if_blank(&mut self.collapsed_class, DEFAULT_COLLAPSED_CLASS);
        self
    }
}

fn restore_if_blank(value: &mut String, default: &str) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        *value = default.to_string();
    } else if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}
