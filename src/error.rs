use thiserror::Error;

pub type Result<T> = std::result::Result<T, PluginError>;

/// Failures at the seam with the host application.
///
/// A properties container that has not rendered yet is not an error; see
/// [`crate::scheduler::FoldOutcome::NotReady`].
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("host call failed: {0}")]
    Js(String),

    #[error("host global is unavailable: {0}")]
    MissingGlobal(&'static str),

    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for PluginError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        let message = value
            .as_string()
            .or_else(|| {
                js_sys::JSON::stringify(&value)
                    .ok()
                    .and_then(|s| s.as_string())
            })
            .unwrap_or_else(|| format!("{value:?}"));
        Self::Js(message)
    }
}

#[cfg(target_arch = "wasm32")]
impl From<PluginError> for wasm_bindgen::JsValue {
    fn from(err: PluginError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}
