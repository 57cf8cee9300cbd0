//! Imports of the host's plugin API used by this crate.

use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// The host-side plugin instance that loaded this module.
    #[derive(Clone, Debug)]
    pub type HostPlugin;

    #[wasm_bindgen(method, getter)]
    pub fn app(this: &HostPlugin) -> App;

    #[wasm_bindgen(method, catch, js_name = loadData)]
    pub async fn load_data(this: &HostPlugin) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = saveData)]
    pub async fn save_data(this: &HostPlugin, data: JsValue) -> Result<JsValue, JsValue>;

    #[derive(Clone, Debug)]
    pub type App;

    #[wasm_bindgen(method, getter)]
    pub fn workspace(this: &App) -> Workspace;

    #[wasm_bindgen(method, getter)]
    pub fn commands(this: &App) -> Commands;

    pub type Commands;

    #[wasm_bindgen(method, js_name = executeCommandById)]
    pub fn execute_command_by_id(this: &Commands, command_id: &str) -> bool;

    #[derive(Clone, Debug)]
    pub type Workspace;

    #[wasm_bindgen(method, js_name = onLayoutReady)]
    pub fn on_layout_ready(this: &Workspace, callback: &js_sys::Function);

    /// Returns an event ref to hand back to [`Workspace::offref`].
    #[wasm_bindgen(method)]
    pub fn on(this: &Workspace, name: &str, callback: &js_sys::Function) -> JsValue;

    #[wasm_bindgen(method)]
    pub fn offref(this: &Workspace, event_ref: &JsValue);

    #[wasm_bindgen(method, js_name = getActiveFile)]
    pub fn get_active_file(this: &Workspace) -> JsValue;
}
