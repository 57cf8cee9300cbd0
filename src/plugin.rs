//! JavaScript-facing plugin object.
//!
//! The host's JS loader constructs [`FoldPropertiesPlugin`] with its own
//! plugin instance and forwards `onload` / `onunload` to it.
//!
//! ```javascript
//! import init, { FoldPropertiesPlugin } from './fold_properties.js';
//!
//! export default class extends Plugin {
//!     async onload() {
//!         await init(wasmBytes);
//!         this.inner = new FoldPropertiesPlugin(this);
//!         await this.inner.onload();
//!     }
//!     onunload() { this.inner?.onunload(); }
//! }
//! ```

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::Serialize;
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use crate::bindings::{HostPlugin, Workspace};
use crate::dom::DomHost;
use crate::scheduler::{FoldScheduler, Phase};
use crate::settings::FoldSettings;
use crate::settings_view::settings_panel;
use crate::{logging, PluginError};

const FILE_OPEN: &str = "file-open";
const LAYOUT_CHANGE: &str = "layout-change";

#[wasm_bindgen(start)]
pub fn wasm_init() {
    console_error_panic_hook::set_once();
    logging::init();
}

struct Subscription {
    event_ref: JsValue,
    _callback: Closure<dyn FnMut(JsValue)>,
}

struct PluginShared {
    host_plugin: HostPlugin,
    workspace: Workspace,
    scheduler: FoldScheduler<DomHost>,
    subscriptions: RefCell<Vec<Subscription>>,
    settings_view: RefCell<Option<Box<dyn Any>>>,
    unloaded: Cell<bool>,
}

#[derive(Serialize)]
struct PluginStatus {
    phase: Phase,
    watching: bool,
    subscriptions: usize,
    settings: FoldSettings,
}

#[wasm_bindgen]
pub struct FoldPropertiesPlugin {
    shared: Rc<PluginShared>,
}

#[wasm_bindgen]
impl FoldPropertiesPlugin {
    #[wasm_bindgen(constructor)]
    pub fn new(host_plugin: HostPlugin) -> Result<FoldPropertiesPlugin, JsValue> {
        let app = host_plugin.app();
        let workspace = app.workspace();
        let host = DomHost::new(app)?;
        Ok(Self {
            shared: Rc::new(PluginShared {
                host_plugin,
                workspace,
                scheduler: FoldScheduler::new(host, FoldSettings::default()),
                subscriptions: RefCell::new(Vec::new()),
                settings_view: RefCell::new(None),
                unloaded: Cell::new(false),
            }),
        })
    }

    /// Loads saved settings, then subscribes to workspace events once the
    /// layout is ready.
    pub fn onload(&self) -> js_sys::Promise {
        let shared = self.shared.clone();
        future_to_promise(async move {
            shared.load_settings().await;
            shared.wait_for_layout();
            info!("fold-properties loaded");
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn onunload(&self) {
        self.shared.unload();
    }

    /// Renders the settings panel into the host's settings tab.
    pub fn display_settings(&self, container: web_sys::HtmlElement) {
        self.shared.display_settings(container);
    }

    pub fn hide_settings(&self) {
        self.shared.settings_view.borrow_mut().take();
    }

    /// Snapshot of the scheduler for debugging from the console.
    pub fn status(&self) -> Result<JsValue, JsValue> {
        let shared = &self.shared;
        let status = PluginStatus {
            phase: shared.scheduler.phase(),
            watching: shared.scheduler.is_watching(),
            subscriptions: shared.subscriptions.borrow().len(),
            settings: shared.scheduler.settings(),
        };
        Ok(serde_wasm_bindgen::to_value(&status)?)
    }
}

impl PluginShared {
    async fn load_settings(&self) {
        let settings = match self.host_plugin.load_data().await {
            Ok(data) => settings_from_js(&data),
            Err(err) => Err(PluginError::from(err)),
        };
        match settings {
            Ok(settings) => self.scheduler.set_settings(settings),
            Err(err) => warn!(%err, "could not load settings, using defaults"),
        }
    }

    fn wait_for_layout(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        let on_ready = Closure::<dyn FnMut()>::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.on_layout_ready();
            }
        });
        self.workspace
            .on_layout_ready(on_ready.as_ref().unchecked_ref());
        // The host offers no way to unregister this callback.
        on_ready.forget();
    }

    fn on_layout_ready(self: &Rc<Self>) {
        if self.unloaded.get() {
            return;
        }
        self.subscribe(FILE_OPEN, |shared| shared.scheduler.schedule());
        self.subscribe(LAYOUT_CHANGE, |shared| {
            shared.scheduler.on_layout_change();
        });

        let active_file = self.workspace.get_active_file();
        if !active_file.is_null() && !active_file.is_undefined() {
            self.scheduler.schedule();
        }
    }

    fn subscribe(self: &Rc<Self>, event: &'static str, handler: fn(&PluginShared)) {
        let weak = Rc::downgrade(self);
        let callback = Closure::<dyn FnMut(JsValue)>::new(move |_payload: JsValue| {
            if let Some(shared) = weak.upgrade() {
                handler(&shared);
            }
        });
        let event_ref = self
            .workspace
            .on(event, callback.as_ref().unchecked_ref());
        self.subscriptions.borrow_mut().push(Subscription {
            event_ref,
            _callback: callback,
        });
    }

    fn unload(&self) {
        self.unloaded.set(true);
        self.scheduler.cleanup();
        let subscriptions: Vec<Subscription> = self.subscriptions.borrow_mut().drain(..).collect();
        for subscription in &subscriptions {
            self.workspace.offref(&subscription.event_ref);
        }
        self.settings_view.borrow_mut().take();
        info!(
            released = subscriptions.len(),
            "fold-properties unloaded"
        );
    }

    fn display_settings(self: &Rc<Self>, container: web_sys::HtmlElement) {
        self.settings_view.borrow_mut().take();
        container.set_inner_html("");

        let weak = Rc::downgrade(self);
        let on_change: Rc<dyn Fn(FoldSettings)> = Rc::new(move |settings| {
            if let Some(shared) = weak.upgrade() {
                shared.apply_settings(settings);
            }
        });
        let initial = self.scheduler.settings();
        let handle = leptos::mount::mount_to(container, move || settings_panel(initial, on_change));
        *self.settings_view.borrow_mut() = Some(Box::new(handle));
    }

    fn apply_settings(&self, settings: FoldSettings) {
        self.scheduler.set_settings(settings.clone());
        let host_plugin = self.host_plugin.clone();
        spawn_local(async move {
            if let Err(err) = save_settings(&host_plugin, &settings).await {
                warn!(%err, "could not save settings");
            }
        });
    }
}

fn settings_from_js(data: &JsValue) -> Result<FoldSettings, PluginError> {
    if data.is_null() || data.is_undefined() {
        return Ok(FoldSettings::default());
    }
    let json = js_sys::JSON::stringify(data)?
        .as_string()
        .unwrap_or_default();
    FoldSettings::from_json(&json)
}

async fn save_settings(host_plugin: &HostPlugin, settings: &FoldSettings) -> Result<(), PluginError> {
    let data = js_sys::JSON::parse(&settings.to_json()?)?;
    host_plugin.save_data(data).await?;
    Ok(())
}
