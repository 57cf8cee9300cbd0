use gloo_timers::callback::Timeout;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, MutationObserver, MutationObserverInit};

use crate::bindings::App;
use crate::error::{PluginError, Result};
use crate::host::{FoldHost, PaneProbe, WatchHandle};
use crate::settings::FoldSettings;

/// [`FoldHost`] backed by the live document and the host's command registry.
pub struct DomHost {
    app: App,
    document: Document,
}

impl DomHost {
    pub fn new(app: App) -> Result<Self> {
        let document = web_sys::window()
            .ok_or(PluginError::MissingGlobal("window"))?
            .document()
            .ok_or(PluginError::MissingGlobal("document"))?;
        Ok(Self { app, document })
    }

    fn find(&self, scope: Option<&Element>, selector: &str) -> Option<Element> {
        let found = match scope {
            Some(element) => element.query_selector(selector),
            None => self.document.query_selector(selector),
        };
        match found {
            Ok(element) => element,
            Err(err) => {
                tracing::warn!(selector, error = ?err, "invalid selector");
                None
            }
        }
    }
}

pub struct DomWatch {
    observer: MutationObserver,
    _on_mutation: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
}

impl WatchHandle for DomWatch {
    fn disconnect(&mut self) {
        self.observer.disconnect();
    }
}

impl Drop for DomWatch {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

impl FoldHost for DomHost {
    type Watch = DomWatch;
    type Deadline = Timeout;

    fn probe(&self, settings: &FoldSettings) -> PaneProbe {
        let Some(pane) = self.find(None, &settings.active_pane_selector) else {
            return PaneProbe::NoActivePane;
        };
        let Some(container) = self.find(Some(&pane), &settings.container_selector) else {
            return PaneProbe::NoContainer;
        };
        PaneProbe::Container {
            collapsed: container.class_list().contains(&settings.collapsed_class),
        }
    }

    fn execute_command(&self, command_id: &str) -> bool {
        self.app.commands().execute_command_by_id(command_id)
    }

    fn watch_body(&self, mut on_batch: Box<dyn FnMut()>) -> Result<DomWatch> {
        let body = self
            .document
            .body()
            .ok_or(PluginError::MissingGlobal("document.body"))?;

        let on_mutation = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |_records: js_sys::Array, _observer: MutationObserver| on_batch(),
        );
        let observer = MutationObserver::new(on_mutation.as_ref().unchecked_ref())?;

        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        observer.observe_with_options(&body, &options)?;

        Ok(DomWatch {
            observer,
            _on_mutation: on_mutation,
        })
    }

    fn arm_deadline(&self, timeout_ms: u32, on_expire: Box<dyn FnOnce()>) -> Timeout {
        Timeout::new(timeout_ms, on_expire)
    }
}
