use std::rc::Rc;

use leptos::prelude::*;

use crate::settings::{FoldSettings, DEFAULT_TIMEOUT_MS};

/// Settings tab content. Every edit is normalized, shown, then handed to
/// `on_change` for the live scheduler and persistence.
pub fn settings_panel(
    initial: FoldSettings,
    on_change: Rc<dyn Fn(FoldSettings)>,
) -> impl IntoView {
    let (settings, set_settings) = signal(initial);
    let on_change = StoredValue::new_local(on_change);

    let apply = move |next: FoldSettings| {
        let next = next.normalized();
        set_settings.set(next.clone());
        on_change.with_value(|notify| notify(next));
    };

    view! {
        <div class="fold-properties-settings" style="display: flex; flex-direction: column; gap: 1.5rem;">
            <div style="display: flex; flex-direction: column; gap: 0.5rem;">
                <label style="font-weight: 600; font-size: 0.9em;">"Wait for properties (ms)"</label>
                <input type="number" min="100" max="30000" step="100"
                    prop:value=move || settings.get().timeout_ms.to_string()
                    on:change=move |e| {
                        let mut next = settings.get_untracked();
                        next.timeout_ms = event_target_value(&e).parse().unwrap_or(DEFAULT_TIMEOUT_MS);
                        apply(next);
                    } />
                <span style="font-size: 0.8em; opacity: 0.7;">
                    "How long to keep watching for the properties panel after a note opens."
                </span>
            </div>
            <label style="display: flex; align-items: center; gap: 0.5rem;">
                <input type="checkbox"
                    prop:checked=move || settings.get().fold_on_layout_change
                    on:change=move |e| {
                        let mut next = settings.get_untracked();
                        next.fold_on_layout_change = event_target_checked(&e);
                        apply(next);
                    } />
                "Also fold when the workspace layout changes"
            </label>
        </div>
    }
}
