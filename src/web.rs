//! Browser host: `web-sys` adapters and the JavaScript entry point.
//!
//! SYSTEM CONTEXT
//! ==============
//! Compiled only with the `web` feature. Maps the host traits onto real DOM
//! objects: [`LocalStorage`] wraps `window.localStorage`, [`DomForm`] and
//! [`DomControl`] wrap form elements, and [`IntervalScheduler`] drives
//! interval saves with `gloo_timers`. [`FormGuard`] is what page scripts use:
//!
//! ```js
//! const guard = new FormGuard({ timeout: 5, excludeFields: ["password"] });
//! guard.excludeIf((name, type) => type === "email" || name.startsWith("card_"));
//! guard.onRestore(() => console.log("draft restored"));
//! guard.protect("form.autosave");
//! ```
//!
//! TRADE-OFFS
//! ==========
//! Listeners are attached with `addEventListener`, never through `oninput`
//! style handler slots, so page code keeps its own handlers.

use std::time::Duration;

use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{
    DomException, EventTarget, HtmlFormElement, HtmlInputElement, HtmlOptionElement, HtmlSelectElement,
    HtmlTextAreaElement,
};

use crate::field::{Control, ControlType, FieldEvent, Subscription, Target, TargetEvent};
use crate::key::PageLocation;
use crate::lifecycle::{Protection, Protector};
use crate::options::{Callbacks, Options};
use crate::storage::{Storage, StorageError};
use crate::trigger::{Scheduler, period_millis};

const QUOTA_EXCEEDED: &str = "QuotaExceededError";

// =============================================================================
// STORAGE
// =============================================================================

/// `window.localStorage`, acquired once.
///
/// Acquisition fails quietly when there is no window or when the browser
/// blocks storage access (for example third-party frames with storage
/// disabled); the adapter then reports itself unavailable.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    storage: Option<web_sys::Storage>,
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStorage {
    #[must_use]
    pub fn new() -> Self {
        let storage = match web_sys::window().map(|w| w.local_storage()) {
            Some(Ok(Some(storage))) => Some(storage),
            Some(Err(err)) => {
                info!("localStorage access denied: {err:?}");
                None
            }
            Some(Ok(None)) | None => None,
        };
        Self { storage }
    }
}

impl Storage for LocalStorage {
    fn available(&self) -> bool {
        self.storage.is_some()
    }

    fn get(&self, key: &str) -> Option<String> {
        match self.storage.as_ref()?.get_item(key) {
            Ok(value) => value,
            Err(err) => {
                debug!("localStorage read of {key} failed: {err:?}");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let storage = self.storage.as_ref().ok_or(StorageError::Unavailable)?;
        storage.set_item(key, value).map_err(|err| classify(&err, key))
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = &self.storage {
            if let Err(err) = storage.remove_item(key) {
                debug!("localStorage remove of {key} failed: {err:?}");
            }
        }
    }
}

fn classify(err: &JsValue, key: &str) -> StorageError {
    match err.dyn_ref::<DomException>() {
        Some(exception) if exception.name() == QUOTA_EXCEEDED => StorageError::QuotaExceeded { key: key.to_owned() },
        _ => StorageError::Backend(format!("{err:?}")),
    }
}

// =============================================================================
// DOM ADAPTERS
// =============================================================================

/// Attach `handler` to `event` on `target`; the subscription removes it.
fn listen_dom(target: &EventTarget, event: &'static str, handler: Box<dyn FnMut()>) -> Subscription {
    let closure = Closure::wrap(handler);
    if let Err(err) = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
        warn!("failed to attach {event} listener: {err:?}");
        return Subscription::noop();
    }
    let target = target.clone();
    Subscription::new(move || {
        if let Err(err) = target.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
            debug!("failed to detach {event} listener: {err:?}");
        }
    })
}

/// A `<form>` element.
#[derive(Debug, Clone)]
pub struct DomForm {
    form: HtmlFormElement,
}

impl DomForm {
    #[must_use]
    pub fn new(form: HtmlFormElement) -> Self {
        Self { form }
    }
}

impl Target for DomForm {
    type Control = DomControl;

    fn id(&self) -> String {
        self.form.id()
    }

    fn controls(&self) -> Vec<DomControl> {
        let elements = self.form.elements();
        (0..elements.length())
            .filter_map(|i| elements.item(i))
            .filter_map(DomControl::from_element)
            .collect()
    }

    fn listen(&self, event: TargetEvent, handler: Box<dyn FnMut()>) -> Subscription {
        listen_dom(self.form.as_ref(), event.dom_name(), handler)
    }
}

/// An `<input>`, `<textarea>`, or `<select>` element.
#[derive(Debug, Clone)]
pub enum DomControl {
    Input(HtmlInputElement),
    TextArea(HtmlTextAreaElement),
    Select(HtmlSelectElement),
}

impl DomControl {
    /// Wrap a form element; anything that is not a value-bearing control
    /// (fieldsets, outputs, buttons) yields `None`.
    #[must_use]
    pub fn from_element(element: web_sys::Element) -> Option<Self> {
        let element = match element.dyn_into::<HtmlInputElement>() {
            Ok(input) => return Some(Self::Input(input)),
            Err(element) => element,
        };
        let element = match element.dyn_into::<HtmlTextAreaElement>() {
            Ok(area) => return Some(Self::TextArea(area)),
            Err(element) => element,
        };
        match element.dyn_into::<HtmlSelectElement>() {
            Ok(select) => Some(Self::Select(select)),
            Err(_) => None,
        }
    }

    fn event_target(&self) -> &EventTarget {
        match self {
            Self::Input(el) => el.as_ref(),
            Self::TextArea(el) => el.as_ref(),
            Self::Select(el) => el.as_ref(),
        }
    }

    fn options(select: &HtmlSelectElement) -> Vec<HtmlOptionElement> {
        (0..select.length())
            .filter_map(|i| select.item(i))
            .filter_map(|el| el.dyn_ref::<HtmlOptionElement>().cloned())
            .collect()
    }
}

impl Control for DomControl {
    fn name(&self) -> String {
        match self {
            Self::Input(el) => el.name(),
            Self::TextArea(el) => el.name(),
            Self::Select(el) => el.name(),
        }
    }

    fn control_type(&self) -> ControlType {
        match self {
            Self::Input(el) => ControlType::from_input_type(&el.type_()),
            Self::TextArea(_) => ControlType::TextArea,
            Self::Select(el) if el.multiple() => ControlType::SelectMultiple,
            Self::Select(_) => ControlType::SelectOne,
        }
    }

    fn value(&self) -> String {
        match self {
            Self::Input(el) => el.value(),
            Self::TextArea(el) => el.value(),
            Self::Select(el) => el.value(),
        }
    }

    fn set_value(&self, value: &str) {
        match self {
            Self::Input(el) => el.set_value(value),
            Self::TextArea(el) => el.set_value(value),
            Self::Select(el) => el.set_value(value),
        }
    }

    fn is_checked(&self) -> bool {
        match self {
            Self::Input(el) => el.checked(),
            Self::TextArea(_) | Self::Select(_) => false,
        }
    }

    fn set_checked(&self, checked: bool) {
        if let Self::Input(el) = self {
            el.set_checked(checked);
        }
    }

    fn selected_values(&self) -> Vec<String> {
        match self {
            Self::Select(el) => Self::options(el)
                .into_iter()
                .filter(HtmlOptionElement::selected)
                .map(|o| o.value())
                .collect(),
            Self::Input(_) | Self::TextArea(_) => Vec::new(),
        }
    }

    fn set_selected_values(&self, values: &[String]) {
        if let Self::Select(el) = self {
            for option in Self::options(el) {
                option.set_selected(values.contains(&option.value()));
            }
        }
    }

    fn listen(&self, event: FieldEvent, handler: Box<dyn FnMut()>) -> Subscription {
        listen_dom(self.event_target(), event.dom_name(), handler)
    }
}

// =============================================================================
// TIMERS
// =============================================================================

/// Repeating tasks on the browser event loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalScheduler;

impl Scheduler for IntervalScheduler {
    fn every(&self, period: Duration, mut task: Box<dyn FnMut()>) -> Subscription {
        let interval = gloo_timers::callback::Interval::new(period_millis(period), move || task());
        Subscription::new(move || drop(interval))
    }
}

/// The current page's location, or an empty one outside a window.
#[must_use]
pub fn page_location() -> PageLocation {
    let Some(window) = web_sys::window() else {
        return PageLocation::default();
    };
    let location = window.location();
    PageLocation::new(
        location.origin().unwrap_or_default(),
        location.pathname().unwrap_or_default(),
        location.search().unwrap_or_default(),
    )
}

// =============================================================================
// JS ENTRY POINT
// =============================================================================

/// Install the console logger and panic hook. Safe to call more than once.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        debug!("console logger already installed: {err}");
    }
}

/// Form protection handle exposed to JavaScript.
#[wasm_bindgen]
#[derive(Debug)]
pub struct FormGuard {
    options: Options,
    on_save: Option<js_sys::Function>,
    on_restore: Option<js_sys::Function>,
    on_release: Option<js_sys::Function>,
    exclude_if: Option<js_sys::Function>,
    protections: Vec<Protection>,
}

#[wasm_bindgen]
impl FormGuard {
    /// Create a guard from an options object (`undefined` for defaults).
    ///
    /// # Errors
    ///
    /// Rejects unknown option keys and a negative or non-finite timeout.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<FormGuard, JsError> {
        let options = if options.is_undefined() || options.is_null() {
            Options::default()
        } else {
            let raw = js_sys::JSON::stringify(&options).map_err(|err| JsError::new(&format!("{err:?}")))?;
            Options::from_json(&String::from(raw))?
        };
        Ok(Self {
            options,
            on_save: None,
            on_restore: None,
            on_release: None,
            exclude_if: None,
            protections: Vec::new(),
        })
    }

    #[wasm_bindgen(js_name = onSave)]
    pub fn on_save(&mut self, callback: js_sys::Function) {
        self.on_save = Some(callback);
    }

    #[wasm_bindgen(js_name = onRestore)]
    pub fn on_restore(&mut self, callback: js_sys::Function) {
        self.on_restore = Some(callback);
    }

    #[wasm_bindgen(js_name = onReleaseData)]
    pub fn on_release(&mut self, callback: js_sys::Function) {
        self.on_release = Some(callback);
    }

    /// Skip fields for which `predicate(name, type)` is truthy, on top of
    /// `excludeFields`. Applies to forms protected after this call.
    #[wasm_bindgen(js_name = excludeIf)]
    pub fn exclude_if(&mut self, predicate: js_sys::Function) {
        self.exclude_if = Some(predicate);
    }

    /// Protect every `<form>` matching `selector`. Returns the number of
    /// fields bound.
    ///
    /// # Errors
    ///
    /// Fails on an invalid selector or a matched form without an id.
    pub fn protect(&mut self, selector: &str) -> Result<usize, JsError> {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return Ok(0);
        };
        let nodes = document
            .query_selector_all(selector)
            .map_err(|err| JsError::new(&format!("invalid selector {selector}: {err:?}")))?;
        let forms: Vec<DomForm> = (0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| node.dyn_ref::<HtmlFormElement>().cloned())
            .map(DomForm::new)
            .collect();
        self.protect_forms(&forms)
    }

    /// Protect a single form element.
    ///
    /// # Errors
    ///
    /// Fails when the form has no id.
    #[wasm_bindgen(js_name = protectForm)]
    pub fn protect_form(&mut self, form: HtmlFormElement) -> Result<usize, JsError> {
        self.protect_forms(&[DomForm::new(form)])
    }

    /// Release every protected form now. Returns the number of fields.
    #[wasm_bindgen(js_name = releaseAll)]
    pub fn release_all(&self) -> usize {
        self.protections.iter().map(Protection::release_all).sum()
    }

    /// Detach every listener and interval this guard attached.
    pub fn stop(&mut self) {
        for protection in &mut self.protections {
            protection.stop();
        }
        self.protections.clear();
    }
}

impl FormGuard {
    fn protect_forms(&mut self, forms: &[DomForm]) -> Result<usize, JsError> {
        let mut protector = Protector::new(LocalStorage::new(), IntervalScheduler, page_location())
            .with_options(self.options.clone())
            .with_callbacks(self.callbacks());
        if let Some(predicate) = self.exclude_if.clone() {
            protector = protector.exclude_if(move |name, control| excluded_by(&predicate, name, control));
        }
        let protection = protector.protect(forms).map_err(JsError::from)?;
        let fields = protection.bound_fields();
        self.protections.push(protection);
        Ok(fields)
    }

    fn callbacks(&self) -> Callbacks {
        let mut callbacks = Callbacks::new();
        if let Some(f) = self.on_save.clone() {
            callbacks = callbacks.on_save(move || call(&f, "onSave"));
        }
        if let Some(f) = self.on_restore.clone() {
            callbacks = callbacks.on_restore(move || call(&f, "onRestore"));
        }
        if let Some(f) = self.on_release.clone() {
            callbacks = callbacks.on_release(move || call(&f, "onReleaseData"));
        }
        callbacks
    }
}

// A throwing predicate keeps the field protected.
fn excluded_by(predicate: &js_sys::Function, name: &str, control: &ControlType) -> bool {
    match predicate.call2(&JsValue::NULL, &JsValue::from_str(name), &JsValue::from_str(control.dom_type())) {
        Ok(verdict) => verdict.is_truthy(),
        Err(err) => {
            warn!("excludeIf threw for {name}: {err:?}");
            false
        }
    }
}

fn call(callback: &js_sys::Function, label: &str) {
    if let Err(err) = callback.call0(&JsValue::NULL) {
        warn!("{label} callback threw: {err:?}");
    }
}
