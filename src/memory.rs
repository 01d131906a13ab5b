//! In-memory form model.
//!
//! [`MemoryForm`] and [`MemoryControl`] implement the host traits without a
//! browser so protection can run in native hosts and under `cargo test`.
//! They mimic the DOM behaviors the lifecycle depends on: radios in one form
//! are mutually exclusive by name, selects only select options they contain,
//! and listeners stack rather than replace each other.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::field::{Control, ControlType, FieldEvent, Subscription, Target, TargetEvent};

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

type Handler = Rc<RefCell<Box<dyn FnMut()>>>;

#[derive(Debug, Clone)]
struct ControlState {
    name: String,
    control_type: ControlType,
    value: String,
    checked: bool,
    options: Vec<String>,
    selected: Vec<String>,
}

struct FieldListener {
    id: u64,
    control: usize,
    event: FieldEvent,
    handler: Handler,
}

struct TargetListener {
    id: u64,
    event: TargetEvent,
    handler: Handler,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    field: Vec<FieldListener>,
    target: Vec<TargetListener>,
}

impl Listeners {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

struct FormInner {
    id: String,
    controls: RefCell<Vec<ControlState>>,
    listeners: RefCell<Listeners>,
}

/// A form held entirely in memory.
#[derive(Clone)]
pub struct MemoryForm {
    inner: Rc<FormInner>,
}

impl std::fmt::Debug for MemoryForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryForm")
            .field("id", &self.inner.id)
            .field("controls", &self.inner.controls.borrow().len())
            .finish_non_exhaustive()
    }
}

impl MemoryForm {
    /// An empty form with the given id. Pass `""` for an anonymous form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(FormInner {
                id: id.into(),
                controls: RefCell::new(Vec::new()),
                listeners: RefCell::new(Listeners::default()),
            }),
        }
    }

    /// Append a control and return its handle.
    pub fn add(&self, name: impl Into<String>, control_type: ControlType, value: impl Into<String>) -> MemoryControl {
        let mut controls = self.inner.controls.borrow_mut();
        controls.push(ControlState {
            name: name.into(),
            control_type,
            value: value.into(),
            checked: false,
            options: Vec::new(),
            selected: Vec::new(),
        });
        MemoryControl { form: self.inner.clone(), index: controls.len() - 1 }
    }

    pub fn add_text(&self, name: impl Into<String>) -> MemoryControl {
        self.add(name, ControlType::Text, "")
    }

    pub fn add_textarea(&self, name: impl Into<String>) -> MemoryControl {
        self.add(name, ControlType::TextArea, "")
    }

    pub fn add_checkbox(&self, name: impl Into<String>, value: impl Into<String>) -> MemoryControl {
        self.add(name, ControlType::Checkbox, value)
    }

    pub fn add_radio(&self, name: impl Into<String>, value: impl Into<String>) -> MemoryControl {
        self.add(name, ControlType::Radio, value)
    }

    /// Append a select with the given option values. Nothing starts selected.
    pub fn add_select(&self, name: impl Into<String>, options: &[&str], multiple: bool) -> MemoryControl {
        let control_type = if multiple { ControlType::SelectMultiple } else { ControlType::SelectOne };
        let control = self.add(name, control_type, "");
        control.with_state(|state| {
            state.options = options.iter().map(|o| (*o).to_owned()).collect();
        });
        control
    }

    /// First control named `name`.
    #[must_use]
    pub fn control(&self, name: &str) -> Option<MemoryControl> {
        let index = self.inner.controls.borrow().iter().position(|c| c.name == name)?;
        Some(MemoryControl { form: self.inner.clone(), index })
    }

    /// Fire the form's submit listeners.
    pub fn submit(&self) {
        self.dispatch_target(TargetEvent::Submit);
    }

    /// Fire the form's reset listeners.
    pub fn reset(&self) {
        self.dispatch_target(TargetEvent::Reset);
    }

    /// Attached field and form listeners combined.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        let listeners = self.inner.listeners.borrow();
        listeners.field.len() + listeners.target.len()
    }

    fn dispatch_target(&self, event: TargetEvent) {
        let handlers: Vec<Handler> = self
            .inner
            .listeners
            .borrow()
            .target
            .iter()
            .filter(|l| l.event == event)
            .map(|l| l.handler.clone())
            .collect();
        run_handlers(&handlers);
    }
}

impl Target for MemoryForm {
    type Control = MemoryControl;

    fn id(&self) -> String {
        self.inner.id.clone()
    }

    fn controls(&self) -> Vec<MemoryControl> {
        let count = self.inner.controls.borrow().len();
        (0..count)
            .map(|index| MemoryControl { form: self.inner.clone(), index })
            .collect()
    }

    fn listen(&self, event: TargetEvent, handler: Box<dyn FnMut()>) -> Subscription {
        let mut listeners = self.inner.listeners.borrow_mut();
        let id = listeners.next_id();
        listeners.target.push(TargetListener { id, event, handler: Rc::new(RefCell::new(handler)) });
        let form = Rc::downgrade(&self.inner);
        Subscription::new(move || detach(&form, |l| l.target.retain(|t| t.id != id)))
    }
}

/// Handle to one control of a [`MemoryForm`].
#[derive(Clone)]
pub struct MemoryControl {
    form: Rc<FormInner>,
    index: usize,
}

impl std::fmt::Debug for MemoryControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryControl")
            .field("index", &self.index)
            .field("state", &self.form.controls.borrow().get(self.index))
            .finish()
    }
}

impl MemoryControl {
    /// Replace the text and fire `input`, as typing would.
    pub fn type_text(&self, text: &str) {
        self.set_value(text);
        self.fire(FieldEvent::Input);
    }

    /// Toggle a checkbox or pick a radio, then fire `change`.
    pub fn click(&self) {
        match self.control_type() {
            ControlType::Radio => self.set_checked(true),
            _ => self.set_checked(!self.is_checked()),
        }
        self.fire(FieldEvent::Change);
    }

    /// Select exactly `values` and fire `change`.
    pub fn choose(&self, values: &[&str]) {
        let values: Vec<String> = values.iter().map(|v| (*v).to_owned()).collect();
        self.set_selected_values(&values);
        self.fire(FieldEvent::Change);
    }

    /// Fire `event` on this control without changing its state.
    pub fn fire(&self, event: FieldEvent) {
        let handlers: Vec<Handler> = self
            .form
            .listeners
            .borrow()
            .field
            .iter()
            .filter(|l| l.control == self.index && l.event == event)
            .map(|l| l.handler.clone())
            .collect();
        run_handlers(&handlers);
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ControlState) -> R) -> R {
        let mut controls = self.form.controls.borrow_mut();
        f(&mut controls[self.index])
    }

    fn read<R>(&self, f: impl FnOnce(&ControlState) -> R) -> R {
        let controls = self.form.controls.borrow();
        f(&controls[self.index])
    }
}

impl Control for MemoryControl {
    fn name(&self) -> String {
        self.read(|s| s.name.clone())
    }

    fn control_type(&self) -> ControlType {
        self.read(|s| s.control_type.clone())
    }

    fn value(&self) -> String {
        self.read(|s| match s.control_type {
            ControlType::SelectOne | ControlType::SelectMultiple => s.selected.first().cloned().unwrap_or_default(),
            _ => s.value.clone(),
        })
    }

    fn set_value(&self, value: &str) {
        self.with_state(|s| match s.control_type {
            ControlType::SelectOne | ControlType::SelectMultiple => {
                s.selected = s.options.iter().filter(|o| o.as_str() == value).take(1).cloned().collect();
            }
            _ => s.value = value.to_owned(),
        });
    }

    fn is_checked(&self) -> bool {
        self.read(|s| s.checked)
    }

    fn set_checked(&self, checked: bool) {
        let mut controls = self.form.controls.borrow_mut();
        let (name, is_radio) = {
            let state = &controls[self.index];
            (state.name.clone(), state.control_type == ControlType::Radio)
        };
        if checked && is_radio {
            for other in controls.iter_mut() {
                if other.control_type == ControlType::Radio && other.name == name {
                    other.checked = false;
                }
            }
        }
        controls[self.index].checked = checked;
    }

    fn selected_values(&self) -> Vec<String> {
        self.read(|s| s.selected.clone())
    }

    fn set_selected_values(&self, values: &[String]) {
        self.with_state(|s| {
            if matches!(s.control_type, ControlType::SelectOne | ControlType::SelectMultiple) {
                s.selected = s.options.iter().filter(|o| values.contains(o)).cloned().collect();
                if s.control_type == ControlType::SelectOne {
                    s.selected.truncate(1);
                }
            }
        });
    }

    fn listen(&self, event: FieldEvent, handler: Box<dyn FnMut()>) -> Subscription {
        let mut listeners = self.form.listeners.borrow_mut();
        let id = listeners.next_id();
        listeners.field.push(FieldListener {
            id,
            control: self.index,
            event,
            handler: Rc::new(RefCell::new(handler)),
        });
        let form = Rc::downgrade(&self.form);
        Subscription::new(move || detach(&form, |l| l.field.retain(|f| f.id != id)))
    }
}

fn run_handlers(handlers: &[Handler]) {
    for handler in handlers {
        let mut handler = handler.borrow_mut();
        (&mut *handler)();
    }
}

fn detach(form: &Weak<FormInner>, remove: impl FnOnce(&mut Listeners)) {
    if let Some(form) = form.upgrade() {
        remove(&mut form.listeners.borrow_mut());
    }
}
