//! Field model: control types, dispatch kinds, and the host traits.
//!
//! SYSTEM CONTEXT
//! ==============
//! The crate never walks a DOM itself. A host hands it [`Target`]s (forms)
//! whose [`Control`]s can be read, written, and listened to. The browser host
//! lives in `web`; [`crate::memory`] provides an in-process one.
//!
//! DESIGN
//! ======
//! Whether a field gets group semantics is decided by its *name* (a `[`
//! anywhere in it), not by its control type. That decision is made once, at
//! bind time, and recorded as a [`FieldKind`] so the codec never re-derives it.

#[cfg(test)]
#[path = "field_test.rs"]
mod field_test;

/// Character whose presence in a field name selects group semantics.
pub const GROUP_MARKER: char = '[';

/// The control type tag of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlType {
    /// `<input type="text">` (and inputs with no type attribute).
    Text,
    /// `<textarea>`.
    TextArea,
    /// `<input type="checkbox">`.
    Checkbox,
    /// `<input type="radio">`.
    Radio,
    /// `<select>` without `multiple`.
    SelectOne,
    /// `<select multiple>`.
    SelectMultiple,
    /// `<input type="file">`; never persisted.
    File,
    /// Submit, reset, and plain buttons; never persisted.
    Button,
    /// Any other input type, e.g. `email` or `number`.
    Other(String),
}

impl ControlType {
    /// Map an `<input>` element's `type` attribute.
    #[must_use]
    pub fn from_input_type(type_attr: &str) -> Self {
        match type_attr.to_ascii_lowercase().as_str() {
            "" | "text" => Self::Text,
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            "file" => Self::File,
            "submit" | "reset" | "button" | "image" => Self::Button,
            other => Self::Other(other.to_owned()),
        }
    }

    /// The control's DOM `type` property, as page scripts see it.
    #[must_use]
    pub fn dom_type(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::TextArea => "textarea",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::SelectOne => "select-one",
            Self::SelectMultiple => "select-multiple",
            Self::File => "file",
            Self::Button => "button",
            Self::Other(other) => other,
        }
    }

    /// Whether the field is typed into rather than toggled or picked.
    ///
    /// Only these fields are eligible for input-driven or interval saves.
    #[must_use]
    pub fn is_text_like(&self) -> bool {
        matches!(self, Self::Text | Self::TextArea)
    }

    /// Whether this control never takes part in protection.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::File | Self::Button)
    }
}

/// How a field's value is encoded and restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Text input or textarea without a group marker.
    Text,
    /// Single checkbox: stores its checked state.
    Checkbox,
    /// Checkbox whose name carries the group marker: stores the checked
    /// values of every same-named checkbox.
    CheckboxGroup,
    /// Radio button: stores the chosen value.
    Radio,
    /// Any other control whose name carries the group marker: the stored
    /// value is split into members.
    Grouped,
    /// Everything else: plain value round-trip.
    Plain,
}

impl FieldKind {
    /// Classify a field once, from its control type and name.
    #[must_use]
    pub fn classify(control: &ControlType, name: &str) -> Self {
        let grouped = name.contains(GROUP_MARKER);
        match control {
            ControlType::Radio => Self::Radio,
            ControlType::Checkbox if grouped => Self::CheckboxGroup,
            ControlType::Checkbox => Self::Checkbox,
            _ if grouped => Self::Grouped,
            ControlType::Text | ControlType::TextArea => Self::Text,
            _ => Self::Plain,
        }
    }
}

/// Field-level events a save can hang off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEvent {
    /// Fired on every edit of a text-like field.
    Input,
    /// Fired when a toggle or pick is committed.
    Change,
}

impl FieldEvent {
    /// DOM event type name.
    #[must_use]
    pub fn dom_name(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Change => "change",
        }
    }
}

/// Form-level events that release stored data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetEvent {
    Submit,
    Reset,
}

impl TargetEvent {
    /// DOM event type name.
    #[must_use]
    pub fn dom_name(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Reset => "reset",
        }
    }
}

/// A registered listener or timer. Dropping it detaches the registration.
#[must_use = "dropping a Subscription detaches it immediately"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap the action that undoes a registration.
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self { detach: Some(Box::new(detach)) }
    }

    /// A subscription with nothing to detach.
    pub fn noop() -> Self {
        Self { detach: None }
    }

    /// Detach now rather than at drop.
    pub fn cancel(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

/// One input control inside a form.
///
/// Handles are cheap clones of the same underlying control, the way
/// `web_sys` element handles are.
pub trait Control: Clone + 'static {
    fn name(&self) -> String;

    fn control_type(&self) -> ControlType;

    /// The control's current value (for checkboxes and radios, the value
    /// attribute, not the checked state).
    fn value(&self) -> String;

    fn set_value(&self, value: &str);

    fn is_checked(&self) -> bool;

    fn set_checked(&self, checked: bool);

    /// Values of the selected options of a select; empty for other controls.
    fn selected_values(&self) -> Vec<String>;

    /// Select exactly the options whose values appear in `values`.
    fn set_selected_values(&self, values: &[String]);

    /// Attach `handler` to `event`. Registration is additive: it never
    /// replaces another listener on the same control.
    fn listen(&self, event: FieldEvent, handler: Box<dyn FnMut()>) -> Subscription;
}

/// A form-like container of controls with a stable identifier.
pub trait Target: Clone + 'static {
    type Control: Control;

    /// The form's identifier. Empty means "none", which protection rejects.
    fn id(&self) -> String;

    /// Every form control in document order.
    fn controls(&self) -> Vec<Self::Control>;

    fn listen(&self, event: TargetEvent, handler: Box<dyn FnMut()>) -> Subscription;
}
