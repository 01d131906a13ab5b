//! Protection lifecycle: restore on attach, save while editing, release on
//! submit or reset.
//!
//! SYSTEM CONTEXT
//! ==============
//! [`Protector`] is the entry point. It is configured once (storage,
//! scheduler, page location, options, callbacks) and then asked to
//! [`Protector::protect`] a set of forms. For each form it restores any saved
//! field values, binds a save trigger per field, and binds submit/reset to
//! release. Everything it attached is owned by the returned [`Protection`];
//! dropping or stopping that handle detaches all of it.
//!
//! DESIGN
//! ======
//! Forms are processed independently: each gets its own restored flag and its
//! own release bindings, so `on_restore` fires once per form that had data,
//! never once per field.
//!
//! TRADE-OFFS
//! ==========
//! Save and restore use `<...><field name><custom prefix>`, while release
//! uses the prefix-less key unless `release_with_prefix` is set. With a
//! non-empty prefix and the default, release therefore does not remove the
//! saved drafts. The default keeps keys compatible with existing stored data.

use std::rc::Rc;

use log::{debug, info};

use crate::codec;
use crate::error::GuardError;
use crate::field::{Control, ControlType, FieldKind, Subscription, Target, TargetEvent};
use crate::key::{PageLocation, StorageKey, build_key};
use crate::options::{Callbacks, Options};
use crate::storage::Storage;
use crate::trigger::{self, SaveTask, Scheduler, TriggerPolicy};

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod lifecycle_test;

type ExcludeFn = Rc<dyn Fn(&str, &ControlType) -> bool>;

/// Configured entry point for protecting forms.
pub struct Protector {
    storage: Rc<dyn Storage>,
    scheduler: Rc<dyn Scheduler>,
    location: PageLocation,
    options: Options,
    callbacks: Rc<Callbacks>,
    exclude: Option<ExcludeFn>,
}

impl std::fmt::Debug for Protector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Protector")
            .field("location", &self.location)
            .field("options", &self.options)
            .field("callbacks", &self.callbacks)
            .field("exclude_predicate", &self.exclude.is_some())
            .finish_non_exhaustive()
    }
}

/// A field that passed exclusion, with everything derived at bind time.
struct BoundField<C: Control> {
    control: C,
    kind: FieldKind,
    control_type: ControlType,
    key: StorageKey,
    release_key: StorageKey,
    group: Vec<C>,
}

impl Protector {
    /// A protector with default options and no callbacks.
    pub fn new(storage: impl Storage + 'static, scheduler: impl Scheduler + 'static, location: PageLocation) -> Self {
        Self {
            storage: Rc::new(storage),
            scheduler: Rc::new(scheduler),
            location,
            options: Options::default(),
            callbacks: Rc::new(Callbacks::default()),
            exclude: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = Rc::new(callbacks);
        self
    }

    /// Skip every field for which `predicate(name, control_type)` holds, in
    /// addition to `Options::exclude_fields`.
    #[must_use]
    pub fn exclude_if(mut self, predicate: impl Fn(&str, &ControlType) -> bool + 'static) -> Self {
        self.exclude = Some(Rc::new(predicate));
        self
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[must_use]
    pub fn location(&self) -> &PageLocation {
        &self.location
    }

    /// Restore, bind saving, and bind release for every form in `targets`.
    ///
    /// An unavailable store makes this a silent no-op: the returned
    /// [`Protection`] is inert and no callback will ever fire.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::InvalidOptions`] for an out-of-range timeout and
    /// [`GuardError::MissingTargetId`] if any form lacks an id. Nothing is
    /// bound when an error is returned.
    pub fn protect<T: Target>(&self, targets: &[T]) -> Result<Protection, GuardError> {
        if !self.storage.available() {
            info!("local storage unavailable; form protection disabled");
            return Ok(Protection::default());
        }
        self.options.validate()?;
        if let Some(index) = targets.iter().position(|t| t.id().trim().is_empty()) {
            return Err(GuardError::MissingTargetId { index });
        }

        let mut protection = Protection::default();
        for target in targets {
            self.protect_target(target, &mut protection);
        }
        debug!(
            "protected {} form(s), {} field(s), {} timer(s)",
            protection.targets, protection.fields, protection.timers
        );
        Ok(protection)
    }

    /// Remove the stored values of every protected field of `target`.
    ///
    /// Fires `on_release` once if the form has at least one protected field.
    /// Returns the number of fields released; calling it again is harmless.
    pub fn release<T: Target>(&self, target: &T) -> usize {
        if !self.storage.available() {
            return 0;
        }
        self.release_set(&self.bound_fields(target)).run()
    }

    fn protect_target<T: Target>(&self, target: &T, protection: &mut Protection) {
        let fields = self.bound_fields(target);
        let mut restored = false;

        for field in &fields {
            if let Some(stored) = self.storage.get(field.key.as_str()).filter(|v| !v.is_empty()) {
                codec::decode(field.kind, &field.control, &stored);
                restored = true;
            }

            let policy = TriggerPolicy::select(&field.control_type, self.options.save_interval());
            if matches!(policy, TriggerPolicy::Debounced { .. }) {
                protection.timers += 1;
            }
            let task = SaveTask {
                control: field.control.clone(),
                kind: field.kind,
                group: field.group.clone(),
                key: field.key.clone(),
                storage: self.storage.clone(),
                callbacks: self.callbacks.clone(),
            };
            protection.subscriptions.push(trigger::bind(policy, task, &*self.scheduler));
            protection.fields += 1;
        }

        if restored {
            debug!("restored saved input into form {}", target.id());
            self.callbacks.restored();
        }

        let release = Rc::new(self.release_set(&fields));
        for event in [TargetEvent::Submit, TargetEvent::Reset] {
            let release = release.clone();
            protection.subscriptions.push(target.listen(
                event,
                Box::new(move || {
                    release.run();
                }),
            ));
        }
        protection.releases.push(release);
        protection.targets += 1;
    }

    /// Enumerate `target`'s controls minus files, buttons, and exclusions.
    fn bound_fields<T: Target>(&self, target: &T) -> Vec<BoundField<T::Control>> {
        let target_id = target.id();
        let controls = target.controls();
        let prefix = self.options.custom_key_prefix.as_str();
        let release_prefix = self.options.release_prefix();

        controls
            .iter()
            .filter_map(|control| {
                let name = control.name();
                let control_type = control.control_type();
                if control_type.is_skipped() || self.is_excluded(&name, &control_type) {
                    return None;
                }
                let kind = FieldKind::classify(&control_type, &name);
                let group = if kind == FieldKind::CheckboxGroup {
                    controls
                        .iter()
                        .filter(|c| c.control_type() == ControlType::Checkbox && c.name() == name)
                        .cloned()
                        .collect()
                } else {
                    Vec::new()
                };
                Some(BoundField {
                    control: control.clone(),
                    kind,
                    key: build_key(&self.location, &target_id, &name, prefix),
                    release_key: build_key(&self.location, &target_id, &name, release_prefix),
                    control_type,
                    group,
                })
            })
            .collect()
    }

    fn is_excluded(&self, name: &str, control_type: &ControlType) -> bool {
        self.options.excludes(name) || self.exclude.as_ref().is_some_and(|f| f(name, control_type))
    }

    fn release_set<C: Control>(&self, fields: &[BoundField<C>]) -> ReleaseSet {
        ReleaseSet {
            storage: self.storage.clone(),
            keys: fields.iter().map(|f| f.release_key.clone()).collect(),
            callbacks: self.callbacks.clone(),
        }
    }
}

/// The keys one form removes when it is submitted or reset.
struct ReleaseSet {
    storage: Rc<dyn Storage>,
    keys: Vec<StorageKey>,
    callbacks: Rc<Callbacks>,
}

impl ReleaseSet {
    fn run(&self) -> usize {
        for key in &self.keys {
            self.storage.remove(key.as_str());
        }
        if !self.keys.is_empty() {
            debug!("released {} stored field(s)", self.keys.len());
            self.callbacks.released();
        }
        self.keys.len()
    }
}

/// Everything attached by one [`Protector::protect`] call.
///
/// Dropping the handle detaches every listener and timer, as does
/// [`Protection::stop`]. Keep it alive for as long as the forms should stay
/// protected.
#[derive(Default)]
pub struct Protection {
    subscriptions: Vec<Subscription>,
    releases: Vec<Rc<ReleaseSet>>,
    targets: usize,
    fields: usize,
    timers: usize,
}

impl std::fmt::Debug for Protection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Protection")
            .field("active", &self.is_active())
            .field("targets", &self.targets)
            .field("fields", &self.fields)
            .field("timers", &self.timers)
            .finish()
    }
}

impl Protection {
    /// Whether any listener or timer is still attached.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Forms processed.
    #[must_use]
    pub fn targets(&self) -> usize {
        self.targets
    }

    /// Fields with a save trigger bound.
    #[must_use]
    pub fn bound_fields(&self) -> usize {
        self.fields
    }

    /// Fields saved by a repeating timer.
    #[must_use]
    pub fn timers(&self) -> usize {
        self.timers
    }

    /// Release every protected form now, as if each had been submitted.
    /// Returns the number of fields released.
    pub fn release_all(&self) -> usize {
        self.releases.iter().map(|r| r.run()).sum()
    }

    /// Detach every listener and cancel every timer.
    pub fn stop(&mut self) {
        let count = self.subscriptions.len();
        self.subscriptions.clear();
        if count > 0 {
            debug!("stopped form protection ({count} subscription(s))");
        }
    }
}
