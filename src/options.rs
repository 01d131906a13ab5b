//! Protection options and lifecycle callbacks.
//!
//! [`Options`] is plain data read once when protection starts. It
//! deserializes from the same camelCase object shape the JavaScript entry
//! point accepts, so a page can pass `{ timeout: 5, customKeyPrefix: "v2" }`
//! straight through. [`Callbacks`] carries the three no-argument hooks.
//!
//! There is no shared defaults object: every [`crate::Protector`] owns its
//! own copy.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::GuardError;
use crate::trigger::MAX_PERIOD;

#[cfg(test)]
#[path = "options_test.rs"]
mod options_test;

/// Default save interval in seconds; zero means "save on every input".
pub const DEFAULT_TIMEOUT_SECS: f64 = 0.0;

/// Configuration read once at protection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Options {
    /// Field names that are never restored, saved, or released.
    pub exclude_fields: Vec<String>,
    /// Appended to the key used for saving and restoring.
    pub custom_key_prefix: String,
    /// Seconds between interval saves of text-like fields. Zero selects
    /// saving on every input event.
    pub timeout: f64,
    /// Also append the custom prefix when releasing. Off by default, so
    /// release targets the prefix-less keys.
    pub release_with_prefix: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            exclude_fields: Vec::new(),
            custom_key_prefix: String::new(),
            timeout: DEFAULT_TIMEOUT_SECS,
            release_with_prefix: false,
        }
    }
}

impl Options {
    /// Parse and validate a JSON options object.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::OptionsParse`] for malformed JSON or unknown keys
    /// and [`GuardError::InvalidOptions`] for out-of-range values.
    pub fn from_json(raw: &str) -> Result<Self, GuardError> {
        let options: Self = serde_json::from_str(raw)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject values that cannot describe a save interval.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::InvalidOptions`] when `timeout` is negative,
    /// not finite, or longer than a browser timer can wait.
    pub fn validate(&self) -> Result<(), GuardError> {
        if !self.timeout.is_finite() || self.timeout < 0.0 {
            return Err(GuardError::InvalidOptions(format!(
                "timeout must be a non-negative number of seconds, got {}",
                self.timeout
            )));
        }
        if self.timeout > MAX_PERIOD.as_secs_f64() {
            return Err(GuardError::InvalidOptions(format!(
                "timeout must be at most {} seconds, got {}",
                MAX_PERIOD.as_secs_f64(),
                self.timeout
            )));
        }
        Ok(())
    }

    /// The interval for text-like fields; zero when saving on input.
    ///
    /// Saturates at [`MAX_PERIOD`] so an oversized timeout never reads as
    /// "save on input".
    #[must_use]
    pub fn save_interval(&self) -> Duration {
        if self.timeout <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(self.timeout).map_or(MAX_PERIOD, |d| d.min(MAX_PERIOD))
    }

    /// Whether the field named `name` is excluded by name.
    #[must_use]
    pub fn excludes(&self, name: &str) -> bool {
        self.exclude_fields.iter().any(|f| f == name)
    }

    /// The prefix to append when building release keys.
    #[must_use]
    pub fn release_prefix(&self) -> &str {
        if self.release_with_prefix { &self.custom_key_prefix } else { "" }
    }
}

type Hook = Rc<dyn Fn()>;

/// Lifecycle hooks, each called synchronously with no arguments.
///
/// - `on_save`: after every triggered save attempt.
/// - `on_restore`: once per form in which at least one field was restored.
/// - `on_release`: once per release of a form with at least one field.
#[derive(Clone, Default)]
pub struct Callbacks {
    on_save: Option<Hook>,
    on_restore: Option<Hook>,
    on_release: Option<Hook>,
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_save", &self.on_save.is_some())
            .field("on_restore", &self.on_restore.is_some())
            .field("on_release", &self.on_release.is_some())
            .finish()
    }
}

impl Callbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_save(mut self, hook: impl Fn() + 'static) -> Self {
        self.on_save = Some(Rc::new(hook));
        self
    }

    #[must_use]
    pub fn on_restore(mut self, hook: impl Fn() + 'static) -> Self {
        self.on_restore = Some(Rc::new(hook));
        self
    }

    #[must_use]
    pub fn on_release(mut self, hook: impl Fn() + 'static) -> Self {
        self.on_release = Some(Rc::new(hook));
        self
    }

    pub(crate) fn saved(&self) {
        if let Some(hook) = &self.on_save {
            hook();
        }
    }

    pub(crate) fn restored(&self) {
        if let Some(hook) = &self.on_restore {
            hook();
        }
    }

    pub(crate) fn released(&self) {
        if let Some(hook) = &self.on_release {
            hook();
        }
    }
}
