//! Save trigger policies.
//!
//! DESIGN
//! ======
//! Each protected field gets exactly one [`TriggerPolicy`] when it is bound,
//! and keeps it for as long as the binding lives:
//!
//! - `Immediate`: every `input` event saves.
//! - `Debounced`: a repeating task re-reads and saves the field every
//!   period, whether or not it changed since the last tick.
//! - `OnChange`: every `change` event saves.
//!
//! Text-like fields pick `Immediate` or `Debounced` from the configured
//! timeout; every other control saves on change.
//!
//! TRADE-OFFS
//! ==========
//! The debounced task re-saves unconditionally. That costs a write per tick
//! per field but cannot miss an edit made between ticks. The task is
//! cancellable through its [`Subscription`]; otherwise it runs for the life
//! of the page.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use log::debug;

use crate::codec;
use crate::field::{Control, ControlType, FieldEvent, FieldKind, Subscription};
use crate::key::StorageKey;
use crate::options::Callbacks;
use crate::storage::{Storage, StorageError};

#[cfg(test)]
#[path = "trigger_test.rs"]
mod trigger_test;

/// Shortest period a repeating task may use.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Longest period a repeating task may use. Browser timers take a signed
/// 32-bit millisecond delay and fire at once past it.
pub const MAX_PERIOD: Duration = Duration::from_millis(0x7FFF_FFFF);

/// `period` clamped to the timer range, in whole milliseconds.
#[must_use]
pub fn period_millis(period: Duration) -> u32 {
    u32::try_from(period.clamp(MIN_PERIOD, MAX_PERIOD).as_millis()).unwrap_or(0x7FFF_FFFF)
}

/// When a field's value is written to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPolicy {
    Immediate,
    Debounced { period: Duration },
    OnChange,
}

impl TriggerPolicy {
    /// Pick the policy for a control given the configured save interval.
    #[must_use]
    pub fn select(control: &ControlType, interval: Duration) -> Self {
        if !control.is_text_like() {
            Self::OnChange
        } else if interval.is_zero() {
            Self::Immediate
        } else {
            Self::Debounced { period: interval }
        }
    }

    /// The field event this policy listens to, if any.
    #[must_use]
    pub fn event(self) -> Option<FieldEvent> {
        match self {
            Self::Immediate => Some(FieldEvent::Input),
            Self::OnChange => Some(FieldEvent::Change),
            Self::Debounced { .. } => None,
        }
    }
}

// =============================================================================
// SCHEDULER
// =============================================================================

/// Source of repeating tasks.
pub trait Scheduler {
    /// Run `task` every `period` until the returned subscription is dropped.
    fn every(&self, period: Duration, task: Box<dyn FnMut()>) -> Subscription;
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
    fn every(&self, period: Duration, task: Box<dyn FnMut()>) -> Subscription {
        (**self).every(period, task)
    }
}

type Task = Rc<RefCell<Box<dyn FnMut()>>>;

struct ManualTask {
    period: Duration,
    next_due: Duration,
    task: Task,
}

#[derive(Default)]
struct ManualInner {
    now: Duration,
    next_id: u64,
    tasks: BTreeMap<u64, ManualTask>,
}

/// A scheduler driven by an explicit virtual clock.
///
/// Nothing runs until [`ManualScheduler::advance`] moves time forward; due
/// tasks then run in deadline order, ties broken by registration order.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Rc<RefCell<ManualInner>>,
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ManualScheduler")
            .field("now", &inner.now)
            .field("tasks", &inner.tasks.len())
            .finish()
    }
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Number of live repeating tasks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    /// Move the clock forward by `by`, running every task that falls due.
    pub fn advance(&self, by: Duration) {
        let deadline = self.inner.borrow().now + by;
        while let Some(task) = self.take_due(deadline) {
            let mut task = task.borrow_mut();
            (&mut *task)();
        }
        self.inner.borrow_mut().now = deadline;
    }

    /// Pop the earliest task due by `deadline` and reschedule it.
    fn take_due(&self, deadline: Duration) -> Option<Task> {
        let mut inner = self.inner.borrow_mut();
        let (&id, due) = inner
            .tasks
            .iter()
            .filter(|(_, t)| t.next_due <= deadline)
            .min_by_key(|(id, t)| (t.next_due, **id))
            .map(|(id, t)| (id, t.next_due))?;
        inner.now = due;
        let entry = inner.tasks.get_mut(&id)?;
        entry.next_due += entry.period;
        Some(entry.task.clone())
    }
}

impl Scheduler for ManualScheduler {
    fn every(&self, period: Duration, task: Box<dyn FnMut()>) -> Subscription {
        let period = period.clamp(MIN_PERIOD, MAX_PERIOD);
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        let next_due = inner.now + period;
        inner.tasks.insert(id, ManualTask { period, next_due, task: Rc::new(RefCell::new(task)) });
        let weak: Weak<RefCell<ManualInner>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().tasks.remove(&id);
            }
        })
    }
}

// =============================================================================
// SAVE
// =============================================================================

/// Everything one field needs to save itself.
pub(crate) struct SaveTask<C: Control> {
    pub control: C,
    pub kind: FieldKind,
    pub group: Vec<C>,
    pub key: StorageKey,
    pub storage: Rc<dyn Storage>,
    pub callbacks: Rc<Callbacks>,
}

impl<C: Control> SaveTask<C> {
    /// Encode and store the field, then notify `on_save`.
    ///
    /// Quota and backend failures drop the save but still notify; only a
    /// store that has become unreachable skips the callback.
    pub fn run(&self) {
        let value = codec::encode(self.kind, &self.control, &self.group);
        match self.storage.set(self.key.as_str(), &value) {
            Ok(()) => {}
            Err(StorageError::Unavailable) => {
                debug!("storage unavailable; save for {} skipped", self.key);
                return;
            }
            Err(err) => debug!("save dropped: {err}"),
        }
        self.callbacks.saved();
    }
}

/// Attach `task` according to `policy`.
pub(crate) fn bind<C: Control>(policy: TriggerPolicy, task: SaveTask<C>, scheduler: &dyn Scheduler) -> Subscription {
    let control = task.control.clone();
    let task = Rc::new(task);
    match policy {
        TriggerPolicy::Debounced { period } => scheduler.every(period, Box::new(move || task.run())),
        TriggerPolicy::Immediate => control.listen(FieldEvent::Input, Box::new(move || task.run())),
        TriggerPolicy::OnChange => control.listen(FieldEvent::Change, Box::new(move || task.run())),
    }
}
