use std::cell::Cell;

use super::*;
use crate::key::{PageLocation, build_key};
use crate::memory::{MemoryControl, MemoryForm};
use crate::storage::MemoryStorage;

fn save_task(control: &MemoryControl, storage: &MemoryStorage, saves: &Rc<Cell<u32>>) -> SaveTask<MemoryControl> {
    let counter = saves.clone();
    SaveTask {
        control: control.clone(),
        kind: FieldKind::classify(&control.control_type(), &control.name()),
        group: Vec::new(),
        key: build_key(&PageLocation::parse("https://e.test/p"), "f", &control.name(), ""),
        storage: Rc::new(storage.clone()),
        callbacks: Rc::new(Callbacks::new().on_save(move || counter.set(counter.get() + 1))),
    }
}

// =============================================================
// Policy selection
// =============================================================

#[test]
fn text_with_zero_interval_is_immediate() {
    assert_eq!(TriggerPolicy::select(&ControlType::Text, Duration::ZERO), TriggerPolicy::Immediate);
    assert_eq!(TriggerPolicy::select(&ControlType::TextArea, Duration::ZERO), TriggerPolicy::Immediate);
}

#[test]
fn text_with_interval_is_debounced() {
    let period = Duration::from_secs(2);
    assert_eq!(TriggerPolicy::select(&ControlType::Text, period), TriggerPolicy::Debounced { period });
}

#[test]
fn non_text_controls_always_save_on_change() {
    for control in [
        ControlType::Checkbox,
        ControlType::Radio,
        ControlType::SelectOne,
        ControlType::SelectMultiple,
        ControlType::Other("email".to_owned()),
    ] {
        assert_eq!(TriggerPolicy::select(&control, Duration::ZERO), TriggerPolicy::OnChange);
        assert_eq!(TriggerPolicy::select(&control, Duration::from_secs(3)), TriggerPolicy::OnChange);
    }
}

#[test]
fn policy_events() {
    assert_eq!(TriggerPolicy::Immediate.event(), Some(FieldEvent::Input));
    assert_eq!(TriggerPolicy::OnChange.event(), Some(FieldEvent::Change));
    assert_eq!(TriggerPolicy::Debounced { period: Duration::from_secs(1) }.event(), None);
}

// =============================================================
// ManualScheduler
// =============================================================

#[test]
fn manual_scheduler_runs_due_ticks_only() {
    let scheduler = ManualScheduler::new();
    let ticks = Rc::new(Cell::new(0));
    let counter = ticks.clone();
    let _sub = scheduler.every(Duration::from_secs(2), Box::new(move || counter.set(counter.get() + 1)));

    scheduler.advance(Duration::from_millis(1999));
    assert_eq!(ticks.get(), 0);
    scheduler.advance(Duration::from_millis(1));
    assert_eq!(ticks.get(), 1);
    scheduler.advance(Duration::from_secs(6));
    assert_eq!(ticks.get(), 4);
    assert_eq!(scheduler.now(), Duration::from_secs(8));
}

#[test]
fn dropping_subscription_cancels_task() {
    let scheduler = ManualScheduler::new();
    let ticks = Rc::new(Cell::new(0));
    let counter = ticks.clone();
    let sub = scheduler.every(Duration::from_secs(1), Box::new(move || counter.set(counter.get() + 1)));
    scheduler.advance(Duration::from_secs(1));
    drop(sub);
    scheduler.advance(Duration::from_secs(5));
    assert_eq!(ticks.get(), 1);
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn zero_period_is_clamped() {
    let scheduler = ManualScheduler::new();
    let ticks = Rc::new(Cell::new(0));
    let counter = ticks.clone();
    let _sub = scheduler.every(Duration::ZERO, Box::new(move || counter.set(counter.get() + 1)));
    scheduler.advance(Duration::from_millis(3));
    assert_eq!(ticks.get(), 3);
}

#[test]
fn period_millis_stays_within_signed_timer_range() {
    assert_eq!(period_millis(Duration::ZERO), 1);
    assert_eq!(period_millis(Duration::from_millis(2500)), 2500);
    assert_eq!(period_millis(Duration::from_secs(3_000_000)), 0x7FFF_FFFF);
    assert!(i32::try_from(period_millis(Duration::MAX)).is_ok());
}

#[test]
fn tasks_run_in_deadline_order() {
    let scheduler = ManualScheduler::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let (a, b) = (log.clone(), log.clone());
    let _slow = scheduler.every(Duration::from_secs(3), Box::new(move || a.borrow_mut().push("slow")));
    let _fast = scheduler.every(Duration::from_secs(2), Box::new(move || b.borrow_mut().push("fast")));
    scheduler.advance(Duration::from_secs(4));
    assert_eq!(*log.borrow(), vec!["fast", "slow", "fast"]);
}

// =============================================================
// Binding
// =============================================================

#[test]
fn immediate_binding_saves_on_each_input() {
    let form = MemoryForm::new("f");
    let field = form.add_text("title");
    let storage = MemoryStorage::new();
    let saves = Rc::new(Cell::new(0));
    let scheduler = ManualScheduler::new();
    let _sub = bind(TriggerPolicy::Immediate, save_task(&field, &storage, &saves), &scheduler);

    field.type_text("h");
    field.type_text("he");
    field.fire(FieldEvent::Change);
    assert_eq!(saves.get(), 2);
    assert_eq!(storage.get("https://e.test/pftitle").as_deref(), Some("he"));
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn debounced_binding_ignores_input_and_saves_per_tick() {
    let form = MemoryForm::new("f");
    let field = form.add_text("title");
    let storage = MemoryStorage::new();
    let saves = Rc::new(Cell::new(0));
    let scheduler = ManualScheduler::new();
    let period = Duration::from_secs(2);
    let _sub = bind(TriggerPolicy::Debounced { period }, save_task(&field, &storage, &saves), &scheduler);

    field.type_text("draft");
    assert_eq!(saves.get(), 0);
    assert!(storage.is_empty());

    scheduler.advance(Duration::from_secs(2));
    assert_eq!(saves.get(), 1);
    scheduler.advance(Duration::from_secs(4));
    assert_eq!(saves.get(), 3);
    assert_eq!(storage.get("https://e.test/pftitle").as_deref(), Some("draft"));
}

#[test]
fn on_change_binding_saves_checkbox_state() {
    let form = MemoryForm::new("f");
    let agree = form.add_checkbox("agree", "yes");
    let storage = MemoryStorage::new();
    let saves = Rc::new(Cell::new(0));
    let _sub = bind(TriggerPolicy::OnChange, save_task(&agree, &storage, &saves), &ManualScheduler::new());

    agree.fire(FieldEvent::Input);
    assert_eq!(saves.get(), 0);
    agree.click();
    assert_eq!(storage.get("https://e.test/pfagree").as_deref(), Some("true"));
    agree.click();
    assert_eq!(storage.get("https://e.test/pfagree").as_deref(), Some("false"));
    assert_eq!(saves.get(), 2);
}

#[test]
fn quota_failure_drops_save_but_still_notifies() {
    let form = MemoryForm::new("f");
    let field = form.add_text("title");
    let storage = MemoryStorage::with_quota(4);
    let saves = Rc::new(Cell::new(0));
    let _sub = bind(TriggerPolicy::Immediate, save_task(&field, &storage, &saves), &ManualScheduler::new());

    field.type_text("far too long for the quota");
    assert!(storage.is_empty());
    assert_eq!(saves.get(), 1);
}

#[test]
fn unreachable_store_skips_callback() {
    let form = MemoryForm::new("f");
    let field = form.add_text("title");
    let storage = MemoryStorage::unavailable();
    let saves = Rc::new(Cell::new(0));
    save_task(&field, &storage, &saves).run();
    assert_eq!(saves.get(), 0);
}
