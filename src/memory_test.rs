use std::cell::Cell;

use super::*;

fn counter() -> (Rc<Cell<u32>>, Box<dyn FnMut()>) {
    let count = Rc::new(Cell::new(0));
    let inner = count.clone();
    (count, Box::new(move || inner.set(inner.get() + 1)))
}

#[test]
fn controls_are_listed_in_insertion_order() {
    let form = MemoryForm::new("f");
    form.add_text("a");
    form.add_checkbox("b", "on");
    let names: Vec<String> = form.controls().iter().map(Control::name).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(form.id(), "f");
}

#[test]
fn radios_are_exclusive_by_name() {
    let form = MemoryForm::new("f");
    let small = form.add_radio("size", "s");
    let large = form.add_radio("size", "l");
    let other = form.add_radio("color", "red");
    other.set_checked(true);
    small.set_checked(true);
    large.set_checked(true);
    assert!(!small.is_checked());
    assert!(large.is_checked());
    assert!(other.is_checked());
}

#[test]
fn select_only_selects_known_options() {
    let form = MemoryForm::new("f");
    let select = form.add_select("tags", &["a", "b", "c"], true);
    select.set_selected_values(&["c".to_owned(), "a".to_owned(), "zzz".to_owned()]);
    assert_eq!(select.selected_values(), vec!["a", "c"]);
    select.set_value("b");
    assert_eq!(select.selected_values(), vec!["b"]);
    select.set_value("a,b");
    assert!(select.selected_values().is_empty());
}

#[test]
fn single_select_keeps_one_option() {
    let form = MemoryForm::new("f");
    let select = form.add_select("one", &["a", "b"], false);
    select.set_selected_values(&["a".to_owned(), "b".to_owned()]);
    assert_eq!(select.value(), "a");
}

#[test]
fn type_text_fires_input_listeners() {
    let form = MemoryForm::new("f");
    let field = form.add_text("name");
    let (count, handler) = counter();
    let _sub = field.listen(FieldEvent::Input, handler);
    field.type_text("hi");
    field.fire(FieldEvent::Change);
    assert_eq!(field.value(), "hi");
    assert_eq!(count.get(), 1);
}

#[test]
fn listeners_stack_and_detach_on_drop() {
    let form = MemoryForm::new("f");
    let field = form.add_checkbox("agree", "yes");
    let (first, h1) = counter();
    let (second, h2) = counter();
    let sub1 = field.listen(FieldEvent::Change, h1);
    let _sub2 = field.listen(FieldEvent::Change, h2);
    field.click();
    drop(sub1);
    field.click();
    assert_eq!(first.get(), 1);
    assert_eq!(second.get(), 2);
    assert_eq!(form.listener_count(), 1);
}

#[test]
fn submit_and_reset_fire_their_own_listeners() {
    let form = MemoryForm::new("f");
    let (submits, h1) = counter();
    let (resets, h2) = counter();
    let _s = form.listen(TargetEvent::Submit, h1);
    let _r = form.listen(TargetEvent::Reset, h2);
    form.submit();
    form.submit();
    form.reset();
    assert_eq!(submits.get(), 2);
    assert_eq!(resets.get(), 1);
}

#[test]
fn control_lookup_by_name() {
    let form = MemoryForm::new("f");
    form.add_text("first");
    let second = form.add_text("second");
    second.set_value("x");
    assert_eq!(form.control("second").map(|c| c.value()), Some("x".to_owned()));
    assert!(form.control("missing").is_none());
}
