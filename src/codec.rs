//! Field value encoding and restoring.
//!
//! Every stored value is a plain string. The [`FieldKind`] chosen at bind time
//! decides both directions:
//!
//! | Kind | Stored as | Restored by |
//! |------|-----------|-------------|
//! | `Text`, `Plain` | the value (selected values joined for a multi-select) | writing the value back |
//! | `Checkbox` | `"true"` / `"false"` | checking unless the value is `"false"` |
//! | `CheckboxGroup` | checked values of same-named boxes, joined | checking members |
//! | `Radio` | the chosen radio's value | checking the radio with that value |
//! | `Grouped` | the value (joined for a multi-select) | splitting into members |
//!
//! Group values are joined with [`GROUP_DELIMITER`] and never escaped, so a
//! value that itself contains the delimiter does not survive a round trip.

use crate::field::{Control, ControlType, FieldKind};

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;

/// Separator for multi-valued fields.
pub const GROUP_DELIMITER: &str = ",";

/// Literal stored for an unchecked single checkbox.
const UNCHECKED: &str = "false";

/// Encode the current state of `control`.
///
/// `group` is every checkbox sharing the control's name in the same form, in
/// document order; only `CheckboxGroup` reads it.
#[must_use]
pub fn encode<C: Control>(kind: FieldKind, control: &C, group: &[C]) -> String {
    match kind {
        FieldKind::Text | FieldKind::Radio => control.value(),
        FieldKind::Checkbox => control.is_checked().to_string(),
        FieldKind::CheckboxGroup => join(group.iter().filter(|c| c.is_checked()).map(Control::value)),
        FieldKind::Grouped | FieldKind::Plain => {
            if control.control_type() == ControlType::SelectMultiple {
                join(control.selected_values().into_iter())
            } else {
                control.value()
            }
        }
    }
}

/// Apply a previously stored value to `control`.
pub fn decode<C: Control>(kind: FieldKind, control: &C, stored: &str) {
    match kind {
        FieldKind::Text | FieldKind::Plain => control.set_value(stored),
        FieldKind::Checkbox => control.set_checked(stored != UNCHECKED),
        FieldKind::CheckboxGroup => {
            let own = control.value();
            control.set_checked(split(stored).any(|member| member == own));
        }
        FieldKind::Radio => {
            if control.value() == stored {
                control.set_checked(true);
            }
        }
        FieldKind::Grouped => {
            let members: Vec<String> = split(stored).map(str::to_owned).collect();
            if control.control_type() == ControlType::SelectMultiple {
                control.set_selected_values(&members);
            } else {
                control.set_value(&members.join(GROUP_DELIMITER));
            }
        }
    }
}

/// Split a stored group value into its members.
pub fn split(stored: &str) -> impl Iterator<Item = &str> {
    stored.split(GROUP_DELIMITER)
}

fn join(values: impl Iterator<Item = String>) -> String {
    values.collect::<Vec<_>>().join(GROUP_DELIMITER)
}
