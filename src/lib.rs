//! Form draft protection backed by browser local storage.
//!
//! This crate keeps in-progress form input alive across accidental
//! navigation, crashes, and closed tabs. Every protected field is saved under
//! a key derived from the page, the form, and the field name; the next time
//! the page loads the saved values are written back into the form, and a
//! successful submit or reset releases them again.
//!
//! The core is host-agnostic: forms, controls, storage, and timers are traits
//! so the whole lifecycle runs natively under `cargo test`. The `web` feature
//! adds `web-sys` implementations and a `#[wasm_bindgen]` entry point.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`storage`] | Key-value store contract, [`storage::MemoryStorage`] |
//! | [`key`] | Page location and deterministic storage keys |
//! | [`field`] | Control types, [`field::FieldKind`] dispatch, host traits |
//! | [`codec`] | Field value encoding and restoring per kind |
//! | [`trigger`] | Save trigger policies and the repeating-task scheduler |
//! | [`options`] | Typed options and lifecycle callbacks |
//! | [`lifecycle`] | [`lifecycle::Protector`] and the [`lifecycle::Protection`] handle |
//! | [`memory`] | In-memory form model for non-browser hosts |
//! | [`error`] | Crate error type |
//! | `web` | Browser bindings (feature `web`) |

pub mod codec;
pub mod error;
pub mod field;
pub mod key;
pub mod lifecycle;
pub mod memory;
pub mod options;
pub mod storage;
pub mod trigger;

#[cfg(feature = "web")]
pub mod web;

pub use error::GuardError;
pub use lifecycle::{Protection, Protector};
pub use options::{Callbacks, Options};
