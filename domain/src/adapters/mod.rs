//! Test-only adapters that live inside the domain crate for convenience.
//!
//! These are intended for unit testing and local demos. Real adapters
//! (SQLite, platform media pickers) live in separate crates.

pub mod memory_kv;
pub mod scripted_picker;
