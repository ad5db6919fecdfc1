//! # Persistence Module
//!
//! ## Why This Module Exists
//! The on-screen layout and the controller bindings outlive a single session. Transform
//! groups, device bindings, per-slot flags and per-button overrides are all plain values
//! stored under fixed string keys. This module defines that key-value surface and the
//! two stores behind it.
//!
//! ## Key Abstractions
//! - **[`KeyValueStore`]**: infallible get/set/remove over [`PrefValue`]s. Typed helpers
//!   (`get_f32`, `get_bool`, ...) are provided methods on top of the three primitives.
//! - **[`MemoryStore`]**: a `BTreeMap` used by tests and as the body of the TOML store.
//! - **[`TomlStore`]**: a shared, file-backed store that is flushed explicitly or by an
//!   autosave task.
//!
//! ## Error Handling Strategy
//! Writes through the trait never fail; only opening and flushing the backing file
//! return a [`StoreError`]. A value stored with the wrong type reads as absent and is
//! logged, so callers fall back to their defaults.

pub mod memory_store;
pub mod toml_store;

pub use memory_store::MemoryStore;
pub use toml_store::{StoreError, TomlStore};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A single persisted preference value
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Key-value preference storage
///
/// Implementations only provide `get`, `set` and `remove`. The typed accessors convert
/// on top of those and treat mismatched types as missing.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<PrefValue>;

    fn set(&mut self, key: &str, value: PrefValue);

    fn remove(&mut self, key: &str);

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn get_f32(&self, key: &str) -> Option<f32> {
        match self.get(key)? {
            PrefValue::Float(v) => Some(v as f32),
            PrefValue::Int(v) => Some(v as f32),
            other => {
                warn!("Preference {} is not a number: {:?}", key, other);
                None
            }
        }
    }

    fn set_f32(&mut self, key: &str, value: f32) {
        self.set(key, PrefValue::Float(f64::from(value)));
    }

    fn get_i32(&self, key: &str) -> Option<i32> {
        match self.get(key)? {
            PrefValue::Int(v) => i32::try_from(v).ok(),
            other => {
                warn!("Preference {} is not an integer: {:?}", key, other);
                None
            }
        }
    }

    fn set_i32(&mut self, key: &str, value: i32) {
        self.set(key, PrefValue::Int(i64::from(value)));
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            PrefValue::Bool(v) => Some(v),
            other => {
                warn!("Preference {} is not a boolean: {:?}", key, other);
                None
            }
        }
    }

    fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, PrefValue::Bool(value));
    }

    fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            PrefValue::Text(v) => Some(v),
            other => {
                warn!("Preference {} is not a string: {:?}", key, other);
                None
            }
        }
    }

    fn set_string(&mut self, key: &str, value: &str) {
        self.set(key, PrefValue::Text(value.to_string()));
    }
}

/// Preference key naming
pub mod keys {
    /// Per-slot key, slots are stored 1-based (`<base>_player_1` .. `<base>_player_4`)
    pub fn player_key(base: &str, slot: usize) -> String {
        format!("{}_player_{}", base, slot + 1)
    }

    /// Key inside the preference scope of a single game
    pub fn game_key(game_id: &str, key: &str) -> String {
        format!("game.{}.{}", game_id, key)
    }

    pub const DEVICE_DESCRIPTOR: &str = "device_descriptor";
    pub const JOYSTICK_MODE: &str = "joystick_mode";
    pub const COMPAT_MODE: &str = "compat_mode";
    pub const CUSTOM_MODE: &str = "custom_mode";
    pub const RIGHT_STICK_MODE: &str = "right_stick_mode";
}
