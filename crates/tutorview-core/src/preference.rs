#![forbid(unsafe_code)]

//! Persistent key-value preference storage.

use std::collections::HashMap;

use crate::view_mode::ViewMode;

/// String key-value store that survives page loads for the same visitor.
pub trait PreferenceStore {
    fn load(&self, key: &str) -> Option<String>;

    fn store(&mut self, key: &str, value: &str);
}

/// Read the stored view mode. Unknown values are logged and treated as absent.
pub fn load_view_mode<S: PreferenceStore + ?Sized>(store: &S, key: &str) -> Option<ViewMode> {
    let raw = store.load(key)?;
    match raw.parse::<ViewMode>() {
        Ok(mode) => Some(mode),
        Err(err) => {
            tracing::warn!(
                target: "tutorview.preference",
                key,
                error = %err,
                "ignoring stored view mode"
            );
            None
        }
    }
}

pub fn store_view_mode<S: PreferenceStore + ?Sized>(store: &mut S, key: &str, mode: ViewMode) {
    tracing::debug!(target: "tutorview.preference", key, mode = %mode, "storing view mode");
    store.store(key, mode.as_str());
}

/// Process-local store, for tests and headless hosts.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    values: HashMap<String, String>,
}

impl MemoryPreferenceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with one entry.
    #[must_use]
    pub fn with(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.store(key, value);
        store
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn store(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_owned(), value.to_owned());
    }
}
