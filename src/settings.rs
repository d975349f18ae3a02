//! Settings store boundary.
//!
//! The host application owns persistence of credentials and the cached
//! session header; this crate only reads and writes opaque strings by key.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Key-value settings store supplied by the host application.
///
/// Values are plain strings with no schema. Implementations must be safe
/// to share across tasks; reads and writes of a single value are atomic.
pub trait SettingsStore: Send + Sync {
    /// Returns the stored value for `key`, or `None` if absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &str);
}

/// In-memory [`SettingsStore`] backed by a `RwLock`-guarded map.
///
/// Suitable for tests and for hosts without their own preference storage.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySettings {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, value: &str) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_settings_roundtrip() {
        let settings = MemorySettings::new();
        settings.put("strava.heatmap.email", "user@example.com");
        assert_eq!(
            settings.get("strava.heatmap.email").as_deref(),
            Some("user@example.com")
        );
    }

    #[test]
    fn test_memory_settings_absent_key() {
        let settings = MemorySettings::new();
        assert_eq!(settings.get("missing"), None);
    }

    #[test]
    fn test_memory_settings_overwrite() {
        let settings = MemorySettings::new();
        settings.put("key", "old");
        settings.put("key", "new");
        assert_eq!(settings.get("key").as_deref(), Some("new"));
    }
}
