// src/storage.rs
//! Storage adapter over a host key-value store.
//!
//! Three named collections live in the store, each a JSON document wrapped in a
//! versioned envelope (see [`crate::schema`]). The public `read`/`write` family never
//! fails: errors are logged here and replaced by a safe default. Callers that must not
//! clobber unreadable data use the `try_*` variants.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};
use thiserror::Error;
use tracing::{debug, error};

use crate::models::UserSettings;
use crate::schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Collection {
    #[strum(to_string = "user exercises")]
    UserExercises,
    #[strum(to_string = "workout records")]
    WorkoutRecords,
    #[strum(to_string = "user settings")]
    UserSettings,
}

impl Collection {
    pub const fn key(self) -> &'static str {
        match self {
            Self::UserExercises => "fitness_app_user_exercises",
            Self::WorkoutRecords => "fitness_app_workout_records",
            Self::UserSettings => "fitness_app_user_settings",
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing storage: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode or decode {collection}: {source}")]
    Json {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },
    #[error("Malformed {collection} data: {reason}")]
    Malformed {
        collection: Collection,
        reason: String,
    },
    #[error("{collection} uses schema version {found}, this build supports up to {supported}")]
    UnsupportedVersion {
        collection: Collection,
        found: u32,
        supported: u32,
    },
    #[error("Storage backend unavailable")]
    Unavailable,
}

/// Minimal string key-value store. Implementations use interior mutability; the
/// whole application runs on one thread.
pub trait KeyValueStore {
    /// # Errors
    /// Backend-specific read failures.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    /// Replaces the value under `key` in one step.
    /// # Errors
    /// Backend-specific write failures.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// # Errors
    /// Backend-specific write failures.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store. Can be told to fail every call.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
    failing: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing.get() {
            Err(StorageError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::rc::Rc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

pub struct Storage {
    backend: Box<dyn KeyValueStore>,
}

impl Storage {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Reads and decodes a collection, upgrading older schema versions on the fly.
    /// `Ok(None)` means the collection has never been written.
    /// # Errors
    /// Backend, decode and version errors.
    pub fn try_read<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.backend.get(collection.key())? else {
            return Ok(None);
        };
        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|source| StorageError::Json { collection, source })?;
        let data = schema::upgrade(collection, value)?;
        serde_json::from_value(data)
            .map(Some)
            .map_err(|source| StorageError::Json { collection, source })
    }

    /// # Errors
    /// Encode and backend errors.
    pub fn try_write<T: Serialize + ?Sized>(
        &self,
        collection: Collection,
        data: &T,
    ) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(&schema::Envelope::current(data))
            .map_err(|source| StorageError::Json { collection, source })?;
        self.backend.set(collection.key(), &encoded)?;
        debug!(%collection, bytes = encoded.len(), "Collection written");
        Ok(())
    }

    /// Reads a sequence collection. Absent or unreadable data yields an empty vector.
    pub fn read<T: DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        match self.try_read(collection) {
            Ok(items) => items.unwrap_or_default(),
            Err(e) => {
                error!(%collection, error = %e, "Failed to read collection");
                Vec::new()
            }
        }
    }

    /// Rewrites a whole sequence collection. Returns `false` on failure.
    pub fn write<T: Serialize>(&self, collection: Collection, items: &[T]) -> bool {
        self.write_value(collection, items)
    }

    pub fn read_settings(&self) -> UserSettings {
        match self.try_read(Collection::UserSettings) {
            Ok(settings) => settings.unwrap_or_default(),
            Err(e) => {
                error!(error = %e, "Failed to read user settings");
                UserSettings::default()
            }
        }
    }

    pub fn write_settings(&self, settings: &UserSettings) -> bool {
        self.write_value(Collection::UserSettings, settings)
    }

    /// Removes all three collections. Attempts every key even if one fails.
    pub fn clear_all(&self) -> bool {
        let mut ok = true;
        for collection in Collection::iter() {
            if let Err(e) = self.backend.remove(collection.key()) {
                error!(%collection, error = %e, "Failed to clear collection");
                ok = false;
            }
        }
        ok
    }

    fn write_value<T: Serialize + ?Sized>(&self, collection: Collection, data: &T) -> bool {
        match self.try_write(collection, data) {
            Ok(()) => true,
            Err(e) => {
                error!(%collection, error = %e, "Failed to write collection");
                false
            }
        }
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}
