// src/schema.rs
//! Versioned envelope for persisted collections, plus upgrades from older shapes.
//!
//! Version 0 is the unversioned layout: a bare JSON array (or object for settings)
//! whose exercises and records carry flat `reps`/`sets`/`duration` style fields.
//! Version 1 wraps the data as `{"version": 1, "data": ...}` and stores targets as a
//! tagged `target` object.

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::storage::{Collection, StorageError};

pub const CURRENT_VERSION: u32 = 1;

#[derive(Serialize)]
pub struct Envelope<'a, T: ?Sized> {
    pub version: u32,
    pub data: &'a T,
}

impl<'a, T: ?Sized> Envelope<'a, T> {
    pub const fn current(data: &'a T) -> Self {
        Self {
            version: CURRENT_VERSION,
            data,
        }
    }
}

/// Splits a stored document into `(version, data)`.
fn unwrap_envelope(collection: Collection, value: Value) -> Result<(u32, Value), StorageError> {
    match value {
        Value::Object(mut map) if map.contains_key("version") && map.contains_key("data") => {
            let version = map
                .get("version")
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| StorageError::Malformed {
                    collection,
                    reason: "schema version is not a non-negative integer".to_string(),
                })?;
            let data = map.remove("data").unwrap_or(Value::Null);
            Ok((version, data))
        }
        other => Ok((0, other)),
    }
}

/// Brings a stored document up to `CURRENT_VERSION` and returns its payload.
/// # Errors
/// `UnsupportedVersion` for documents written by a newer build, `Malformed` if an
/// upgrade step meets an unexpected shape.
pub fn upgrade(collection: Collection, value: Value) -> Result<Value, StorageError> {
    let (mut version, mut data) = unwrap_envelope(collection, value)?;
    if version > CURRENT_VERSION {
        return Err(StorageError::UnsupportedVersion {
            collection,
            found: version,
            supported: CURRENT_VERSION,
        });
    }
    while version < CURRENT_VERSION {
        info!(%collection, from = version, to = version + 1, "Migrating stored collection");
        data = match version {
            0 => v0_to_v1(collection, data)?,
            _ => unreachable!("no migration registered for version {version}"),
        };
        version += 1;
    }
    Ok(data)
}

fn v0_to_v1(collection: Collection, data: Value) -> Result<Value, StorageError> {
    match collection {
        Collection::UserSettings => Ok(data),
        Collection::UserExercises => map_items(collection, data, exercise_v0_to_v1),
        Collection::WorkoutRecords => map_items(collection, data, record_v0_to_v1),
    }
}

fn map_items(
    collection: Collection,
    data: Value,
    step: fn(&mut Map<String, Value>),
) -> Result<Value, StorageError> {
    let Value::Array(items) = data else {
        return Err(StorageError::Malformed {
            collection,
            reason: "expected an array".to_string(),
        });
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(mut obj) => {
                step(&mut obj);
                Ok(Value::Object(obj))
            }
            _ => Err(StorageError::Malformed {
                collection,
                reason: "expected an array of objects".to_string(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

/// Reads a count, treating null, missing and non-numeric values as 0 (like `x || 0`).
fn count(obj: &Map<String, Value>, key: &str) -> u64 {
    obj.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn first_positive(obj: &Map<String, Value>, keys: &[&str]) -> u64 {
    keys.iter()
        .map(|k| count(obj, k))
        .find(|&v| v > 0)
        .unwrap_or(0)
}

fn target_json(reps: u64, sets: u64, seconds: u64) -> Value {
    if seconds > 0 {
        json!({ "mode": "duration", "seconds": seconds })
    } else {
        json!({ "mode": "reps", "reps": reps, "sets": sets })
    }
}

fn exercise_v0_to_v1(obj: &mut Map<String, Value>) {
    if !obj.contains_key("target") {
        let reps = first_positive(obj, &["reps", "defaultReps"]);
        let sets = first_positive(obj, &["sets", "defaultSets"]);
        let seconds = first_positive(obj, &["duration", "defaultDuration"]);
        obj.insert("target".to_string(), target_json(reps, sets, seconds));
    }
    for key in [
        "reps",
        "sets",
        "duration",
        "defaultReps",
        "defaultSets",
        "defaultDuration",
    ] {
        obj.remove(key);
    }
    obj.entry("type").or_insert_with(|| json!("custom"));
    obj.entry("category").or_insert_with(|| json!(crate::models::CUSTOM_CATEGORY));
}

fn record_v0_to_v1(obj: &mut Map<String, Value>) {
    if !obj.contains_key("target") {
        let target = target_json(
            count(obj, "reps"),
            count(obj, "sets"),
            count(obj, "targetDuration"),
        );
        obj.insert("target".to_string(), target);
    }
    for key in ["reps", "sets", "targetDuration"] {
        obj.remove(key);
    }
    // Actual elapsed time stays under `duration`.
    if !obj.get("duration").is_some_and(Value::is_u64) {
        obj.insert("duration".to_string(), json!(0));
    }
    if obj.get("notes").map_or(true, Value::is_null) {
        obj.insert("notes".to_string(), json!(""));
    }
}
