//src/db.rs
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use crate::storage::{KeyValueStore, StorageError};

const DB_FILE_NAME: &str = "fitlog.sqlite";
const APP_DATA_DIR: &str = "fitlog";
const DATA_DIR_ENV_VAR: &str = "FITLOG_DATA_DIR"; // Environment variable name

/// Gets the path to the SQLite database file within the app's data directory.
/// Exposed at crate root as get_db_path_util
pub fn get_db_path() -> Result<PathBuf, StorageError> {
    let app_dir = match std::env::var(DATA_DIR_ENV_VAR).ok() {
        Some(dir) => PathBuf::from(dir),
        None => dirs::data_dir()
            .ok_or(StorageError::DataDir)?
            .join(APP_DATA_DIR),
    };
    if !app_dir.exists() {
        std::fs::create_dir_all(&app_dir)?;
    }
    Ok(app_dir.join(DB_FILE_NAME))
}

/// Opens a connection to the SQLite database.
pub fn open_db<P: AsRef<Path>>(path: P) -> Result<Connection, StorageError> {
    let conn = Connection::open(path)?;
    Ok(conn)
}

/// Initializes the key-value table if it doesn't exist.
pub fn init_db(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL -- JSON document, see schema.rs
        )",
        [],
    )?;
    Ok(())
}

/// SQLite-backed key-value store. One row per collection.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path`.
    /// # Errors
    /// Returns `StorageError::Database` if opening or initializing fails.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Self::from_connection(open_db(path)?)
    }

    /// # Errors
    /// Returns `StorageError::Database` if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// # Errors
    /// Returns `StorageError::Database` if the schema cannot be created.
    pub fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        init_db(&conn)?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(StorageError::Database)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // Single statement, so the whole collection is replaced or nothing is.
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}
