// src/error.rs
use thiserror::Error;

use crate::storage::Collection;

/// Errors surfaced by the record store, the plan manager and the service layer.
///
/// Storage failures never reach callers as `StorageError`; by the time they get here
/// they have been logged and reduced to `Persistence`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Failed to persist {0}")]
    Persistence(Collection),
    #[error("Exercise not found: {0}")]
    NotFound(String),
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
