//! Repository layer over the key-value medium.
//!
//! # Responsibility
//! - Translate typed collections to and from persisted JSON.
//! - Own every mutation of the seven persisted keys.
//!
//! # Invariants
//! - Every mutation reads, modifies and persists a whole collection.
//! - A failed write is returned to the caller; nothing is cached in memory,
//!   so the caller never sees a view that differs from storage.
//! - Read paths reject undecodable persisted state instead of masking it.

use crate::db::DbError;
use crate::model::ValidationError;
use crate::storage::StoreKey;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod dashboard_repo;
pub mod persistence;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for persistence and decoding failures.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// A stored value could not be decoded into its typed shape.
    InvalidData {
        key: StoreKey,
        source: serde_json::Error,
    },
    /// A typed value could not be encoded to JSON.
    Encode(serde_json::Error),
    /// A value breaks a record invariant; nothing was written.
    Invalid(ValidationError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData { key, source } => {
                write!(f, "invalid persisted data under `{key}`: {source}")
            }
            Self::Encode(err) => write!(f, "failed to encode value: {err}"),
            Self::Invalid(err) => write!(f, "invalid value: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
            Self::Invalid(err) => Some(err),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Invalid(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
