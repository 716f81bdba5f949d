//! Store contracts and blob-backed implementations.
//!
//! # Responsibility
//! - Define the key-value blob contract and its memory/SQLite backends.
//! - Provide the config store and the ledger (roster) store on top of blobs.
//!
//! # Invariants
//! - Every mutation reads the whole blob, edits one entry and writes the
//!   whole blob back; readers never observe a partial update.
//! - Unparseable blobs are treated as absent and replaced with defaults.
//! - Blob write failures surface as `RepoError::Store`, never swallowed.

use crate::model::window::InvertedWindowError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod blob_store;
pub mod config_repo;
pub mod roster_repo;
pub mod seed;

use blob_store::StoreError;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors raised by the config and ledger stores.
#[derive(Debug)]
pub enum RepoError {
    /// Blob backend failed to read or persist.
    Store(StoreError),
    /// In-memory state could not be encoded for persistence.
    Encode(serde_json::Error),
    /// Display name is blank after trim.
    BlankName,
    /// Window refused by the active window policy.
    InvalidWindow(InvertedWindowError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode blob: {err}"),
            Self::BlankName => write!(f, "display name must not be blank"),
            Self::InvalidWindow(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::InvalidWindow(err) => Some(err),
            Self::BlankName => None,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

impl From<InvertedWindowError> for RepoError {
    fn from(value: InvertedWindowError) -> Self {
        Self::InvalidWindow(value)
    }
}
