//! Engines and use-case services.
//!
//! # Responsibility
//! - Pure engines: reconciliation planning, scoring, daily chart buckets.
//! - Services orchestrating the stores for the presentation layer.
//!
//! # Invariants
//! - Scores and series are recomputed from store snapshots on every call.
//! - Reconciliation is the only path that changes ledger records.

use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod chart;
pub mod coaching;
pub mod leaderboard_service;
pub mod reconcile_service;
pub mod scoring;

use reconcile_service::InputError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for roster use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Referenced participant does not exist.
    ParticipantNotFound(String),
    /// Count or delta input failed validation.
    InvalidInput(InputError),
    /// Store-level failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParticipantNotFound(id) => write!(f, "participant not found: {id}"),
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::ParticipantNotFound(_) => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<InputError> for ServiceError {
    fn from(value: InputError) -> Self {
        Self::InvalidInput(value)
    }
}
