//! Read and mutation outcomes.

use std::sync::Arc;

use thiserror::Error;

use super::key::QueryKind;
use crate::backend::BackendError;

/// Outcome of a read.
#[derive(Debug, Clone)]
pub enum QueryState<T> {
    /// The backend is not connected yet; the read was not issued.
    Disabled,
    Success(T),
    Error(QueryError),
}

impl<T> QueryState<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryState<U> {
        match self {
            Self::Disabled => QueryState::Disabled,
            Self::Success(value) => QueryState::Success(f(value)),
            Self::Error(e) => QueryState::Error(e),
        }
    }

    /// Combine two reads; the first non-success state wins.
    pub fn zip<U>(self, other: QueryState<U>) -> QueryState<(T, U)> {
        match (self, other) {
            (Self::Error(e), _) | (_, QueryState::Error(e)) => QueryState::Error(e),
            (Self::Disabled, _) | (_, QueryState::Disabled) => QueryState::Disabled,
            (Self::Success(a), QueryState::Success(b)) => QueryState::Success((a, b)),
        }
    }

    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// The value if the read succeeded.
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }
}

/// A failed read. Cheap to clone; coalesced readers share one error.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error(transparent)]
    Backend(Arc<BackendError>),

    #[error("query {0:?} resolved to an unexpected value")]
    Mismatch(QueryKind),
}

/// A failed mutation.
#[derive(Debug, Error)]
pub enum MutationError {
    /// The backend is not connected yet; nothing was sent.
    #[error("The marketplace is not available yet. Please try again shortly.")]
    Disabled,

    /// The backend ran the operation and reported a failure.
    #[error("{0}")]
    Failed(String),

    /// The call itself failed or was rejected.
    #[error(transparent)]
    Transport(#[from] BackendError),
}
