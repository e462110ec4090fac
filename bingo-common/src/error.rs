//! Error types for Based Bingo
//!
//! Every error here is recoverable: the front-end translates it into a
//! human-readable message at the point of the user action.

use thiserror::Error;

use crate::roster::Principal;

/// Result type for configuration and startup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration and startup errors
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Store could not be opened
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Rejections raised before any state is consulted
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a post URL")]
    EmptyReference,

    #[error("Please enter a valid X (Twitter) post URL")]
    InvalidReference,
}

/// Rejections that depend on the progress of the current scope
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    #[error("All four letters are already unlocked")]
    AlreadyComplete,

    #[error("This post has already been submitted")]
    DuplicateReference,
}

/// Failures reported by a submission or roster store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backing store could not be reached or written
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Uniqueness constraint on (scope, reference) violated
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Caller is not allowed to perform the operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Stored record could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::DuplicateKey(db_err.message().to_string())
            }
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. } => StoreError::Corrupt(err.to_string()),
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

/// Everything `ProgressTracker::submit` can fail with
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Admin roster mutations that would break the roster contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("{0} is already an admin")]
    AlreadyAdmin(Principal),

    #[error("Cannot remove the last admin")]
    LastAdmin,

    #[error("{0} is not an admin")]
    NotAdmin(Principal),

    #[error("Admin roster cannot be empty")]
    Empty,
}

/// Failure of an atomic roster edit: the edit itself or the store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterUpdateError {
    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for RosterUpdateError {
    fn from(err: sqlx::Error) -> Self {
        RosterUpdateError::Store(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_error_messages_are_human_readable() {
        let err: SubmitError = ValidationError::InvalidReference.into();
        assert_eq!(err.to_string(), "Please enter a valid X (Twitter) post URL");

        let err: SubmitError = StateError::DuplicateReference.into();
        assert_eq!(err.to_string(), "This post has already been submitted");
    }

    #[test]
    fn test_roster_error_names_principal() {
        let err = RosterError::AlreadyAdmin(Principal::Fid(42));
        assert_eq!(err.to_string(), "fid:42 is already an admin");
    }

    #[test]
    fn test_pool_failures_are_unavailable() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
