//! Error types for dataset persistence.

use std::fmt;

use thiserror::Error;

use crate::model::InvalidDataset;

/// What kind of `SQLite` failure a database error was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    /// Another connection held the database or a table lock.
    BusyOrLocked,
    /// Unique, foreign-key, check or not-null constraint rejected the write.
    ConstraintViolation,
    /// No pooled connection became free in time.
    PoolTimeout,
    Other,
}

// Primary result codes; extended codes carry these in the low byte.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;
const SQLITE_CONSTRAINT: i32 = 19;

impl DbErrorKind {
    #[must_use]
    pub fn from_sqlx(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => Self::PoolTimeout,
            sqlx::Error::Database(database_error) => Self::from_database(database_error.as_ref()),
            _ => Self::Other,
        }
    }

    fn from_database(database_error: &dyn sqlx::error::DatabaseError) -> Self {
        if !matches!(database_error.kind(), sqlx::error::ErrorKind::Other) {
            return Self::ConstraintViolation;
        }
        let primary = database_error
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .map(|code| code & 0xff);
        match primary {
            Some(SQLITE_BUSY | SQLITE_LOCKED) => Self::BusyOrLocked,
            Some(SQLITE_CONSTRAINT) => Self::ConstraintViolation,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BusyOrLocked => "busy_or_locked",
            Self::ConstraintViolation => "constraint_violation",
            Self::PoolTimeout => "pool_timeout",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for DbErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while storing or loading datasets.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// Database operation failed.
    #[error("database error ({kind}): {message}")]
    Database {
        kind: DbErrorKind,
        message: String,
    },

    /// The dataset breaks a record invariant and was not written.
    #[error("invalid dataset: {0}")]
    Invalid(#[from] InvalidDataset),

    /// A stored value could not be mapped back into the record.
    #[error(
        "corrupt stored value for {field}: {value:?}\n  Suggestion: The row was written by an incompatible version; reprocess the dataset"
    )]
    Corrupt {
        field: &'static str,
        value: String,
    },
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database {
            kind: DbErrorKind::from_sqlx(&err),
            message: err.to_string(),
        }
    }
}

impl RepositoryError {
    pub(crate) fn corrupt(field: &'static str, value: impl Into<String>) -> Self {
        Self::Corrupt {
            field,
            value: value.into(),
        }
    }

    /// Returns the typed database error kind, when this is a database error.
    #[must_use]
    pub fn database_kind(&self) -> Option<DbErrorKind> {
        match self {
            Self::Database { kind, .. } => Some(*kind),
            Self::Invalid(_) | Self::Corrupt { .. } => None,
        }
    }

    /// True when a unique, check or foreign-key constraint rejected the write.
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        self.database_kind() == Some(DbErrorKind::ConstraintViolation)
    }
}
