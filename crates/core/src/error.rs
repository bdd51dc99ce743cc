//! Repository error model.

use thiserror::Error;

/// Result type used across repositories and units of work.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Broad classification of a [`RepositoryError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required argument was absent or of the wrong shape.
    InvalidArgument,
    /// A structural precondition of the operation failed.
    InvalidOperation,
    /// The backing storage itself failed.
    Storage,
}

/// Repository-level error.
///
/// "Not found" on reads is not an error: lookups return `Option`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// A required argument was absent (e.g. no ordering) or not usable by the callee.
    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// Staging was attempted on a repository with no unit of work bound.
    #[error("there is no unit of work configured for the repository '{repository}'")]
    MissingUnitOfWork { repository: String },

    /// Another stored entity already has this key.
    #[error("there is another entity with key '{key}'")]
    DuplicateKey { key: String },

    /// No stored entity has this key.
    #[error("there is no entity with key '{key}'")]
    EntityNotFound { key: String },

    /// Backing storage failure (lock poisoned, IO, ...).
    #[error("storage error: {0}")]
    Storage(String),
}

impl RepositoryError {
    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    pub fn missing_unit_of_work(repository: impl Into<String>) -> Self {
        Self::MissingUnitOfWork {
            repository: repository.into(),
        }
    }

    pub fn duplicate_key(key: impl core::fmt::Debug) -> Self {
        Self::DuplicateKey {
            key: format!("{key:?}"),
        }
    }

    pub fn entity_not_found(key: impl core::fmt::Debug) -> Self {
        Self::EntityNotFound {
            key: format!("{key:?}"),
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::MissingUnitOfWork { .. }
            | Self::DuplicateKey { .. }
            | Self::EntityNotFound { .. } => ErrorKind::InvalidOperation,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        self.kind() == ErrorKind::InvalidArgument
    }

    pub fn is_invalid_operation(&self) -> bool {
        self.kind() == ErrorKind::InvalidOperation
    }
}
