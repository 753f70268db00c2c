//! Error taxonomy shared across the subsystem.

use thiserror::Error as ThisError;

/// Result type used across the domain layer.
pub type Result<T> = core::result::Result<T, Error>;

/// Typed failure surfaced by administration, provisioning and authorization
/// operations.
///
/// Callers are responsible for user-facing messaging; every variant carries
/// enough context for an operator to act on it (which constraint, which name,
/// how many dependents block a deletion).
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum Error {
    /// An id or name lookup missed.
    #[error("not found")]
    NotFound,

    /// A uniqueness or referential guard was violated (e.g. duplicate name,
    /// deleting a role still in use).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A mutation was attempted on a protected (system) entity.
    #[error("policy violation: {0}")]
    PolicyViolation(String),

    /// A deployment precondition is unmet (e.g. the default role is missing).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A data invariant was observed broken. Should be unreachable; logged as
    /// a severe condition wherever it is raised.
    #[error("data integrity violation: {0}")]
    DataIntegrity(String),

    /// Malformed input (blank name, claims without email or handle).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Underlying store I/O failure, cause opaque to the caller.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl Error {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn policy(msg: impl Into<String>) -> Self {
        Self::PolicyViolation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::DataIntegrity(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }
}

/// Failure surfaced by a persistence port.
///
/// Stores report only what they can know: a miss, a uniqueness constraint
/// violation, or an opaque backend failure. All policy interpretation happens
/// in the services that call them.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// An atomic uniqueness constraint rejected a write (the create-if-absent
    /// primitive provisioning and administration rely on).
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for Error {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => Error::NotFound,
            StoreError::UniqueViolation(msg) => Error::Conflict(msg),
            StoreError::Backend(msg) => Error::Persistence(msg),
        }
    }
}
