//! # Error Types
//!
//! One error enum for every operation exposed by the core.

use crate::storage::StoreError;
use crate::workflow::WorkflowError;
use thiserror::Error;

/// Result alias used across the core.
pub type Result<T> = std::result::Result<T, PortalError>;

/// Errors returned by [`crate::Portal`] operations.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The referenced row does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A unique value (email, username, reservation number...) is taken.
    #[error("already exists: {0}")]
    Conflict(String),

    /// The request carried missing or malformed data.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The session token is missing, unknown or expired.
    #[error("authentication required")]
    Unauthorized,

    /// Email/password pair did not match an active account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Authenticated, but not allowed to touch this row.
    #[error("access denied: {0}")]
    Forbidden(String),

    /// A review-pipeline transition was refused.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// The storage backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Password hashing failed (bad parameters or salt).
    #[error("password hashing failed: {0}")]
    Password(String),
}

impl PortalError {
    /// Build a `NotFound` error for an entity keyed by anything printable.
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Whether this error is a unique-index collision.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Conflict(_) | Self::Store(StoreError::Conflict { .. })
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
