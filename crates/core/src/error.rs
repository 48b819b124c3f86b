//! Error types for the catalog domain layer.
//!
//! This module defines a two-level hierarchy:
//!
//! - [`DomainError`] - Validation failures and missing entities
//! - [`StorageError`] - Database/repository errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::fmt;

use thiserror::Error;

// =============================================================================
// Entity Kinds
// =============================================================================

/// The four persisted entity kinds.
///
/// Used to tell apart `NotFound` conditions and to label logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Category,
    Course,
    Review,
    User,
}

impl EntityKind {
    /// Lowercase name, used as a metric label and as a resource key.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Course => "course",
            Self::Review => "review",
            Self::User => "user",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Category => "Category",
            Self::Course => "Course",
            Self::Review => "Review",
            Self::User => "User",
        };
        f.write_str(label)
    }
}

// =============================================================================
// Domain Errors
// =============================================================================

/// Business rule violations surfaced by the services.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A field of a write failed its constraints.
    #[error("Invalid field '{field}': {message}")]
    FieldInvalid {
        /// Path of the offending field (e.g. `name`, `category`).
        field: String,
        /// Human readable constraint message.
        message: String,
    },

    /// The target entity, or an entity it references, does not exist.
    #[error("{0} not found")]
    NotFound(EntityKind),

    /// Unexpected internal failure (e.g. password hashing).
    #[error("Internal error: {0}")]
    Internal(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DomainError {
    /// Build a [`DomainError::FieldInvalid`].
    pub fn field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FieldInvalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Short label used for metrics.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::FieldInvalid { .. } => "field_invalid",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
            Self::Storage(_) => "storage",
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Database and repository errors.
///
/// These errors originate from storage operations like queries,
/// transactions, and row decoding.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to establish database connection.
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// SQL query execution failed.
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// The query was rejected before execution (unknown field, missing parameter).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Database constraint was violated (unique, foreign key, etc.).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Database migration failed.
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// Transaction commit/rollback failed.
    #[error("Transaction error: {0}")]
    TransactionError(String),

    /// Row decoding failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    // Test critique: la conversion Storage -> Domain préserve le message
    #[test]
    fn test_storage_error_converts_into_domain() {
        let storage_err = StorageError::ConstraintViolation("duplicate name".into());
        let domain_err: DomainError = storage_err.into();

        assert!(matches!(
            domain_err,
            DomainError::Storage(StorageError::ConstraintViolation(_))
        ));
        assert!(domain_err.to_string().contains("duplicate name"));
    }

    #[test]
    fn test_not_found_is_distinct_per_kind() {
        let course = DomainError::NotFound(EntityKind::Course);
        assert_eq!(course.to_string(), "Course not found");
        assert!(!matches!(course, DomainError::NotFound(EntityKind::Category)));
    }

    #[test]
    fn test_field_invalid_carries_path() {
        let err = DomainError::field_invalid("url", "must match a URL");
        let msg = err.to_string();
        assert!(msg.contains("'url'") && msg.contains("must match"));
        assert_eq!(err.kind_label(), "field_invalid");
    }
}
