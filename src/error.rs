//! Custom error types for the expense tracker
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions. Every mutating operation reports failure
//! through one of these variants; none of them is fatal to the process.

use thiserror::Error;

use crate::services::consistency::PropagationReport;

/// The main error type for expense tracker operations
#[derive(Error, Debug)]
pub enum ExpenseError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Caller-supplied data violates an invariant
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Delete blocked by the category usage guard
    #[error("Category '{category}' is used by {references} expense(s) and cannot be deleted")]
    CategoryInUse { category: String, references: usize },

    /// A remote store operation failed (network, permission, quota)
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A category rename reached only some of the referencing expenses
    #[error(
        "Category rename propagated to {} of {} expense(s); {} failed",
        .0.updated,
        .0.matched,
        .0.failures.len()
    )]
    PartialPropagation(PropagationReport),

    /// No user id has been supplied by the authentication boundary
    #[error("No user is signed in")]
    NotSignedIn,

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),
}

impl ExpenseError {
    /// Create a "not found" error for categories
    pub fn category_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for store documents
    pub fn document_not_found(path: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Document",
            identifier: path.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error came from the persistence boundary
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::PartialPropagation(_))
    }
}

impl From<std::io::Error> for ExpenseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ExpenseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for expense tracker operations
pub type ExpenseResult<T> = Result<T, ExpenseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExpenseId;

    #[test]
    fn test_error_display() {
        let err = ExpenseError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = ExpenseError::category_not_found("Food");
        assert_eq!(err.to_string(), "Category not found: Food");
        assert!(err.is_not_found());
        assert!(!err.is_validation());

        let err = ExpenseError::document_not_found("users/alice/categories/c1");
        assert_eq!(err.to_string(), "Document not found: users/alice/categories/c1");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_category_in_use_error() {
        let err = ExpenseError::CategoryInUse {
            category: "Groceries".into(),
            references: 3,
        };
        assert_eq!(
            err.to_string(),
            "Category 'Groceries' is used by 3 expense(s) and cannot be deleted"
        );
    }

    #[test]
    fn test_partial_propagation_error() {
        let report = PropagationReport {
            matched: 3,
            updated: 2,
            failures: vec![(ExpenseId::from("e3"), "quota exceeded".into())],
        };
        let err = ExpenseError::PartialPropagation(report);
        assert_eq!(
            err.to_string(),
            "Category rename propagated to 2 of 3 expense(s); 1 failed"
        );
        assert!(err.is_persistence());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ExpenseError = io_err.into();
        assert!(matches!(err, ExpenseError::Io(_)));
    }
}
