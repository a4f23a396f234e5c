use thiserror::Error;

use crate::executor::ExecutionError;

/// Errors raised while building, translating or materializing a query.
///
/// Everything except `Execution` is produced by this crate; `Execution`
/// carries the execution boundary's failure unchanged.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The descriptor violates a structural invariant.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// An expression references an alias or attribute that is not in scope.
    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),

    /// Returned rows do not fit the requested projection shape.
    #[error("projection mismatch: {0}")]
    ProjectionMismatch(String),

    /// A single-result accessor received more than one row.
    #[error("expected at most one result, got {count}")]
    NonUniqueResult { count: usize },

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl QueryError {
    pub fn invalid(message: impl Into<String>) -> Self {
        QueryError::InvalidQuery(message.into())
    }

    pub fn unresolved(message: impl Into<String>) -> Self {
        QueryError::UnresolvedReference(message.into())
    }

    pub fn mismatch(message: impl Into<String>) -> Self {
        QueryError::ProjectionMismatch(message.into())
    }

    pub fn err<T>(self) -> Result<T> {
        Err(self)
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category_and_detail() {
        let err = QueryError::invalid("limit must be positive");
        assert_eq!(err.to_string(), "invalid query: limit must be positive");

        let err = QueryError::NonUniqueResult { count: 3 };
        assert_eq!(err.to_string(), "expected at most one result, got 3");
    }

    #[test]
    fn execution_errors_pass_through_unchanged() {
        let err: QueryError = ExecutionError::new("connection reset").into();
        assert_eq!(err.to_string(), "connection reset");
        assert!(matches!(err, QueryError::Execution(_)));
    }
}
