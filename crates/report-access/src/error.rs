//! Error types for access resolution and editing
//!
//! Resolution aborts on any store failure; missing hierarchy nodes and
//! resource records are reported as `NotFound` where they reach the caller at
//! all. `NothingToDo` is an expected outcome, not a failure of the system.

use report_hierarchy::HierarchyError;
use report_rbac::ResourceIdError;
use thiserror::Error;

use crate::store::{StoreError, StoreOperation};

/// Access resolution and editing errors.
#[derive(Debug, Error)]
pub enum AccessError {
    /// A hierarchy node, hierarchy or project does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A call to the access-control store failed
    #[error("Store call {operation} failed ({context}): {source}")]
    StoreFailure {
        /// Failed store operation
        operation: StoreOperation,
        /// Project/page/resource ids of the request
        context: String,
        /// Underlying store error
        #[source]
        source: StoreError,
    },

    /// Malformed input or stored data
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The request matched nothing to change
    #[error("Nothing to do: {0}")]
    NothingToDo(String),

    /// Hierarchy could not be used
    #[error("Hierarchy error: {0}")]
    Hierarchy(HierarchyError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for access operations.
pub type AccessResult<T> = Result<T, AccessError>;

impl AccessError {
    /// Wrap a store error with the operation and request context.
    pub fn store(operation: StoreOperation, context: impl Into<String>, source: StoreError) -> Self {
        AccessError::StoreFailure {
            operation,
            context: context.into(),
            source,
        }
    }

    /// Check if this error should be logged at error level.
    ///
    /// Missing nodes, rejected input and empty bulk edits are expected.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            AccessError::StoreFailure { .. } | AccessError::Hierarchy(_) | AccessError::Config(_)
        )
    }

    /// Whether this is the "nothing to change" outcome.
    pub fn is_nothing_to_do(&self) -> bool {
        matches!(self, AccessError::NothingToDo(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AccessError::NotFound(_) => 404,
            AccessError::Validation(_) => 400,
            AccessError::NothingToDo(_) => 422,
            AccessError::StoreFailure { source, .. } => match source {
                StoreError::AuthenticationFailed => 502,
                StoreError::Unavailable(_) => 503,
                StoreError::RequestFailed(e) if e.is_timeout() => 504,
                _ => 502,
            },
            AccessError::Hierarchy(_) | AccessError::Config(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AccessError::NotFound(_) => "NOT_FOUND",
            AccessError::StoreFailure { .. } => "STORE_FAILURE",
            AccessError::Validation(_) => "VALIDATION_FAILED",
            AccessError::NothingToDo(_) => "NOTHING_TO_DO",
            AccessError::Hierarchy(_) => "HIERARCHY_ERROR",
            AccessError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<HierarchyError> for AccessError {
    fn from(err: HierarchyError) -> Self {
        if err.is_not_found() {
            AccessError::NotFound(err.to_string())
        } else {
            AccessError::Hierarchy(err)
        }
    }
}

impl From<ResourceIdError> for AccessError {
    fn from(err: ResourceIdError) -> Self {
        AccessError::Validation(err.to_string())
    }
}
