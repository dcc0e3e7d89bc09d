//! Access-control store interface.
//!
//! The store persists access records, resources, users, groups and roles, and
//! computes the raw effective roles along a breadcrumb trail. This module
//! defines the interface; [`http`] talks to the remote store and [`memory`]
//! keeps everything in process.

use async_trait::async_trait;
use report_hierarchy::BreadcrumbTrail;
use report_rbac::{
    AccessGrant, AccessRecord, EffectiveRoleSet, Group, RecordMutation, ResourceId, ResourceRecord, Role, Subject,
    User,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod http;
pub mod memory;

pub use http::HttpAccessControlStore;
pub use memory::MemoryAccessControlStore;

/// Store client errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Store returned an error response.
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Error message from the store.
        message: String,
    },

    /// Invalid response from the store.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Authentication failed.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Store is unavailable.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether retrying the same idempotent call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::RequestFailed(e) => e.is_timeout() || e.is_connect(),
            StoreError::ApiError { status, .. } => *status >= 500,
            StoreError::Unavailable(_) => true,
            StoreError::InvalidResponse(_) | StoreError::AuthenticationFailed => false,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store operations, used for error context and call accounting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StoreOperation {
    /// List access records.
    ListAccessRecords,
    /// Retrieve a resource record.
    RetrieveResource,
    /// List groups.
    ListGroups,
    /// List users.
    ListUsers,
    /// List roles.
    ListRoles,
    /// Effective roles per subject along a trail.
    RetrieveEffectiveRoles,
    /// Add an access record.
    AddAccessRecord,
    /// Edit one or more access records.
    EditAccessRecords,
    /// Delete an access record.
    DeleteAccessRecord,
    /// Edit a resource record.
    EditResource,
}

impl StoreOperation {
    /// Get the string representation of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOperation::ListAccessRecords => "list_access_records",
            StoreOperation::RetrieveResource => "retrieve_resource",
            StoreOperation::ListGroups => "list_groups",
            StoreOperation::ListUsers => "list_users",
            StoreOperation::ListRoles => "list_roles",
            StoreOperation::RetrieveEffectiveRoles => "retrieve_effective_roles",
            StoreOperation::AddAccessRecord => "add_access_record",
            StoreOperation::EditAccessRecords => "edit_access_records",
            StoreOperation::DeleteAccessRecord => "delete_access_record",
            StoreOperation::EditResource => "edit_resource",
        }
    }

    /// Whether the operation mutates the store.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            StoreOperation::AddAccessRecord
                | StoreOperation::EditAccessRecords
                | StoreOperation::DeleteAccessRecord
                | StoreOperation::EditResource
        )
    }
}

impl std::fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access-control store.
///
/// Mutations return `false` when the store reports that nothing changed.
#[async_trait]
pub trait AccessControlStore: Send + Sync {
    /// List access records, optionally only those stored against one resource.
    async fn list_access_records(&self, resource_id: Option<&ResourceId>) -> StoreResult<Vec<AccessRecord>>;

    /// Retrieve the record of a resource. Not-found is `Ok(None)`.
    ///
    /// With `strict`, only resources registered in the store are returned;
    /// otherwise the store may describe an implicit resource that only has
    /// grants.
    async fn retrieve_resource(&self, resource_id: &ResourceId, strict: bool) -> StoreResult<Option<ResourceRecord>>;

    /// List all groups with their members.
    async fn list_groups(&self) -> StoreResult<Vec<Group>>;

    /// List all users.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// List all roles.
    async fn list_roles(&self) -> StoreResult<Vec<Role>>;

    /// Effective roles per subject inherited along a breadcrumb trail.
    async fn retrieve_effective_roles(&self, trail: &BreadcrumbTrail) -> StoreResult<EffectiveRoleSet>;

    /// Add an access record.
    async fn add_access_record(&self, grant: &AccessGrant) -> StoreResult<bool>;

    /// Change the enabled flag of one or more access records in one batch.
    async fn edit_access_records(&self, mutations: &[RecordMutation]) -> StoreResult<bool>;

    /// Delete an access record.
    async fn delete_access_record(
        &self,
        resource_id: &ResourceId,
        subject: &Subject,
        role_id: &str,
    ) -> StoreResult<bool>;

    /// Edit the flags of a resource record.
    async fn edit_resource(
        &self,
        resource_id: &ResourceId,
        reset_inheritance: bool,
        is_persistent: bool,
    ) -> StoreResult<bool>;
}
