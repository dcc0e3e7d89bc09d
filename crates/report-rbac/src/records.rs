//! # Access Records
//!
//! Explicit grants stored against a resource id, the resource record itself,
//! and the write-side shapes used to add or edit grants.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resources::ResourceId;
use crate::subjects::Subject;

/// Errors raised when a stored record cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Neither a user nor a group reference is set.
    #[error("Access record on {0} has no subject reference")]
    MissingSubject(ResourceId),

    /// No role reference is set.
    #[error("Access record on {0} has no role reference")]
    MissingRole(ResourceId),
}

/// An explicit grant stored directly against a resource id.
///
/// The store hands records out with optional references; a well-formed record
/// carries exactly one of `user_ref`/`group_ref` and a `role_ref`. Use
/// [`AccessRecord::subject`] and [`AccessRecord::role_id`] to interpret it.
///
/// # Example
///
/// ```
/// use report_rbac::{AccessRecord, ResourceId, Subject};
///
/// let record = AccessRecord::new(ResourceId::from_raw("get:1:p:n"), Subject::user("u1"), "editor");
/// assert_eq!(record.subject().unwrap(), Subject::user("u1"));
/// assert_eq!(record.role_id().unwrap(), "editor");
/// assert!(record.enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessRecord {
    /// Resource the grant is stored against.
    pub resource_id: ResourceId,

    /// Granted user, if the subject is a user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ref: Option<String>,

    /// Granted group, if the subject is a group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_ref: Option<String>,

    /// Granted role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_ref: Option<String>,

    /// Whether the grant is active.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Whether the store keeps the record when its resource is regenerated.
    #[serde(default)]
    pub persistent: bool,
}

fn default_enabled() -> bool {
    true
}

impl AccessRecord {
    /// Create an enabled record for a subject and role.
    pub fn new(resource_id: ResourceId, subject: Subject, role_id: impl Into<String>) -> Self {
        let (user_ref, group_ref) = match subject {
            Subject::User(id) => (Some(id), None),
            Subject::Group(id) => (None, Some(id)),
        };

        Self {
            resource_id,
            user_ref,
            group_ref,
            role_ref: Some(role_id.into()),
            enabled: true,
            persistent: false,
        }
    }

    /// Set the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Resolve the subject of this record.
    ///
    /// A user reference wins over a group reference when both are present;
    /// see [`AccessRecord::has_ambiguous_subject`].
    pub fn subject(&self) -> Result<Subject, RecordError> {
        match (&self.user_ref, &self.group_ref) {
            (Some(user), _) if !user.is_empty() => Ok(Subject::User(user.clone())),
            (_, Some(group)) if !group.is_empty() => Ok(Subject::Group(group.clone())),
            _ => Err(RecordError::MissingSubject(self.resource_id.clone())),
        }
    }

    /// Whether the record carries both a user and a group reference.
    pub fn has_ambiguous_subject(&self) -> bool {
        matches!(
            (&self.user_ref, &self.group_ref),
            (Some(user), Some(group)) if !user.is_empty() && !group.is_empty()
        )
    }

    /// Resolve the role id of this record.
    pub fn role_id(&self) -> Result<&str, RecordError> {
        match self.role_ref.as_deref() {
            Some(role) if !role.is_empty() => Ok(role),
            _ => Err(RecordError::MissingRole(self.resource_id.clone())),
        }
    }

    /// Check whether this record grants `role_id` to `subject`.
    ///
    /// Only well-formed records match; the enabled flag is not considered.
    pub fn grants(&self, subject: &Subject, role_id: &str) -> bool {
        match (self.subject(), self.role_id()) {
            (Ok(own), Ok(role)) => &own == subject && role == role_id,
            _ => false,
        }
    }
}

/// The store's record for a resource itself (not a grant).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Resource id.
    pub resource_id: ResourceId,

    /// Whether inheritance from ancestors is cut at this resource.
    #[serde(default)]
    pub reset_inheritance: bool,

    /// Whether the resource survives regeneration.
    #[serde(default)]
    pub persistent: bool,

    /// Optional description maintained by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A new grant to add to the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessGrant {
    /// Resource to grant on.
    pub resource_id: ResourceId,
    /// Subject receiving the role.
    pub subject: Subject,
    /// Role to grant.
    pub role_id: String,
    /// Whether the grant starts enabled.
    pub enabled: bool,
    /// Ask the store to cut inheritance at this resource.
    pub reset_inheritance: bool,
}

/// A change to the enabled flag of an existing grant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordMutation {
    /// Resource the grant is stored against.
    pub resource_id: ResourceId,
    /// Subject holding the grant.
    pub subject: Subject,
    /// Granted role.
    pub role_id: String,
    /// New enabled flag.
    pub enabled: bool,
}
