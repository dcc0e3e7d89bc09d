//! # Subjects
//!
//! Users and groups (the holders of role grants) and the roles themselves,
//! as listed by the access-control store.

use serde::{Deserialize, Serialize};

/// Kind of subject a grant is held by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    /// An individual user.
    User,
    /// A group of users.
    Group,
}

impl SubjectKind {
    /// Get the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::User => "user",
            SubjectKind::Group => "group",
        }
    }
}

/// Holder of a role grant: exactly one user or one group.
///
/// # Example
///
/// ```
/// use report_rbac::{Subject, SubjectKind};
///
/// let subject = Subject::user("u1");
/// assert_eq!(subject.kind(), SubjectKind::User);
/// assert_eq!(subject.id(), "u1");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Subject {
    /// A user id.
    User(String),
    /// A group id.
    Group(String),
}

impl Subject {
    /// Create a user subject.
    pub fn user(id: impl Into<String>) -> Self {
        Subject::User(id.into())
    }

    /// Create a group subject.
    pub fn group(id: impl Into<String>) -> Self {
        Subject::Group(id.into())
    }

    /// Subject kind.
    pub fn kind(&self) -> SubjectKind {
        match self {
            Subject::User(_) => SubjectKind::User,
            Subject::Group(_) => SubjectKind::Group,
        }
    }

    /// Subject id (user id or group id).
    pub fn id(&self) -> &str {
        match self {
            Subject::User(id) | Subject::Group(id) => id,
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind().as_str(), self.id())
    }
}

/// A user known to the access-control store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// User id.
    pub id: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    /// Create a user with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            email: None,
        }
    }
}

/// A group and its direct members.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    /// Group id.
    pub id: String,

    /// Group name.
    #[serde(default)]
    pub name: String,

    /// User ids of the direct members.
    #[serde(default)]
    pub members: Vec<String>,
}

impl Group {
    /// Create a group with the given members.
    pub fn new<I, S>(id: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether a user is a direct member of this group.
    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m == user_id)
    }
}

/// A role that can be granted on a resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    /// Role id (e.g., "editor").
    pub id: String,

    /// Human-readable name.
    #[serde(default)]
    pub name: String,

    /// Role description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Role {
    /// Create a role whose name equals its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: None,
        }
    }
}
