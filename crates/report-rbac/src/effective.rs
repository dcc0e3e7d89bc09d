//! # Effective Roles
//!
//! Per-subject role lists derived purely from inheritance along a breadcrumb
//! trail, in the shape the access-control store returns them.

use serde::{Deserialize, Serialize};

use crate::subjects::{Subject, SubjectKind};

/// Roles held by a single user or group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubjectRoles {
    /// User id or group id.
    pub id: String,
    /// Role ids, in the order the store reported them.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl SubjectRoles {
    /// Create an entry.
    pub fn new<I, S>(id: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether the entry lists a role.
    pub fn has_role(&self, role_id: &str) -> bool {
        self.roles.iter().any(|r| r == role_id)
    }
}

/// Inherited roles per user and per group.
///
/// # Example
///
/// ```
/// use report_rbac::{EffectiveRoleSet, Subject, SubjectKind, SubjectRoles};
///
/// let mut set = EffectiveRoleSet {
///     users: vec![SubjectRoles::new("u1", ["viewer"])],
///     groups: vec![],
/// };
/// assert!(set.remove_role(SubjectKind::User, "u1", "viewer"));
/// set.retain_non_empty();
/// assert!(set.is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectiveRoleSet {
    /// Roles inherited by individual users.
    #[serde(default)]
    pub users: Vec<SubjectRoles>,
    /// Roles inherited by groups.
    #[serde(default)]
    pub groups: Vec<SubjectRoles>,
}

impl EffectiveRoleSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no subject holds any entry.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.groups.is_empty()
    }

    /// Entries for one subject kind.
    pub fn entries(&self, kind: SubjectKind) -> &[SubjectRoles] {
        match kind {
            SubjectKind::User => &self.users,
            SubjectKind::Group => &self.groups,
        }
    }

    fn entries_mut(&mut self, kind: SubjectKind) -> &mut Vec<SubjectRoles> {
        match kind {
            SubjectKind::User => &mut self.users,
            SubjectKind::Group => &mut self.groups,
        }
    }

    /// Roles of a subject, if it has an entry.
    pub fn roles_of(&self, kind: SubjectKind, id: &str) -> Option<&[String]> {
        self.entries(kind)
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.roles.as_slice())
    }

    /// Check whether a subject holds a role.
    pub fn holds(&self, subject: &Subject, role_id: &str) -> bool {
        self.roles_of(subject.kind(), subject.id())
            .map(|roles| roles.iter().any(|r| r == role_id))
            .unwrap_or(false)
    }

    /// Remove a role from a subject's entry.
    ///
    /// # Returns
    ///
    /// `true` if the role was present.
    pub fn remove_role(&mut self, kind: SubjectKind, id: &str, role_id: &str) -> bool {
        let mut removed = false;
        for entry in self.entries_mut(kind).iter_mut().filter(|e| e.id == id) {
            let before = entry.roles.len();
            entry.roles.retain(|r| r != role_id);
            removed |= entry.roles.len() != before;
        }
        removed
    }

    /// Drop every subject left without roles.
    pub fn retain_non_empty(&mut self) {
        self.users.retain(|e| !e.roles.is_empty());
        self.groups.retain(|e| !e.roles.is_empty());
    }

}
