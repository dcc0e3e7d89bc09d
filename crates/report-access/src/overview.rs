//! Access overview of a single page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use report_rbac::{AccessRecord, EffectiveRoleSet, Group, ResourceId, ResourceRecord, Role, Subject, User};

/// Everything an access-control UI needs to render one page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessOverview {
    /// Project the page belongs to.
    pub project_id: String,

    /// Page (hierarchy node) id.
    pub page_id: String,

    /// Resource id of the page.
    pub current_resource_id: ResourceId,

    /// Store record of the page, `None` if the store does not know it.
    pub current_resource: Option<ResourceRecord>,

    /// Grants stored directly against the page.
    pub explicit_records: Vec<AccessRecord>,

    /// All groups.
    pub groups: Vec<Group>,

    /// All users.
    pub users: Vec<User>,

    /// All roles.
    pub roles: Vec<Role>,

    /// Roles inherited from ancestors, after masking.
    pub inherited_roles: EffectiveRoleSet,

    /// Roles of the requesting user on this page.
    pub requesting_user_permissions: Option<RequesterPermissions>,

    /// When the overview was computed.
    pub resolved_at: DateTime<Utc>,
}

/// Roles a user holds on a resource, directly or through groups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequesterPermissions {
    /// Requesting user.
    pub user_id: String,

    /// Role ids, sorted.
    pub roles: BTreeSet<String>,
}

impl RequesterPermissions {
    /// Compute the roles of `user_id` on the current resource.
    ///
    /// Counts enabled explicit records for the user or any group the user is
    /// a direct member of, plus inherited roles of the user and those groups.
    /// `inherited` must be the unmasked set.
    pub fn compute(
        user_id: &str,
        groups: &[Group],
        explicit_records: &[AccessRecord],
        inherited: &EffectiveRoleSet,
    ) -> Self {
        let memberships: Vec<&str> = groups
            .iter()
            .filter(|g| g.has_member(user_id))
            .map(|g| g.id.as_str())
            .collect();

        let mut roles = BTreeSet::new();

        for record in explicit_records.iter().filter(|r| r.enabled) {
            let (Ok(subject), Ok(role)) = (record.subject(), record.role_id()) else {
                continue;
            };
            let applies = match subject {
                Subject::User(ref id) => id == user_id,
                Subject::Group(ref id) => memberships.contains(&id.as_str()),
            };
            if applies {
                roles.insert(role.to_string());
            }
        }

        for entry in inherited.users.iter().filter(|e| e.id == user_id) {
            roles.extend(entry.roles.iter().cloned());
        }
        for entry in inherited
            .groups
            .iter()
            .filter(|e| memberships.contains(&e.id.as_str()))
        {
            roles.extend(entry.roles.iter().cloned());
        }

        Self {
            user_id: user_id.to_string(),
            roles,
        }
    }

    /// Check whether the user holds a role.
    pub fn has_role(&self, role_id: &str) -> bool {
        self.roles.contains(role_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_rbac::SubjectRoles;

    fn resource() -> ResourceId {
        ResourceId::from_raw("get:1:ar2024:notes")
    }

    #[test]
    fn test_requester_permissions_combine_sources() {
        let groups = vec![Group::new("reviewers", ["u1"]), Group::new("others", ["u2"])];
        let records = vec![
            AccessRecord::new(resource(), Subject::user("u1"), "editor"),
            AccessRecord::new(resource(), Subject::group("others"), "admin"),
            AccessRecord::new(resource(), Subject::user("u1"), "approver").with_enabled(false),
        ];
        let inherited = EffectiveRoleSet {
            users: vec![SubjectRoles::new("u1", ["viewer"])],
            groups: vec![SubjectRoles::new("reviewers", ["commenter"])],
        };

        let permissions = RequesterPermissions::compute("u1", &groups, &records, &inherited);

        let roles: Vec<&str> = permissions.roles.iter().map(String::as_str).collect();
        assert_eq!(roles, vec!["commenter", "editor", "viewer"]);
        assert!(!permissions.has_role("admin"));
        assert!(!permissions.has_role("approver"));
    }

    #[test]
    fn test_group_grant_reaches_member() {
        let groups = vec![Group::new("reviewers", ["u1"])];
        let records = vec![AccessRecord::new(resource(), Subject::group("reviewers"), "viewer")];

        let permissions = RequesterPermissions::compute("u1", &groups, &records, &EffectiveRoleSet::new());
        assert!(permissions.has_role("viewer"));

        let outsider = RequesterPermissions::compute("u9", &groups, &records, &EffectiveRoleSet::new());
        assert!(outsider.roles.is_empty());
    }
}
