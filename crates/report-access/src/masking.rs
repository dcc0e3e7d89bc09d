//! Masking of inherited roles.
//!
//! Masking hides redundant or superseded inherited entries in an overview.
//! It never touches stored records. The passes must run in order, after all
//! inputs have been fetched:
//!
//! 1. [`collapse_group_duplicates`]
//! 2. [`hide_explicit_overrides`]
//! 3. [`drop_empty_subjects`]

use tracing::debug;

use report_rbac::{AccessRecord, EffectiveRoleSet, Group, ResourceId, SubjectKind};

/// Remove a member's inherited role when one of their groups already shows it.
///
/// The role stays on the group entry only. Idempotent.
pub fn collapse_group_duplicates(inherited: &mut EffectiveRoleSet, groups: &[Group]) -> usize {
    let mut removed = 0;

    let group_roles: Vec<(String, Vec<String>)> = inherited
        .groups
        .iter()
        .map(|e| (e.id.clone(), e.roles.clone()))
        .collect();

    for (group_id, roles) in group_roles {
        let Some(group) = groups.iter().find(|g| g.id == group_id) else {
            continue;
        };

        for member in &group.members {
            for role in &roles {
                if inherited.remove_role(SubjectKind::User, member, role) {
                    debug!(group = %group_id, user = %member, role = %role, "Collapsed inherited role into group");
                    removed += 1;
                }
            }
        }
    }

    removed
}

/// Remove inherited `(subject, role)` pairs that are explicitly granted on the
/// current resource.
///
/// Only records stored against `current` count; an identical grant on an
/// ancestor leaves the inherited entry in place. Subjects are only compared
/// with subjects of the same kind.
pub fn hide_explicit_overrides(
    inherited: &mut EffectiveRoleSet,
    explicit_records: &[AccessRecord],
    current: &ResourceId,
) -> usize {
    let mut removed = 0;

    for record in explicit_records.iter().filter(|r| &r.resource_id == current) {
        let (Ok(subject), Ok(role)) = (record.subject(), record.role_id()) else {
            continue;
        };

        if inherited.remove_role(subject.kind(), subject.id(), role) {
            debug!(%subject, role, "Inherited role hidden by explicit record");
            removed += 1;
        }
    }

    removed
}

/// Drop every subject left without roles.
pub fn drop_empty_subjects(inherited: &mut EffectiveRoleSet) {
    inherited.retain_non_empty();
}

/// Run all masking passes in order.
pub fn apply_masking(
    inherited: &mut EffectiveRoleSet,
    groups: &[Group],
    explicit_records: &[AccessRecord],
    current: &ResourceId,
) {
    let collapsed = collapse_group_duplicates(inherited, groups);
    let hidden = hide_explicit_overrides(inherited, explicit_records, current);
    drop_empty_subjects(inherited);

    debug!(collapsed, hidden, "Masking applied");
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_rbac::{Subject, SubjectRoles};

    fn current() -> ResourceId {
        ResourceId::from_raw("get:1:ar2024:b")
    }

    fn ancestor() -> ResourceId {
        ResourceId::from_raw("get:1:ar2024:a")
    }

    #[test]
    fn test_group_collapse() {
        let groups = vec![Group::new("g", ["u2"])];
        let mut inherited = EffectiveRoleSet {
            users: vec![SubjectRoles::new("u2", ["viewer"]), SubjectRoles::new("u3", ["viewer"])],
            groups: vec![SubjectRoles::new("g", ["viewer"])],
        };

        assert_eq!(collapse_group_duplicates(&mut inherited, &groups), 1);
        drop_empty_subjects(&mut inherited);

        assert!(inherited.roles_of(SubjectKind::User, "u2").is_none());
        assert!(inherited.holds(&Subject::user("u3"), "viewer"));
        assert!(inherited.holds(&Subject::group("g"), "viewer"));
    }

    #[test]
    fn test_group_collapse_is_idempotent() {
        let groups = vec![Group::new("g", ["u1", "u2"])];
        let mut inherited = EffectiveRoleSet {
            users: vec![
                SubjectRoles::new("u1", ["viewer", "editor"]),
                SubjectRoles::new("u2", ["viewer"]),
            ],
            groups: vec![SubjectRoles::new("g", ["viewer"])],
        };

        collapse_group_duplicates(&mut inherited, &groups);
        let once = inherited.clone();

        assert_eq!(collapse_group_duplicates(&mut inherited, &groups), 0);
        assert_eq!(inherited, once);
        assert_eq!(inherited.roles_of(SubjectKind::User, "u1"), Some(&["editor".to_string()][..]));
    }

    #[test]
    fn test_group_collapse_ignores_unknown_groups() {
        let mut inherited = EffectiveRoleSet {
            users: vec![SubjectRoles::new("u1", ["viewer"])],
            groups: vec![SubjectRoles::new("ghost", ["viewer"])],
        };

        assert_eq!(collapse_group_duplicates(&mut inherited, &[]), 0);
        assert!(inherited.holds(&Subject::user("u1"), "viewer"));
    }

    #[test]
    fn test_explicit_override_only_on_current_resource() {
        let records = vec![
            AccessRecord::new(current(), Subject::user("u1"), "editor"),
            AccessRecord::new(ancestor(), Subject::user("u2"), "viewer"),
        ];
        let mut inherited = EffectiveRoleSet {
            users: vec![
                SubjectRoles::new("u1", ["editor", "viewer"]),
                SubjectRoles::new("u2", ["viewer"]),
            ],
            groups: vec![],
        };

        assert_eq!(hide_explicit_overrides(&mut inherited, &records, &current()), 1);

        assert_eq!(inherited.roles_of(SubjectKind::User, "u1"), Some(&["viewer".to_string()][..]));
        assert!(inherited.holds(&Subject::user("u2"), "viewer"));
    }

    #[test]
    fn test_explicit_override_matches_subject_kind() {
        let records = vec![AccessRecord::new(current(), Subject::user("x"), "viewer")];
        let mut inherited = EffectiveRoleSet {
            users: vec![],
            groups: vec![SubjectRoles::new("x", ["viewer"])],
        };

        assert_eq!(hide_explicit_overrides(&mut inherited, &records, &current()), 0);
        assert!(inherited.holds(&Subject::group("x"), "viewer"));
    }

    #[test]
    fn test_apply_masking_drops_empty_subjects() {
        let groups = vec![Group::new("g", ["u2"])];
        let records = vec![AccessRecord::new(current(), Subject::user("u1"), "editor")];
        let mut inherited = EffectiveRoleSet {
            users: vec![SubjectRoles::new("u1", ["editor"]), SubjectRoles::new("u2", ["viewer"])],
            groups: vec![SubjectRoles::new("g", ["viewer"])],
        };

        apply_masking(&mut inherited, &groups, &records, &current());

        assert!(inherited.users.is_empty());
        assert_eq!(inherited.groups, vec![SubjectRoles::new("g", ["viewer"])]);
    }
}
