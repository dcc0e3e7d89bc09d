//! Effective access resolution
//!
//! Assembles the [`AccessOverview`] of one page: the explicit grants on the
//! page, the reference lists, and the roles inherited along the page's
//! breadcrumb trail after masking.
//!
//! All store reads of one resolution are issued concurrently. Any failed read
//! aborts the resolution; the only tolerated failure is the lookup of the
//! page's own resource record, which degrades to an empty section.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use report_hierarchy::{build_breadcrumb_trail, BreadcrumbTrail, Hierarchy};
use report_rbac::{calculate_resource_id, Action, EffectiveRoleSet, ResourceId, ScopeLevel};

use crate::config::DEFAULT_OVERVIEW_PAGE_ID;
use crate::error::{AccessError, AccessResult};
use crate::masking::apply_masking;
use crate::overview::{AccessOverview, RequesterPermissions};
use crate::store::{AccessControlStore, StoreOperation};

/// Resolver settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverSettings {
    /// Page id of the project overview, which never inherits access.
    pub overview_page_id: String,
    /// Scope level of calculated resource ids.
    pub scope: ScopeLevel,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            overview_page_id: DEFAULT_OVERVIEW_PAGE_ID.to_string(),
            scope: ScopeLevel::DEFAULT,
        }
    }
}

/// Computes access overviews against an access-control store.
#[derive(Clone)]
pub struct EffectiveAccessResolver {
    store: Arc<dyn AccessControlStore>,
    settings: ResolverSettings,
}

impl std::fmt::Debug for EffectiveAccessResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectiveAccessResolver")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl EffectiveAccessResolver {
    /// Create a resolver.
    pub fn new(store: Arc<dyn AccessControlStore>, settings: ResolverSettings) -> Self {
        Self { store, settings }
    }

    /// Resolver settings.
    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Resource id of a page.
    pub fn resource_id(&self, project_id: &str, page_id: &str) -> AccessResult<ResourceId> {
        Ok(calculate_resource_id(Action::Get, page_id, project_id, self.settings.scope)?)
    }

    /// Compute the access overview of a page.
    ///
    /// # Arguments
    ///
    /// * `project_id` - Project the page belongs to
    /// * `page_id` - Hierarchy node of the page
    /// * `hierarchy` - Hierarchy used to build the breadcrumb trail
    /// * `requester` - Requesting user, to report their own roles
    ///
    /// # Errors
    ///
    /// [`AccessError::StoreFailure`] if listing records, groups, users, roles
    /// or effective roles fails. No partial overview is returned.
    #[instrument(skip(self, hierarchy), fields(channel = %hierarchy.channel()))]
    pub async fn get_access_overview(
        &self,
        project_id: &str,
        page_id: &str,
        hierarchy: &Hierarchy,
        requester: Option<&str>,
    ) -> AccessResult<AccessOverview> {
        if hierarchy.project_id() != project_id {
            return Err(AccessError::Validation(format!(
                "Hierarchy of project {} used for project {}",
                hierarchy.project_id(),
                project_id
            )));
        }

        let resource_id = self.resource_id(project_id, page_id)?;
        let context = format!("project={} page={} resource={}", project_id, page_id, resource_id);
        let trail = self.inheritance_trail(hierarchy, page_id)?;

        let store = self.store.as_ref();
        let fail = |operation: StoreOperation| {
            let context = context.clone();
            move |source| AccessError::store(operation, context, source)
        };

        let current = async {
            match store.retrieve_resource(&resource_id, false).await {
                Ok(record) => record,
                Err(e) => {
                    warn!(resource_id = %resource_id, error = %e, "Current resource lookup failed, treating as not found");
                    None
                }
            }
        };

        let fetches = async {
            tokio::try_join!(
                async {
                    store
                        .list_access_records(Some(&resource_id))
                        .await
                        .map_err(fail(StoreOperation::ListAccessRecords))
                },
                async { store.list_groups().await.map_err(fail(StoreOperation::ListGroups)) },
                async { store.list_users().await.map_err(fail(StoreOperation::ListUsers)) },
                async { store.list_roles().await.map_err(fail(StoreOperation::ListRoles)) },
                async {
                    match &trail {
                        Some(trail) => store
                            .retrieve_effective_roles(trail)
                            .await
                            .map_err(fail(StoreOperation::RetrieveEffectiveRoles)),
                        None => Ok(EffectiveRoleSet::new()),
                    }
                },
            )
        };

        let (current_resource, fetched) = tokio::join!(current, fetches);
        let (explicit_records, groups, users, roles, mut inherited) = fetched?;

        // The trail stops above the page, so a reset on the page itself is applied here
        if current_resource.as_ref().map_or(false, |r| r.reset_inheritance) {
            debug!(resource_id = %resource_id, "Page resets inheritance, ancestor grants ignored");
            inherited = EffectiveRoleSet::new();
        }

        debug!(
            explicit = explicit_records.len(),
            inherited_users = inherited.users.len(),
            inherited_groups = inherited.groups.len(),
            "Access data fetched"
        );

        for record in explicit_records.iter().filter(|r| r.has_ambiguous_subject()) {
            warn!(
                resource_id = %record.resource_id,
                user_ref = ?record.user_ref,
                group_ref = ?record.group_ref,
                "Access record has both user and group reference, using user"
            );
        }

        // Before masking: the requester's roles include masked duplicates
        let requesting_user_permissions =
            requester.map(|user_id| RequesterPermissions::compute(user_id, &groups, &explicit_records, &inherited));

        apply_masking(&mut inherited, &groups, &explicit_records, &resource_id);

        Ok(AccessOverview {
            project_id: project_id.to_string(),
            page_id: page_id.to_string(),
            current_resource_id: resource_id,
            current_resource,
            explicit_records,
            groups,
            users,
            roles,
            inherited_roles: inherited,
            requesting_user_permissions,
            resolved_at: Utc::now(),
        })
    }

    /// Ancestor trail to query inherited roles for, if any.
    ///
    /// The overview page and hierarchy roots inherit nothing. A page missing
    /// from the hierarchy yields no trail rather than an error.
    fn inheritance_trail(&self, hierarchy: &Hierarchy, page_id: &str) -> AccessResult<Option<BreadcrumbTrail>> {
        if page_id == self.settings.overview_page_id {
            debug!(page_id, "Overview page does not inherit access");
            return Ok(None);
        }

        match build_breadcrumb_trail(hierarchy, page_id, false, self.settings.scope) {
            Ok(trail) if trail.is_empty() => Ok(None),
            Ok(trail) => Ok(Some(trail)),
            Err(e) if e.is_not_found() => {
                warn!(page_id, error = %e, "Page not in hierarchy, no inherited roles");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAccessControlStore;
    use report_hierarchy::{HierarchyItem, OutputChannel};
    use report_rbac::{AccessRecord, Group, ResourceRecord, Role, Subject, SubjectKind, User};

    fn hierarchy() -> Hierarchy {
        Hierarchy::build(
            "ar2024",
            OutputChannel::pdf("en"),
            HierarchyItem::new("cms-overview", "overview.xml").with_child(
                HierarchyItem::new("a", "a.xml").with_child(HierarchyItem::new("b", "b.xml")),
            ),
        )
        .unwrap()
    }

    fn id(node: &str) -> ResourceId {
        calculate_resource_id(Action::Get, node, "ar2024", ScopeLevel::DEFAULT).unwrap()
    }

    fn store() -> MemoryAccessControlStore {
        MemoryAccessControlStore::new()
            .with_users([User::new("u1"), User::new("u2")])
            .with_groups([Group::new("g", ["u2"])])
            .with_roles([Role::new("viewer"), Role::new("editor")])
    }

    #[tokio::test]
    async fn test_overview_page_skips_effective_roles() {
        let store = Arc::new(store().with_record(AccessRecord::new(id("cms-overview"), Subject::user("u1"), "editor")));
        let resolver = EffectiveAccessResolver::new(store.clone(), ResolverSettings::default());

        let overview = resolver
            .get_access_overview("ar2024", "cms-overview", &hierarchy(), None)
            .await
            .unwrap();

        assert_eq!(overview.explicit_records.len(), 1);
        assert!(overview.inherited_roles.is_empty());
        assert_eq!(store.call_count(StoreOperation::RetrieveEffectiveRoles).await, 0);
    }

    #[tokio::test]
    async fn test_inherited_roles_are_masked_and_requester_sees_all() {
        let store = Arc::new(
            store()
                .with_record(AccessRecord::new(id("a"), Subject::group("g"), "viewer"))
                .with_record(AccessRecord::new(id("a"), Subject::user("u2"), "viewer"))
                .with_record(AccessRecord::new(id("a"), Subject::user("u2"), "editor"))
                .with_record(AccessRecord::new(id("b"), Subject::user("u2"), "editor")),
        );
        let resolver = EffectiveAccessResolver::new(store, ResolverSettings::default());

        let overview = resolver
            .get_access_overview("ar2024", "b", &hierarchy(), Some("u2"))
            .await
            .unwrap();

        assert!(overview.inherited_roles.roles_of(SubjectKind::User, "u2").is_none());
        assert!(overview.inherited_roles.holds(&Subject::group("g"), "viewer"));

        let permissions = overview.requesting_user_permissions.unwrap();
        assert!(permissions.has_role("viewer"));
        assert!(permissions.has_role("editor"));
    }

    #[tokio::test]
    async fn test_page_resetting_inheritance_inherits_nothing() {
        let store = Arc::new(
            store()
                .with_record(AccessRecord::new(id("a"), Subject::user("u1"), "viewer"))
                .with_record(AccessRecord::new(id("b"), Subject::user("u2"), "editor"))
                .with_resource(ResourceRecord {
                    resource_id: id("b"),
                    reset_inheritance: true,
                    persistent: false,
                    description: None,
                }),
        );
        let resolver = EffectiveAccessResolver::new(store, ResolverSettings::default());

        let overview = resolver
            .get_access_overview("ar2024", "b", &hierarchy(), Some("u1"))
            .await
            .unwrap();

        assert!(overview.inherited_roles.is_empty());
        assert_eq!(overview.explicit_records.len(), 1);
        assert!(overview.requesting_user_permissions.unwrap().roles.is_empty());
    }

    #[tokio::test]
    async fn test_page_missing_from_hierarchy_has_no_inheritance() {
        let store = Arc::new(store());
        let resolver = EffectiveAccessResolver::new(store.clone(), ResolverSettings::default());

        let overview = resolver
            .get_access_overview("ar2024", "detached", &hierarchy(), None)
            .await
            .unwrap();

        assert!(overview.inherited_roles.is_empty());
        assert!(overview.current_resource.is_none());
        assert_eq!(store.call_count(StoreOperation::RetrieveEffectiveRoles).await, 0);
    }

    #[tokio::test]
    async fn test_project_mismatch_is_rejected() {
        let resolver = EffectiveAccessResolver::new(Arc::new(store()), ResolverSettings::default());
        let result = resolver.get_access_overview("other", "a", &hierarchy(), None).await;
        assert!(matches!(result, Err(AccessError::Validation(_))));
    }
}
