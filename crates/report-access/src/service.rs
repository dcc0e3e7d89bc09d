//! Access service
//!
//! The facade callers use: cached overviews, single-record edits and bulk
//! toggles. Every successful or attempted write clears both caches and, for
//! single-record edits, returns the re-resolved overview of the page.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use report_hierarchy::{find_equivalent_resource_ids, Hierarchy, HierarchyProvider, OutputChannel};
use report_rbac::{AccessGrant, RecordMutation, ResourceId, Subject};

use crate::bulk::{BulkEditResult, BulkRbacEditor};
use crate::cache::{CacheInvalidation, SectionKey};
use crate::error::{AccessError, AccessResult};
use crate::overview::AccessOverview;
use crate::resolver::{EffectiveAccessResolver, ResolverSettings};
use crate::store::{AccessControlStore, StoreOperation};

/// Which resources a new grant is written to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GrantScope {
    /// Only the page itself.
    #[default]
    ThisNode,
    /// The page and every rendition of its content in other output channels.
    AllChannels,
    /// Like `AllChannels`, restricted to the page's language.
    AllChannelsSameLanguage,
}

/// A page in one output channel, as seen by one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverviewQuery {
    /// Project id.
    pub project_id: String,
    /// Page id.
    pub page_id: String,
    /// Output channel whose hierarchy the page is resolved in.
    pub channel: OutputChannel,
    /// Requesting user.
    pub requester: Option<String>,
}

impl OverviewQuery {
    /// Create an anonymous query.
    pub fn new(project_id: impl Into<String>, page_id: impl Into<String>, channel: OutputChannel) -> Self {
        Self {
            project_id: project_id.into(),
            page_id: page_id.into(),
            channel,
            requester: None,
        }
    }

    /// Report the roles of this user in the overview.
    pub fn with_requester(mut self, user_id: impl Into<String>) -> Self {
        self.requester = Some(user_id.into());
        self
    }

    fn section_key(&self) -> SectionKey {
        SectionKey::new(self.requester.as_deref(), &self.project_id, &self.page_id, &self.channel)
    }
}

/// A grant to add.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddAccessRequest {
    /// Subject receiving the role.
    pub subject: Subject,
    /// Role to grant.
    pub role_id: String,
    /// Whether the grant starts enabled.
    pub enabled: bool,
    /// Ask the store to cut inheritance at the granted resources.
    pub reset_inheritance: bool,
    /// Resources to write the grant to.
    pub scope: GrantScope,
}

impl AddAccessRequest {
    /// An enabled grant on the page only.
    pub fn new(subject: Subject, role_id: impl Into<String>) -> Self {
        Self {
            subject,
            role_id: role_id.into(),
            enabled: true,
            reset_inheritance: false,
            scope: GrantScope::ThisNode,
        }
    }

    /// Set the grant scope.
    pub fn with_scope(mut self, scope: GrantScope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the initial enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Cut inheritance at the granted resources.
    pub fn with_reset_inheritance(mut self, reset_inheritance: bool) -> Self {
        self.reset_inheritance = reset_inheritance;
        self
    }
}

/// Access service.
#[derive(Clone)]
pub struct AccessService {
    store: Arc<dyn AccessControlStore>,
    hierarchies: Arc<dyn HierarchyProvider>,
    caches: CacheInvalidation,
    resolver: EffectiveAccessResolver,
    bulk: BulkRbacEditor,
}

impl std::fmt::Debug for AccessService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessService")
            .field("resolver", &self.resolver)
            .field("bulk", &self.bulk)
            .finish_non_exhaustive()
    }
}

impl AccessService {
    /// Create a service.
    pub fn new(
        store: Arc<dyn AccessControlStore>,
        hierarchies: Arc<dyn HierarchyProvider>,
        caches: CacheInvalidation,
        settings: ResolverSettings,
    ) -> Self {
        let bulk = BulkRbacEditor::new(store.clone(), hierarchies.clone(), caches.clone());
        let resolver = EffectiveAccessResolver::new(store.clone(), settings);

        Self {
            store,
            hierarchies,
            caches,
            resolver,
            bulk,
        }
    }

    /// The caches used by this service.
    pub fn caches(&self) -> &CacheInvalidation {
        &self.caches
    }

    /// Hierarchy of one channel, from the forest cache when present.
    async fn hierarchy(&self, project_id: &str, channel: &OutputChannel) -> AccessResult<Hierarchy> {
        if let Some(forest) = self.caches.overview.get(project_id).await {
            return Ok(forest.hierarchy(channel)?.clone());
        }
        Ok(self.hierarchies.get_hierarchy(project_id, channel).await?)
    }

    /// Access overview of a page, from the section-info cache when present.
    #[instrument(skip(self, query), fields(project_id = %query.project_id, page_id = %query.page_id))]
    pub async fn access_overview(&self, query: &OverviewQuery) -> AccessResult<Arc<AccessOverview>> {
        let key = query.section_key();
        if let Some(overview) = self.caches.section_info.get(&key).await {
            debug!("Access overview served from cache");
            return Ok(overview);
        }

        let hierarchy = self.hierarchy(&query.project_id, &query.channel).await?;
        let overview = Arc::new(
            self.resolver
                .get_access_overview(
                    &query.project_id,
                    &query.page_id,
                    &hierarchy,
                    query.requester.as_deref(),
                )
                .await?,
        );

        self.caches.section_info.insert(key, overview.clone()).await;
        Ok(overview)
    }

    /// Resources a grant on the queried page is written to.
    async fn grant_targets(&self, query: &OverviewQuery, scope: GrantScope) -> AccessResult<BTreeSet<ResourceId>> {
        let own = self.resolver.resource_id(&query.project_id, &query.page_id)?;

        let only_same_language = match scope {
            GrantScope::ThisNode => return Ok(BTreeSet::from([own])),
            GrantScope::AllChannels => false,
            GrantScope::AllChannelsSameLanguage => true,
        };

        let forest = self.bulk.forest(&query.project_id).await?;
        let hierarchy = forest.hierarchy(&query.channel)?;
        let data_ref = hierarchy.require(&query.page_id)?.data_ref();

        let mut targets = find_equivalent_resource_ids(
            &forest,
            &query.channel,
            &query.page_id,
            data_ref,
            only_same_language,
            self.resolver.settings().scope,
        )?;
        targets.insert(own);
        Ok(targets)
    }

    /// Clear the caches and re-resolve the page after a write.
    async fn after_write(&self, query: &OverviewQuery, changed: bool) -> AccessResult<Arc<AccessOverview>> {
        self.caches.clear_all().await;

        if !changed {
            return Err(AccessError::NothingToDo("No access records were changed".to_string()));
        }
        self.access_overview(query).await
    }

    /// Grant a role on the page, and optionally on its other renditions.
    #[instrument(skip(self, query, request), fields(project_id = %query.project_id, page_id = %query.page_id, subject = %request.subject, role = %request.role_id))]
    pub async fn add_access(&self, query: &OverviewQuery, request: AddAccessRequest) -> AccessResult<Arc<AccessOverview>> {
        let targets = self.grant_targets(query, request.scope).await?;
        debug!(targets = targets.len(), scope = ?request.scope, "Adding access");

        let mut changed = false;
        let mut result = Ok(());
        for resource_id in targets {
            let grant = AccessGrant {
                resource_id,
                subject: request.subject.clone(),
                role_id: request.role_id.clone(),
                enabled: request.enabled,
                reset_inheritance: request.reset_inheritance,
            };

            match self.store.add_access_record(&grant).await {
                Ok(added) => changed |= added,
                Err(e) => {
                    let context = format!("project={} page={} resource={}", query.project_id, query.page_id, grant.resource_id);
                    result = Err(AccessError::store(StoreOperation::AddAccessRecord, context, e));
                    break;
                }
            }
        }

        if let Err(e) = result {
            // Earlier targets may already be written
            self.caches.clear_all().await;
            return Err(e);
        }

        info!(changed, "Access added");
        self.after_write(query, changed).await
    }

    /// Enable or disable a grant on the page.
    #[instrument(skip(self, query), fields(project_id = %query.project_id, page_id = %query.page_id))]
    pub async fn edit_access(
        &self,
        query: &OverviewQuery,
        subject: Subject,
        role_id: &str,
        enabled: bool,
    ) -> AccessResult<Arc<AccessOverview>> {
        let resource_id = self.resolver.resource_id(&query.project_id, &query.page_id)?;
        let context = format!("project={} page={} resource={}", query.project_id, query.page_id, resource_id);
        let mutation = RecordMutation {
            resource_id,
            subject,
            role_id: role_id.to_string(),
            enabled,
        };

        let changed = self
            .store
            .edit_access_records(std::slice::from_ref(&mutation))
            .await
            .map_err(|e| AccessError::store(StoreOperation::EditAccessRecords, context, e))?;

        info!(changed, "Access edited");
        self.after_write(query, changed).await
    }

    /// Delete a grant on the page.
    #[instrument(skip(self, query), fields(project_id = %query.project_id, page_id = %query.page_id))]
    pub async fn remove_access(
        &self,
        query: &OverviewQuery,
        subject: &Subject,
        role_id: &str,
    ) -> AccessResult<Arc<AccessOverview>> {
        let resource_id = self.resolver.resource_id(&query.project_id, &query.page_id)?;
        let changed = self
            .store
            .delete_access_record(&resource_id, subject, role_id)
            .await
            .map_err(|e| {
                let context = format!("project={} page={} resource={}", query.project_id, query.page_id, resource_id);
                AccessError::store(StoreOperation::DeleteAccessRecord, context, e)
            })?;

        info!(changed, "Access removed");
        self.after_write(query, changed).await
    }

    /// Change the inheritance and persistence flags of the page's resource.
    #[instrument(skip(self, query), fields(project_id = %query.project_id, page_id = %query.page_id))]
    pub async fn edit_resource(
        &self,
        query: &OverviewQuery,
        reset_inheritance: bool,
        is_persistent: bool,
    ) -> AccessResult<Arc<AccessOverview>> {
        let resource_id = self.resolver.resource_id(&query.project_id, &query.page_id)?;
        let changed = self
            .store
            .edit_resource(&resource_id, reset_inheritance, is_persistent)
            .await
            .map_err(|e| {
                let context = format!("project={} page={} resource={}", query.project_id, query.page_id, resource_id);
                AccessError::store(StoreOperation::EditResource, context, e)
            })?;

        info!(changed, "Resource edited");
        self.after_write(query, changed).await
    }

    /// Enable or disable every grant on the structural nodes of a project.
    pub async fn apply_bulk_role_toggle(
        &self,
        project_id: &str,
        role_filter: Option<&str>,
        enable: bool,
    ) -> AccessResult<BulkEditResult> {
        self.bulk.apply_bulk_role_toggle(project_id, role_filter, enable).await
    }

    /// Forget the cached hierarchies of a project after its structure changed.
    pub async fn invalidate_hierarchies(&self, project_id: &str) {
        self.caches.overview.clear_scope(project_id).await;
        self.caches.section_info.clear().await;
        info!(project_id, "Hierarchy caches cleared");
    }
}
