//! In-memory access-control store.
//!
//! Keeps records, resources and subjects in process. Useful for single-node
//! deployments and tests: it counts calls per operation and can be told to
//! fail specific operations.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use report_hierarchy::BreadcrumbTrail;
use report_rbac::{
    AccessGrant, AccessRecord, EffectiveRoleSet, Group, RecordMutation, ResourceId, ResourceRecord, Role, Subject,
    SubjectRoles, User,
};

use super::{AccessControlStore, StoreError, StoreOperation, StoreResult};

#[derive(Debug, Default)]
struct StoreState {
    records: Vec<AccessRecord>,
    resources: HashMap<ResourceId, ResourceRecord>,
    users: Vec<User>,
    groups: Vec<Group>,
    roles: Vec<Role>,
    failing: HashSet<StoreOperation>,
    calls: HashMap<StoreOperation, u64>,
}

/// In-memory access-control store.
#[derive(Debug, Default)]
pub struct MemoryAccessControlStore {
    state: RwLock<StoreState>,
    writes: AtomicU64,
}

impl MemoryAccessControlStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self) -> &mut StoreState {
        self.state.get_mut()
    }

    /// Register users.
    pub fn with_users<I: IntoIterator<Item = User>>(mut self, users: I) -> Self {
        self.state_mut().users.extend(users);
        self
    }

    /// Register groups.
    pub fn with_groups<I: IntoIterator<Item = Group>>(mut self, groups: I) -> Self {
        self.state_mut().groups.extend(groups);
        self
    }

    /// Register roles.
    pub fn with_roles<I: IntoIterator<Item = Role>>(mut self, roles: I) -> Self {
        self.state_mut().roles.extend(roles);
        self
    }

    /// Add a stored access record.
    pub fn with_record(mut self, record: AccessRecord) -> Self {
        self.state_mut().records.push(record);
        self
    }

    /// Register a resource record.
    pub fn with_resource(mut self, resource: ResourceRecord) -> Self {
        self.state_mut()
            .resources
            .insert(resource.resource_id.clone(), resource);
        self
    }

    /// Make every call of an operation fail with [`StoreError::Unavailable`].
    pub async fn fail_on(&self, operation: StoreOperation) {
        self.state.write().await.failing.insert(operation);
    }

    /// Stop failing an operation.
    pub async fn recover(&self, operation: StoreOperation) {
        self.state.write().await.failing.remove(&operation);
    }

    /// Snapshot of the stored access records.
    pub async fn records(&self) -> Vec<AccessRecord> {
        self.state.read().await.records.clone()
    }

    /// Number of calls of one operation served so far (failed ones included).
    pub async fn call_count(&self, operation: StoreOperation) -> u64 {
        self.state.read().await.calls.get(&operation).copied().unwrap_or(0)
    }

    /// Number of mutating calls served so far (failed ones included).
    pub fn write_calls(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Log the call and apply failure injection.
    async fn enter(&self, operation: StoreOperation) -> StoreResult<()> {
        if operation.is_write() {
            self.writes.fetch_add(1, Ordering::Relaxed);
        }

        let mut state = self.state.write().await;
        *state.calls.entry(operation).or_insert(0) += 1;

        if state.failing.contains(&operation) {
            debug!(%operation, "Injected store failure");
            return Err(StoreError::Unavailable(format!("{} is failing", operation)));
        }
        Ok(())
    }
}

/// Merge the enabled grants of the records into per-subject role lists.
fn merge_roles<'a, I>(records: I) -> EffectiveRoleSet
where
    I: IntoIterator<Item = &'a AccessRecord>,
{
    let mut set = EffectiveRoleSet::new();

    for record in records.into_iter().filter(|r| r.enabled) {
        let (Ok(subject), Ok(role)) = (record.subject(), record.role_id()) else {
            continue;
        };

        let entries = match subject {
            Subject::User(_) => &mut set.users,
            Subject::Group(_) => &mut set.groups,
        };

        match entries.iter_mut().find(|e| e.id == subject.id()) {
            Some(entry) if entry.has_role(role) => {}
            Some(entry) => entry.roles.push(role.to_string()),
            None => entries.push(SubjectRoles::new(subject.id(), [role])),
        }
    }

    set
}

#[async_trait]
impl AccessControlStore for MemoryAccessControlStore {
    async fn list_access_records(&self, resource_id: Option<&ResourceId>) -> StoreResult<Vec<AccessRecord>> {
        self.enter(StoreOperation::ListAccessRecords).await?;

        let state = self.state.read().await;
        Ok(state
            .records
            .iter()
            .filter(|r| resource_id.map_or(true, |id| &r.resource_id == id))
            .cloned()
            .collect())
    }

    async fn retrieve_resource(&self, resource_id: &ResourceId, strict: bool) -> StoreResult<Option<ResourceRecord>> {
        self.enter(StoreOperation::RetrieveResource).await?;

        let state = self.state.read().await;
        if let Some(resource) = state.resources.get(resource_id) {
            return Ok(Some(resource.clone()));
        }

        // Implicit resource: known only through its grants
        if !strict && state.records.iter().any(|r| &r.resource_id == resource_id) {
            return Ok(Some(ResourceRecord {
                resource_id: resource_id.clone(),
                reset_inheritance: false,
                persistent: false,
                description: None,
            }));
        }

        Ok(None)
    }

    async fn list_groups(&self) -> StoreResult<Vec<Group>> {
        self.enter(StoreOperation::ListGroups).await?;
        Ok(self.state.read().await.groups.clone())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.enter(StoreOperation::ListUsers).await?;
        Ok(self.state.read().await.users.clone())
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        self.enter(StoreOperation::ListRoles).await?;
        Ok(self.state.read().await.roles.clone())
    }

    async fn retrieve_effective_roles(&self, trail: &BreadcrumbTrail) -> StoreResult<EffectiveRoleSet> {
        self.enter(StoreOperation::RetrieveEffectiveRoles).await?;

        let state = self.state.read().await;
        let ids = trail.as_slice();

        // Inheritance is cut at the nearest ancestor that resets it
        let start = ids
            .iter()
            .rposition(|id| state.resources.get(id).map_or(false, |r| r.reset_inheritance))
            .unwrap_or(0);
        let window = &ids[start..];

        let records = window
            .iter()
            .flat_map(|id| state.records.iter().filter(move |r| &r.resource_id == id));

        Ok(merge_roles(records))
    }

    async fn add_access_record(&self, grant: &AccessGrant) -> StoreResult<bool> {
        self.enter(StoreOperation::AddAccessRecord).await?;

        let mut state = self.state.write().await;
        let exists = state
            .records
            .iter()
            .any(|r| r.resource_id == grant.resource_id && r.grants(&grant.subject, &grant.role_id));
        if exists {
            return Ok(false);
        }

        state.records.push(
            AccessRecord::new(grant.resource_id.clone(), grant.subject.clone(), grant.role_id.clone())
                .with_enabled(grant.enabled),
        );

        if grant.reset_inheritance {
            state
                .resources
                .entry(grant.resource_id.clone())
                .or_insert_with(|| ResourceRecord {
                    resource_id: grant.resource_id.clone(),
                    reset_inheritance: false,
                    persistent: false,
                    description: None,
                })
                .reset_inheritance = true;
        }

        Ok(true)
    }

    async fn edit_access_records(&self, mutations: &[RecordMutation]) -> StoreResult<bool> {
        self.enter(StoreOperation::EditAccessRecords).await?;

        let mut state = self.state.write().await;
        let mut matched = false;

        for mutation in mutations {
            for record in state
                .records
                .iter_mut()
                .filter(|r| r.resource_id == mutation.resource_id && r.grants(&mutation.subject, &mutation.role_id))
            {
                record.enabled = mutation.enabled;
                matched = true;
            }
        }

        Ok(matched)
    }

    async fn delete_access_record(
        &self,
        resource_id: &ResourceId,
        subject: &Subject,
        role_id: &str,
    ) -> StoreResult<bool> {
        self.enter(StoreOperation::DeleteAccessRecord).await?;

        let mut state = self.state.write().await;
        let before = state.records.len();
        state
            .records
            .retain(|r| !(&r.resource_id == resource_id && r.grants(subject, role_id)));

        Ok(state.records.len() != before)
    }

    async fn edit_resource(
        &self,
        resource_id: &ResourceId,
        reset_inheritance: bool,
        is_persistent: bool,
    ) -> StoreResult<bool> {
        self.enter(StoreOperation::EditResource).await?;

        let mut state = self.state.write().await;
        let resource = state
            .resources
            .entry(resource_id.clone())
            .or_insert_with(|| ResourceRecord {
                resource_id: resource_id.clone(),
                reset_inheritance: false,
                persistent: false,
                description: None,
            });
        resource.reset_inheritance = reset_inheritance;
        resource.persistent = is_persistent;

        Ok(true)
    }
}
