//! Bulk enable/disable of access records
//!
//! A bulk toggle flips the enabled flag of every access record stored against
//! a structural node (a node with children) of a project, optionally only for
//! one role. Leaf content nodes are never touched. The whole batch is
//! submitted in one store call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use report_hierarchy::{HierarchyForest, HierarchyProvider};
use report_rbac::{AccessRecord, RecordMutation, ResourceId};

use crate::cache::CacheInvalidation;
use crate::error::{AccessError, AccessResult};
use crate::store::{AccessControlStore, StoreOperation};

/// A record left out of a bulk edit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Resource the record is stored against.
    pub resource_id: ResourceId,
    /// Why the record could not be edited.
    pub reason: String,
}

/// Outcome of an applied bulk toggle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkEditResult {
    /// Id of this bulk operation, also present in the logs.
    pub operation_id: Uuid,
    /// Project edited.
    pub project_id: String,
    /// Flag written to every record.
    pub enabled: bool,
    /// Role the edit was restricted to.
    pub role_filter: Option<String>,
    /// Number of records submitted.
    pub count: usize,
    /// Human-readable summary.
    pub message: String,
    /// Records left out because their references could not be resolved.
    pub skipped: Vec<SkippedRecord>,
}

/// Transport shape of a bulk toggle outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkEditResponse {
    /// Whether records were changed.
    pub success: bool,
    /// Number of records changed.
    pub count: usize,
    /// Human-readable summary.
    pub message: String,
}

impl BulkEditResponse {
    /// Convert a bulk outcome.
    ///
    /// "Nothing to do" becomes an unsuccessful response; other errors are
    /// passed through.
    pub fn from_outcome(outcome: AccessResult<BulkEditResult>) -> AccessResult<Self> {
        match outcome {
            Ok(result) => Ok(Self {
                success: true,
                count: result.count,
                message: result.message,
            }),
            Err(AccessError::NothingToDo(message)) => Ok(Self {
                success: false,
                count: 0,
                message,
            }),
            Err(e) => Err(e),
        }
    }
}

/// Applies bulk role toggles.
#[derive(Clone)]
pub struct BulkRbacEditor {
    store: Arc<dyn AccessControlStore>,
    hierarchies: Arc<dyn HierarchyProvider>,
    caches: CacheInvalidation,
}

impl std::fmt::Debug for BulkRbacEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkRbacEditor").finish_non_exhaustive()
    }
}

impl BulkRbacEditor {
    /// Create an editor.
    pub fn new(
        store: Arc<dyn AccessControlStore>,
        hierarchies: Arc<dyn HierarchyProvider>,
        caches: CacheInvalidation,
    ) -> Self {
        Self {
            store,
            hierarchies,
            caches,
        }
    }

    /// Forest of a project, from the cache when present.
    pub async fn forest(&self, project_id: &str) -> AccessResult<Arc<HierarchyForest>> {
        if let Some(forest) = self.caches.overview.get(project_id).await {
            debug!(project_id, "Hierarchy forest served from cache");
            return Ok(forest);
        }

        let forest = Arc::new(self.hierarchies.get_all_hierarchies(project_id).await?);
        self.caches.overview.insert(forest.clone()).await;
        Ok(forest)
    }

    /// Enable or disable every access record on the structural nodes of a project.
    ///
    /// A record matches when its resource id embeds the project and one of the
    /// structural node ids, whatever its action or scope level.
    ///
    /// # Arguments
    ///
    /// * `project_id` - Project to edit
    /// * `role_filter` - Only edit records granting this role
    /// * `enable` - Flag to write
    ///
    /// # Errors
    ///
    /// - [`AccessError::NothingToDo`] if the project has no structural nodes,
    ///   no record matches, or the store reports that nothing changed. The
    ///   store is not written to in the first two cases.
    /// - [`AccessError::StoreFailure`] if listing or editing records fails.
    #[instrument(skip(self), fields(operation_id = tracing::field::Empty))]
    pub async fn apply_bulk_role_toggle(
        &self,
        project_id: &str,
        role_filter: Option<&str>,
        enable: bool,
    ) -> AccessResult<BulkEditResult> {
        let operation_id = Uuid::now_v7();
        tracing::Span::current().record("operation_id", tracing::field::display(operation_id));

        let forest = self.forest(project_id).await?;
        let containers = forest.container_ids();
        if containers.is_empty() {
            return Err(AccessError::NothingToDo(format!(
                "Project {} has no sections with sub-pages to edit",
                project_id
            )));
        }
        debug!(containers = containers.len(), "Collected structural nodes");

        let context = format!("project={} operation={}", project_id, operation_id);
        let records = self
            .store
            .list_access_records(None)
            .await
            .map_err(|e| AccessError::store(StoreOperation::ListAccessRecords, context.clone(), e))?;

        let (mutations, skipped) = Self::collect_mutations(&records, project_id, &containers, role_filter, enable);

        if mutations.is_empty() {
            return Err(AccessError::NothingToDo(match role_filter {
                Some(role) => format!("No {} access records found to update", role),
                None => "No access records found to update".to_string(),
            }));
        }

        let changed = self
            .store
            .edit_access_records(&mutations)
            .await
            .map_err(|e| AccessError::store(StoreOperation::EditAccessRecords, context, e))?;
        if !changed {
            return Err(AccessError::NothingToDo("No access records were changed".to_string()));
        }

        self.caches.clear_all().await;

        let count = mutations.len();
        let message = format!(
            "{} {} access record{}",
            if enable { "Enabled" } else { "Disabled" },
            count,
            if count == 1 { "" } else { "s" }
        );
        info!(%operation_id, count, skipped = skipped.len(), "Bulk role toggle applied");

        Ok(BulkEditResult {
            operation_id,
            project_id: project_id.to_string(),
            enabled: enable,
            role_filter: role_filter.map(str::to_string),
            count,
            message,
            skipped,
        })
    }

    fn collect_mutations(
        records: &[AccessRecord],
        project_id: &str,
        containers: &BTreeSet<String>,
        role_filter: Option<&str>,
        enable: bool,
    ) -> (Vec<RecordMutation>, Vec<SkippedRecord>) {
        let mut mutations = Vec::new();
        let mut skipped = Vec::new();

        for record in records {
            let on_container = record
                .resource_id
                .components()
                .map(|c| c.project_id == project_id && containers.contains(&c.node_id))
                .unwrap_or(false);
            if !on_container {
                continue;
            }

            let role_id = match record.role_id() {
                Ok(role) => role,
                Err(e) => {
                    warn!(resource_id = %record.resource_id, error = %e, "Skipping access record");
                    skipped.push(SkippedRecord {
                        resource_id: record.resource_id.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            if role_filter.map_or(false, |filter| filter != role_id) {
                continue;
            }

            let subject = match record.subject() {
                Ok(subject) => subject,
                Err(e) => {
                    warn!(resource_id = %record.resource_id, error = %e, "Skipping access record");
                    skipped.push(SkippedRecord {
                        resource_id: record.resource_id.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            if record.has_ambiguous_subject() {
                warn!(
                    resource_id = %record.resource_id,
                    user_ref = ?record.user_ref,
                    group_ref = ?record.group_ref,
                    "Access record has both user and group reference, using user"
                );
            }

            mutations.push(RecordMutation {
                resource_id: record.resource_id.clone(),
                subject,
                role_id: role_id.to_string(),
                enabled: enable,
            });
        }

        (mutations, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_from_success() {
        let result = BulkEditResult {
            operation_id: Uuid::now_v7(),
            project_id: "ar2024".to_string(),
            enabled: false,
            role_filter: None,
            count: 3,
            message: "Disabled 3 access records".to_string(),
            skipped: vec![],
        };

        let response = BulkEditResponse::from_outcome(Ok(result)).unwrap();
        assert!(response.success);
        assert_eq!(response.count, 3);
    }

    #[test]
    fn test_response_from_nothing_to_do() {
        let response =
            BulkEditResponse::from_outcome(Err(AccessError::NothingToDo("No access records found".to_string())))
                .unwrap();
        assert!(!response.success);
        assert_eq!(response.count, 0);
        assert_eq!(response.message, "No access records found");
    }

    #[test]
    fn test_response_passes_failures_through() {
        let outcome = Err(AccessError::Validation("bad".to_string()));
        assert!(BulkEditResponse::from_outcome(outcome).is_err());
    }
}
