//! Hierarchy provider
//!
//! The interface to the content hierarchy store, plus an in-memory
//! implementation for single-process deployments and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::channel::OutputChannel;
use crate::error::{HierarchyError, HierarchyResult};
use crate::forest::HierarchyForest;
use crate::node::Hierarchy;

/// Source of project hierarchies.
#[async_trait]
pub trait HierarchyProvider: Send + Sync {
    /// Get the hierarchy of one output channel.
    async fn get_hierarchy(&self, project_id: &str, channel: &OutputChannel) -> HierarchyResult<Hierarchy>;

    /// Get the hierarchies of every output channel of a project.
    async fn get_all_hierarchies(&self, project_id: &str) -> HierarchyResult<HierarchyForest>;
}

/// In-memory hierarchy provider.
///
/// Forests are registered per project. The provider counts forest loads so
/// callers can verify cache reuse.
#[derive(Default)]
pub struct MemoryHierarchyProvider {
    /// Registered forests by project id
    forests: Arc<RwLock<HashMap<String, HierarchyForest>>>,
    /// Number of `get_all_hierarchies` calls served
    forest_loads: AtomicU64,
}

impl std::fmt::Debug for MemoryHierarchyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryHierarchyProvider")
            .field("forest_loads", &self.forest_loads.load(Ordering::Relaxed))
            .finish()
    }
}

impl MemoryHierarchyProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the forest of a project.
    pub async fn insert(&self, forest: HierarchyForest) {
        let mut forests = self.forests.write().await;
        forests.insert(forest.project_id().to_string(), forest);
    }

    /// Number of forest loads served so far.
    pub fn forest_loads(&self) -> u64 {
        self.forest_loads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl HierarchyProvider for MemoryHierarchyProvider {
    async fn get_hierarchy(&self, project_id: &str, channel: &OutputChannel) -> HierarchyResult<Hierarchy> {
        let forests = self.forests.read().await;
        let forest = forests
            .get(project_id)
            .ok_or_else(|| HierarchyError::ProjectNotFound(project_id.to_string()))?;

        forest.hierarchy(channel).cloned()
    }

    async fn get_all_hierarchies(&self, project_id: &str) -> HierarchyResult<HierarchyForest> {
        self.forest_loads.fetch_add(1, Ordering::Relaxed);
        debug!(project_id, "Loading hierarchy forest");

        let forests = self.forests.read().await;
        forests
            .get(project_id)
            .cloned()
            .ok_or_else(|| HierarchyError::ProjectNotFound(project_id.to_string()))
    }
}
