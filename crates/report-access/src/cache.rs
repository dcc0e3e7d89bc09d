//! Overview and section-info caches
//!
//! Two caches sit in front of the store and the hierarchy provider:
//!
//! - [`OverviewCache`]: hierarchy forests per project
//! - [`SectionInfoCache`]: computed access overviews per user and section
//!
//! Both are injected through [`CacheInvalidation`]; any access-record
//! mutation clears both of them completely before the next read.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use report_hierarchy::{HierarchyForest, OutputChannel};

use crate::overview::AccessOverview;

/// Cache of hierarchy forests by project id.
#[async_trait]
pub trait OverviewCache: Send + Sync {
    /// Cached forest of a project.
    async fn get(&self, project_id: &str) -> Option<Arc<HierarchyForest>>;

    /// Store the forest of a project.
    async fn insert(&self, forest: Arc<HierarchyForest>);

    /// Drop the entries of one project.
    async fn clear_scope(&self, project_id: &str);

    /// Drop everything.
    async fn clear_all(&self);
}

/// Cache key of a computed overview.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SectionKey {
    /// Requesting user, if any.
    pub user_id: Option<String>,
    /// Project id.
    pub project_id: String,
    /// Page id.
    pub page_id: String,
    /// Output channel whose hierarchy the overview was resolved in.
    pub channel: OutputChannel,
}

impl SectionKey {
    /// Create a key.
    pub fn new(user_id: Option<&str>, project_id: &str, page_id: &str, channel: &OutputChannel) -> Self {
        Self {
            user_id: user_id.map(str::to_string),
            project_id: project_id.to_string(),
            page_id: page_id.to_string(),
            channel: channel.clone(),
        }
    }
}

/// Cache of computed access overviews.
#[async_trait]
pub trait SectionInfoCache: Send + Sync {
    /// Cached overview.
    async fn get(&self, key: &SectionKey) -> Option<Arc<AccessOverview>>;

    /// Store an overview.
    async fn insert(&self, key: SectionKey, overview: Arc<AccessOverview>);

    /// Drop everything.
    async fn clear(&self);
}

/// In-memory forest cache.
#[derive(Debug, Default)]
pub struct MemoryOverviewCache {
    entries: Arc<RwLock<HashMap<String, Arc<HierarchyForest>>>>,
}

impl MemoryOverviewCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached forests.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl OverviewCache for MemoryOverviewCache {
    async fn get(&self, project_id: &str) -> Option<Arc<HierarchyForest>> {
        self.entries.read().await.get(project_id).cloned()
    }

    async fn insert(&self, forest: Arc<HierarchyForest>) {
        let mut entries = self.entries.write().await;
        entries.insert(forest.project_id().to_string(), forest);
    }

    async fn clear_scope(&self, project_id: &str) {
        self.entries.write().await.remove(project_id);
    }

    async fn clear_all(&self) {
        self.entries.write().await.clear();
    }
}

/// In-memory overview cache.
#[derive(Debug, Default)]
pub struct MemorySectionInfoCache {
    entries: Arc<RwLock<HashMap<SectionKey, Arc<AccessOverview>>>>,
}

impl MemorySectionInfoCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached overviews.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SectionInfoCache for MemorySectionInfoCache {
    async fn get(&self, key: &SectionKey) -> Option<Arc<AccessOverview>> {
        self.entries.read().await.get(key).cloned()
    }

    async fn insert(&self, key: SectionKey, overview: Arc<AccessOverview>) {
        self.entries.write().await.insert(key, overview);
    }

    async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

/// Handles to both caches.
#[derive(Clone)]
pub struct CacheInvalidation {
    /// Forest cache.
    pub overview: Arc<dyn OverviewCache>,
    /// Overview cache.
    pub section_info: Arc<dyn SectionInfoCache>,
}

impl std::fmt::Debug for CacheInvalidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheInvalidation").finish_non_exhaustive()
    }
}

impl CacheInvalidation {
    /// Wrap existing caches.
    pub fn new(overview: Arc<dyn OverviewCache>, section_info: Arc<dyn SectionInfoCache>) -> Self {
        Self { overview, section_info }
    }

    /// Fresh in-memory caches.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryOverviewCache::new()),
            Arc::new(MemorySectionInfoCache::new()),
        )
    }

    /// Clear both caches completely.
    pub async fn clear_all(&self) {
        self.overview.clear_all().await;
        self.section_info.clear().await;
        info!("Access caches cleared");
    }
}
