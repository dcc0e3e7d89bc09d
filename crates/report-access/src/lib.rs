//! # Report Access
//!
//! Effective access resolution for report content hierarchies: which users
//! and groups hold which roles on a section, explicitly or by inheritance,
//! with redundant inherited entries masked before they reach the UI.
//!
//! ## Overview
//!
//! The report-access crate handles:
//! - **Store**: The [`AccessControlStore`] interface, an HTTP client and an
//!   in-memory implementation
//! - **Resolver**: [`EffectiveAccessResolver`] assembling an [`AccessOverview`]
//! - **Masking**: Group collapse and explicit-override hiding
//! - **Bulk edits**: [`BulkRbacEditor`] toggling many grants in one batch
//! - **Caches**: [`CacheInvalidation`] over the overview and section-info caches
//! - **Service**: [`AccessService`], the facade callers use
//!
//! ## Resolution Flow
//!
//! ```text
//! page id ─→ ResourceId
//!   ├─ current resource record   (not found ⇒ empty section)
//!   ├─ explicit records          ┐
//!   ├─ users / groups / roles    ├─ fetched concurrently
//!   └─ breadcrumb trail ─→ effective roles per subject ┘
//!        │
//!        ├─ pass A: drop user roles duplicated by one of their groups
//!        ├─ pass B: hide inherited pairs explicitly granted on this resource
//!        └─ drop subjects without roles
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use report_access::{AccessService, CacheInvalidation, HttpAccessControlStore, OverviewQuery, StoreConfig};
//! use report_hierarchy::{MemoryHierarchyProvider, OutputChannel};
//! use std::sync::Arc;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig::from_env();
//!     let store = Arc::new(HttpAccessControlStore::from_config(&config)?);
//!     let hierarchies = Arc::new(MemoryHierarchyProvider::new());
//!
//!     let service = AccessService::new(store, hierarchies, CacheInvalidation::in_memory(), config.resolver_settings());
//!     let query = OverviewQuery::new("ar2024", "notes", OutputChannel::pdf("en")).with_requester("u1");
//!     let overview = service.access_overview(&query).await?;
//!     println!("{} inherited user entries", overview.inherited_roles.users.len());
//!     Ok(())
//! }
//! ```

pub mod bulk;
pub mod cache;
pub mod config;
pub mod error;
pub mod masking;
pub mod overview;
pub mod resolver;
pub mod retry;
pub mod service;
pub mod store;

// Re-export main types
pub use bulk::{BulkEditResponse, BulkEditResult, BulkRbacEditor, SkippedRecord};
pub use cache::{
    CacheInvalidation, MemoryOverviewCache, MemorySectionInfoCache, OverviewCache, SectionInfoCache, SectionKey,
};
pub use config::{StoreConfig, StoreEndpoint};
pub use error::{AccessError, AccessResult};
pub use overview::{AccessOverview, RequesterPermissions};
pub use resolver::{EffectiveAccessResolver, ResolverSettings};
pub use retry::{with_retry_if, RetryConfig};
pub use service::{AccessService, AddAccessRequest, GrantScope, OverviewQuery};
pub use store::{
    AccessControlStore, HttpAccessControlStore, MemoryAccessControlStore, StoreError, StoreOperation, StoreResult,
};
