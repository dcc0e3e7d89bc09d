//! # Report Hierarchy
//!
//! Typed content hierarchies for report projects and the walks the
//! access-control layer performs over them.
//!
//! ## Overview
//!
//! The report-hierarchy crate handles:
//! - **Output channels**: PDF, website, XBRL... renditions in a given language
//! - **Hierarchies**: One explicit node tree per output channel
//! - **Forests**: All hierarchies of a project
//! - **Walker**: Breadcrumb trails and resource-equivalent nodes
//! - **Provider**: The interface to the hierarchy store
//!
//! ## Architecture
//!
//! ```text
//! HierarchyForest (project)
//!   ├─ Hierarchy (pdf / en)
//!   │    └─ HierarchyNode ─ data_ref ─┐
//!   └─ Hierarchy (website / en)       │ same content
//!        └─ HierarchyNode ─ data_ref ─┘
//! ```
//!
//! Nodes live in an arena owned by their [`Hierarchy`]; parent links are plain
//! indices, so the tree has no reference cycles.
//!
//! ## Usage
//!
//! ```rust
//! use report_hierarchy::{build_breadcrumb_trail, Hierarchy, HierarchyItem, OutputChannel};
//! use report_rbac::ScopeLevel;
//!
//! let root = HierarchyItem::new("report", "report.xml")
//!     .with_child(HierarchyItem::new("notes", "notes.xml")
//!         .with_child(HierarchyItem::new("note-1", "note-1.xml")));
//! let tree = Hierarchy::build("ar2024", OutputChannel::pdf("en"), root).unwrap();
//!
//! let trail = build_breadcrumb_trail(&tree, "note-1", false, ScopeLevel::DEFAULT).unwrap();
//! assert_eq!(trail.len(), 2);
//! ```

pub mod channel;
pub mod error;
pub mod forest;
pub mod node;
pub mod provider;
pub mod walker;

// Re-export main types for convenience
pub use channel::{ChannelType, OutputChannel};
pub use error::{HierarchyError, HierarchyResult};
pub use forest::HierarchyForest;
pub use node::{Hierarchy, HierarchyDocument, HierarchyItem, HierarchyNode};
pub use provider::{HierarchyProvider, MemoryHierarchyProvider};
pub use walker::{build_breadcrumb_trail, find_equivalent_resource_ids, BreadcrumbTrail};
