//! # Report RBAC
//!
//! Resource identity and the access-record data model shared by the report
//! access-control crates.
//!
//! ## Overview
//!
//! The report-rbac crate handles:
//! - **Actions**: The closed set of operations a resource id is computed for
//! - **Resources**: Canonical, stable [`ResourceId`] strings
//! - **Subjects**: Users and groups holding role grants, plus the role list
//! - **Records**: Explicit access records, resource records and mutations
//! - **Effective roles**: Per-subject role sets derived from inheritance
//!
//! ## Resource Ids
//!
//! ```text
//! ResourceId = action ":" scope ":" project ":" node
//!
//! Examples:
//!   "get:1:ar2024:cms-overview"        - Overview page of project ar2024
//!   "get:1:ar2024:financial-statements" - A section in the same project
//! ```
//!
//! `:` and `%` inside project and node ids are percent-escaped, so distinct
//! inputs always produce distinct ids and every id can be parsed back.
//!
//! ## Usage
//!
//! ```rust
//! use report_rbac::{calculate_resource_id, Action, ResourceId, ScopeLevel};
//!
//! let id = calculate_resource_id(Action::Get, "notes", "ar2024", ScopeLevel::DEFAULT).unwrap();
//! assert_eq!(id.as_str(), "get:1:ar2024:notes");
//!
//! let parts = id.components().unwrap();
//! assert_eq!(parts.node_id, "notes");
//! ```

pub mod actions;
pub mod effective;
pub mod records;
pub mod resources;
pub mod subjects;

// Re-export main types for convenience
pub use actions::Action;
pub use effective::{EffectiveRoleSet, SubjectRoles};
pub use records::{AccessGrant, AccessRecord, RecordError, RecordMutation, ResourceRecord};
pub use resources::{calculate_resource_id, ResourceComponents, ResourceId, ResourceIdError, ScopeLevel};
pub use subjects::{Group, Role, Subject, SubjectKind, User};
