//! Error types for hierarchy operations

use report_rbac::ResourceIdError;
use thiserror::Error;

/// Hierarchy error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// Node is not part of the hierarchy
    #[error("Node {node_id} not found in project {project_id}")]
    NodeNotFound {
        /// Requested node id.
        node_id: String,
        /// Project searched.
        project_id: String,
    },

    /// No hierarchy exists for the channel
    #[error("No hierarchy for channel {channel} in project {project_id}")]
    HierarchyNotFound {
        /// Project searched.
        project_id: String,
        /// Requested channel, formatted.
        channel: String,
    },

    /// No hierarchies are registered for the project
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// The same node id occurs twice in one tree
    #[error("Duplicate node id in hierarchy: {0}")]
    DuplicateNode(String),

    /// A node has an empty id
    #[error("Hierarchy node without id below {parent}")]
    EmptyNodeId {
        /// Id of the parent node, or "<root>".
        parent: String,
    },

    /// Resource id calculation failed
    #[error("Resource id error: {0}")]
    ResourceId(#[from] ResourceIdError),
}

/// Result type for hierarchy operations.
pub type HierarchyResult<T> = Result<T, HierarchyError>;

impl HierarchyError {
    /// Check if this error means something requested does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            HierarchyError::NodeNotFound { .. }
                | HierarchyError::HierarchyNotFound { .. }
                | HierarchyError::ProjectNotFound(_)
        )
    }
}
