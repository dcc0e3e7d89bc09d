//! Hierarchy trees
//!
//! A [`Hierarchy`] is the explicit node tree of one output channel. It is built
//! from the nested [`HierarchyItem`] shape the hierarchy store delivers and
//! flattened into an arena, so ancestors and children are index lookups.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::channel::OutputChannel;
use crate::error::{HierarchyError, HierarchyResult};

/// Nested hierarchy item as delivered by the hierarchy store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HierarchyItem {
    /// Node id (unique within its hierarchy).
    pub id: String,

    /// Reference to the content document rendered at this node.
    pub data_ref: String,

    /// Section title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Child items, in document order.
    #[serde(default)]
    pub children: Vec<HierarchyItem>,
}

impl HierarchyItem {
    /// Create a leaf item.
    pub fn new(id: impl Into<String>, data_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data_ref: data_ref.into(),
            title: None,
            children: Vec::new(),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append a child item.
    pub fn with_child(mut self, child: HierarchyItem) -> Self {
        self.children.push(child);
        self
    }
}

/// A node inside a [`Hierarchy`].
///
/// The parent link is an index into the owning hierarchy and never keeps the
/// parent alive on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyNode {
    id: String,
    data_ref: String,
    title: Option<String>,
    parent: Option<usize>,
    children: Vec<usize>,
    depth: usize,
}

impl HierarchyNode {
    /// Node id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Content reference.
    pub fn data_ref(&self) -> &str {
        &self.data_ref
    }

    /// Section title, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Distance from the root (the root has depth 0).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether the node is a structural container.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Whether the node is the hierarchy root.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// The node tree of one output channel in a project.
///
/// # Examples
///
/// ```
/// use report_hierarchy::{Hierarchy, HierarchyItem, OutputChannel};
///
/// let root = HierarchyItem::new("report", "report.xml")
///     .with_child(HierarchyItem::new("intro", "intro.xml"));
/// let tree = Hierarchy::build("ar2024", OutputChannel::website("en"), root).unwrap();
///
/// assert_eq!(tree.len(), 2);
/// assert_eq!(tree.node("intro").unwrap().depth(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Hierarchy {
    project_id: String,
    channel: OutputChannel,
    nodes: Vec<HierarchyNode>,
    index: HashMap<String, usize>,
}

impl Hierarchy {
    /// Build a hierarchy from its nested representation.
    ///
    /// # Errors
    ///
    /// - [`HierarchyError::EmptyNodeId`] if any item has an empty id
    /// - [`HierarchyError::DuplicateNode`] if an id occurs twice
    pub fn build(
        project_id: impl Into<String>,
        channel: OutputChannel,
        root: HierarchyItem,
    ) -> HierarchyResult<Self> {
        let mut nodes: Vec<HierarchyNode> = Vec::new();
        let mut index = HashMap::new();

        // Depth-first, children pushed in reverse to keep document order
        let mut stack: Vec<(HierarchyItem, Option<usize>)> = vec![(root, None)];

        while let Some((item, parent)) = stack.pop() {
            if item.id.is_empty() {
                let parent = parent
                    .map(|p| nodes[p].id.clone())
                    .unwrap_or_else(|| "<root>".to_string());
                return Err(HierarchyError::EmptyNodeId { parent });
            }
            if index.contains_key(&item.id) {
                return Err(HierarchyError::DuplicateNode(item.id));
            }

            let position = nodes.len();
            let depth = parent.map(|p| nodes[p].depth + 1).unwrap_or(0);
            if let Some(p) = parent {
                nodes[p].children.push(position);
            }

            let HierarchyItem {
                id,
                data_ref,
                title,
                children,
            } = item;

            index.insert(id.clone(), position);
            nodes.push(HierarchyNode {
                id,
                data_ref,
                title,
                parent,
                children: Vec::with_capacity(children.len()),
                depth,
            });

            for child in children.into_iter().rev() {
                stack.push((child, Some(position)));
            }
        }

        Ok(Self {
            project_id: project_id.into(),
            channel,
            nodes,
            index,
        })
    }

    /// Project this hierarchy belongs to.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Output channel context.
    pub fn channel(&self) -> &OutputChannel {
        &self.channel
    }

    /// The root node.
    pub fn root(&self) -> &HierarchyNode {
        // build() always creates the root first
        &self.nodes[0]
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a hierarchy has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check whether a node id is part of this hierarchy.
    pub fn contains(&self, node_id: &str) -> bool {
        self.index.contains_key(node_id)
    }

    /// Look up a node by id.
    pub fn node(&self, node_id: &str) -> Option<&HierarchyNode> {
        self.index.get(node_id).map(|&i| &self.nodes[i])
    }

    /// Look up a node by id, failing with [`HierarchyError::NodeNotFound`].
    pub fn require(&self, node_id: &str) -> HierarchyResult<&HierarchyNode> {
        self.node(node_id).ok_or_else(|| HierarchyError::NodeNotFound {
            node_id: node_id.to_string(),
            project_id: self.project_id.clone(),
        })
    }

    /// Parent of a node.
    pub fn parent(&self, node: &HierarchyNode) -> Option<&HierarchyNode> {
        node.parent.map(|p| &self.nodes[p])
    }

    /// Children of a node, in document order.
    pub fn children<'a>(&'a self, node: &'a HierarchyNode) -> impl Iterator<Item = &'a HierarchyNode> + 'a {
        node.children.iter().map(move |&c| &self.nodes[c])
    }

    /// Ancestors of a node, root first, excluding the node itself.
    ///
    /// The returned list has exactly `depth` entries.
    pub fn ancestors(&self, node_id: &str) -> HierarchyResult<Vec<&HierarchyNode>> {
        let node = self.require(node_id)?;

        let mut chain = Vec::with_capacity(node.depth);
        let mut current = self.parent(node);
        while let Some(ancestor) = current {
            chain.push(ancestor);
            current = self.parent(ancestor);
        }
        chain.reverse();

        Ok(chain)
    }

    /// All structural nodes (nodes with at least one child), root included.
    pub fn descendants_with_children(&self) -> impl Iterator<Item = &HierarchyNode> {
        self.nodes.iter().filter(|n| n.has_children())
    }

    /// All nodes in depth-first document order.
    pub fn nodes(&self) -> impl Iterator<Item = &HierarchyNode> {
        self.nodes.iter()
    }
}

/// Serialized form of a hierarchy: channel context plus nested items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyDocument {
    /// Project id.
    pub project_id: String,
    /// Channel context.
    pub channel: OutputChannel,
    /// Root item.
    pub root: HierarchyItem,
}

impl TryFrom<HierarchyDocument> for Hierarchy {
    type Error = HierarchyError;

    fn try_from(doc: HierarchyDocument) -> HierarchyResult<Self> {
        Hierarchy::build(doc.project_id, doc.channel, doc.root)
    }
}
