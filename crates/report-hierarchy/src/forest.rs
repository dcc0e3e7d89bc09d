//! Hierarchy forests
//!
//! All hierarchies of one project, one per output channel.

use std::collections::BTreeSet;

use crate::channel::OutputChannel;
use crate::error::{HierarchyError, HierarchyResult};
use crate::node::Hierarchy;

/// The full cross-channel set of hierarchies of a project.
#[derive(Debug, Clone)]
pub struct HierarchyForest {
    project_id: String,
    hierarchies: Vec<Hierarchy>,
}

impl HierarchyForest {
    /// Create an empty forest.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            hierarchies: Vec::new(),
        }
    }

    /// Add a hierarchy, replacing any existing one for the same channel.
    pub fn with_hierarchy(mut self, hierarchy: Hierarchy) -> Self {
        self.insert(hierarchy);
        self
    }

    /// Add a hierarchy, replacing any existing one for the same channel.
    pub fn insert(&mut self, hierarchy: Hierarchy) {
        self.hierarchies.retain(|h| h.channel() != hierarchy.channel());
        self.hierarchies.push(hierarchy);
    }

    /// Project id.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// All hierarchies.
    pub fn hierarchies(&self) -> &[Hierarchy] {
        &self.hierarchies
    }

    /// Whether the forest has no hierarchies.
    pub fn is_empty(&self) -> bool {
        self.hierarchies.is_empty()
    }

    /// Hierarchy of a channel.
    pub fn hierarchy(&self, channel: &OutputChannel) -> HierarchyResult<&Hierarchy> {
        self.hierarchies
            .iter()
            .find(|h| h.channel() == channel)
            .ok_or_else(|| HierarchyError::HierarchyNotFound {
                project_id: self.project_id.clone(),
                channel: channel.to_string(),
            })
    }

    /// Ids of all structural nodes across every hierarchy.
    pub fn container_ids(&self) -> BTreeSet<String> {
        self.hierarchies
            .iter()
            .flat_map(|h| h.descendants_with_children())
            .map(|n| n.id().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::HierarchyItem;

    fn tree(channel: OutputChannel, leaf: &str) -> Hierarchy {
        let root = HierarchyItem::new(format!("root-{leaf}"), "root.xml")
            .with_child(HierarchyItem::new(leaf, "leaf.xml"));
        Hierarchy::build("ar2024", channel, root).unwrap()
    }

    #[test]
    fn test_insert_replaces_same_channel() {
        let forest = HierarchyForest::new("ar2024")
            .with_hierarchy(tree(OutputChannel::pdf("en"), "a"))
            .with_hierarchy(tree(OutputChannel::pdf("en"), "b"))
            .with_hierarchy(tree(OutputChannel::website("en"), "c"));

        assert_eq!(forest.hierarchies().len(), 2);
        assert!(forest.hierarchy(&OutputChannel::pdf("en")).unwrap().contains("b"));
        assert!(forest.hierarchy(&OutputChannel::pdf("nl")).is_err());
    }

    #[test]
    fn test_container_ids_span_channels() {
        let forest = HierarchyForest::new("ar2024")
            .with_hierarchy(tree(OutputChannel::pdf("en"), "a"))
            .with_hierarchy(tree(OutputChannel::website("en"), "c"));

        let containers: Vec<String> = forest.container_ids().into_iter().collect();
        assert_eq!(containers, vec!["root-a".to_string(), "root-c".to_string()]);
    }
}
