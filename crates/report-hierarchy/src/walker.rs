//! Hierarchy walks used for access control
//!
//! - [`build_breadcrumb_trail`]: ancestor resource ids of a node, root first
//! - [`find_equivalent_resource_ids`]: resources rendering the same content in
//!   other output channels

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use report_rbac::{calculate_resource_id, Action, ResourceId, ScopeLevel};

use crate::channel::OutputChannel;
use crate::error::HierarchyResult;
use crate::forest::HierarchyForest;
use crate::node::Hierarchy;

/// Ordered resource ids from the hierarchy root towards a node.
///
/// Trails are acyclic by construction because hierarchies are trees.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct BreadcrumbTrail(Vec<ResourceId>);

impl BreadcrumbTrail {
    /// Wrap an already ordered list of resource ids.
    pub fn new(resources: Vec<ResourceId>) -> Self {
        Self(resources)
    }

    /// Number of resources in the trail.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the trail is empty (node at the hierarchy root).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resource ids, root first.
    pub fn as_slice(&self) -> &[ResourceId] {
        &self.0
    }

    /// Iterate root first.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceId> {
        self.0.iter()
    }
}

/// Build the breadcrumb trail of a node.
///
/// # Arguments
///
/// * `hierarchy` - Tree the node lives in
/// * `node_id` - Target node
/// * `include_self` - Append the node's own resource id at the end
/// * `scope` - Scope level for the calculated resource ids
///
/// # Returns
///
/// Resource ids ordered root → parent (→ node). Without `include_self` the
/// trail length equals the node depth.
///
/// # Errors
///
/// [`HierarchyError::NodeNotFound`](crate::error::HierarchyError::NodeNotFound)
/// if the node is not in the hierarchy.
pub fn build_breadcrumb_trail(
    hierarchy: &Hierarchy,
    node_id: &str,
    include_self: bool,
    scope: ScopeLevel,
) -> HierarchyResult<BreadcrumbTrail> {
    let project_id = hierarchy.project_id();
    let mut nodes = hierarchy.ancestors(node_id)?;
    if include_self {
        nodes.push(hierarchy.require(node_id)?);
    }

    let resources = nodes
        .into_iter()
        .map(|n| calculate_resource_id(Action::Get, n.id(), project_id, scope))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        project_id,
        node_id,
        include_self,
        length = resources.len(),
        "Built breadcrumb trail"
    );

    Ok(BreadcrumbTrail(resources))
}

/// Find the resources rendering the same content as a node across channels.
///
/// Every hierarchy of the forest is scanned for nodes whose content reference
/// equals `data_ref`. With `only_same_language`, only hierarchies in the
/// language of `channel`, the node's own channel, are searched. The node's own
/// resource is always part of the result; duplicates collapse by resource id.
///
/// # Errors
///
/// - `HierarchyNotFound` if the forest has no hierarchy for `channel`
/// - `NodeNotFound` if that hierarchy does not contain `node_id`
pub fn find_equivalent_resource_ids(
    forest: &HierarchyForest,
    channel: &OutputChannel,
    node_id: &str,
    data_ref: &str,
    only_same_language: bool,
    scope: ScopeLevel,
) -> HierarchyResult<BTreeSet<ResourceId>> {
    let project_id = forest.project_id();
    forest.hierarchy(channel)?.require(node_id)?;

    let mut resources = BTreeSet::new();
    resources.insert(calculate_resource_id(Action::Get, node_id, project_id, scope)?);

    if data_ref.is_empty() {
        return Ok(resources);
    }

    let candidates = forest
        .hierarchies()
        .iter()
        .filter(|h| !only_same_language || h.channel().same_language(channel));

    for hierarchy in candidates {
        for node in hierarchy.nodes().filter(|n| n.data_ref() == data_ref) {
            resources.insert(calculate_resource_id(Action::Get, node.id(), project_id, scope)?);
        }
    }

    debug!(
        project_id,
        node_id,
        channel = %channel,
        data_ref,
        only_same_language,
        count = resources.len(),
        "Resolved equivalent resources"
    );

    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HierarchyError;
    use crate::node::HierarchyItem;

    const SCOPE: ScopeLevel = ScopeLevel::DEFAULT;

    fn rid(node: &str) -> ResourceId {
        calculate_resource_id(Action::Get, node, "ar2024", SCOPE).unwrap()
    }

    fn pdf_tree() -> Hierarchy {
        let root = HierarchyItem::new("R", "report.xml").with_child(
            HierarchyItem::new("A", "notes.xml").with_child(HierarchyItem::new("B", "note-1.xml")),
        );
        Hierarchy::build("ar2024", OutputChannel::pdf("en"), root).unwrap()
    }

    fn forest() -> HierarchyForest {
        let web = HierarchyItem::new("web-root", "site.xml").with_child(
            HierarchyItem::new("web-notes", "notes.xml")
                .with_child(HierarchyItem::new("web-note-1", "note-1.xml")),
        );
        let dutch = HierarchyItem::new("nl-root", "report.xml")
            .with_child(HierarchyItem::new("nl-notes", "notes.xml"));

        HierarchyForest::new("ar2024")
            .with_hierarchy(pdf_tree())
            .with_hierarchy(Hierarchy::build("ar2024", OutputChannel::website("en"), web).unwrap())
            .with_hierarchy(Hierarchy::build("ar2024", OutputChannel::pdf("nl"), dutch).unwrap())
    }

    #[test]
    fn test_trail_excludes_self() {
        let tree = pdf_tree();
        let trail = build_breadcrumb_trail(&tree, "B", false, SCOPE).unwrap();

        assert_eq!(trail.as_slice(), &[rid("R"), rid("A")]);
        assert_eq!(trail.len(), tree.node("B").unwrap().depth());
    }

    #[test]
    fn test_trail_includes_self() {
        let tree = pdf_tree();
        let trail = build_breadcrumb_trail(&tree, "B", true, SCOPE).unwrap();
        assert_eq!(trail.as_slice(), &[rid("R"), rid("A"), rid("B")]);
    }

    #[test]
    fn test_trail_of_root_is_empty() {
        let tree = pdf_tree();
        assert!(build_breadcrumb_trail(&tree, "R", false, SCOPE).unwrap().is_empty());
    }

    #[test]
    fn test_trail_for_unknown_node() {
        let tree = pdf_tree();
        let err = build_breadcrumb_trail(&tree, "Z", false, SCOPE).unwrap_err();
        assert!(matches!(err, HierarchyError::NodeNotFound { .. }));
    }

    #[test]
    fn test_equivalents_across_all_languages() {
        let found = find_equivalent_resource_ids(&forest(), &OutputChannel::pdf("en"), "A", "notes.xml", false, SCOPE).unwrap();
        let expected: BTreeSet<ResourceId> =
            [rid("A"), rid("web-notes"), rid("nl-notes")].into_iter().collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_equivalents_same_language_only() {
        let found = find_equivalent_resource_ids(&forest(), &OutputChannel::pdf("en"), "A", "notes.xml", true, SCOPE).unwrap();
        let expected: BTreeSet<ResourceId> = [rid("A"), rid("web-notes")].into_iter().collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_equivalents_without_data_ref() {
        let found = find_equivalent_resource_ids(&forest(), &OutputChannel::pdf("en"), "B", "", false, SCOPE).unwrap();
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec![rid("B")]);
    }

    #[test]
    fn test_equivalents_unknown_node() {
        let channel = OutputChannel::pdf("en");
        assert!(find_equivalent_resource_ids(&forest(), &channel, "nope", "notes.xml", false, SCOPE).is_err());
        assert!(find_equivalent_resource_ids(&forest(), &OutputChannel::pdf("de"), "A", "notes.xml", false, SCOPE).is_err());
    }

    #[test]
    fn test_equivalents_use_language_of_given_channel() {
        let english = HierarchyItem::new("R", "report.xml").with_child(HierarchyItem::new("shared", "notes.xml"));
        let website = HierarchyItem::new("web-R", "report.xml").with_child(HierarchyItem::new("web-notes", "notes.xml"));
        let dutch = HierarchyItem::new("nl-R", "report.xml")
            .with_child(HierarchyItem::new("shared", "notes.xml"))
            .with_child(HierarchyItem::new("nl-notes", "notes.xml"));
        let forest = HierarchyForest::new("ar2024")
            .with_hierarchy(Hierarchy::build("ar2024", OutputChannel::pdf("en"), english).unwrap())
            .with_hierarchy(Hierarchy::build("ar2024", OutputChannel::website("en"), website).unwrap())
            .with_hierarchy(Hierarchy::build("ar2024", OutputChannel::pdf("nl"), dutch).unwrap());

        let found =
            find_equivalent_resource_ids(&forest, &OutputChannel::pdf("nl"), "shared", "notes.xml", true, SCOPE).unwrap();

        let expected: BTreeSet<ResourceId> = [rid("shared"), rid("nl-notes")].into_iter().collect();
        assert_eq!(found, expected);
    }
}
