//! Per-actor graph state.
//!
//! These types are plain data owned by exactly one actor. They hold no
//! handles of their own and never talk to other actors; the actor handlers
//! in [`crate::actors`] do the messaging and call in here for the mutation.
//!
//! Invariants kept by every mutation:
//! - the set of addresses in `monitors` equals the set of distinct edge targets
//! - for trees, `child_nodes` equals the edge targets, in edge order

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

use crate::node::{Edge, Field, FieldValue, MonitorRef, NodeId, NodeRef, NodeSnapshot, TreeLinks};

/// Something that names a node. Implemented by [`NodeRef`] for running
/// actors and by bare ids for runtime-free use.
pub trait Address: Clone + Eq + fmt::Debug + Send + Sync + 'static {
    fn node_id(&self) -> NodeId;
}

impl Address for NodeRef {
    fn node_id(&self) -> NodeId {
        self.id()
    }
}

impl Address for NodeId {
    fn node_id(&self) -> NodeId {
        *self
    }
}

/// Outgoing edges, the monitor table and object-manager attributes of one node.
#[derive(Debug, Clone)]
pub struct NodeState<A = NodeRef> {
    edges: Vec<Edge<A>>,
    monitors: HashMap<MonitorRef, A>,
    attributes: HashMap<String, serde_json::Value>,
}

impl<A> Default for NodeState<A> {
    fn default() -> Self {
        Self {
            edges: Vec::new(),
            monitors: HashMap::new(),
            attributes: HashMap::new(),
        }
    }
}

impl<A: Address> NodeState<A> {
    pub fn edges(&self) -> &[Edge<A>] {
        &self.edges
    }

    pub fn monitors(&self) -> &HashMap<MonitorRef, A> {
        &self.monitors
    }

    pub fn attributes(&self) -> &HashMap<String, serde_json::Value> {
        &self.attributes
    }

    /// Whether `id` is currently monitored.
    pub fn is_monitoring(&self, id: NodeId) -> bool {
        self.monitor_for(id).is_some()
    }

    /// Index of the first edge to `id`.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.edges.iter().position(|e| e.target.node_id() == id)
    }

    /// Append an edge, registering a monitor on the target if it has none.
    pub fn add_edge(&mut self, target: A, weight: i64) {
        self.ensure_monitor(&target);
        self.edges.push(Edge::new(target, weight));
    }

    /// Insert an edge at `index` (clamped to the end).
    pub fn insert_edge(&mut self, index: usize, target: A, weight: i64) {
        self.ensure_monitor(&target);
        let index = index.min(self.edges.len());
        self.edges.insert(index, Edge::new(target, weight));
    }

    /// Drop every edge to `id`, whatever its weight, and release its monitor.
    ///
    /// Returns the number of edges removed; zero is not an error.
    pub fn remove_edge(&mut self, id: NodeId) -> usize {
        if let Some(monitor) = self.monitor_for(id) {
            self.monitors.remove(&monitor);
        }
        let before = self.edges.len();
        self.edges.retain(|e| e.target.node_id() != id);
        before - self.edges.len()
    }

    /// Put `new` where the first edge to `old` sits and drop the remaining
    /// edges to `old`. Returns `false` if there is no edge to `old`.
    pub fn replace_edge(&mut self, old: NodeId, new: A, weight: i64) -> bool {
        let Some(index) = self.position(old) else {
            return false;
        };
        self.remove_edge(old);
        self.insert_edge(index, new, weight);
        true
    }

    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }

    pub fn put_attribute(&mut self, key: String, value: serde_json::Value) {
        self.attributes.insert(key, value);
    }

    /// Overwrite the keys present in `update`, keep the rest.
    pub fn merge_attributes(&mut self, update: HashMap<String, serde_json::Value>) {
        self.attributes.extend(update);
    }

    fn monitor_for(&self, id: NodeId) -> Option<MonitorRef> {
        self.monitors
            .iter()
            .find(|(_, target)| target.node_id() == id)
            .map(|(monitor, _)| *monitor)
    }

    fn ensure_monitor(&mut self, target: &A) {
        if !self.is_monitoring(target.node_id()) {
            self.monitors.insert(Uuid::new_v4(), target.clone());
        }
    }
}

/// Node state plus parent pointer and ordered child list.
#[derive(Debug, Clone)]
pub struct TreeState<A = NodeRef> {
    node: NodeState<A>,
    parent: Option<A>,
    child_nodes: Vec<A>,
}

impl<A> Default for TreeState<A> {
    fn default() -> Self {
        Self {
            node: NodeState::default(),
            parent: None,
            child_nodes: Vec::new(),
        }
    }
}

impl<A: Address> TreeState<A> {
    pub fn node(&self) -> &NodeState<A> {
        &self.node
    }

    pub fn parent(&self) -> Option<&A> {
        self.parent.as_ref()
    }

    pub fn child_nodes(&self) -> &[A] {
        &self.child_nodes
    }

    pub fn has_child(&self, id: NodeId) -> bool {
        self.child_nodes.iter().any(|c| c.node_id() == id)
    }

    /// Re-derive `child_nodes` from the edge list.
    pub fn mirror(&mut self) {
        self.child_nodes = self.node.edges.iter().map(|e| e.target.clone()).collect();
    }

    pub fn append_child(&mut self, child: A, weight: i64) {
        self.node.add_edge(child, weight);
        self.mirror();
    }

    /// Splice `child` in front of `reference`. Returns `false` (and changes
    /// nothing) if `reference` is not a child.
    pub fn insert_before(&mut self, child: A, weight: i64, reference: NodeId) -> bool {
        let Some(index) = self.node.position(reference) else {
            return false;
        };
        self.node.insert_edge(index, child, weight);
        self.mirror();
        true
    }

    /// Remove `child` from the list. Returns `false` if it was not a child.
    pub fn detach(&mut self, child: NodeId) -> bool {
        let removed = self.node.remove_edge(child) > 0;
        self.mirror();
        removed
    }

    /// Swap `old` for `new` in place. Returns `false` if `old` was not a child.
    pub fn replace(&mut self, new: A, weight: i64, old: NodeId) -> bool {
        let replaced = self.node.replace_edge(old, new, weight);
        self.mirror();
        replaced
    }

    pub fn set_parent(&mut self, parent: Option<A>) {
        self.parent = parent;
    }

    /// Clear the parent pointer only if it still names `expected`.
    pub fn clear_parent_if(&mut self, expected: NodeId) -> bool {
        match &self.parent {
            Some(parent) if parent.node_id() == expected => {
                self.parent = None;
                true
            }
            _ => false,
        }
    }
}

/// State carried by a graph actor, seen through what the shared handlers need.
pub trait GraphModel: Default + fmt::Debug + Send + Sync + 'static {
    fn node(&self) -> &NodeState;

    fn node_mut(&mut self) -> &mut NodeState;

    /// Hook run after every edge-level mutation.
    fn edges_changed(&mut self) {}

    /// Parent/child links, for tree actors.
    fn tree_links(&self) -> Option<TreeLinks> {
        None
    }

    /// Prune everything pointing at a terminated node. Returns `true` if the
    /// node was monitored.
    fn node_down(&mut self, id: NodeId) -> bool {
        if !self.node().is_monitoring(id) {
            return false;
        }
        self.node_mut().remove_edge(id);
        self.edges_changed();
        true
    }

    fn snapshot(&self, address: NodeRef) -> NodeSnapshot {
        let node = self.node();
        NodeSnapshot {
            address,
            edges: node.edges().to_vec(),
            attributes: node.attributes().clone(),
            tree: self.tree_links(),
        }
    }

    fn field(&self, field: &Field) -> FieldValue {
        match field {
            Field::Edges => FieldValue::Edges(self.node().edges().to_vec()),
            Field::Parent => FieldValue::Parent(self.tree_links().and_then(|t| t.parent)),
            Field::ChildNodes => FieldValue::ChildNodes(
                self.tree_links().map(|t| t.child_nodes).unwrap_or_default(),
            ),
            Field::Attribute(key) => FieldValue::Attribute(self.node().attribute(key).cloned()),
        }
    }
}

impl GraphModel for NodeState {
    fn node(&self) -> &NodeState {
        self
    }

    fn node_mut(&mut self) -> &mut NodeState {
        self
    }
}

impl GraphModel for TreeState {
    fn node(&self) -> &NodeState {
        &self.node
    }

    fn node_mut(&mut self) -> &mut NodeState {
        &mut self.node
    }

    fn edges_changed(&mut self) {
        self.mirror();
    }

    fn tree_links(&self) -> Option<TreeLinks> {
        Some(TreeLinks {
            parent: self.parent.clone(),
            child_nodes: self.child_nodes.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn id(name: &str) -> NodeId {
        Uuid::new_v5(&Uuid::NAMESPACE_DNS, name.as_bytes())
    }

    fn assert_monitors_match_edges<A: Address>(node: &NodeState<A>) {
        let monitored: Vec<NodeId> = node.monitors().values().map(Address::node_id).collect();
        let distinct_monitored: HashSet<NodeId> = monitored.iter().copied().collect();
        let targets: HashSet<NodeId> = node.edges().iter().map(|e| e.target.node_id()).collect();
        assert_eq!(monitored.len(), distinct_monitored.len(), "duplicate monitor");
        assert_eq!(distinct_monitored, targets);
    }

    #[test]
    fn test_add_edge_keeps_duplicates_under_one_monitor() {
        let mut node = NodeState::<NodeId>::default();
        let b = id("b");

        node.add_edge(b, 1);
        node.add_edge(b, 2);

        assert_eq!(
            node.edges(),
            &[Edge::new(b, 1), Edge::new(b, 2)]
        );
        assert_eq!(node.monitors().len(), 1);
        assert_monitors_match_edges(&node);
    }

    #[test]
    fn test_remove_edge_drops_all_weights_and_monitor() {
        let mut node = NodeState::<NodeId>::default();
        let (b, c) = (id("b"), id("c"));
        node.add_edge(b, 1);
        node.add_edge(c, 0);
        node.add_edge(b, 2);

        assert_eq!(node.remove_edge(b), 2);
        assert_eq!(node.edges(), &[Edge::new(c, 0)]);
        assert!(!node.is_monitoring(b));
        assert_monitors_match_edges(&node);
    }

    #[test]
    fn test_remove_missing_edge_is_noop() {
        let mut node = NodeState::<NodeId>::default();
        node.add_edge(id("b"), 0);

        assert_eq!(node.remove_edge(id("missing")), 0);
        assert_eq!(node.edges().len(), 1);
        assert_monitors_match_edges(&node);
    }

    #[test]
    fn test_attributes_merge_overwrites_present_keys() {
        let mut node = NodeState::<NodeId>::default();
        node.put_attribute("name".into(), serde_json::json!("root"));
        node.put_attribute("color".into(), serde_json::json!("red"));

        node.merge_attributes(HashMap::from([("color".to_string(), serde_json::json!("blue"))]));

        assert_eq!(node.attribute("name"), Some(&serde_json::json!("root")));
        assert_eq!(node.attribute("color"), Some(&serde_json::json!("blue")));
    }

    #[test]
    fn test_tree_list_order_mutations() {
        let mut tree = TreeState::<NodeId>::default();
        let (c1, c2, c3, c4) = (id("c1"), id("c2"), id("c3"), id("c4"));

        tree.append_child(c1, 0);
        tree.append_child(c2, 0);
        assert_eq!(tree.child_nodes(), &[c1, c2]);

        assert!(tree.insert_before(c3, 0, c1));
        assert_eq!(tree.child_nodes(), &[c3, c1, c2]);

        assert!(tree.replace(c4, 0, c2));
        assert_eq!(tree.child_nodes(), &[c3, c1, c4]);
        assert!(!tree.node().is_monitoring(c2));

        assert!(tree.detach(c1));
        assert_eq!(tree.child_nodes(), &[c3, c4]);
        assert_monitors_match_edges(tree.node());
    }

    #[test]
    fn test_tree_mutations_against_missing_reference_change_nothing() {
        let mut tree = TreeState::<NodeId>::default();
        tree.append_child(id("c1"), 0);

        assert!(!tree.insert_before(id("x"), 0, id("missing")));
        assert!(!tree.replace(id("x"), 0, id("missing")));
        assert!(!tree.detach(id("missing")));
        assert_eq!(tree.child_nodes(), &[id("c1")]);
        assert!(!tree.node().is_monitoring(id("x")));
    }

    #[test]
    fn test_child_list_mirrors_edge_order() {
        let mut tree = TreeState::<NodeId>::default();
        let (a, b) = (id("a"), id("b"));
        tree.append_child(a, 3);
        tree.insert_before(b, 7, a);

        let targets: Vec<NodeId> = tree.node().edges().iter().map(|e| e.target).collect();
        assert_eq!(targets, tree.child_nodes());
        assert_eq!(tree.node().edges()[0].weight, 7);
    }

    #[test]
    fn test_clear_parent_if_only_clears_matching_parent() {
        let mut tree = TreeState::<NodeId>::default();
        tree.set_parent(Some(id("new-parent")));

        assert!(!tree.clear_parent_if(id("old-parent")));
        assert_eq!(tree.parent(), Some(&id("new-parent")));

        assert!(tree.clear_parent_if(id("new-parent")));
        assert_eq!(tree.parent(), None);
    }
}
