//! Node addresses, edges and state snapshots.
//!
//! A [`NodeRef`] is the address of a running graph actor. Clients may also hold
//! a [`NodeSnapshot`], which carries the address it was taken from; both are
//! normalized through [`NodeRefOrSnapshot`] before anything is sent.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use acton_reactive::prelude::*;
use tracing::info;
use uuid::Uuid;

/// Unique identifier of a graph actor.
pub type NodeId = Uuid;

/// Handle identifying one monitor registration in a node's monitor table.
pub type MonitorRef = Uuid;

/// Address of a graph actor.
///
/// Equality and hashing use the id only; the handle is the delivery route.
#[derive(Clone)]
pub struct NodeRef {
    id: NodeId,
    handle: ActorHandle,
}

impl NodeRef {
    pub(crate) fn new(id: NodeId, handle: ActorHandle) -> Self {
        Self { id, handle }
    }

    /// The node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The underlying actor handle.
    pub fn handle(&self) -> &ActorHandle {
        &self.handle
    }

    /// Stop the actor. Nodes holding edges to it prune them once the
    /// termination notice reaches their mailbox.
    pub async fn stop(&self) {
        let result = self.handle.stop().await;
        info!(node = %self.id, ?result, "Node stopped");
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for NodeRef {}

impl Hash for NodeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").field(&self.id).finish()
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

/// A directed, weighted reference to another node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge<A = NodeRef> {
    pub target: A,
    pub weight: i64,
}

impl<A> Edge<A> {
    pub fn new(target: A, weight: i64) -> Self {
        Self { target, weight }
    }
}

/// Parent/child links of a tree actor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeLinks {
    /// Owning parent, `None` for a root.
    pub parent: Option<NodeRef>,
    /// Children in list order; mirrors the edge targets.
    pub child_nodes: Vec<NodeRef>,
}

/// Point-in-time copy of a node's state.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    /// Address the snapshot was taken from
    pub address: NodeRef,
    /// Outgoing edges in insertion order
    pub edges: Vec<Edge>,
    /// Object-manager fields
    pub attributes: HashMap<String, serde_json::Value>,
    /// Present for tree actors only
    pub tree: Option<TreeLinks>,
}

impl NodeSnapshot {
    pub fn id(&self) -> NodeId {
        self.address.id
    }

    /// Edge targets in edge order.
    pub fn targets(&self) -> Vec<NodeId> {
        self.edges.iter().map(|e| e.target.id).collect()
    }

    /// Parent of a tree actor.
    pub fn parent(&self) -> Option<&NodeRef> {
        self.tree.as_ref().and_then(|t| t.parent.as_ref())
    }

    /// Child ids of a tree actor, in list order. Empty for plain nodes.
    pub fn children(&self) -> Vec<NodeId> {
        self.tree
            .as_ref()
            .map(|t| t.child_nodes.iter().map(NodeRef::id).collect())
            .unwrap_or_default()
    }
}

/// Anything a client can name a node by.
#[derive(Debug, Clone)]
pub enum NodeRefOrSnapshot {
    Address(NodeRef),
    Snapshot(NodeSnapshot),
}

impl NodeRefOrSnapshot {
    /// Resolve to the address messages are sent to.
    pub fn into_address(self) -> NodeRef {
        match self {
            Self::Address(node) => node,
            Self::Snapshot(snapshot) => snapshot.address,
        }
    }
}

impl From<NodeRef> for NodeRefOrSnapshot {
    fn from(node: NodeRef) -> Self {
        Self::Address(node)
    }
}

impl From<&NodeRef> for NodeRefOrSnapshot {
    fn from(node: &NodeRef) -> Self {
        Self::Address(node.clone())
    }
}

impl From<NodeSnapshot> for NodeRefOrSnapshot {
    fn from(snapshot: NodeSnapshot) -> Self {
        Self::Snapshot(snapshot)
    }
}

impl From<&NodeSnapshot> for NodeRefOrSnapshot {
    fn from(snapshot: &NodeSnapshot) -> Self {
        Self::Snapshot(snapshot.clone())
    }
}

/// A single readable field of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Edges,
    Parent,
    ChildNodes,
    Attribute(String),
}

/// Value of a [`Field`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Edges(Vec<Edge>),
    Parent(Option<NodeRef>),
    ChildNodes(Vec<NodeRef>),
    Attribute(Option<serde_json::Value>),
}

/// Options for `add_edge` / `remove_edge`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeOpts {
    pub weight: i64,
    pub bidirectional: bool,
}

impl EdgeOpts {
    pub fn weight(weight: i64) -> Self {
        Self {
            weight,
            ..Self::default()
        }
    }

    pub fn bidirectional(mut self) -> Self {
        self.bidirectional = true;
        self
    }
}

/// Options for the tree mutations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChildOpts {
    /// Weight of the parent→child edge
    pub weight: i64,
}

impl ChildOpts {
    pub fn weight(weight: i64) -> Self {
        Self { weight }
    }
}
