//! Message types for graph actor communication.
//!
//! Every mutating request carries an optional [`ReplyPort`]: `Some` for the
//! synchronous call form, `None` for the fire-and-forget cast form.

use std::collections::HashMap;

use crate::error::Result;
use crate::node::{Field, FieldValue, NodeId, NodeRef, NodeSnapshot};
use crate::reply::ReplyPort;

// ============================================================================
// Node messages (handled by node and tree actors)
// ============================================================================

/// Append an edge to `target` and monitor it.
#[derive(Debug, Clone)]
pub struct AddEdge {
    pub target: NodeRef,
    pub weight: i64,
    pub reply: Option<ReplyPort<NodeSnapshot>>,
}

/// Drop every edge to `target` and its monitor.
///
/// `weight` is carried for symmetry with [`AddEdge`] but does not filter.
#[derive(Debug, Clone)]
pub struct RemoveEdge {
    pub target: NodeRef,
    pub weight: i64,
    pub reply: Option<ReplyPort<NodeSnapshot>>,
}

/// Read the whole state.
#[derive(Debug, Clone)]
pub struct GetState {
    pub reply: ReplyPort<NodeSnapshot>,
}

/// Read one field.
#[derive(Debug, Clone)]
pub struct GetField {
    pub field: Field,
    pub reply: ReplyPort<FieldValue>,
}

/// Write one attribute.
#[derive(Debug, Clone)]
pub struct PutAttribute {
    pub key: String,
    pub value: serde_json::Value,
    pub reply: Option<ReplyPort<NodeSnapshot>>,
}

/// Merge a partial attribute update.
#[derive(Debug, Clone)]
pub struct MergeAttributes {
    pub update: HashMap<String, serde_json::Value>,
    pub reply: Option<ReplyPort<NodeSnapshot>>,
}

/// Liveness check. Answered by any running graph actor; a stopped one
/// drops the port unanswered.
#[derive(Debug, Clone)]
pub struct Ping {
    pub reply: ReplyPort<()>,
}

/// Termination notice, broadcast by a graph actor as it stops.
///
/// Every graph actor subscribes; only those monitoring `id` react. Also sent
/// directly to a watcher whose new target turned out to be stopped already.
#[derive(Debug, Clone)]
pub struct NodeDown {
    pub id: NodeId,
}

// ============================================================================
// Tree messages
// ============================================================================

/// Add `child` at the end of the child list.
///
/// `check_cycles` is `false` for the cast form.
#[derive(Debug, Clone)]
pub struct AppendChild {
    pub child: NodeRef,
    pub weight: i64,
    pub check_cycles: bool,
    pub reply: Option<ReplyPort<Result<NodeSnapshot>>>,
}

/// Put `child` immediately before `reference`.
#[derive(Debug, Clone)]
pub struct InsertBefore {
    pub child: NodeRef,
    pub reference: NodeRef,
    pub weight: i64,
    pub check_cycles: bool,
    pub reply: Option<ReplyPort<Result<NodeSnapshot>>>,
}

/// Remove `child` from the child list.
#[derive(Debug, Clone)]
pub struct RemoveChild {
    pub child: NodeRef,
    pub reply: Option<ReplyPort<Result<NodeSnapshot>>>,
}

/// Swap `old_child` for `new_child` in place.
#[derive(Debug, Clone)]
pub struct ReplaceChild {
    pub new_child: NodeRef,
    pub old_child: NodeRef,
    pub weight: i64,
    pub reply: Option<ReplyPort<Result<NodeSnapshot>>>,
}

/// Overwrite the parent pointer. Sent by the adopting parent.
#[derive(Debug, Clone)]
pub struct SetParent {
    pub parent: Option<NodeRef>,
}

/// Clear the parent pointer if it still names `expected`. Sent by a parent
/// letting go of the receiver.
#[derive(Debug, Clone)]
pub struct ClearParentIf {
    pub expected: NodeId,
}
