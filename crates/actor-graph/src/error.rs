//! Error outcomes reported to synchronous callers.

use thiserror::Error;

use crate::node::NodeId;

/// Why a synchronous graph or tree operation did not succeed.
///
/// The first three variants are deterministic: re-issuing the same call
/// against unchanged state fails the same way. The transport variants describe
/// the target actor, not the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The new child is the parent itself or one of its ancestors.
    #[error("attaching {child} under {parent} would create a cycle")]
    CycleRejected { parent: NodeId, child: NodeId },

    /// The sibling named as the insertion/replacement point is not a child.
    #[error("{reference} is not a child of {parent}")]
    ReferenceNotFound { parent: NodeId, reference: NodeId },

    /// The child to remove is not a child.
    #[error("{child} is not a child of {parent}")]
    ChildNotFound { parent: NodeId, child: NodeId },

    /// The target stopped before replying.
    #[error("node {0} is not running")]
    Unavailable(NodeId),

    /// The configured call timeout elapsed.
    #[error("call to node {0} timed out")]
    Timeout(NodeId),
}

pub type Result<T> = std::result::Result<T, GraphError>;
