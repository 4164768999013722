//! NodeActor: owner of a weighted edge list with liveness monitoring.

use acton_reactive::prelude::*;

use super::graph_actor::{spawn_graph_actor, GraphActorState};
use crate::config::GraphConfig;
use crate::graph::NodeState;
use crate::node::NodeRef;

/// Actor holding directed, weighted edges to other nodes.
///
/// Handles:
/// - `AddEdge` / `RemoveEdge` - edge mutation, monitor registration/release
/// - `NodeDown` - prune edges to a monitored node that terminated
/// - `GetState` / `GetField` / `PutAttribute` / `MergeAttributes` - object manager
#[derive(Debug, Clone, Default)]
pub struct NodeActor {
    config: GraphConfig,
}

impl NodeActor {
    /// Create a new NodeActor.
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    /// Spawn this node in the given runtime and return its address.
    pub async fn spawn(self, runtime: &mut ActorRuntime) -> NodeRef {
        spawn_graph_actor::<NodeState>(runtime, "Node", self.config, configure_node_actor).await
    }
}

/// Plain nodes need nothing beyond the shared handlers.
fn configure_node_actor(_actor: &mut ManagedActor<Idle, GraphActorState<NodeState>>) {}
