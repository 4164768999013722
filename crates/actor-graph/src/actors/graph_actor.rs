//! State and handlers shared by node and tree actors.
//!
//! Covers the edge operations, the object-manager reads and writes, and
//! termination monitoring.

use std::sync::Arc;

use acton_reactive::prelude::*;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::config::GraphConfig;
use crate::error::GraphError;
use crate::graph::{GraphModel, NodeState};
use crate::messages::{
    AddEdge, GetField, GetState, MergeAttributes, NodeDown, Ping, PutAttribute, RemoveEdge,
};
use crate::node::NodeRef;
use crate::reply::{call, cast, respond};

/// Actor state for a graph node.
///
/// The graph sits behind an async mutex so a handler can keep it locked
/// across the nested calls it makes before committing its mutation.
pub struct GraphActorState<G> {
    /// Edges, monitors, attributes (and tree links for trees)
    pub graph: Arc<Mutex<G>>,
    /// This actor's own address, set before start
    pub address: Option<NodeRef>,
    /// Timeouts and walk bounds for nested calls
    pub config: GraphConfig,
}

impl<G: Default> Default for GraphActorState<G> {
    fn default() -> Self {
        Self {
            graph: Arc::new(Mutex::new(G::default())),
            address: None,
            config: GraphConfig::default(),
        }
    }
}

impl<G> Clone for GraphActorState<G> {
    fn clone(&self) -> Self {
        Self {
            graph: Arc::clone(&self.graph),
            address: self.address.clone(),
            config: self.config.clone(),
        }
    }
}

impl<G> std::fmt::Debug for GraphActorState<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphActorState")
            .field("address", &self.address)
            .field("graph", &"<mutex>")
            .finish()
    }
}

/// Create, wire and start a graph actor.
///
/// `configure` registers the kind-specific handlers on top of the shared ones.
pub(crate) async fn spawn_graph_actor<G: GraphModel>(
    runtime: &mut ActorRuntime,
    kind: &str,
    config: GraphConfig,
    configure: fn(&mut ManagedActor<Idle, GraphActorState<G>>),
) -> NodeRef {
    let id = Uuid::new_v4();
    let mut actor = runtime
        .new_actor_with_name::<GraphActorState<G>>(format!("{}:{}", kind, id.simple()));

    let address = NodeRef::new(id, actor.handle().clone());
    actor.model.address = Some(address.clone());
    actor.model.config = config;

    // Termination notices arrive by broadcast; subscribe BEFORE starting
    actor.handle().subscribe::<NodeDown>().await;

    configure_graph_handlers(&mut actor);
    configure(&mut actor);

    actor.start().await;
    info!(node = %id, kind, "Node spawned");
    address
}

/// Confirm that a target `watcher` just started monitoring is still running.
///
/// A target that stopped before the monitor existed has already broadcast its
/// `NodeDown`, so the notice is queued to `watcher` directly instead.
pub(crate) fn watch(watcher: &NodeRef, target: &NodeRef) {
    let (watcher, target) = (watcher.clone(), target.clone());
    tokio::spawn(async move {
        if let Err(GraphError::Unavailable(id)) = call(&target, None, |reply| Ping { reply }).await
        {
            debug!(node = %watcher, target = %id, "Monitored node already stopped");
            cast(&watcher, NodeDown { id }).await;
        }
    });
}

/// Add an edge, watching the target if this is its first monitor.
fn add_watched_edge(node: &mut NodeState, address: &NodeRef, target: &NodeRef, weight: i64) {
    let watched = node.is_monitoring(target.id());
    node.add_edge(target.clone(), weight);
    if !watched {
        watch(address, target);
    }
}

/// Register the edge, object-manager and monitoring handlers.
fn configure_graph_handlers<G: GraphModel>(actor: &mut ManagedActor<Idle, GraphActorState<G>>) {
    // Announce our termination to whoever monitors us
    actor.before_stop(|actor| {
        let broker = actor.broker().clone();
        let id = actor.model.address.as_ref().map(NodeRef::id);

        Reply::pending(async move {
            if let Some(id) = id {
                broker.broadcast(NodeDown { id }).await;
            }
        })
    });

    actor.mutate_on::<AddEdge>(|actor, context| {
        let msg = context.message().clone();
        let graph = actor.model.graph.clone();
        let Some(address) = actor.model.address.clone() else {
            warn!("AddEdge: address not set");
            return Reply::ready();
        };

        Reply::pending(async move {
            let mut graph = graph.lock().await;
            add_watched_edge(graph.node_mut(), &address, &msg.target, msg.weight);
            graph.edges_changed();
            debug!(
                node = %address,
                target = %msg.target,
                weight = msg.weight,
                edges = graph.node().edges().len(),
                "Edge added"
            );
            respond(&msg.reply, graph.snapshot(address));
        })
    });

    actor.mutate_on::<RemoveEdge>(|actor, context| {
        let msg = context.message().clone();
        let graph = actor.model.graph.clone();
        let Some(address) = actor.model.address.clone() else {
            warn!("RemoveEdge: address not set");
            return Reply::ready();
        };

        Reply::pending(async move {
            let mut graph = graph.lock().await;
            let removed = graph.node_mut().remove_edge(msg.target.id());
            graph.edges_changed();
            debug!(
                node = %address,
                target = %msg.target,
                weight = msg.weight,
                removed,
                "Edges removed"
            );
            respond(&msg.reply, graph.snapshot(address));
        })
    });

    actor.mutate_on::<NodeDown>(|actor, context| {
        let id = context.message().id;
        let graph = actor.model.graph.clone();
        let address = actor.model.address.clone();

        Reply::pending(async move {
            let mut graph = graph.lock().await;
            if graph.node_down(id) {
                debug!(node = ?address, target = %id, "Monitored node terminated, edges pruned");
            } else {
                trace!(node = ?address, target = %id, "Ignoring termination of unmonitored node");
            }
        })
    });

    actor.act_on::<Ping>(|_actor, context| {
        context.message().reply.send(());
        Reply::ready()
    });

    actor.act_on::<GetState>(|actor, context| {
        let reply = context.message().reply.clone();
        let graph = actor.model.graph.clone();
        let Some(address) = actor.model.address.clone() else {
            warn!("GetState: address not set");
            return Reply::ready();
        };

        Reply::pending(async move {
            let graph = graph.lock().await;
            reply.send(graph.snapshot(address));
        })
    });

    actor.act_on::<GetField>(|actor, context| {
        let msg = context.message().clone();
        let graph = actor.model.graph.clone();

        Reply::pending(async move {
            let graph = graph.lock().await;
            msg.reply.send(graph.field(&msg.field));
        })
    });

    actor.mutate_on::<PutAttribute>(|actor, context| {
        let msg = context.message().clone();
        let graph = actor.model.graph.clone();
        let Some(address) = actor.model.address.clone() else {
            warn!("PutAttribute: address not set");
            return Reply::ready();
        };

        Reply::pending(async move {
            let mut graph = graph.lock().await;
            graph.node_mut().put_attribute(msg.key, msg.value);
            respond(&msg.reply, graph.snapshot(address));
        })
    });

    actor.mutate_on::<MergeAttributes>(|actor, context| {
        let msg = context.message().clone();
        let graph = actor.model.graph.clone();
        let Some(address) = actor.model.address.clone() else {
            warn!("MergeAttributes: address not set");
            return Reply::ready();
        };

        Reply::pending(async move {
            let mut graph = graph.lock().await;
            graph.node_mut().merge_attributes(msg.update);
            respond(&msg.reply, graph.snapshot(address));
        })
    });
}
