//! TreeActor: ordered, parent-tracked children with cycle prevention.
//!
//! A tree actor is a node actor whose edge list doubles as its child list.
//! On top of the shared edge handlers it provides:
//! - list-order mutation (append, insert-before, replace, remove)
//! - a blocking ancestor walk that rejects cycle-introducing mutations
//! - parent-pointer maintenance on the children, by message
//!
//! The child is the only writer of its own parent pointer. Parents initiate
//! writes with `SetParent` (adopt) and `ClearParentIf` (release); the latter is
//! a compare-and-set evaluated by the child, so a release from an old parent
//! never clobbers a newer parent's adoption.

use acton_reactive::prelude::*;
use tracing::{debug, trace, warn};

use super::graph_actor::{spawn_graph_actor, watch, GraphActorState};
use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::graph::{GraphModel, TreeState};
use crate::messages::{
    AppendChild, ClearParentIf, GetField, InsertBefore, RemoveChild, ReplaceChild, SetParent,
};
use crate::node::{Field, FieldValue, NodeId, NodeRef};
use crate::reply::{call, cast, respond};

/// Actor representing one node of a tree.
///
/// Handles, in addition to everything a [`NodeActor`](super::NodeActor) handles:
/// - `AppendChild` / `InsertBefore` / `RemoveChild` / `ReplaceChild`
/// - `SetParent` / `ClearParentIf` - parent-pointer writes from parents
#[derive(Debug, Clone, Default)]
pub struct TreeActor {
    config: GraphConfig,
}

impl TreeActor {
    /// Create a new TreeActor.
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    /// Spawn this tree node in the given runtime and return its address.
    ///
    /// The node starts as a root with no children.
    pub async fn spawn(self, runtime: &mut ActorRuntime) -> NodeRef {
        spawn_graph_actor::<TreeState>(runtime, "Tree", self.config, configure_tree_actor).await
    }
}

/// Read `node`'s parent pointer with a blocking call.
///
/// Plain nodes answer `None`.
async fn parent_of(node: &NodeRef, config: &GraphConfig) -> Result<Option<NodeRef>> {
    let value = call(node, config.call_timeout(), |reply| GetField {
        field: Field::Parent,
        reply,
    })
    .await?;
    Ok(match value {
        FieldValue::Parent(parent) => parent,
        _ => None,
    })
}

/// Whether `node` is `candidate` or one of `candidate`'s ancestors.
///
/// Walks parent pointers upward, one blocking call per hop. An ancestor that
/// has stopped ends the walk like a root does. A walk longer than
/// `max_ancestor_depth` (when configured) counts as reaching `node`.
///
/// `walker` is the actor running the walk, if any. It cannot answer its own
/// parent query while busy, so arriving back at it means the tree already
/// holds a cycle through it, and that also counts as reaching `node`.
pub(crate) async fn is_ancestor(
    candidate: Option<NodeRef>,
    node: NodeId,
    walker: Option<NodeId>,
    config: &GraphConfig,
) -> Result<bool> {
    let mut candidate = candidate;
    let mut hops = 0usize;

    while let Some(current) = candidate {
        if current.id() == node {
            return Ok(true);
        }
        if walker == Some(current.id()) {
            warn!(node = %node, walker = %current, "Ancestor walk looped back to walker");
            return Ok(true);
        }
        if config.max_ancestor_depth.is_some_and(|max| hops >= max) {
            warn!(node = %node, hops, "Ancestor walk exceeded configured depth");
            return Ok(true);
        }
        hops += 1;

        candidate = match parent_of(&current, config).await {
            Ok(parent) => parent,
            Err(GraphError::Unavailable(id)) => {
                trace!(ancestor = %id, "Ancestor stopped, treating as root");
                None
            }
            Err(e) => return Err(e),
        };
    }

    Ok(false)
}

/// Reject `child` if it is `parent` or one of `parent`'s ancestors.
///
/// The first hop uses `tree`'s own parent pointer; the actor never calls itself.
async fn ensure_acyclic(
    tree: &TreeState,
    parent: &NodeRef,
    child: &NodeRef,
    config: &GraphConfig,
) -> Result<()> {
    let cyclic = child == parent
        || is_ancestor(tree.parent().cloned(), child.id(), Some(parent.id()), config).await?;
    if cyclic {
        return Err(GraphError::CycleRejected {
            parent: parent.id(),
            child: child.id(),
        });
    }
    Ok(())
}

/// Log a failure that a cast caller will never see.
fn report(outcome: &Result<()>, reply_expected: bool, operation: &str) {
    if let Err(e) = outcome {
        if !reply_expected {
            warn!(error = %e, operation, "Cast rejected");
        }
    }
}

/// Configure the tree-specific handlers.
fn configure_tree_actor(actor: &mut ManagedActor<Idle, GraphActorState<TreeState>>) {
    // AppendChild - cycle check (call form only), add edge, adopt child
    actor.mutate_on::<AppendChild>(|actor, context| {
        let msg = context.message().clone();
        let graph = actor.model.graph.clone();
        let config = actor.model.config.clone();
        let Some(address) = actor.model.address.clone() else {
            warn!("AppendChild: address not set");
            return Reply::ready();
        };

        Reply::pending(async move {
            let mut tree = graph.lock().await;

            let outcome = if msg.check_cycles {
                ensure_acyclic(&tree, &address, &msg.child, &config).await
            } else {
                Ok(())
            };
            report(&outcome, msg.reply.is_some(), "append_child");
            if let Err(e) = outcome {
                respond(&msg.reply, Err(e));
                return;
            }

            let watched = tree.node().is_monitoring(msg.child.id());
            tree.append_child(msg.child.clone(), msg.weight);
            if !watched {
                watch(&address, &msg.child);
            }
            debug!(
                node = %address,
                child = %msg.child,
                children = tree.child_nodes().len(),
                "Child appended"
            );
            let snapshot = tree.snapshot(address.clone());
            drop(tree);

            cast(&msg.child, SetParent { parent: Some(address) }).await;
            respond(&msg.reply, Ok(snapshot));
        })
    });

    // InsertBefore - splice child in front of a reference sibling
    actor.mutate_on::<InsertBefore>(|actor, context| {
        let msg = context.message().clone();
        let graph = actor.model.graph.clone();
        let config = actor.model.config.clone();
        let Some(address) = actor.model.address.clone() else {
            warn!("InsertBefore: address not set");
            return Reply::ready();
        };

        Reply::pending(async move {
            let mut tree = graph.lock().await;
            let child = msg.child.clone();

            let outcome: Result<()> = async {
                if !tree.has_child(msg.reference.id()) {
                    return Err(GraphError::ReferenceNotFound {
                        parent: address.id(),
                        reference: msg.reference.id(),
                    });
                }
                if msg.check_cycles || child == address {
                    ensure_acyclic(&tree, &address, &child, &config).await?;
                }
                Ok(())
            }
            .await;
            report(&outcome, msg.reply.is_some(), "insert_before");
            if let Err(e) = outcome {
                respond(&msg.reply, Err(e));
                return;
            }

            if child == msg.reference {
                respond(&msg.reply, Ok(tree.snapshot(address)));
                return;
            }

            // Detach from wherever the child currently sits
            let current_parent = match parent_of(&child, &config).await {
                Ok(parent) => parent,
                Err(e) => {
                    report(&Err(e.clone()), msg.reply.is_some(), "insert_before");
                    respond(&msg.reply, Err(e));
                    return;
                }
            };
            if tree.has_child(child.id()) {
                tree.detach(child.id());
            }
            if let Some(other) = current_parent.filter(|p| p != &address) {
                cast(
                    &other,
                    RemoveChild {
                        child: child.clone(),
                        reply: None,
                    },
                )
                .await;
            }

            let watched = tree.node().is_monitoring(child.id());
            tree.insert_before(child.clone(), msg.weight, msg.reference.id());
            if !watched {
                watch(&address, &child);
            }
            debug!(
                node = %address,
                child = %child,
                reference = %msg.reference,
                "Child inserted"
            );
            let snapshot = tree.snapshot(address.clone());
            drop(tree);

            cast(&child, SetParent { parent: Some(address) }).await;
            respond(&msg.reply, Ok(snapshot));
        })
    });

    // RemoveChild - drop the edge, release the child's parent pointer
    actor.mutate_on::<RemoveChild>(|actor, context| {
        let msg = context.message().clone();
        let graph = actor.model.graph.clone();
        let Some(address) = actor.model.address.clone() else {
            warn!("RemoveChild: address not set");
            return Reply::ready();
        };

        Reply::pending(async move {
            let mut tree = graph.lock().await;

            if !tree.detach(msg.child.id()) {
                let e = GraphError::ChildNotFound {
                    parent: address.id(),
                    child: msg.child.id(),
                };
                trace!(error = %e, "RemoveChild: nothing to remove");
                respond(&msg.reply, Err(e));
                return;
            }
            debug!(node = %address, child = %msg.child, "Child removed");
            let snapshot = tree.snapshot(address.clone());
            drop(tree);

            cast(
                &msg.child,
                ClearParentIf {
                    expected: address.id(),
                },
            )
            .await;
            respond(&msg.reply, Ok(snapshot));
        })
    });

    // ReplaceChild - swap old for new at the same position
    actor.mutate_on::<ReplaceChild>(|actor, context| {
        let msg = context.message().clone();
        let graph = actor.model.graph.clone();
        let config = actor.model.config.clone();
        let Some(address) = actor.model.address.clone() else {
            warn!("ReplaceChild: address not set");
            return Reply::ready();
        };

        Reply::pending(async move {
            let mut tree = graph.lock().await;
            let (new_child, old_child) = (msg.new_child.clone(), msg.old_child.clone());

            let outcome: Result<()> = async {
                if !tree.has_child(old_child.id()) {
                    return Err(GraphError::ReferenceNotFound {
                        parent: address.id(),
                        reference: old_child.id(),
                    });
                }
                ensure_acyclic(&tree, &address, &new_child, &config).await
            }
            .await;
            report(&outcome, msg.reply.is_some(), "replace_child");
            if let Err(e) = outcome {
                respond(&msg.reply, Err(e));
                return;
            }

            if new_child == old_child {
                respond(&msg.reply, Ok(tree.snapshot(address)));
                return;
            }

            // A different parent gives the new child up before we take it
            let current_parent = match parent_of(&new_child, &config).await {
                Ok(parent) => parent,
                Err(e) => {
                    report(&Err(e.clone()), msg.reply.is_some(), "replace_child");
                    respond(&msg.reply, Err(e));
                    return;
                }
            };
            if let Some(other) = current_parent.filter(|p| p != &address) {
                let released = call(&other, config.call_timeout(), |reply| RemoveChild {
                    child: new_child.clone(),
                    reply: Some(reply),
                })
                .await;
                match released {
                    Ok(Ok(_)) | Ok(Err(GraphError::ChildNotFound { .. })) => {}
                    Ok(Err(e)) | Err(e) => {
                        warn!(
                            node = %address,
                            old_parent = %other,
                            error = %e,
                            "ReplaceChild: old parent did not release child"
                        );
                    }
                }
            }
            if tree.has_child(new_child.id()) {
                tree.detach(new_child.id());
            }

            cast(
                &old_child,
                ClearParentIf {
                    expected: address.id(),
                },
            )
            .await;
            let watched = tree.node().is_monitoring(new_child.id());
            tree.replace(new_child.clone(), msg.weight, old_child.id());
            if !watched {
                watch(&address, &new_child);
            }
            debug!(
                node = %address,
                new_child = %new_child,
                old_child = %old_child,
                "Child replaced"
            );
            let snapshot = tree.snapshot(address.clone());
            drop(tree);

            cast(&new_child, SetParent { parent: Some(address) }).await;
            respond(&msg.reply, Ok(snapshot));
        })
    });

    actor.mutate_on::<SetParent>(|actor, context| {
        let parent = context.message().parent.clone();
        let graph = actor.model.graph.clone();
        let address = actor.model.address.clone();

        Reply::pending(async move {
            let mut tree = graph.lock().await;
            debug!(node = ?address, parent = ?parent, "Parent set");
            tree.set_parent(parent);
        })
    });

    actor.mutate_on::<ClearParentIf>(|actor, context| {
        let expected = context.message().expected;
        let graph = actor.model.graph.clone();
        let address = actor.model.address.clone();

        Reply::pending(async move {
            let mut tree = graph.lock().await;
            if tree.clear_parent_if(expected) {
                debug!(node = ?address, parent = %expected, "Parent cleared");
            } else {
                trace!(
                    node = ?address,
                    expected = %expected,
                    current = ?tree.parent(),
                    "Parent pointer moved on, not clearing"
                );
            }
        })
    });
}
