//! Client facade over node and tree actors.
//!
//! Every argument naming a node accepts a [`NodeRef`] or a [`NodeSnapshot`]
//! (by value or reference) and is resolved to an address before anything is
//! sent. Each mutation comes in two forms:
//!
//! - the call form (`add_edge`, `append_child`, ...) waits for the target to
//!   apply it and returns the target's updated state, or a [`GraphError`]
//! - the cast form (`cast_add_edge`, `cast_append_child`, ...) returns as soon
//!   as the request is queued, with no confirmation
//!
//! Cast forms skip what their call forms check: `cast_append_child` and
//! `cast_insert_before` do not run the cycle check, so they can build a cyclic
//! tree, after which any ancestor walk through the cycle never finishes. Rejected
//! casts are only logged.
//!
//! Parent pointers on children are updated by follow-up messages the parent
//! sends after it has applied the mutation; they may land after the call
//! form has returned.
//!
//! ## Usage
//!
//! ```ignore
//! use actor_graph::{ChildOpts, GraphClient};
//! use acton_reactive::prelude::*;
//!
//! let mut runtime = ActonApp::launch_async().await;
//! let client = GraphClient::default();
//!
//! let root = client.spawn_tree(&mut runtime).await;
//! let child = client.spawn_tree(&mut runtime).await;
//! let state = client.append_child(&root, &child, ChildOpts::default()).await?;
//! assert_eq!(state.children(), vec![child.id()]);
//! ```

use std::collections::HashMap;

use acton_reactive::prelude::*;
use tracing::debug;

use crate::actors::{is_ancestor, NodeActor, TreeActor};
use crate::config::GraphConfig;
use crate::error::Result;
use crate::messages::{
    AddEdge, AppendChild, GetField, GetState, InsertBefore, MergeAttributes, PutAttribute,
    RemoveChild, RemoveEdge, ReplaceChild,
};
use crate::node::{
    ChildOpts, Edge, EdgeOpts, Field, FieldValue, NodeRef, NodeRefOrSnapshot, NodeSnapshot,
};
use crate::reply::{call, cast};

fn resolve(node: impl Into<NodeRefOrSnapshot>) -> NodeRef {
    node.into().into_address()
}

/// Entry point for spawning nodes and issuing graph/tree operations.
#[derive(Debug, Clone, Default)]
pub struct GraphClient {
    config: GraphConfig,
}

impl GraphClient {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Spawn a plain graph node sharing this client's configuration.
    pub async fn spawn_node(&self, runtime: &mut ActorRuntime) -> NodeRef {
        NodeActor::new(self.config.clone()).spawn(runtime).await
    }

    /// Spawn a root tree node sharing this client's configuration.
    pub async fn spawn_tree(&self, runtime: &mut ActorRuntime) -> NodeRef {
        TreeActor::new(self.config.clone()).spawn(runtime).await
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Add an edge `from → to`; with `bidirectional`, `to → from` is added first.
    pub async fn add_edge(
        &self,
        from: impl Into<NodeRefOrSnapshot>,
        to: impl Into<NodeRefOrSnapshot>,
        opts: EdgeOpts,
    ) -> Result<NodeSnapshot> {
        let (from, to) = (resolve(from), resolve(to));
        if opts.bidirectional {
            self.add_directed(&to, &from, opts.weight).await?;
        }
        self.add_directed(&from, &to, opts.weight).await
    }

    pub async fn cast_add_edge(
        &self,
        from: impl Into<NodeRefOrSnapshot>,
        to: impl Into<NodeRefOrSnapshot>,
        opts: EdgeOpts,
    ) {
        let (from, to) = (resolve(from), resolve(to));
        if opts.bidirectional {
            cast(&to, add_edge_message(&from, opts.weight)).await;
        }
        cast(&from, add_edge_message(&to, opts.weight)).await;
    }

    /// Remove every edge `from → to`; with `bidirectional`, `to → from` too.
    ///
    /// `opts.weight` does not narrow the removal: all edges to `to` go,
    /// whatever their weight. Removing an absent edge succeeds unchanged.
    pub async fn remove_edge(
        &self,
        from: impl Into<NodeRefOrSnapshot>,
        to: impl Into<NodeRefOrSnapshot>,
        opts: EdgeOpts,
    ) -> Result<NodeSnapshot> {
        let (from, to) = (resolve(from), resolve(to));
        if opts.bidirectional {
            self.remove_directed(&to, &from, opts.weight).await?;
        }
        self.remove_directed(&from, &to, opts.weight).await
    }

    pub async fn cast_remove_edge(
        &self,
        from: impl Into<NodeRefOrSnapshot>,
        to: impl Into<NodeRefOrSnapshot>,
        opts: EdgeOpts,
    ) {
        let (from, to) = (resolve(from), resolve(to));
        if opts.bidirectional {
            cast(&to, remove_edge_message(&from, opts.weight)).await;
        }
        cast(&from, remove_edge_message(&to, opts.weight)).await;
    }

    async fn add_directed(&self, from: &NodeRef, to: &NodeRef, weight: i64) -> Result<NodeSnapshot> {
        debug!(from = %from, to = %to, weight, "add_edge");
        call(from, self.config.call_timeout(), |reply| AddEdge {
            target: to.clone(),
            weight,
            reply: Some(reply),
        })
        .await
    }

    async fn remove_directed(
        &self,
        from: &NodeRef,
        to: &NodeRef,
        weight: i64,
    ) -> Result<NodeSnapshot> {
        debug!(from = %from, to = %to, weight, "remove_edge");
        call(from, self.config.call_timeout(), |reply| RemoveEdge {
            target: to.clone(),
            weight,
            reply: Some(reply),
        })
        .await
    }

    // ------------------------------------------------------------------
    // Tree
    // ------------------------------------------------------------------

    /// Append `child` to `parent`'s children, rejecting cycles.
    pub async fn append_child(
        &self,
        parent: impl Into<NodeRefOrSnapshot>,
        child: impl Into<NodeRefOrSnapshot>,
        opts: ChildOpts,
    ) -> Result<NodeSnapshot> {
        let (parent, child) = (resolve(parent), resolve(child));
        call(&parent, self.config.call_timeout(), |reply| AppendChild {
            child,
            weight: opts.weight,
            check_cycles: true,
            reply: Some(reply),
        })
        .await?
    }

    /// Append without the cycle check.
    pub async fn cast_append_child(
        &self,
        parent: impl Into<NodeRefOrSnapshot>,
        child: impl Into<NodeRefOrSnapshot>,
        opts: ChildOpts,
    ) {
        let (parent, child) = (resolve(parent), resolve(child));
        cast(
            &parent,
            AppendChild {
                child,
                weight: opts.weight,
                check_cycles: false,
                reply: None,
            },
        )
        .await;
    }

    /// Place `child` immediately before `reference` in `parent`'s children,
    /// moving it from wherever it currently sits.
    pub async fn insert_before(
        &self,
        parent: impl Into<NodeRefOrSnapshot>,
        child: impl Into<NodeRefOrSnapshot>,
        reference: impl Into<NodeRefOrSnapshot>,
        opts: ChildOpts,
    ) -> Result<NodeSnapshot> {
        let (parent, child, reference) = (resolve(parent), resolve(child), resolve(reference));
        call(&parent, self.config.call_timeout(), |reply| InsertBefore {
            child,
            reference,
            weight: opts.weight,
            check_cycles: true,
            reply: Some(reply),
        })
        .await?
    }

    /// Insert without the cycle check; a missing reference is a silent no-op.
    pub async fn cast_insert_before(
        &self,
        parent: impl Into<NodeRefOrSnapshot>,
        child: impl Into<NodeRefOrSnapshot>,
        reference: impl Into<NodeRefOrSnapshot>,
        opts: ChildOpts,
    ) {
        let (parent, child, reference) = (resolve(parent), resolve(child), resolve(reference));
        cast(
            &parent,
            InsertBefore {
                child,
                reference,
                weight: opts.weight,
                check_cycles: false,
                reply: None,
            },
        )
        .await;
    }

    /// Remove `child` from `parent`'s children.
    pub async fn remove_child(
        &self,
        parent: impl Into<NodeRefOrSnapshot>,
        child: impl Into<NodeRefOrSnapshot>,
    ) -> Result<NodeSnapshot> {
        let (parent, child) = (resolve(parent), resolve(child));
        call(&parent, self.config.call_timeout(), |reply| RemoveChild {
            child,
            reply: Some(reply),
        })
        .await?
    }

    pub async fn cast_remove_child(
        &self,
        parent: impl Into<NodeRefOrSnapshot>,
        child: impl Into<NodeRefOrSnapshot>,
    ) {
        let (parent, child) = (resolve(parent), resolve(child));
        cast(&parent, RemoveChild { child, reply: None }).await;
    }

    /// Put `new_child` where `old_child` is in `parent`'s children.
    pub async fn replace_child(
        &self,
        parent: impl Into<NodeRefOrSnapshot>,
        new_child: impl Into<NodeRefOrSnapshot>,
        old_child: impl Into<NodeRefOrSnapshot>,
        opts: ChildOpts,
    ) -> Result<NodeSnapshot> {
        let (parent, new_child, old_child) =
            (resolve(parent), resolve(new_child), resolve(old_child));
        call(&parent, self.config.call_timeout(), |reply| ReplaceChild {
            new_child,
            old_child,
            weight: opts.weight,
            reply: Some(reply),
        })
        .await?
    }

    /// Replace without waiting; absent `old_child` or a cycle is a silent no-op.
    pub async fn cast_replace_child(
        &self,
        parent: impl Into<NodeRefOrSnapshot>,
        new_child: impl Into<NodeRefOrSnapshot>,
        old_child: impl Into<NodeRefOrSnapshot>,
        opts: ChildOpts,
    ) {
        let (parent, new_child, old_child) =
            (resolve(parent), resolve(new_child), resolve(old_child));
        cast(
            &parent,
            ReplaceChild {
                new_child,
                old_child,
                weight: opts.weight,
                reply: None,
            },
        )
        .await;
    }

    /// Whether `node` is `candidate` or one of its ancestors.
    pub async fn is_ancestor(
        &self,
        candidate: Option<NodeRef>,
        node: impl Into<NodeRefOrSnapshot>,
    ) -> Result<bool> {
        is_ancestor(candidate, resolve(node).id(), None, &self.config).await
    }

    // ------------------------------------------------------------------
    // Object manager
    // ------------------------------------------------------------------

    /// Full state of `node`.
    pub async fn get(&self, node: impl Into<NodeRefOrSnapshot>) -> Result<NodeSnapshot> {
        let node = resolve(node);
        call(&node, self.config.call_timeout(), |reply| GetState { reply }).await
    }

    /// One field of `node`.
    pub async fn get_field(
        &self,
        node: impl Into<NodeRefOrSnapshot>,
        field: Field,
    ) -> Result<FieldValue> {
        let node = resolve(node);
        call(&node, self.config.call_timeout(), |reply| GetField { field, reply }).await
    }

    pub async fn edges(&self, node: impl Into<NodeRefOrSnapshot>) -> Result<Vec<Edge>> {
        Ok(self.get(node).await?.edges)
    }

    pub async fn parent(&self, node: impl Into<NodeRefOrSnapshot>) -> Result<Option<NodeRef>> {
        Ok(self.get(node).await?.parent().cloned())
    }

    pub async fn children(&self, node: impl Into<NodeRefOrSnapshot>) -> Result<Vec<NodeRef>> {
        Ok(self
            .get(node)
            .await?
            .tree
            .map(|t| t.child_nodes)
            .unwrap_or_default())
    }

    pub async fn put(
        &self,
        node: impl Into<NodeRefOrSnapshot>,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<NodeSnapshot> {
        let (node, key) = (resolve(node), key.into());
        call(&node, self.config.call_timeout(), |reply| PutAttribute {
            key,
            value,
            reply: Some(reply),
        })
        .await
    }

    pub async fn cast_put(
        &self,
        node: impl Into<NodeRefOrSnapshot>,
        key: impl Into<String>,
        value: serde_json::Value,
    ) {
        let node = resolve(node);
        cast(
            &node,
            PutAttribute {
                key: key.into(),
                value,
                reply: None,
            },
        )
        .await;
    }

    /// Apply a partial attribute update: present keys overwrite, others stay.
    pub async fn merge(
        &self,
        node: impl Into<NodeRefOrSnapshot>,
        update: HashMap<String, serde_json::Value>,
    ) -> Result<NodeSnapshot> {
        let node = resolve(node);
        call(&node, self.config.call_timeout(), |reply| MergeAttributes {
            update,
            reply: Some(reply),
        })
        .await
    }

    pub async fn cast_merge(
        &self,
        node: impl Into<NodeRefOrSnapshot>,
        update: HashMap<String, serde_json::Value>,
    ) {
        let node = resolve(node);
        cast(&node, MergeAttributes { update, reply: None }).await;
    }
}

fn add_edge_message(target: &NodeRef, weight: i64) -> AddEdge {
    AddEdge {
        target: target.clone(),
        weight,
        reply: None,
    }
}

fn remove_edge_message(target: &NodeRef, weight: i64) -> RemoveEdge {
    RemoveEdge {
        target: target.clone(),
        weight,
        reply: None,
    }
}
