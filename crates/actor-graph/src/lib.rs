//! Actor Graph: graph and tree topologies built from independent actors.
//!
//! Each node is an acton-reactive actor that owns its outgoing, weighted edges
//! and monitors their targets, pruning edges when a target terminates. Tree
//! nodes add an ordered child list mirrored from those edges, a parent
//! pointer, and a blocking ancestor walk that rejects cycles.

pub mod actors;
pub mod client;
pub mod config;
pub mod error;
pub mod graph;
pub mod messages;
pub mod node;
pub mod reply;

pub use actors::{NodeActor, TreeActor};
pub use client::GraphClient;
pub use config::GraphConfig;
pub use error::GraphError;
pub use graph::{Address, GraphModel, NodeState, TreeState};
pub use node::{
    ChildOpts, Edge, EdgeOpts, Field, FieldValue, NodeId, NodeRef, NodeRefOrSnapshot,
    NodeSnapshot, TreeLinks,
};
