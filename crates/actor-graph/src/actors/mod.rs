//! Acton-reactive actors for graph and tree nodes.
//!
//! Each node is its own actor; its mailbox is the only way in:
//!
//! ```text
//! Client → AddEdge / RemoveEdge      → NodeActor | TreeActor
//! Client → AppendChild / InsertBefore
//!          / RemoveChild / ReplaceChild → TreeActor
//!   ├─ GetField(Parent) (call)  → ancestors       (cycle check)
//!   ├─ RemoveChild (call/cast)  → child's old parent
//!   ├─ SetParent (cast)         → new child
//!   └─ ClearParentIf (cast)     → removed child    (compare-and-set in the child)
//! Actor stopping → NodeDown (broadcast) → every node monitoring it prunes
//! New monitor → Ping (call, detached task) → target
//!   └─ port dropped → NodeDown (cast) → the new monitor's owner
//! ```
//!
//! Handlers are registered with `mutate_on`, so one actor applies one request
//! at a time, start to finish, including any nested calls it makes.

mod graph_actor;
mod node_actor;
mod tree_actor;

pub use graph_actor::GraphActorState;
pub use node_actor::NodeActor;
pub use tree_actor::TreeActor;

pub(crate) use tree_actor::is_ancestor;
