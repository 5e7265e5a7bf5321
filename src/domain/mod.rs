//! Domain models for the graph canvas
//!
//! Contains the graph model and the dependency list derivation, without any
//! I/O concerns.

mod id;
mod node;
mod edge;
mod graph;
mod ordering;

pub use id::{generate_id, GraphId, IdError, IdKind};
pub use node::{DeclaredStatus, Node, NodeMeta, UnknownStatus};
pub use edge::Edge;
pub use graph::{Graph, GraphError, GraphType};
pub use ordering::{
    count_declared_blocked, derive_task_rows, DependencyList, DependencySummary, RowStatus,
    TaskRow,
};
