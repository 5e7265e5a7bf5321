//! Graph Canvas - graphs of tasks with an automatically ordered dependency list
//!
//! Nodes are tasks and edges (including hyperedges) are prerequisite links.
//! The dependency list orders the tasks so every prerequisite comes first,
//! and flags tasks caught on or behind a cycle as blocked.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{
    derive_task_rows, DeclaredStatus, DependencyList, Edge, Graph, GraphId, Node, RowStatus,
    TaskRow,
};
