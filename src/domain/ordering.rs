//! Dependency list derivation
//!
//! Turns a snapshot of nodes and edges into an ordered task list. Every edge
//! makes each of its sources a prerequisite of each of its targets. Nodes are
//! then scheduled with Kahn's algorithm: a node becomes ready once all of its
//! prerequisites have been scheduled, and nodes that become ready together
//! are taken in tie-break order:
//!
//! 1. numeric `metadata.order` (missing or non-numeric sorts last)
//! 2. vertical position `y` (missing sorts last)
//! 3. lowercased `text`, or the unmodified id when `text` is empty
//! 4. node id
//!
//! Nodes that are never scheduled sit on a dependency cycle or downstream of
//! one. They are reported as blocked rows, never as an error.
//!
//! The derivation is a pure function of its inputs and holds no state.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use serde::Serialize;

use super::edge::Edge;
use super::node::{DeclaredStatus, Node};

/// Structural classification of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    /// Scheduled, carries an order number
    Ready,
    /// On or behind an unresolved cycle
    Blocked,
}

impl RowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowStatus::Ready => "ready",
            RowStatus::Blocked => "blocked",
        }
    }
}

/// One row of the dependency list
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow<'a> {
    pub node: &'a Node,

    /// 1-based schedule position, only for ready rows
    pub order: Option<usize>,

    /// Direct prerequisites, sorted by id
    pub prerequisites: Vec<&'a Node>,

    /// Direct dependents, sorted by id
    pub dependents: Vec<&'a Node>,

    pub status: RowStatus,
}

impl<'a> TaskRow<'a> {
    pub fn is_ready(&self) -> bool {
        self.status == RowStatus::Ready
    }

    pub fn is_blocked(&self) -> bool {
        self.status == RowStatus::Blocked
    }

    /// `"No prerequisites"` or `"Depends on A, B"`
    pub fn prerequisites_summary(&self) -> String {
        if self.prerequisites.is_empty() {
            return "No prerequisites".to_string();
        }
        let labels: Vec<&str> = self
            .prerequisites
            .iter()
            .map(|node| node.display_label())
            .collect();
        format!("Depends on {}", labels.join(", "))
    }

    /// `"Unblocks 0 tasks"` or `"Unblocks 2 tasks • Next: A +"`
    pub fn dependents_summary(&self) -> String {
        let count = self.dependents.len();
        let mut summary = format!(
            "Unblocks {} task{}",
            count,
            if count == 1 { "" } else { "s" }
        );
        if let Some(next) = self.dependents.first() {
            summary.push_str(" • Next: ");
            summary.push_str(next.display_label());
            if count > 1 {
                summary.push_str(" +");
            }
        }
        summary
    }
}

/// Tie-break key for nodes that become ready at the same time
#[derive(Debug, Clone)]
struct SortKey<'a> {
    order: f64,
    y: f64,
    label: String,
    node: &'a Node,
}

impl<'a> SortKey<'a> {
    fn of(node: &'a Node) -> Self {
        // -0.0 and 0.0 tie
        let order = match node.metadata.order_hint() {
            Some(hint) if hint == 0.0 => 0.0,
            Some(hint) => hint,
            None => f64::INFINITY,
        };
        let y = match node.y {
            Some(y) if y == 0.0 => 0.0,
            Some(y) => y,
            None => f64::INFINITY,
        };
        let label = if node.text.is_empty() {
            node.id.clone()
        } else {
            node.text.to_lowercase()
        };
        Self {
            order,
            y,
            label,
            node,
        }
    }
}

impl Ord for SortKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order
            .total_cmp(&other.order)
            .then_with(|| self.y.total_cmp(&other.y))
            .then_with(|| self.label.cmp(&other.label))
            .then_with(|| self.node.id.cmp(&other.node.id))
    }
}

impl PartialOrd for SortKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey<'_> {}

/// Prerequisite/dependent sets for the nodes of one snapshot
struct Adjacency<'a> {
    /// Present nodes, first occurrence of each id
    nodes: Vec<&'a Node>,
    by_id: HashMap<&'a str, &'a Node>,
    prerequisites: HashMap<&'a str, BTreeSet<&'a str>>,
    dependents: HashMap<&'a str, BTreeSet<&'a str>>,
}

impl<'a> Adjacency<'a> {
    fn build<'e>(
        nodes: impl IntoIterator<Item = &'a Node>,
        edges: impl IntoIterator<Item = &'e Edge>,
    ) -> Self {
        let mut present = Vec::new();
        let mut by_id: HashMap<&'a str, &'a Node> = HashMap::new();
        for node in nodes {
            if !by_id.contains_key(node.id.as_str()) {
                by_id.insert(node.id.as_str(), node);
                present.push(node);
            }
        }

        let mut prerequisites: HashMap<&'a str, BTreeSet<&'a str>> = present
            .iter()
            .map(|node| (node.id.as_str(), BTreeSet::new()))
            .collect();
        let mut dependents = prerequisites.clone();

        for edge in edges {
            for (source, target) in edge.pairs() {
                // Endpoints missing from the snapshot are stale references
                let (Some(&source), Some(&target)) = (by_id.get(source), by_id.get(target)) else {
                    continue;
                };
                let (source, target) = (source.id.as_str(), target.id.as_str());
                if let Some(set) = prerequisites.get_mut(target) {
                    set.insert(source);
                }
                if let Some(set) = dependents.get_mut(source) {
                    set.insert(target);
                }
            }
        }

        Self {
            nodes: present,
            by_id,
            prerequisites,
            dependents,
        }
    }

    fn resolve(&self, ids: Option<&BTreeSet<&'a str>>) -> Vec<&'a Node> {
        ids.into_iter()
            .flatten()
            .filter_map(|id| self.by_id.get(id).copied())
            .collect()
    }

    fn row(&self, node: &'a Node, order: Option<usize>, status: RowStatus) -> TaskRow<'a> {
        let id = node.id.as_str();
        TaskRow {
            node,
            order,
            prerequisites: self.resolve(self.prerequisites.get(id)),
            dependents: self.resolve(self.dependents.get(id)),
            status,
        }
    }

    /// Kahn traversal: ready rows in schedule order, then blocked rows
    fn rows(&self) -> Vec<TaskRow<'a>> {
        let mut remaining = self.prerequisites.clone();
        let mut worklist: BinaryHeap<Reverse<SortKey<'a>>> = self
            .nodes
            .iter()
            .copied()
            .filter(|node| {
                remaining
                    .get(node.id.as_str())
                    .map_or(true, |pending| pending.is_empty())
            })
            .map(|node| Reverse(SortKey::of(node)))
            .collect();

        let mut visited: HashSet<&'a str> = HashSet::with_capacity(self.nodes.len());
        let mut rows = Vec::with_capacity(self.nodes.len());

        while let Some(Reverse(key)) = worklist.pop() {
            let node = key.node;
            let id = node.id.as_str();
            if !visited.insert(id) {
                continue;
            }

            rows.push(self.row(node, Some(rows.len() + 1), RowStatus::Ready));

            for dependent in self.dependents.get(id).into_iter().flatten() {
                let Some(pending) = remaining.get_mut(dependent) else {
                    continue;
                };
                pending.remove(id);
                if pending.is_empty() && !visited.contains(dependent) {
                    if let Some(&next) = self.by_id.get(dependent) {
                        worklist.push(Reverse(SortKey::of(next)));
                    }
                }
            }
        }

        let mut blocked: Vec<SortKey<'a>> = self
            .nodes
            .iter()
            .copied()
            .filter(|node| !visited.contains(node.id.as_str()))
            .map(SortKey::of)
            .collect();
        blocked.sort();

        rows.extend(
            blocked
                .into_iter()
                .map(|key| self.row(key.node, None, RowStatus::Blocked)),
        );
        rows
    }

    /// Groups of nodes that depend on each other in a loop
    fn cycles(&self) -> Vec<Vec<&'a Node>> {
        let mut graph: DiGraph<&'a Node, ()> = DiGraph::new();
        let indices: HashMap<&str, _> = self
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), graph.add_node(*node)))
            .collect();

        for (target, sources) in &self.prerequisites {
            for source in sources {
                if let (Some(&from), Some(&to)) = (indices.get(source), indices.get(target)) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        let mut groups: Vec<Vec<SortKey<'a>>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut keys: Vec<_> = component
                    .into_iter()
                    .map(|idx| SortKey::of(graph[idx]))
                    .collect();
                keys.sort();
                keys
            })
            .collect();
        groups.sort_by(|a, b| a[0].cmp(&b[0]));

        groups
            .into_iter()
            .map(|keys| keys.into_iter().map(|key| key.node).collect())
            .collect()
    }
}

/// Derives the ordered task rows for a snapshot
///
/// Ready rows come first in schedule order (`order` = 1..K), followed by
/// blocked rows in tie-break order. Every node appears exactly once; if the
/// same id is given twice, the first node wins. Edge endpoints that are not
/// in `nodes` and self-pairs are ignored.
pub fn derive_task_rows<'a, 'e>(
    nodes: impl IntoIterator<Item = &'a Node>,
    edges: impl IntoIterator<Item = &'e Edge>,
) -> Vec<TaskRow<'a>> {
    Adjacency::build(nodes, edges).rows()
}

/// Counts nodes whose declared status is `blocked`
///
/// This is the user-set tag, not the structural classification.
pub fn count_declared_blocked<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> usize {
    nodes
        .into_iter()
        .filter(|node| node.declared_status() == Some(DeclaredStatus::Blocked))
        .count()
}

/// Counters shown above the dependency list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DependencySummary {
    /// Rows scheduled with an order number
    pub ready: usize,

    /// Rows held back by a cycle
    pub blocked: usize,

    /// Nodes whose declared status is `blocked`
    pub declared_blocked: usize,

    /// Number of edges in the snapshot
    pub dependencies: usize,
}

/// Derived rows plus the counters and cycle groups around them
#[derive(Debug, Clone)]
pub struct DependencyList<'a> {
    pub rows: Vec<TaskRow<'a>>,
    pub summary: DependencySummary,

    /// Strongly connected groups of two or more nodes
    pub cycles: Vec<Vec<&'a Node>>,
}

impl<'a> DependencyList<'a> {
    /// Derives the list for a snapshot
    pub fn derive<'e>(
        nodes: impl IntoIterator<Item = &'a Node>,
        edges: impl IntoIterator<Item = &'e Edge>,
    ) -> Self {
        let edges: Vec<&Edge> = edges.into_iter().collect();
        let adjacency = Adjacency::build(nodes, edges.iter().copied());
        let rows = adjacency.rows();

        let ready = rows.iter().filter(|row| row.is_ready()).count();
        let summary = DependencySummary {
            ready,
            blocked: rows.len() - ready,
            declared_blocked: count_declared_blocked(adjacency.nodes.iter().copied()),
            dependencies: edges.len(),
        };

        Self {
            rows,
            summary,
            cycles: adjacency.cycles(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn ready_rows(&self) -> impl Iterator<Item = &TaskRow<'a>> {
        self.rows.iter().filter(|row| row.is_ready())
    }

    pub fn blocked_rows(&self) -> impl Iterator<Item = &TaskRow<'a>> {
        self.rows.iter().filter(|row| row.is_blocked())
    }

    /// Returns true if the node sits on a cycle rather than behind one
    pub fn is_in_cycle(&self, node_id: &str) -> bool {
        self.cycles
            .iter()
            .any(|group| group.iter().any(|node| node.id == node_id))
    }

    /// `"Ordered automatically from N dependencies."`
    pub fn headline(&self) -> String {
        if self.is_empty() {
            return "Add nodes to view the dependency list.".to_string();
        }
        let count = self.summary.dependencies;
        format!(
            "Ordered automatically from {} {}.",
            count,
            if count == 1 { "dependency" } else { "dependencies" }
        )
    }
}
