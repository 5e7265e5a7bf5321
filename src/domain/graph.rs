//! Graph aggregate
//!
//! A graph owns its nodes and edges and is the unit that gets loaded, edited
//! and saved. Nodes and edges are keyed by id in sorted maps so files are
//! written in a stable order; on disk they are plain JSON lists.
//!
//! The task operations at the bottom back the dependency list: a task is a
//! node, and its prerequisites/postrequisites are direct (one-to-one) edges.
//! Hyperedges are never rewritten by those operations.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::edge::Edge;
use super::id::{generate_id, GraphId, IdKind};
use super::node::{DeclaredStatus, Node};
use super::ordering::DependencyList;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Edge not found: {0}")]
    EdgeNotFound(String),

    #[error("Graph type '{0}' is invalid. Choose one of: list, tree, dag, graph, multigraph, hypergraph, ubergraph")]
    InvalidGraphType(String),

    #[error("Task label is required")]
    EmptyLabel,

    #[error("Self-dependency not allowed: {0}")]
    SelfDependency(String),

    #[error("An edge needs at least one source and one target")]
    EmptyEndpoints,
}

/// Kind of graph the canvas is drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GraphType {
    List,
    Tree,
    Dag,
    #[default]
    Graph,
    Multigraph,
    Hypergraph,
    Ubergraph,
}

impl GraphType {
    pub const ALL: [GraphType; 7] = [
        GraphType::List,
        GraphType::Tree,
        GraphType::Dag,
        GraphType::Graph,
        GraphType::Multigraph,
        GraphType::Hypergraph,
        GraphType::Ubergraph,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GraphType::List => "list",
            GraphType::Tree => "tree",
            GraphType::Dag => "dag",
            GraphType::Graph => "graph",
            GraphType::Multigraph => "multigraph",
            GraphType::Hypergraph => "hypergraph",
            GraphType::Ubergraph => "ubergraph",
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphType {
    type Err = GraphError;

    /// Case-insensitive; blank means `graph`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if normalized.is_empty() {
            return Ok(GraphType::Graph);
        }
        GraphType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| GraphError::InvalidGraphType(s.to_string()))
    }
}

impl TryFrom<String> for GraphType {
    type Error = GraphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GraphType> for String {
    fn from(kind: GraphType) -> Self {
        kind.as_str().to_string()
    }
}

fn default_directed() -> bool {
    true
}

/// A graph with its nodes and edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub id: GraphId,

    /// Display name (falls back to the id when blank)
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub graph_type: GraphType,

    #[serde(default = "default_directed")]
    pub directed: bool,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,

    #[serde(default, with = "keyed_list")]
    pub nodes: BTreeMap<String, Node>,

    #[serde(default, with = "keyed_list")]
    pub edges: BTreeMap<String, Edge>,

    /// Rendering settings and anything else not interpreted here
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Graph {
    /// Creates an empty directed graph
    pub fn new(id: GraphId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            graph_type: GraphType::default(),
            directed: true,
            metadata: Map::new(),
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    /// Name to show, falling back to the id
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() {
            self.id.as_str()
        } else {
            name
        }
    }

    /// Derives the dependency list for the current contents
    pub fn dependency_list(&self) -> DependencyList<'_> {
        DependencyList::derive(self.nodes.values(), self.edges.values())
    }

    /// Mints an id not used by any node or edge of this graph
    fn fresh_id(&self, kind: IdKind, seed: &str) -> String {
        let now = Utc::now();
        let mut salt = 0;
        loop {
            let id = generate_id(kind, seed, now, salt);
            if !self.nodes.contains_key(&id) && !self.edges.contains_key(&id) {
                return id;
            }
            salt += 1;
        }
    }

    // ---------------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------------

    /// Inserts or replaces a node
    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Creates a node with a generated id and returns it
    pub fn create_node(&mut self, text: &str, position: Option<(f64, f64)>) -> &Node {
        let id = self.fresh_id(IdKind::Node, text);
        let mut node = Node::new(id.clone(), text);
        if let Some((x, y)) = position {
            node.set_position(x, y, Some(0.0));
        }
        self.nodes.entry(id).or_insert(node)
    }

    pub fn get_node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    /// Mutable access, failing if the node does not exist
    pub fn node_mut(&mut self, node_id: &str) -> Result<&mut Node, GraphError> {
        self.nodes
            .get_mut(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))
    }

    fn require_node(&self, node_id: &str) -> Result<(), GraphError> {
        if self.nodes.contains_key(node_id) {
            Ok(())
        } else {
            Err(GraphError::NodeNotFound(node_id.to_string()))
        }
    }

    /// Removes a node and detaches it from every edge
    ///
    /// Edges left without a source or a target are removed as well.
    pub fn remove_node(&mut self, node_id: &str) -> Result<Node, GraphError> {
        let node = self
            .nodes
            .remove(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;

        for edge in self.edges.values_mut() {
            edge.remove_endpoint(node_id);
        }
        self.edges.retain(|_, edge| !edge.is_dangling());

        Ok(node)
    }

    /// Moves nodes; unknown ids are skipped. Returns the moved nodes.
    pub fn patch_node_positions(&mut self, positions: &[(String, f64, f64)]) -> Vec<Node> {
        let mut updated = Vec::new();
        for (node_id, x, y) in positions {
            if let Some(node) = self.nodes.get_mut(node_id) {
                node.set_position(*x, *y, None);
                updated.push(node.clone());
            }
        }
        updated
    }

    // ---------------------------------------------------------------------
    // Edges
    // ---------------------------------------------------------------------

    /// Inserts or replaces an edge as given
    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.insert(edge.id.clone(), edge);
    }

    /// Creates an edge with a generated id between existing nodes
    pub fn create_edge(
        &mut self,
        sources: &[String],
        targets: &[String],
        text: &str,
    ) -> Result<&Edge, GraphError> {
        self.check_endpoints(sources, targets)?;

        let seed = format!("{}->{}", sources.join(","), targets.join(","));
        let id = self.fresh_id(IdKind::Edge, &seed);
        let mut edge = Edge::new(id.clone(), sources.iter().cloned(), targets.iter().cloned());
        edge.text = text.to_string();
        Ok(self.edges.entry(id).or_insert(edge))
    }

    pub fn get_edge(&self, edge_id: &str) -> Option<&Edge> {
        self.edges.get(edge_id)
    }

    pub fn remove_edge(&mut self, edge_id: &str) -> Result<Edge, GraphError> {
        self.edges
            .remove(edge_id)
            .ok_or_else(|| GraphError::EdgeNotFound(edge_id.to_string()))
    }

    /// Replaces the endpoints of an edge; `None` keeps that side
    pub fn update_edge_endpoints(
        &mut self,
        edge_id: &str,
        sources: Option<&[String]>,
        targets: Option<&[String]>,
    ) -> Result<&Edge, GraphError> {
        let edge = self
            .edges
            .get(edge_id)
            .ok_or_else(|| GraphError::EdgeNotFound(edge_id.to_string()))?;

        let sources: Vec<String> = match sources {
            Some(ids) => ids.to_vec(),
            None => edge.sources.iter().cloned().collect(),
        };
        let targets: Vec<String> = match targets {
            Some(ids) => ids.to_vec(),
            None => edge.targets.iter().cloned().collect(),
        };
        self.check_endpoints(&sources, &targets)?;

        let edge = self
            .edges
            .get_mut(edge_id)
            .ok_or_else(|| GraphError::EdgeNotFound(edge_id.to_string()))?;
        edge.sources = sources.into_iter().filter(|id| !id.is_empty()).collect();
        edge.targets = targets.into_iter().filter(|id| !id.is_empty()).collect();
        Ok(edge)
    }

    fn check_endpoints(&self, sources: &[String], targets: &[String]) -> Result<(), GraphError> {
        let blank = |ids: &[String]| ids.iter().all(|id| id.is_empty());
        if blank(sources) || blank(targets) {
            return Err(GraphError::EmptyEndpoints);
        }
        for id in sources.iter().chain(targets).filter(|id| !id.is_empty()) {
            self.require_node(id)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Dependency list tasks
    // ---------------------------------------------------------------------

    /// Sources of direct edges that point at the node
    pub fn direct_prerequisites(&self, node_id: &str) -> BTreeSet<&str> {
        self.edges
            .values()
            .filter(|edge| edge.is_direct() && edge.targets.contains(node_id))
            .flat_map(|edge| edge.sources.iter().map(String::as_str))
            .filter(|id| *id != node_id)
            .collect()
    }

    /// Targets of direct edges that leave the node
    pub fn direct_postrequisites(&self, node_id: &str) -> BTreeSet<&str> {
        self.edges
            .values()
            .filter(|edge| edge.is_direct() && edge.sources.contains(node_id))
            .flat_map(|edge| edge.targets.iter().map(String::as_str))
            .filter(|id| *id != node_id)
            .collect()
    }

    fn check_task_links(&self, task_id: Option<&str>, ids: &[String]) -> Result<(), GraphError> {
        for id in ids {
            if Some(id.as_str()) == task_id {
                return Err(GraphError::SelfDependency(id.clone()));
            }
            self.require_node(id)?;
        }
        Ok(())
    }

    fn link(&mut self, source: &str, target: &str) {
        let id = self.fresh_id(IdKind::Edge, &format!("{}->{}", source, target));
        self.add_edge(Edge::direct(id, source, target));
    }

    /// Creates a task node wired to its prerequisites and postrequisites
    ///
    /// Each prerequisite gets a direct edge into the task, and the task gets
    /// a direct edge into each postrequisite. Returns the new node id.
    pub fn create_task(
        &mut self,
        label: &str,
        prerequisites: &[String],
        postrequisites: &[String],
    ) -> Result<String, GraphError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(GraphError::EmptyLabel);
        }
        self.check_task_links(None, prerequisites)?;
        self.check_task_links(None, postrequisites)?;

        let task_id = self.create_node(label, None).id.clone();
        for before in dedup(prerequisites) {
            self.link(before, &task_id);
        }
        for after in dedup(postrequisites) {
            self.link(&task_id, after);
        }
        Ok(task_id)
    }

    /// Relabels a task and/or replaces its direct links
    ///
    /// `None` leaves that part unchanged. Replacing prerequisites removes
    /// every direct edge into the task before adding the new ones (and the
    /// same for postrequisites with edges out of it). Hyperedges stay.
    pub fn edit_task(
        &mut self,
        task_id: &str,
        label: Option<&str>,
        prerequisites: Option<&[String]>,
        postrequisites: Option<&[String]>,
    ) -> Result<(), GraphError> {
        self.require_node(task_id)?;
        let label = match label.map(str::trim) {
            Some("") => return Err(GraphError::EmptyLabel),
            other => other,
        };
        if let Some(ids) = prerequisites {
            self.check_task_links(Some(task_id), ids)?;
        }
        if let Some(ids) = postrequisites {
            self.check_task_links(Some(task_id), ids)?;
        }

        if let Some(label) = label {
            self.node_mut(task_id)?.text = label.to_string();
        }

        if let Some(ids) = prerequisites {
            self.edges
                .retain(|_, edge| !(edge.is_direct() && edge.targets.contains(task_id)));
            for before in dedup(ids) {
                self.link(before, task_id);
            }
        }

        if let Some(ids) = postrequisites {
            self.edges
                .retain(|_, edge| !(edge.is_direct() && edge.sources.contains(task_id)));
            for after in dedup(ids) {
                self.link(task_id, after);
            }
        }

        Ok(())
    }

    /// Sets or clears the declared status of a task
    pub fn set_task_status(
        &mut self,
        task_id: &str,
        status: Option<DeclaredStatus>,
    ) -> Result<(), GraphError> {
        self.node_mut(task_id)?.set_declared_status(status);
        Ok(())
    }
}

fn dedup(ids: &[String]) -> BTreeSet<&str> {
    ids.iter().map(String::as_str).collect()
}

/// Items keyed by `id`, stored on disk as a JSON list
trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Node {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Edge {
    fn key(&self) -> &str {
        &self.id
    }
}

mod keyed_list {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Keyed;

    pub fn serialize<T, S>(items: &BTreeMap<String, T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(items.values())
    }

    /// Later entries with a repeated id replace earlier ones
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
    where
        T: Deserialize<'de> + Keyed,
        D: Deserializer<'de>,
    {
        let items = Vec::<T>::deserialize(deserializer)?;
        Ok(items
            .into_iter()
            .map(|item| (item.key().to_string(), item))
            .collect())
    }
}
