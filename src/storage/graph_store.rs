//! JSON storage for graphs
//!
//! Each graph lives in `.canvas/graphs/{id}.json` as one pretty-printed JSON
//! document. Readers take a shared lock and writers an exclusive one, and
//! writes go to a temp file that is renamed into place, so a reader always
//! sees a complete snapshot.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use thiserror::Error;

use crate::domain::{Graph, GraphId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Graph not found: {0}")]
    GraphNotFound(GraphId),

    #[error("Graph '{0}' already exists")]
    GraphAlreadyExists(GraphId),
}

/// Store for graph documents
pub struct GraphStore {
    dir: PathBuf,
}

impl GraphStore {
    /// Creates a store rooted at the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".canvas").join("graphs"))
    }

    /// Returns the directory holding the graph files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file path for a graph
    pub fn path_for(&self, id: &GraphId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Returns true if the graph has a file
    pub fn exists(&self, id: &GraphId) -> bool {
        self.path_for(id).is_file()
    }

    /// Reads one graph
    pub fn get(&self, id: &GraphId) -> Result<Graph> {
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(StoreError::GraphNotFound(id.clone()).into());
        }
        read_graph_file(&path)
    }

    /// Reads all graphs, sorted by id
    pub fn list(&self) -> Result<Vec<Graph>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read graph directory: {}", self.dir.display()))?;

        let mut graphs = Vec::new();
        for entry in entries {
            let path = entry.context("Failed to read directory entry")?.path();
            if path.extension().map(|ext| ext == "json").unwrap_or(false) {
                graphs.push(read_graph_file(&path)?);
            }
        }

        graphs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(graphs)
    }

    /// Writes a graph, replacing any previous version
    pub fn save(&self, graph: &Graph) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create directory: {}", self.dir.display()))?;

        let path = self.path_for(&graph.id);
        let temp_path = path.with_extension("json.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            file.lock_exclusive()
                .context("Failed to acquire write lock on graph file")?;

            let mut writer = BufWriter::new(&file);
            serde_json::to_writer_pretty(&mut writer, graph).context("Failed to serialize graph")?;
            writeln!(writer).context("Failed to write graph")?;
            writer.flush().context("Failed to flush graph file")?;
        }

        // Atomic rename
        fs::rename(&temp_path, &path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }

    /// Saves a new graph, failing if the id is taken
    pub fn create(&self, graph: &Graph) -> Result<()> {
        if self.exists(&graph.id) {
            return Err(StoreError::GraphAlreadyExists(graph.id.clone()).into());
        }
        self.save(graph)
    }

    /// Reads a graph, creating an empty one if it does not exist yet
    pub fn ensure(&self, id: &GraphId, name: &str) -> Result<Graph> {
        if self.exists(id) {
            return self.get(id);
        }
        let graph = Graph::new(id.clone(), name);
        self.save(&graph)?;
        Ok(graph)
    }

    /// Deletes a graph file
    pub fn delete(&self, id: &GraphId) -> Result<()> {
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(StoreError::GraphNotFound(id.clone()).into());
        }
        fs::remove_file(&path)
            .with_context(|| format!("Failed to delete graph file: {}", path.display()))
    }
}

/// Reads a graph document from any path
pub fn read_graph_file(path: &Path) -> Result<Graph> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open graph file: {}", path.display()))?;

    // Acquire shared lock for reading
    file.lock_shared()
        .context("Failed to acquire read lock on graph file")?;

    let graph: Graph = serde_json::from_reader(BufReader::new(&file))
        .with_context(|| format!("Failed to parse graph file: {}", path.display()))?;

    // Lock is released when file is dropped
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Edge, Node};
    use tempfile::TempDir;

    fn graph_id(id: &str) -> GraphId {
        id.parse().unwrap()
    }

    fn sample_graph() -> Graph {
        let mut graph = Graph::new(graph_id("plan"), "Plan");
        graph.add_node(Node::new("a", "A"));
        graph.add_node(Node::new("b", "B"));
        graph.add_edge(Edge::direct("e1", "a", "b"));
        graph
    }

    #[test]
    fn empty_store() {
        let dir = TempDir::new().unwrap();
        let store = GraphStore::new(dir.path().join("graphs"));

        assert!(store.list().unwrap().is_empty());
        assert!(!store.exists(&graph_id("plan")));
        assert!(store.get(&graph_id("plan")).is_err());
    }

    #[test]
    fn save_and_get() {
        let dir = TempDir::new().unwrap();
        let store = GraphStore::new(dir.path());

        let graph = sample_graph();
        store.save(&graph).unwrap();

        assert!(store.exists(&graph.id));
        let loaded = store.get(&graph.id).unwrap();
        assert_eq!(loaded, graph);
        assert!(!dir.path().join("plan.json.tmp").exists());
    }

    #[test]
    fn save_replaces() {
        let dir = TempDir::new().unwrap();
        let store = GraphStore::new(dir.path());

        let mut graph = sample_graph();
        store.save(&graph).unwrap();

        graph.remove_node("a").unwrap();
        store.save(&graph).unwrap();

        let loaded = store.get(&graph.id).unwrap();
        assert_eq!(loaded.nodes.len(), 1);
        assert!(loaded.edges.is_empty());
    }

    #[test]
    fn create_rejects_duplicates() {
        let dir = TempDir::new().unwrap();
        let store = GraphStore::new(dir.path());

        let graph = sample_graph();
        store.create(&graph).unwrap();

        let err = store.create(&graph).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::GraphAlreadyExists(_))
        ));
    }

    #[test]
    fn list_sorted_by_id() {
        let dir = TempDir::new().unwrap();
        let store = GraphStore::new(dir.path());

        for id in ["zeta", "alpha", "mid"] {
            store.save(&Graph::new(graph_id(id), id)).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let ids: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|g| g.id.to_string())
            .collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn ensure_creates_once() {
        let dir = TempDir::new().unwrap();
        let store = GraphStore::new(dir.path());
        let id = graph_id("workspace");

        let mut graph = store.ensure(&id, "Workspace").unwrap();
        assert_eq!(graph.name, "Workspace");

        graph.add_node(Node::new("a", "A"));
        store.save(&graph).unwrap();

        let again = store.ensure(&id, "Other").unwrap();
        assert_eq!(again.name, "Workspace");
        assert_eq!(again.nodes.len(), 1);
    }

    #[test]
    fn delete_graph() {
        let dir = TempDir::new().unwrap();
        let store = GraphStore::new(dir.path());

        let graph = sample_graph();
        store.save(&graph).unwrap();
        store.delete(&graph.id).unwrap();

        assert!(!store.exists(&graph.id));
        let err = store.delete(&graph.id).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::GraphNotFound(_))
        ));
    }

    #[test]
    fn read_legacy_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.json");
        fs::write(
            &path,
            r#"{
  "id": "legacy",
  "name": "Legacy",
  "nodes": [{"id": "a", "text": "A"}, {"id": "c", "text": "C"}],
  "edges": [{"id": "e", "source_id": "a", "target_id": "c", "source_ids": ["a", "b"]}]
}"#,
        )
        .unwrap();

        let graph = read_graph_file(&path).unwrap();
        assert_eq!(graph.edges["e"].sources.len(), 2);

        let list = graph.dependency_list();
        assert_eq!(list.rows.len(), 2);
        assert_eq!(list.summary.ready, 2);
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = read_graph_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));
    }
}
