//! Project management
//!
//! Handles project initialization and provides access to stores.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::{Config, GraphStore};
use crate::domain::{Graph, GraphId};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a canvas project. Run 'canvas init' first.")]
    NotInProject,
}

/// A canvas project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let canvas_dir = root.join(".canvas");

        if !canvas_dir.is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let canvas_dir = root.join(".canvas");

        let graphs_dir = canvas_dir.join("graphs");
        fs::create_dir_all(&graphs_dir).with_context(|| {
            format!("Failed to create graphs directory: {}", graphs_dir.display())
        })?;

        // Create default config
        let config_path = canvas_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# Graph canvas configuration

# Graph used when a command is not given --graph
default_graph = "workspace"

# Name given to the default graph when it is first created
default_graph_name = "Workspace"

# Type for new graphs (list, tree, dag, graph, multigraph, hypergraph, ubergraph)
default_graph_type = "graph"
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        // Create .gitignore for .canvas
        let gitignore_path = canvas_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = r#"# Ignore interrupted writes
graphs/*.json.tmp
"#;
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .canvas directory path
    pub fn canvas_dir(&self) -> PathBuf {
        self.root.join(".canvas")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the graph store
    pub fn graph_store(&self) -> GraphStore {
        GraphStore::for_project(&self.root)
    }

    /// Resolves `--graph`, falling back to the configured default
    pub fn graph_id(&self, requested: Option<&str>) -> Result<GraphId> {
        match requested {
            Some(id) => Ok(id.parse()?),
            None => Ok(self.config.project.default_graph_id()?),
        }
    }

    /// Loads the graph a command works on
    ///
    /// The configured default graph is created on first use; any other graph
    /// must already exist.
    pub fn load_graph(&self, requested: Option<&str>) -> Result<Graph> {
        let id = self.graph_id(requested)?;
        let store = self.graph_store();
        if id == self.config.project.default_graph_id()? {
            return store.ensure(&id, &self.config.project.default_graph_name);
        }
        store.get(&id)
    }
}
