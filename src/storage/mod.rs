//! # Storage Layer
//!
//! Persistence for the graph canvas with git-friendly file formats.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Graphs | JSON (one document per graph) | `.canvas/graphs/{id}.json` |
//! | Config | TOML | `.canvas/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - [`GraphStore`] uses file locking (`fs2`) for concurrent access
//! - All writes are atomic (temp file + rename)
//!
//! ## Project Structure
//!
//! ```text
//! .canvas/
//! ├── graphs/
//! │   └── workspace.json    # One file per graph
//! ├── config.toml           # Project configuration
//! └── .gitignore            # Ignores interrupted writes
//! ```
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a canvas project
//! - [`GraphStore`] - Read/write graphs as JSON
//! - [`Config`] - Project and global configuration

mod config;
mod graph_store;
mod project;

pub use config::{Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig};
pub use graph_store::{read_graph_file, GraphStore, StoreError};
pub use project::{Project, ProjectError};
