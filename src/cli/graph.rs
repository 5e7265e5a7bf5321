//! Graph CLI commands

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;

use super::output::Output;
use crate::domain::{Graph, GraphId, GraphType};
use crate::storage::{read_graph_file, Project};

#[derive(Subcommand)]
pub enum GraphCommands {
    /// Create an empty graph
    New {
        /// Graph ID (letters, digits, '-' and '_')
        id: String,

        /// Display name (defaults to the ID)
        #[arg(long)]
        name: Option<String>,

        /// Graph type (list, tree, dag, graph, multigraph, hypergraph, ubergraph)
        #[arg(long = "type")]
        graph_type: Option<String>,

        /// Create an undirected graph
        #[arg(long)]
        undirected: bool,
    },

    /// List graphs in the project
    List,

    /// Show a graph's nodes and edges
    Show {
        /// Graph ID (defaults to --graph or the configured default)
        id: Option<String>,
    },

    /// Delete a graph
    Delete {
        /// Graph ID
        id: String,
    },

    /// Import a graph document, replacing any graph with the same ID
    Import {
        /// Path to the graph JSON file
        file: PathBuf,
    },

    /// Print a graph document as JSON
    Export {
        /// Graph ID (defaults to --graph or the configured default)
        id: Option<String>,

        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

pub fn run(cmd: GraphCommands, output: &Output, graph: Option<&str>) -> Result<()> {
    match cmd {
        GraphCommands::New {
            id,
            name,
            graph_type,
            undirected,
        } => new_graph(output, &id, name.as_deref(), graph_type.as_deref(), undirected),
        GraphCommands::List => list_graphs(output),
        GraphCommands::Show { id } => show_graph(output, id.as_deref().or(graph)),
        GraphCommands::Delete { id } => delete_graph(output, &id),
        GraphCommands::Import { file } => import_graph(output, &file),
        GraphCommands::Export { id, output: path } => {
            export_graph(output, id.as_deref().or(graph), path)
        }
    }
}

fn new_graph(
    output: &Output,
    id: &str,
    name: Option<&str>,
    graph_type: Option<&str>,
    undirected: bool,
) -> Result<()> {
    let project = Project::open_current()?;
    let id: GraphId = id.parse()?;

    let graph_type = match graph_type {
        Some(kind) => kind.parse::<GraphType>()?,
        None => project.config().project.default_graph_type,
    };

    let mut graph = Graph::new(id.clone(), name.unwrap_or(id.as_str()));
    graph.graph_type = graph_type;
    graph.directed = !undirected;

    output.verbose_ctx(
        "graph",
        &format!("Creating {} graph '{}'", graph.graph_type, graph.id),
    );
    project.graph_store().create(&graph)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": graph.id,
            "name": graph.name,
            "graph_type": graph.graph_type,
            "directed": graph.directed,
        }));
    } else {
        output.success(&format!("Created graph: {} - {}", graph.id, graph.display_name()));
    }

    Ok(())
}

fn list_graphs(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.graph_store();
    output.verbose_ctx("graph", &format!("Reading graphs from {}", store.dir().display()));

    let graphs = store.list()?;

    if output.is_json() {
        let items: Vec<_> = graphs
            .iter()
            .map(|g| {
                serde_json::json!({
                    "id": g.id,
                    "name": g.display_name(),
                    "graph_type": g.graph_type,
                    "directed": g.directed,
                    "nodes": g.nodes.len(),
                    "edges": g.edges.len(),
                })
            })
            .collect();
        output.data(&items);
    } else if graphs.is_empty() {
        println!("No graphs");
    } else {
        println!("{:<20} {:<12} {:>6} {:>6}  NAME", "ID", "TYPE", "NODES", "EDGES");
        println!("{}", "-".repeat(70));
        for g in &graphs {
            println!(
                "{:<20} {:<12} {:>6} {:>6}  {}",
                g.id,
                g.graph_type,
                g.nodes.len(),
                g.edges.len(),
                g.display_name()
            );
        }
    }

    Ok(())
}

fn show_graph(output: &Output, graph: Option<&str>) -> Result<()> {
    let project = Project::open_current()?;
    let graph = project.load_graph(graph)?;

    if output.is_json() {
        output.data(&graph);
        return Ok(());
    }

    println!("Graph: {}", graph.id);
    println!("Name: {}", graph.display_name());
    println!("Type: {}", graph.graph_type);
    println!("Directed: {}", if graph.directed { "yes" } else { "no" });

    println!("\nNodes ({}):", graph.nodes.len());
    for node in graph.nodes.values() {
        println!("  {:<12} {}", node.id, node.display_label());
    }

    println!("\nEdges ({}):", graph.edges.len());
    for edge in graph.edges.values() {
        println!("  {:<12} {}", edge.id, super::edge::describe(edge));
    }

    Ok(())
}

fn delete_graph(output: &Output, id: &str) -> Result<()> {
    let project = Project::open_current()?;
    let id: GraphId = id.parse()?;

    project.graph_store().delete(&id)?;
    output.success(&format!("Deleted graph: {}", id));

    Ok(())
}

fn import_graph(output: &Output, file: &Path) -> Result<()> {
    let project = Project::open_current()?;
    let graph = read_graph_file(file)?;
    let store = project.graph_store();

    let replaced = store.exists(&graph.id);
    output.verbose_ctx(
        "graph",
        &format!(
            "Importing '{}' from {} (replace: {})",
            graph.id,
            file.display(),
            replaced
        ),
    );
    store.save(&graph)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": graph.id,
            "nodes": graph.nodes.len(),
            "edges": graph.edges.len(),
            "replaced": replaced,
        }));
    } else {
        output.success(&format!(
            "Imported graph: {} ({} nodes, {} edges)",
            graph.id,
            graph.nodes.len(),
            graph.edges.len()
        ));
    }

    Ok(())
}

fn export_graph(output: &Output, graph: Option<&str>, path: Option<PathBuf>) -> Result<()> {
    let project = Project::open_current()?;
    let graph = project.load_graph(graph)?;

    let json = serde_json::to_string_pretty(&graph).context("Failed to serialize graph")?;

    match path {
        Some(path) => {
            fs::write(&path, format!("{}\n", json))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            output.success(&format!("Exported graph {} to {}", graph.id, path.display()));
        }
        None => println!("{}", json),
    }

    Ok(())
}
