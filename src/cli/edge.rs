//! Edge CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use crate::domain::Edge;
use crate::storage::Project;

#[derive(Subcommand)]
pub enum EdgeCommands {
    /// Connect nodes; every source becomes a prerequisite of every target
    ///
    /// Examples:
    ///   canvas edge add --from n-1234567 --to n-89abcde
    ///   canvas edge add --from a,b --to c     # hyperedge
    Add {
        /// Source node IDs
        #[arg(long = "from", value_delimiter = ',', num_args = 1.., required = true)]
        sources: Vec<String>,

        /// Target node IDs
        #[arg(long = "to", value_delimiter = ',', num_args = 1.., required = true)]
        targets: Vec<String>,

        /// Edge label
        #[arg(long, default_value = "")]
        text: String,
    },

    /// Replace the sources and/or targets of an edge
    Update {
        /// Edge ID
        id: String,

        /// New source node IDs
        #[arg(long = "from", value_delimiter = ',', num_args = 1..)]
        sources: Option<Vec<String>>,

        /// New target node IDs
        #[arg(long = "to", value_delimiter = ',', num_args = 1..)]
        targets: Option<Vec<String>>,
    },

    /// Delete an edge
    Delete {
        /// Edge ID
        id: String,
    },

    /// List edges in the graph
    List,
}

pub fn run(cmd: EdgeCommands, output: &Output, graph: Option<&str>) -> Result<()> {
    match cmd {
        EdgeCommands::Add {
            sources,
            targets,
            text,
        } => add_edge(output, graph, &sources, &targets, &text),
        EdgeCommands::Update {
            id,
            sources,
            targets,
        } => update_edge(output, graph, &id, sources.as_deref(), targets.as_deref()),
        EdgeCommands::Delete { id } => delete_edge(output, graph, &id),
        EdgeCommands::List => list_edges(output, graph),
    }
}

/// One-line `a, b -> c` rendering of an edge
pub(super) fn describe(edge: &Edge) -> String {
    let join = |ids: &std::collections::BTreeSet<String>| {
        ids.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    };
    let mut line = format!("{} -> {}", join(&edge.sources), join(&edge.targets));
    if !edge.text.is_empty() {
        line.push_str(&format!(" ({})", edge.text));
    }
    line
}

fn add_edge(
    output: &Output,
    graph: Option<&str>,
    sources: &[String],
    targets: &[String],
    text: &str,
) -> Result<()> {
    let project = Project::open_current()?;
    let mut graph = project.load_graph(graph)?;

    let edge = graph.create_edge(sources, targets, text)?.clone();
    if edge.pairs().next().is_none() {
        output.verbose_ctx("edge", "Edge only connects a node to itself; it adds no ordering");
    }
    project.graph_store().save(&graph)?;

    if output.is_json() {
        output.data(&edge);
    } else {
        output.success(&format!("Created edge: {} - {}", edge.id, describe(&edge)));
    }

    Ok(())
}

fn update_edge(
    output: &Output,
    graph: Option<&str>,
    id: &str,
    sources: Option<&[String]>,
    targets: Option<&[String]>,
) -> Result<()> {
    if sources.is_none() && targets.is_none() {
        anyhow::bail!("Nothing to update. Pass --from and/or --to.");
    }

    let project = Project::open_current()?;
    let mut graph = project.load_graph(graph)?;

    let edge = graph.update_edge_endpoints(id, sources, targets)?.clone();
    project.graph_store().save(&graph)?;

    if output.is_json() {
        output.data(&edge);
    } else {
        output.success(&format!("Updated edge: {} - {}", edge.id, describe(&edge)));
    }

    Ok(())
}

fn delete_edge(output: &Output, graph: Option<&str>, id: &str) -> Result<()> {
    let project = Project::open_current()?;
    let mut graph = project.load_graph(graph)?;

    let edge = graph.remove_edge(id)?;
    project.graph_store().save(&graph)?;

    output.success(&format!("Deleted edge: {}", edge.id));

    Ok(())
}

fn list_edges(output: &Output, graph: Option<&str>) -> Result<()> {
    let project = Project::open_current()?;
    let graph = project.load_graph(graph)?;

    if output.is_json() {
        let edges: Vec<&Edge> = graph.edges.values().collect();
        output.data(&edges);
    } else if graph.edges.is_empty() {
        println!("No edges");
    } else {
        println!("{:<12} {:<6} ENDPOINTS", "ID", "KIND");
        println!("{}", "-".repeat(60));
        for edge in graph.edges.values() {
            let kind = if edge.is_direct() { "direct" } else { "hyper" };
            println!("{:<12} {:<6} {}", edge.id, kind, describe(edge));
        }
    }

    Ok(())
}
