//! Node CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use crate::domain::Node;
use crate::storage::Project;

#[derive(Subcommand)]
pub enum NodeCommands {
    /// Add a node to the graph
    Add {
        /// Label text
        text: String,

        /// Horizontal position
        #[arg(long, requires = "y", allow_negative_numbers = true)]
        x: Option<f64>,

        /// Vertical position
        #[arg(long, requires = "x", allow_negative_numbers = true)]
        y: Option<f64>,

        /// Ordering hint (lower comes first among tasks that are ready together)
        #[arg(long, allow_negative_numbers = true)]
        order: Option<f64>,
    },

    /// Change a node's label or ordering hint
    Update {
        /// Node ID
        id: String,

        /// New label text
        #[arg(long)]
        text: Option<String>,

        /// New ordering hint
        #[arg(long, allow_negative_numbers = true, conflicts_with = "clear_order")]
        order: Option<f64>,

        /// Remove the ordering hint
        #[arg(long)]
        clear_order: bool,
    },

    /// Move a node on the canvas
    Move {
        /// Node ID
        id: String,

        /// Horizontal position
        #[arg(allow_negative_numbers = true)]
        x: f64,

        /// Vertical position
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },

    /// Delete a node and detach it from its edges
    Delete {
        /// Node ID
        id: String,
    },

    /// List nodes in the graph
    List,
}

pub fn run(cmd: NodeCommands, output: &Output, graph: Option<&str>) -> Result<()> {
    match cmd {
        NodeCommands::Add { text, x, y, order } => {
            let position = x.zip(y);
            add_node(output, graph, &text, position, order)
        }
        NodeCommands::Update {
            id,
            text,
            order,
            clear_order,
        } => {
            let order = if clear_order { Some(None) } else { order.map(Some) };
            update_node(output, graph, &id, text.as_deref(), order)
        }
        NodeCommands::Move { id, x, y } => move_node(output, graph, &id, x, y),
        NodeCommands::Delete { id } => delete_node(output, graph, &id),
        NodeCommands::List => list_nodes(output, graph),
    }
}

fn add_node(
    output: &Output,
    graph: Option<&str>,
    text: &str,
    position: Option<(f64, f64)>,
    order: Option<f64>,
) -> Result<()> {
    let project = Project::open_current()?;
    let mut graph = project.load_graph(graph)?;

    let node_id = graph.create_node(text, position).id.clone();
    let node = graph.node_mut(&node_id)?;
    if order.is_some() {
        node.set_order_hint(order);
    }
    let node = node.clone();
    project.graph_store().save(&graph)?;
    output.verbose_ctx("node", &format!("Saved graph '{}'", graph.id));

    if output.is_json() {
        output.data(&node);
    } else {
        output.success(&format!("Created node: {} - {}", node.id, node.display_label()));
    }

    Ok(())
}

fn update_node(
    output: &Output,
    graph: Option<&str>,
    id: &str,
    text: Option<&str>,
    order: Option<Option<f64>>,
) -> Result<()> {
    let project = Project::open_current()?;
    let mut graph = project.load_graph(graph)?;

    let node = graph.node_mut(id)?;
    if let Some(text) = text {
        node.text = text.to_string();
    }
    if let Some(order) = order {
        node.set_order_hint(order);
    }
    let node = node.clone();
    project.graph_store().save(&graph)?;

    if output.is_json() {
        output.data(&node);
    } else {
        output.success(&format!("Updated node: {} - {}", node.id, node.display_label()));
    }

    Ok(())
}

fn move_node(output: &Output, graph: Option<&str>, id: &str, x: f64, y: f64) -> Result<()> {
    let project = Project::open_current()?;
    let mut graph = project.load_graph(graph)?;

    let moved = graph.patch_node_positions(&[(id.to_string(), x, y)]);
    let Some(node) = moved.first() else {
        anyhow::bail!("Node not found: {}", id);
    };
    project.graph_store().save(&graph)?;

    if output.is_json() {
        output.data(node);
    } else {
        output.success(&format!("Moved node {} to ({}, {})", node.id, x, y));
    }

    Ok(())
}

fn delete_node(output: &Output, graph: Option<&str>, id: &str) -> Result<()> {
    let project = Project::open_current()?;
    let mut graph = project.load_graph(graph)?;

    let edges_before = graph.edges.len();
    let node = graph.remove_node(id)?;
    let edges_removed = edges_before - graph.edges.len();
    output.verbose_ctx(
        "node",
        &format!("Removed {} edge(s) left without endpoints", edges_removed),
    );
    project.graph_store().save(&graph)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": node.id,
            "deleted": true,
            "edges_removed": edges_removed,
        }));
    } else {
        output.success(&format!("Deleted node: {} - {}", node.id, node.display_label()));
    }

    Ok(())
}

fn list_nodes(output: &Output, graph: Option<&str>) -> Result<()> {
    let project = Project::open_current()?;
    let graph = project.load_graph(graph)?;

    if output.is_json() {
        let nodes: Vec<&Node> = graph.nodes.values().collect();
        output.data(&nodes);
    } else if graph.nodes.is_empty() {
        println!("No nodes");
    } else {
        println!(
            "{:<12} {:>8} {:>8} {:>6} {:<12} LABEL",
            "ID", "X", "Y", "ORDER", "STATUS"
        );
        println!("{}", "-".repeat(70));
        for node in graph.nodes.values() {
            println!(
                "{:<12} {:>8} {:>8} {:>6} {:<12} {}",
                node.id,
                coordinate(node.x),
                coordinate(node.y),
                node.metadata
                    .order_hint()
                    .map(|order| order.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                node.declared_status().map(|s| s.as_str()).unwrap_or("-"),
                node.display_label()
            );
        }
    }

    Ok(())
}

fn coordinate(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "-".to_string())
}
