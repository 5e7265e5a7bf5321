//! Task CLI commands
//!
//! Tasks are nodes seen through the dependency list: `--after` names the
//! prerequisites (direct edges into the task) and `--before` the tasks it
//! unblocks (direct edges out of it).

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use crate::domain::{DeclaredStatus, Graph};
use crate::storage::Project;

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task wired to its prerequisites and dependents
    ///
    /// Examples:
    ///   canvas task add "Design"
    ///   canvas task add "Build" --after n-1234567
    ///   canvas task add "Test" --after n-1234567,n-89abcde --before n-fedcba9
    Add {
        /// Task label
        label: String,

        /// Tasks that must come first
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        after: Vec<String>,

        /// Tasks this one unblocks
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        before: Vec<String>,
    },

    /// Show a task's row in the dependency list
    Show {
        /// Task (node) ID
        id: String,
    },

    /// Relabel a task or replace its direct links
    Edit {
        /// Task (node) ID
        id: String,

        /// New label
        #[arg(long)]
        label: Option<String>,

        /// Replace prerequisites
        #[arg(long, value_delimiter = ',', num_args = 1.., conflicts_with = "clear_after")]
        after: Option<Vec<String>>,

        /// Replace dependents
        #[arg(long, value_delimiter = ',', num_args = 1.., conflicts_with = "clear_before")]
        before: Option<Vec<String>>,

        /// Remove all direct prerequisites
        #[arg(long)]
        clear_after: bool,

        /// Remove all direct dependents
        #[arg(long)]
        clear_before: bool,
    },

    /// Set the declared status (none, started, in_progress, blocked, complete)
    Status {
        /// Task (node) ID
        id: String,

        /// New status, or "none" to clear it
        status: String,
    },

    /// Delete a task and its links
    Delete {
        /// Task (node) ID
        id: String,
    },
}

pub fn run(cmd: TaskCommands, output: &Output, graph: Option<&str>) -> Result<()> {
    match cmd {
        TaskCommands::Add {
            label,
            after,
            before,
        } => add_task(output, graph, &label, &after, &before),
        TaskCommands::Show { id } => show_task(output, graph, &id),
        TaskCommands::Edit {
            id,
            label,
            after,
            before,
            clear_after,
            clear_before,
        } => {
            let after = if clear_after { Some(Vec::new()) } else { after };
            let before = if clear_before { Some(Vec::new()) } else { before };
            edit_task(
                output,
                graph,
                &id,
                label.as_deref(),
                after.as_deref(),
                before.as_deref(),
            )
        }
        TaskCommands::Status { id, status } => set_status(output, graph, &id, &status),
        TaskCommands::Delete { id } => delete_task(output, graph, &id),
    }
}

/// Parses a status argument; `none` clears it
fn parse_status(status: &str) -> Result<Option<DeclaredStatus>> {
    if status.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    Ok(Some(status.parse()?))
}

fn add_task(
    output: &Output,
    graph: Option<&str>,
    label: &str,
    after: &[String],
    before: &[String],
) -> Result<()> {
    let project = Project::open_current()?;
    let mut graph = project.load_graph(graph)?;

    let task_id = graph.create_task(label, after, before)?;
    output.verbose_ctx(
        "task",
        &format!(
            "Created {} with {} prerequisite(s), {} dependent(s)",
            task_id,
            after.len(),
            before.len()
        ),
    );
    project.graph_store().save(&graph)?;

    if output.is_json() {
        output.data(&task_json(&graph, &task_id));
    } else {
        output.success(&format!("Created task: {} - {}", task_id, label.trim()));
    }

    Ok(())
}

fn show_task(output: &Output, graph: Option<&str>, id: &str) -> Result<()> {
    let project = Project::open_current()?;
    let graph = project.load_graph(graph)?;

    let list = graph.dependency_list();
    let row = list
        .rows
        .iter()
        .find(|row| row.node.id == id)
        .ok_or_else(|| anyhow::anyhow!("Task not found: {}", id))?;

    if output.is_json() {
        output.data(&task_json(&graph, id));
        return Ok(());
    }

    println!("Task: {}", row.node.id);
    println!("Label: {}", row.node.display_label());
    match row.order {
        Some(order) => println!("Order: {}", order),
        None => println!("Order: —"),
    }
    println!("Row: {}", row.status.as_str());
    if row.is_blocked() {
        let reason = if list.is_in_cycle(id) {
            "on a dependency cycle"
        } else {
            "waiting on a cycle upstream"
        };
        println!("Blocked: {}", reason);
    }
    println!(
        "Status: {}",
        row.node
            .declared_status()
            .map(|s| s.label())
            .unwrap_or("No Status")
    );
    println!("{}", row.prerequisites_summary());
    println!("{}", row.dependents_summary());

    Ok(())
}

fn edit_task(
    output: &Output,
    graph: Option<&str>,
    id: &str,
    label: Option<&str>,
    after: Option<&[String]>,
    before: Option<&[String]>,
) -> Result<()> {
    let project = Project::open_current()?;
    let mut graph = project.load_graph(graph)?;

    graph.edit_task(id, label, after, before)?;
    project.graph_store().save(&graph)?;

    if graph.dependency_list().is_in_cycle(id) {
        output.verbose_ctx("task", &format!("{} is now on a dependency cycle", id));
    }

    if output.is_json() {
        output.data(&task_json(&graph, id));
    } else {
        output.success(&format!("Updated task: {}", id));
    }

    Ok(())
}

fn set_status(output: &Output, graph: Option<&str>, id: &str, status: &str) -> Result<()> {
    let status = parse_status(status)?;

    let project = Project::open_current()?;
    let mut graph = project.load_graph(graph)?;

    graph.set_task_status(id, status)?;
    project.graph_store().save(&graph)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": id,
            "status": status,
        }));
    } else {
        let label = status.map(|s| s.label()).unwrap_or("No Status");
        output.success(&format!("Set status of {} to {}", id, label));
    }

    Ok(())
}

fn delete_task(output: &Output, graph: Option<&str>, id: &str) -> Result<()> {
    let project = Project::open_current()?;
    let mut graph = project.load_graph(graph)?;

    let node = graph.remove_node(id)?;
    project.graph_store().save(&graph)?;

    output.success(&format!("Deleted task: {} - {}", node.id, node.display_label()));

    Ok(())
}

/// JSON view of a task and its direct links
fn task_json(graph: &Graph, id: &str) -> serde_json::Value {
    let label = graph
        .get_node(id)
        .map(|node| node.display_label())
        .unwrap_or(id);
    let status = graph.get_node(id).and_then(|node| node.declared_status());

    serde_json::json!({
        "id": id,
        "label": label,
        "status": status,
        "prerequisites": graph.direct_prerequisites(id),
        "dependents": graph.direct_postrequisites(id),
    })
}
