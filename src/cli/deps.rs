//! Dependency list commands (deps, status)

use std::path::Path;

use anyhow::Result;

use super::output::Output;
use crate::domain::{DeclaredStatus, DependencyList, Graph, Node, TaskRow};
use crate::storage::{read_graph_file, Project};

/// Loads the graph from `--file` or from the current project
fn load(output: &Output, graph: Option<&str>, file: Option<&Path>) -> Result<Graph> {
    match file {
        Some(path) => {
            output.verbose_ctx("deps", &format!("Reading snapshot {}", path.display()));
            read_graph_file(path)
        }
        None => {
            let project = Project::open_current()?;
            output.verbose_ctx(
                "deps",
                &format!("Opened project at: {}", project.root().display()),
            );
            project.load_graph(graph)
        }
    }
}

/// Render the dependency list
pub fn deps(output: &Output, graph: Option<&str>, file: Option<&Path>) -> Result<()> {
    let graph = load(output, graph, file)?;
    let list = graph.dependency_list();
    output.verbose_ctx(
        "deps",
        &format!(
            "Derived {} row(s) from {} node(s), {} edge(s)",
            list.rows.len(),
            graph.nodes.len(),
            graph.edges.len()
        ),
    );

    if output.is_json() {
        output.data(&serde_json::json!({
            "graph": graph.id,
            "headline": list.headline(),
            "summary": list.summary,
            "rows": list.rows.iter().map(|row| row_json(&list, row)).collect::<Vec<_>>(),
            "cycles": list
                .cycles
                .iter()
                .map(|group| group.iter().map(|node| node.id.as_str()).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    println!("Dependency list: {}", graph.display_name());
    println!("{}", list.headline());
    if list.is_empty() {
        return Ok(());
    }
    println!(
        "Ready: {}  Blocked: {}  Marked blocked: {}",
        list.summary.ready, list.summary.blocked, list.summary.declared_blocked
    );
    println!();

    for row in list.ready_rows() {
        print_row(row);
    }

    let mut blocked = list.blocked_rows().peekable();
    if blocked.peek().is_some() {
        println!();
        println!("Blocked:");
        for row in blocked {
            print_row(row);
        }
    }

    if !list.cycles.is_empty() {
        println!();
        println!("Cycles ({}):", list.cycles.len());
        for group in &list.cycles {
            let labels: Vec<&str> = group.iter().map(|node| node.display_label()).collect();
            println!("  {}", labels.join(" <-> "));
        }
    }

    Ok(())
}

fn print_row(row: &TaskRow<'_>) {
    let order = row
        .order
        .map(|order| order.to_string())
        .unwrap_or_else(|| "—".to_string());
    let status = row
        .node
        .declared_status()
        .map(|s| format!(" [{}]", s.label()))
        .unwrap_or_default();
    println!("{:>4}  {}{}", order, row.node.display_label(), status);
    if row.is_blocked() {
        println!("      Resolve cycle");
    }
    println!("      {}", row.prerequisites_summary());
    println!("      {}", row.dependents_summary());
}

fn row_json(list: &DependencyList<'_>, row: &TaskRow<'_>) -> serde_json::Value {
    let ids = |nodes: &[&Node]| {
        nodes.iter().map(|node| node.id.clone()).collect::<Vec<_>>()
    };
    serde_json::json!({
        "id": row.node.id,
        "label": row.node.display_label(),
        "order": row.order,
        "status": row.status,
        "declared_status": row.node.declared_status(),
        "prerequisites": ids(&row.prerequisites),
        "dependents": ids(&row.dependents),
        "in_cycle": list.is_in_cycle(&row.node.id),
    })
}

/// Show counts for a graph
pub fn status(output: &Output, graph: Option<&str>) -> Result<()> {
    let project = Project::open_current()?;
    let graph = project.load_graph(graph)?;
    let list = graph.dependency_list();

    let declared: Vec<(DeclaredStatus, usize)> = DeclaredStatus::ALL
        .into_iter()
        .map(|status| {
            let count = graph
                .nodes
                .values()
                .filter(|node| node.declared_status() == Some(status))
                .count();
            (status, count)
        })
        .collect();

    if output.is_json() {
        let by_status: serde_json::Map<String, serde_json::Value> = declared
            .iter()
            .map(|(status, count)| (status.as_str().to_string(), (*count).into()))
            .collect();
        output.data(&serde_json::json!({
            "project": project.root().display().to_string(),
            "graph": graph.id,
            "name": graph.display_name(),
            "graph_type": graph.graph_type,
            "nodes": graph.nodes.len(),
            "edges": graph.edges.len(),
            "ready": list.summary.ready,
            "blocked": list.summary.blocked,
            "declared_blocked": list.summary.declared_blocked,
            "cycles": list.cycles.len(),
            "by_status": by_status,
        }));
        return Ok(());
    }

    println!("Graph: {} ({})", graph.display_name(), graph.id);
    println!("Type: {}", graph.graph_type);
    println!();
    println!("Nodes: {}", graph.nodes.len());
    println!("Edges: {}", graph.edges.len());
    println!();
    println!("Ready: {}", list.summary.ready);
    println!("Blocked: {}", list.summary.blocked);
    println!("Cycles: {}", list.cycles.len());
    println!();
    for (status, count) in &declared {
        println!("{}: {}", status.label(), count);
    }

    Ok(())
}
