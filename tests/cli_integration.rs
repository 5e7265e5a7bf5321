//! CLI integration tests for the canvas binary
//!
//! These tests verify the complete workflow from initialization through
//! graph editing, ensuring the dependency list reflects every change.

use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command instance for the canvas binary
fn canvas_cmd() -> assert_cmd::Command {
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("canvas"))
}

/// Command running inside the project, isolated from the user's config
fn canvas(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = canvas_cmd();
    cmd.current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .env_remove("CANVAS_GRAPH");
    cmd
}

/// Create a temporary directory and initialize a canvas project
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    canvas_cmd()
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .arg("init")
        .arg(dir.path())
        .assert()
        .success();
    dir
}

/// Runs a command with `--format json` and parses stdout
fn json(dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = canvas(dir)
        .args(args)
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).unwrap()
}

/// Adds a task and returns its id
fn add_task(dir: &TempDir, label: &str, after: &[&str]) -> String {
    let joined = after.join(",");
    let mut args = vec!["task", "add", label];
    if !after.is_empty() {
        args.push("--after");
        args.push(&joined);
    }
    json(dir, &args)["id"].as_str().unwrap().to_string()
}

fn row_ids(deps: &serde_json::Value) -> Vec<String> {
    deps["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Initialization Tests
// =============================================================================

#[test]
fn test_init_creates_structure() {
    let dir = TempDir::new().unwrap();

    canvas_cmd()
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .arg("init")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized canvas project"));

    assert!(dir.path().join(".canvas").is_dir());
    assert!(dir.path().join(".canvas/graphs").is_dir());
    assert!(dir.path().join(".canvas/config.toml").is_file());
    assert!(dir.path().join(".canvas/.gitignore").is_file());
}

#[test]
fn test_init_is_idempotent() {
    let dir = setup_project();

    canvas(&dir).arg("init").assert().success();
}

#[test]
fn test_outside_project_fails() {
    let dir = TempDir::new().unwrap();

    canvas(&dir)
        .arg("deps")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not in a canvas project"));
}

// =============================================================================
// Dependency List Tests
// =============================================================================

#[test]
fn test_empty_graph() {
    let dir = setup_project();

    canvas(&dir)
        .arg("deps")
        .assert()
        .success()
        .stdout(predicate::str::contains("Add nodes to view the dependency list."));

    // The default graph is created on first use
    assert!(dir.path().join(".canvas/graphs/workspace.json").is_file());
}

#[test]
fn test_tasks_ordered_by_prerequisites() {
    let dir = setup_project();

    // Added in reverse so insertion order and label order disagree with the chain
    let ship = add_task(&dir, "Ship", &[]);
    let build = add_task(&dir, "Build", &[]);
    let design = add_task(&dir, "Design", &[]);
    canvas(&dir)
        .args(["task", "edit", ship.as_str(), "--after", build.as_str()])
        .assert()
        .success();
    canvas(&dir)
        .args(["task", "edit", build.as_str(), "--after", design.as_str()])
        .assert()
        .success();

    let deps = json(&dir, &["deps"]);
    assert_eq!(row_ids(&deps), vec![design, build, ship]);
    assert_eq!(deps["summary"]["ready"], 3);
    assert_eq!(deps["summary"]["blocked"], 0);
    assert_eq!(deps["summary"]["dependencies"], 2);
    assert_eq!(deps["rows"][0]["order"], 1);
    assert_eq!(deps["rows"][2]["order"], 3);
    assert_eq!(deps["headline"], "Ordered automatically from 2 dependencies.");

    canvas(&dir)
        .arg("deps")
        .assert()
        .success()
        .stdout(predicate::str::contains("No prerequisites"))
        .stdout(predicate::str::contains("Depends on Design"))
        .stdout(predicate::str::contains("Unblocks 1 task • Next: Build"));
}

#[test]
fn test_cycle_blocks_tasks() {
    let dir = setup_project();

    let a = add_task(&dir, "Alpha", &[]);
    let b = add_task(&dir, "Beta", &[&a]);
    let c = add_task(&dir, "Gamma", &[&b]);
    canvas(&dir)
        .args(["task", "edit", a.as_str(), "--after", b.as_str()])
        .assert()
        .success();

    let deps = json(&dir, &["deps"]);
    assert_eq!(deps["summary"]["ready"], 0);
    assert_eq!(deps["summary"]["blocked"], 3);
    assert_eq!(deps["cycles"].as_array().unwrap().len(), 1);

    let rows = deps["rows"].as_array().unwrap();
    assert!(rows.iter().all(|row| row["status"] == "blocked"));
    assert!(rows.iter().all(|row| row["order"].is_null()));
    let gamma = rows.iter().find(|row| row["id"] == c.as_str()).unwrap();
    assert_eq!(gamma["in_cycle"], false);

    canvas(&dir)
        .arg("deps")
        .assert()
        .success()
        .stdout(predicate::str::contains("Blocked:\n"))
        .stdout(predicate::str::contains("Resolve cycle"));

    // Breaking the cycle makes everything ready again
    canvas(&dir)
        .args(["task", "edit", a.as_str(), "--clear-after"])
        .assert()
        .success();
    let deps = json(&dir, &["deps"]);
    assert_eq!(row_ids(&deps), vec![a, b, c]);
}

#[test]
fn test_hyperedge_orders_every_pair() {
    let dir = setup_project();

    let a = json(&dir, &["node", "add", "A", "--x", "0", "--y", "30"])["id"]
        .as_str()
        .unwrap()
        .to_string();
    let b = json(&dir, &["node", "add", "B", "--x", "0", "--y", "20"])["id"]
        .as_str()
        .unwrap()
        .to_string();
    let c = json(&dir, &["node", "add", "C", "--x", "0", "--y", "10"])["id"]
        .as_str()
        .unwrap()
        .to_string();

    let from = format!("{},{}", a, b);
    let edge = json(&dir, &["edge", "add", "--from", &from, "--to", &c]);
    assert_eq!(edge["sources"].as_array().unwrap().len(), 2);

    // C is highest on the canvas but waits for both sources; B sorts above A by y
    let deps = json(&dir, &["deps"]);
    assert_eq!(row_ids(&deps), vec![b, a, c]);
    assert_eq!(deps["rows"][2]["prerequisites"].as_array().unwrap().len(), 2);
}

#[test]
fn test_order_hint_beats_position() {
    let dir = setup_project();

    json(&dir, &["node", "add", "Top", "--x", "0", "--y", "-50"]);
    let hinted = json(
        &dir,
        &["node", "add", "Hinted", "--x", "0", "--y", "500", "--order", "1"],
    );
    let hinted = hinted["id"].as_str().unwrap().to_string();

    let deps = json(&dir, &["deps"]);
    assert_eq!(row_ids(&deps)[0], hinted);
}

#[test]
fn test_declared_status_counted_separately() {
    let dir = setup_project();

    let task = add_task(&dir, "Waiting on vendor", &[]);
    canvas(&dir)
        .args(["task", "status", task.as_str(), "blocked"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Blocked"));

    let status = json(&dir, &["status"]);
    assert_eq!(status["declared_blocked"], 1);
    assert_eq!(status["blocked"], 0);
    assert_eq!(status["ready"], 1);
    assert_eq!(status["by_status"]["blocked"], 1);

    canvas(&dir)
        .args(["task", "status", task.as_str(), "none"])
        .assert()
        .success();
    assert_eq!(json(&dir, &["status"])["declared_blocked"], 0);

    canvas(&dir)
        .args(["task", "status", task.as_str(), "done"])
        .assert()
        .failure();
}

#[test]
fn test_task_validation() {
    let dir = setup_project();

    canvas(&dir)
        .args(["task", "add", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("label is required"));

    canvas(&dir)
        .args(["task", "add", "Orphan", "--after", "n-missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Node not found"));

    let task = add_task(&dir, "Solo", &[]);
    canvas(&dir)
        .args(["task", "edit", task.as_str(), "--after", task.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Self-dependency"));
}

#[test]
fn test_task_show() {
    let dir = setup_project();

    let design = add_task(&dir, "Design", &[]);
    let build = add_task(&dir, "Build", &[&design]);

    canvas(&dir)
        .args(["task", "show", build.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Order: 2"))
        .stdout(predicate::str::contains("Depends on Design"));

    let shown = json(&dir, &["task", "show", &design]);
    assert_eq!(shown["dependents"][0], build.as_str());
}

// =============================================================================
// Node and Edge Tests
// =============================================================================

#[test]
fn test_node_lifecycle() {
    let dir = setup_project();

    let a = json(&dir, &["node", "add", "Alpha", "--x", "1", "--y", "2"]);
    assert_eq!(a["y"], 2.0);
    let a = a["id"].as_str().unwrap().to_string();
    let b = add_task(&dir, "Beta", &[&a]);

    let moved = json(&dir, &["node", "move", &a, "-5", "7.5"]);
    assert_eq!(moved["x"], -5.0);

    let updated = json(&dir, &["node", "update", &a, "--text", "Renamed"]);
    assert_eq!(updated["text"], "Renamed");

    let nodes = json(&dir, &["node", "list"]);
    assert_eq!(nodes.as_array().unwrap().len(), 2);

    let deleted = json(&dir, &["node", "delete", &a]);
    assert_eq!(deleted["edges_removed"], 1);
    assert!(json(&dir, &["edge", "list"]).as_array().unwrap().is_empty());

    canvas(&dir)
        .args(["node", "delete", a.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Node not found"));

    canvas(&dir)
        .args(["node", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(b.as_str()));
}

#[test]
fn test_edge_update_and_delete() {
    let dir = setup_project();

    let a = add_task(&dir, "A", &[]);
    let b = add_task(&dir, "B", &[]);
    let c = add_task(&dir, "C", &[]);

    let edge = json(&dir, &["edge", "add", "--from", &a, "--to", &b, "--text", "then"]);
    let edge_id = edge["id"].as_str().unwrap().to_string();
    assert!(edge_id.starts_with("e-"));

    let updated = json(&dir, &["edge", "update", &edge_id, "--to", &c]);
    assert_eq!(updated["targets"][0], c.as_str());
    assert_eq!(updated["sources"][0], a.as_str());

    canvas(&dir)
        .args(["edge", "update", edge_id.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to update"));

    canvas(&dir)
        .args(["edge", "add", "--from", a.as_str(), "--to", "n-ghost"])
        .assert()
        .failure();

    canvas(&dir)
        .args(["edge", "delete", edge_id.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted edge"));
    assert_eq!(json(&dir, &["deps"])["summary"]["dependencies"], 0);
}

// =============================================================================
// Graph Tests
// =============================================================================

#[test]
fn test_graph_new_list_delete() {
    let dir = setup_project();

    canvas(&dir)
        .args(["graph", "new", "release", "--name", "Release plan", "--type", "DAG"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created graph: release"));

    canvas(&dir)
        .args(["graph", "new", "release"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    canvas(&dir)
        .args(["graph", "new", "bad", "--type", "forest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is invalid"));

    let graphs = json(&dir, &["graph", "list"]);
    assert_eq!(graphs[0]["id"], "release");
    assert_eq!(graphs[0]["graph_type"], "dag");

    canvas(&dir)
        .args(["graph", "delete", "release"])
        .assert()
        .success();
    assert!(json(&dir, &["graph", "list"]).as_array().unwrap().is_empty());
}

#[test]
fn test_graph_flag_selects_graph() {
    let dir = setup_project();

    // Naming the default graph works before it has been written
    let named_default = json(&dir, &["--graph", "workspace", "deps"]);
    assert_eq!(named_default["graph"], "workspace");

    canvas(&dir)
        .args(["--graph", "missing", "deps"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Graph not found"));

    canvas(&dir).args(["graph", "new", "side"]).assert().success();
    canvas(&dir)
        .args(["--graph", "side", "task", "add", "Side task"])
        .assert()
        .success();

    let side = json(&dir, &["--graph", "side", "deps"]);
    assert_eq!(side["rows"].as_array().unwrap().len(), 1);

    let via_env = canvas(&dir)
        .env("CANVAS_GRAPH", "side")
        .args(["status", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let via_env: serde_json::Value = serde_json::from_slice(&via_env).unwrap();
    assert_eq!(via_env["graph"], "side");

    let workspace = json(&dir, &["deps"]);
    assert!(workspace["rows"].as_array().unwrap().is_empty());
}

#[test]
fn test_export_import_round_trip() {
    let dir = setup_project();

    let a = add_task(&dir, "First", &[]);
    add_task(&dir, "Second", &[&a]);

    let export_path = dir.path().join("export.json");
    canvas(&dir)
        .args(["graph", "export", "--output"])
        .arg(&export_path)
        .assert()
        .success();

    let mut document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&export_path).unwrap()).unwrap();
    document["id"] = "copy".into();
    fs::write(&export_path, document.to_string()).unwrap();

    let imported = json(&dir, &["graph", "import", export_path.to_str().unwrap()]);
    assert_eq!(imported["id"], "copy");
    assert_eq!(imported["nodes"], 2);
    assert_eq!(imported["replaced"], false);

    let copy = json(&dir, &["--graph", "copy", "deps"]);
    assert_eq!(copy["summary"]["ready"], 2);
    assert_eq!(copy["rows"][0]["id"], a.as_str());
}

#[test]
fn test_deps_from_snapshot_file() {
    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("snapshot.json");
    fs::write(
        &snapshot,
        r#"{
  "id": "snapshot",
  "nodes": [
    {"id": "a", "text": "Alpha", "x": 0, "y": 0},
    {"id": "c", "text": "Charlie", "x": 0, "y": -10}
  ],
  "edges": [
    {"id": "e1", "source_id": "a", "target_id": "c", "source_ids": ["a", "gone"]}
  ]
}"#,
    )
    .unwrap();

    // No project needed; the stale endpoint "gone" is ignored
    let output = canvas(&dir)
        .args(["deps", "--format", "json", "--file"])
        .arg(&snapshot)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let deps: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(row_ids(&deps), vec!["a", "c"]);
    assert_eq!(deps["summary"]["ready"], 2);
}

// =============================================================================
// Output Tests
// =============================================================================

#[test]
fn test_verbose_logs_to_stderr() {
    let dir = setup_project();

    canvas(&dir)
        .args(["--verbose", "deps"])
        .assert()
        .success()
        .stderr(predicate::str::contains("[verbose:deps]"));
}

#[test]
fn test_global_default_format() {
    let dir = setup_project();
    let config_dir = dir.path().join("xdg/graph-canvas");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "default_format = \"json\"\n").unwrap();

    let output = canvas(&dir)
        .arg("status")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let status: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(status["graph"], "workspace");
}
