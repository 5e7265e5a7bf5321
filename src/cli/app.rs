//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{deps, edge, graph, node, task};
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "canvas")]
#[command(author, version, about = "Graph canvas with an automatically ordered dependency list")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to `default_format` from the global config)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Graph to work on (defaults to `default_graph` from the project config)
    #[arg(long, short = 'g', global = true, env = "CANVAS_GRAPH")]
    pub graph: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new canvas project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Manage graphs
    #[command(subcommand)]
    Graph(graph::GraphCommands),

    /// Manage nodes on the canvas
    #[command(subcommand)]
    Node(node::NodeCommands),

    /// Manage edges between nodes
    #[command(subcommand)]
    Edge(edge::EdgeCommands),

    /// Edit the dependency list
    #[command(subcommand)]
    Task(task::TaskCommands),

    /// Show the dependency list in execution order
    Deps {
        /// Read a graph JSON snapshot instead of the project
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show graph status overview
    Status,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = match cli.format {
        Some(format) => format,
        None => Config::load()?.global.default_format.into(),
    };
    let output = Output::new(format, cli.verbose);
    let graph = cli.graph.as_deref();

    output.verbose("Canvas CLI starting");

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path));
            let project = Project::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Created .canvas directory at: {}", project.canvas_dir().display()),
            );
            output.success(&format!(
                "Initialized canvas project at {}",
                project.root().display()
            ));
        }

        Commands::Graph(cmd) => graph::run(cmd, &output, graph)?,
        Commands::Node(cmd) => node::run(cmd, &output, graph)?,
        Commands::Edge(cmd) => edge::run(cmd, &output, graph)?,
        Commands::Task(cmd) => task::run(cmd, &output, graph)?,

        Commands::Deps { file } => {
            output.verbose_ctx(
                "deps",
                &format!("Deriving dependency list, graph: {:?}, file: {:?}", graph, file),
            );
            deps::deps(&output, graph, file.as_deref())?
        }
        Commands::Status => {
            output.verbose("Gathering graph status");
            deps::status(&output, graph)?
        }
    }

    output.verbose("Command completed successfully");
    Ok(())
}
