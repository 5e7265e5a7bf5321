//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project management | `init`, `status` |
//! | Graph | Whole graphs | `graph new`, `graph list`, `graph import` |
//! | Canvas | Nodes and edges | `node add`, `node move`, `edge add` |
//! | Task | Dependency list editing | `task add`, `task edit`, `task status` |
//! | Query | Derived ordering | `deps`, `deps --file snapshot.json` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! The default comes from `default_format` in the global config.
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output:
//! ```bash
//! canvas --verbose deps
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod deps;
mod edge;
mod graph;
mod node;
mod output;
mod task;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
