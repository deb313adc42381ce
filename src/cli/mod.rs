//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Tasks | Edit the list | `add`, `do`, `rm` |
//! | Views | Read the list | `ls`, `next` |
//! | Housekeeping | Reorder and clean up | `sort`, `archive`, `dedup` |
//! | Reconciliation | Combine and verify lists | `merge`, `check` |
//!
//! Tasks are addressed by 1-based line number, as shown by `ls`.
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output:
//! ```bash
//! todo --verbose ls
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod maintenance;
mod output;
mod task;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
