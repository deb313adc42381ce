//! # Storage Layer
//!
//! Plain-text persistence for todo.txt lists.
//!
//! ## Files
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks | todo.txt, one task per line | `todo.txt` (configurable) |
//! | Archive | todo.txt, appended | `todo.archive.txt` next to the todo file |
//! | Global config | TOML | `<config dir>/config.toml` |
//! | Project config | TOML | nearest `.todo.toml` |
//!
//! ## Concurrency Safety
//!
//! - Reads take a shared `fs2` lock, writes an exclusive one
//! - Rewrites are atomic (temp file + rename)
//! - Archive writes append under the lock
//!
//! ## Key Types
//!
//! - [`Workspace`] - Entry point for one invocation's files
//! - [`TodoFile`] - Read/write/append a todo.txt file
//! - [`Config`] - Layered configuration

mod config;
mod todo_file;
mod workspace;

pub use config::{Config, ConfigError, ConfigLayer, MergeLayer, CONFIG_ENV, PROJECT_CONFIG_FILE};
pub use todo_file::TodoFile;
pub use workspace::{Workspace, WorkspaceError};
