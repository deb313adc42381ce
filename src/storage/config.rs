//! Configuration handling
//!
//! Configuration comes from TOML files, most specific last:
//!
//! 1. the global `config.toml` in the user config directory (or the file
//!    named by `TODOTXT_CONFIG`)
//! 2. the nearest `.todo.toml` in the current directory or a parent
//!
//! Command-line flags and their environment variables are applied on top by
//! the CLI. Relative paths in a file resolve against that file's directory.
//!
//! ```toml
//! todo_file = "todo.txt"
//! archive_file = "done.txt"
//! color = true
//! list_format = "checkbox"
//!
//! [merge]
//! hard = false
//! prefer_self = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{LineFormat, MergeStrategy};

/// Environment variable naming an alternative global config file
pub const CONFIG_ENV: &str = "TODOTXT_CONFIG";

/// File name of the project configuration
pub const PROJECT_CONFIG_FILE: &str = ".todo.toml";

pub const DEFAULT_TODO_FILE: &str = "todo.txt";
pub const DEFAULT_ARCHIVE_FILE: &str = "todo.archive.txt";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// `[merge]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeLayer {
    pub hard: Option<bool>,
    pub prefer_self: Option<bool>,
}

/// The settings one file provides; unset keys fall through
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    pub todo_file: Option<PathBuf>,
    pub archive_file: Option<PathBuf>,
    pub color: Option<bool>,
    pub list_format: Option<LineFormat>,
    pub merge: MergeLayer,
}

impl ConfigLayer {
    /// Reads a layer, resolving its relative paths against the file's directory
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let mut layer: ConfigLayer = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        if let Some(base) = path.parent() {
            layer.resolve_paths(base);
        }
        Ok(layer)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.todo_file, &mut self.archive_file].into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Lays `other` over `self`; keys set in `other` win
    pub fn overlay(self, other: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            todo_file: other.todo_file.or(self.todo_file),
            archive_file: other.archive_file.or(self.archive_file),
            color: other.color.or(self.color),
            list_format: other.list_format.or(self.list_format),
            merge: MergeLayer {
                hard: other.merge.hard.or(self.merge.hard),
                prefer_self: other.merge.prefer_self.or(self.merge.prefer_self),
            },
        }
    }
}

/// Resolved configuration for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub todo_file: PathBuf,
    pub archive_file: PathBuf,
    pub color: bool,
    pub list_format: LineFormat,
    pub merge: MergeStrategy,

    /// Files that contributed, in load order
    pub sources: Vec<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations, then applies `overrides`
    pub fn load(cwd: &Path, overrides: ConfigLayer) -> Result<Self> {
        let global = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| Self::global_config_dir().map(|dir| dir.join("config.toml")));

        Self::load_from(global.as_deref(), cwd, overrides)
    }

    /// Loads from an explicit global file and a starting directory
    ///
    /// Relative paths in `overrides` resolve against `cwd`.
    pub fn load_from(global: Option<&Path>, cwd: &Path, overrides: ConfigLayer) -> Result<Self> {
        let mut layer = ConfigLayer::default();
        let mut sources = Vec::new();

        let project = Self::find_project_config(cwd);
        for path in [global, project.as_deref()].into_iter().flatten() {
            if path.is_file() {
                layer = layer.overlay(ConfigLayer::from_file(path)?);
                sources.push(path.to_path_buf());
            }
        }

        let mut config = Self::resolve(layer.overlay(overrides), cwd);
        config.sources = sources;
        Ok(config)
    }

    /// Fills unset keys with defaults
    ///
    /// The archive defaults to a sibling of the todo file.
    pub fn resolve(layer: ConfigLayer, cwd: &Path) -> Self {
        let todo_file = match layer.todo_file {
            Some(path) if path.is_relative() => cwd.join(path),
            Some(path) => path,
            None => cwd.join(DEFAULT_TODO_FILE),
        };
        let archive_file = match layer.archive_file {
            Some(path) if path.is_relative() => cwd.join(path),
            Some(path) => path,
            None => todo_file.with_file_name(DEFAULT_ARCHIVE_FILE),
        };
        let defaults = MergeStrategy::default();

        Self {
            todo_file,
            archive_file,
            color: layer.color.unwrap_or(true),
            list_format: layer.list_format.unwrap_or_default(),
            merge: MergeStrategy {
                hard: layer.merge.hard.unwrap_or(defaults.hard),
                self_priority: layer.merge.prefer_self.unwrap_or(defaults.self_priority),
            },
            sources: Vec::new(),
        }
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "todotxt", "todotxt-cli").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Finds the nearest `.todo.toml` in `start` or a parent
    pub fn find_project_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            let candidate = current.join(PROJECT_CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}
