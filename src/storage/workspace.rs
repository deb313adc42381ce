//! Workspace access
//!
//! Ties the resolved configuration to the todo and archive files used by a
//! single command invocation.

use std::path::Path;

use anyhow::Result;
use thiserror::Error;

use super::{Config, TodoFile};
use crate::domain::TaskList;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("No task on line {line} ({len} tasks in {file})")]
    LineOutOfRange {
        line: usize,
        len: usize,
        file: String,
    },
}

/// The files one invocation reads and writes
pub struct Workspace {
    config: Config,
    todo: TodoFile,
    archive: TodoFile,
}

impl Workspace {
    pub fn open(config: Config) -> Self {
        let todo = TodoFile::new(&config.todo_file);
        let archive = TodoFile::new(&config.archive_file);
        Self {
            config,
            todo,
            archive,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn todo_path(&self) -> &Path {
        self.todo.path()
    }

    pub fn archive_path(&self) -> &Path {
        self.archive.path()
    }

    pub fn load(&self) -> Result<TaskList> {
        self.todo.read()
    }

    pub fn save(&self, tasks: &TaskList) -> Result<()> {
        self.todo.write(tasks)
    }

    /// Moves completed tasks to the archive file and saves the rest
    ///
    /// The archive is written first, so a failure never loses tasks.
    pub fn archive_completed(&self, tasks: &mut TaskList) -> Result<TaskList> {
        let done = tasks.archive();
        if done.is_empty() {
            return Ok(done);
        }
        self.append_to_archive(&done)?;
        self.save(tasks)?;
        Ok(done)
    }

    /// Appends tasks to the archive file
    pub fn append_to_archive(&self, tasks: &TaskList) -> Result<()> {
        self.archive.append(tasks)
    }

    /// Converts a 1-based line number into a list position
    pub fn line_index(&self, tasks: &TaskList, line: usize) -> Result<usize, WorkspaceError> {
        if line == 0 || line > tasks.len() {
            return Err(WorkspaceError::LineOutOfRange {
                line,
                len: tasks.len(),
                file: self.todo.path().display().to_string(),
            });
        }
        Ok(line - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::config::ConfigLayer;
    use std::fs;
    use tempfile::TempDir;

    fn workspace(dir: &TempDir) -> Workspace {
        Workspace::open(Config::resolve(ConfigLayer::default(), dir.path()))
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);

        let tasks = TaskList::from_text("(A) One\nTwo");
        ws.save(&tasks).unwrap();

        assert_eq!(ws.load().unwrap(), tasks);
        assert_eq!(ws.todo_path(), dir.path().join("todo.txt"));
    }

    #[test]
    fn archive_moves_completed_tasks() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);

        let mut tasks = TaskList::from_text("x Done\nOpen\nx Also done");
        ws.save(&tasks).unwrap();

        let done = ws.archive_completed(&mut tasks).unwrap();

        assert_eq!(done.len(), 2);
        assert_eq!(
            fs::read_to_string(ws.archive_path()).unwrap(),
            "x Done\nx Also done\n"
        );
        assert_eq!(fs::read_to_string(ws.todo_path()).unwrap(), "Open\n");
    }

    #[test]
    fn archive_without_completed_tasks_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);

        let mut tasks = TaskList::from_text("Open");
        let done = ws.archive_completed(&mut tasks).unwrap();

        assert!(done.is_empty());
        assert!(!ws.archive_path().exists());
    }

    #[test]
    fn line_numbers_are_one_based() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        let tasks = TaskList::from_text("One\nTwo");

        assert_eq!(ws.line_index(&tasks, 1), Ok(0));
        assert_eq!(ws.line_index(&tasks, 2), Ok(1));
        assert!(matches!(
            ws.line_index(&tasks, 0),
            Err(WorkspaceError::LineOutOfRange { line: 0, len: 2, .. })
        ));
        assert!(ws.line_index(&tasks, 3).is_err());
    }
}
