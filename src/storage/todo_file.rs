//! todo.txt file storage
//!
//! A list is read whole and written back whole. Uses file locking for
//! concurrent access safety and a temp file + rename for atomic rewrites.
//! Comment and blank lines are not preserved across a rewrite.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use crate::domain::{RenderOptions, TaskList};

/// A todo.txt file on disk
#[derive(Debug, Clone)]
pub struct TodoFile {
    path: PathBuf,
}

impl TodoFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads and decodes the file; a missing file is an empty list
    pub fn read(&self) -> Result<TaskList> {
        if !self.path.exists() {
            return Ok(TaskList::new());
        }

        let mut file = File::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        file.lock_shared()
            .with_context(|| format!("Failed to acquire read lock on {}", self.path.display()))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        // Lock is released when file is dropped
        Ok(TaskList::from_text(&content))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("todo.txt"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        Ok(())
    }

    /// Replaces the file with the encoded list
    pub fn write(&self, tasks: &TaskList) -> Result<()> {
        self.ensure_parent()?;

        let temp_path = self.temp_path();
        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            file.lock_exclusive()
                .with_context(|| format!("Failed to acquire write lock on {}", temp_path.display()))?;

            let mut writer = BufWriter::new(&file);
            writer
                .write_all(tasks.to_text(&RenderOptions::plain()).as_bytes())
                .with_context(|| format!("Failed to write {}", temp_path.display()))?;
            writer.flush().with_context(|| format!("Failed to flush {}", temp_path.display()))?;
        }

        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }

    /// Appends the encoded list, starting on a fresh line
    pub fn append(&self, tasks: &TaskList) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }
        self.ensure_parent()?;

        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        file.lock_exclusive()
            .with_context(|| format!("Failed to acquire write lock on {}", self.path.display()))?;

        let mut text = String::new();
        if !ends_with_newline(&mut file)? {
            text.push('\n');
        }
        text.push_str(&tasks.to_text(&RenderOptions::plain()));

        file.write_all(text.as_bytes())
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        file.flush().with_context(|| format!("Failed to flush {}", self.path.display()))?;

        Ok(())
    }
}

/// True for an empty file or one whose last byte is `\n`
fn ends_with_newline(file: &mut File) -> Result<bool> {
    let len = file.metadata().context("Failed to stat file")?.len();
    if len == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))
        .and_then(|_| file.read_exact(&mut last))
        .context("Failed to read end of file")?;
    Ok(last[0] == b'\n')
}
