//! Main CLI application structure

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use crossterm::tty::IsTty;

use super::output::{Output, OutputFormat};
use super::{maintenance, task};
use crate::domain::{LineFormat, RenderOptions};
use crate::storage::{Config, ConfigLayer, Workspace};

#[derive(Parser)]
#[command(name = "todo")]
#[command(author, version, about = "A todo.txt task manager")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the todo.txt file
    #[arg(long, short = 'f', global = true, env = "TODOTXT_PATH")]
    pub file: Option<PathBuf>,

    /// Path to the archive file for completed tasks
    #[arg(long, global = true, env = "ARCHIVE_PATH")]
    pub archive_file: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable colors in output
    #[arg(long, short = 'c', global = true)]
    pub no_color: bool,

    /// List tasks with checkbox and priority columns
    #[arg(long, global = true)]
    pub checkbox: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add tasks, one per line of TEXT
    ///
    /// Examples:
    ///   todo add "(A) Call mom @phone due:2024-05-01"
    ///   todo add "Water plants rec:+1w due:2024-05-01"
    #[command(visible_alias = "a")]
    Add {
        /// Task text in todo.txt format
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Mark tasks as done (recurring tasks move to their next due date)
    Do {
        /// Line numbers, starting at 1
        #[arg(required = true)]
        lines: Vec<usize>,
    },

    /// Remove tasks
    #[command(visible_aliases = ["del", "delete"])]
    Rm {
        /// Line numbers, starting at 1
        #[arg(required = true)]
        lines: Vec<usize>,
    },

    /// List tasks
    #[command(visible_alias = "list")]
    Ls {
        /// Only show tasks whose line contains this text
        filter: Option<String>,

        /// Show tasks in urgency order
        #[arg(long, short)]
        sort: bool,
    },

    /// Sort the file by urgency
    Sort {
        /// Least urgent first
        #[arg(long, short)]
        reverse: bool,
    },

    /// Show the most urgent open task
    Next,

    /// Move completed tasks to the archive file
    Archive,

    /// Merge tasks from another todo.txt file
    Merge {
        /// File to merge in
        file: PathBuf,

        /// Allow conflicting fields to be overwritten
        #[arg(long)]
        hard: bool,

        /// With --hard, take the other file's values on conflict
        #[arg(long)]
        prefer_other: bool,
    },

    /// Remove exact duplicate tasks
    Dedup,

    /// Report dependency cycles, orphan dependencies and duplicate ids
    Check,
}

impl Cli {
    /// Settings given by flags and environment variables
    fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            todo_file: self.file.clone(),
            archive_file: self.archive_file.clone(),
            color: self.no_color.then_some(false),
            list_format: self.checkbox.then_some(LineFormat::Checkbox),
            ..ConfigLayer::default()
        }
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    output.verbose("todo starting");

    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let config = Config::load(&cwd, cli.overrides())?;
    for source in &config.sources {
        output.verbose_ctx("config", &format!("Loaded {}", source.display()));
    }

    let color = config.color && output.is_text() && std::io::stdout().is_tty();
    let output = output.with_render(
        RenderOptions::plain()
            .with_color(color)
            .with_format(config.list_format),
    );
    output.verbose_ctx(
        "config",
        &format!(
            "todo file: {}, archive: {}, color: {}",
            config.todo_file.display(),
            config.archive_file.display(),
            color
        ),
    );

    let workspace = Workspace::open(config);
    let now = now();

    match cli.command {
        Commands::Add { text } => task::add(&workspace, &output, &text.join(" "), now),
        Commands::Do { lines } => task::complete(&workspace, &output, &lines, now),
        Commands::Rm { lines } => task::remove(&workspace, &output, &lines),
        Commands::Ls { filter, sort } => task::list(&workspace, &output, filter.as_deref(), sort, now),
        Commands::Sort { reverse } => task::sort(&workspace, &output, reverse, now),
        Commands::Next => task::next(&workspace, &output, now),
        Commands::Archive => task::archive(&workspace, &output),
        Commands::Merge {
            file,
            hard,
            prefer_other,
        } => maintenance::merge(&workspace, &output, &file, hard, prefer_other),
        Commands::Dedup => maintenance::dedup(&workspace, &output),
        Commands::Check => maintenance::check(&workspace, &output),
    }
}

/// The reference instant for urgency and recurrence
fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
