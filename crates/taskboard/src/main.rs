//! CLI entry point for taskboard.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

use taskboard_app::{ProjectConfig, TaskService, TaskStore};
use taskboard_core::{Priority, TaskId};
use taskboard_events::NotificationBus;
use taskboard_store::{FileBlobStore, RetryingBlobStore};

mod commands;

/// Prioritised task list kept in a local data directory.
#[derive(Parser, Debug)]
#[command(
    name = "taskboard",
    version,
    about = "taskboard: a prioritised task list stored as JSON in a data directory"
)]
struct Cli {
    /// Directory holding the task list and config.toml (defaults to the platform data dir).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Explicit configuration file; overrides `<data-dir>/config.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a task.
    Add {
        /// Task text.
        text: String,
        /// low, medium, high or urgent.
        #[arg(short, long, default_value_t = Priority::Medium)]
        priority: Priority,
    },

    /// List tasks, optionally narrowed by a filter and a search.
    Ls {
        /// Filter strategy name (see `strategies`).
        #[arg(short, long)]
        filter: Option<String>,
        /// Case-insensitive text search applied after the filter.
        #[arg(short, long)]
        search: Option<String>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Replace the text of a task.
    Edit {
        /// Task id.
        id: TaskId,
        /// New text.
        text: String,
    },

    /// Flip a task between pending and completed.
    Toggle {
        /// Task id.
        id: TaskId,
    },

    /// Delete a task.
    Rm {
        /// Task id.
        id: TaskId,
    },

    /// List the available filter strategies.
    Strategies,
}

fn main() -> Result<ExitCode> {
    let Cli { data_dir, config, cmd } = Cli::parse();
    install_tracing();

    let data_dir = resolve_data_dir(data_dir)?;
    let config = config.map_or_else(
        || ProjectConfig::load(&data_dir),
        |path| ProjectConfig::from_path(&path),
    )?;
    let storage_dir = config.storage.dir.as_deref().unwrap_or(&data_dir);

    let mut service = open_service(storage_dir, &config)?;
    service
        .load()
        .with_context(|| format!("failed to load tasks from {}", storage_dir.display()))?;

    let stdout = io::stdout();
    commands::run(cmd, &mut service, &config.filters, &mut stdout.lock())
}

type CliBlobStore = RetryingBlobStore<FileBlobStore>;

fn open_service(storage_dir: &Path, config: &ProjectConfig) -> Result<TaskService<CliBlobStore>> {
    let files = FileBlobStore::open(storage_dir)
        .with_context(|| format!("failed to open data directory {}", storage_dir.display()))?;
    let blob = RetryingBlobStore::new(files, config.storage.retry.policy());
    let store = TaskStore::with_key(blob, config.storage.key.clone());
    Ok(TaskService::new(store, NotificationBus::new()).with_strict_filters(config.filters.strict))
}

fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    explicit
        .or_else(|| dirs::data_dir().map(|dir| dir.join("taskboard")))
        .ok_or_else(|| anyhow!("could not determine a data directory, pass --data-dir"))
}

fn install_tracing() {
    // RUST_LOG is honoured; INFO otherwise. Logs go to stderr so `ls --json` stays parseable.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}
