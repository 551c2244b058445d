use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use taskboard_app::{FilterConfig, ServiceError, TaskService};
use taskboard_core::{Priority, TaskId};
use taskboard_store::BlobStore;
use tracing::warn;

use crate::Command;

mod render;

/// Execute one CLI command against a loaded service, writing results to `out`.
///
/// User mistakes (blank text, unknown ids, unknown filters in strict mode) and
/// unsaved changes are reported on stderr with a failing exit code; anything
/// else propagates.
pub fn run<B: BlobStore, W: Write>(
    command: Command,
    service: &mut TaskService<B>,
    filters: &FilterConfig,
    out: &mut W,
) -> Result<ExitCode> {
    match command {
        Command::Add { text, priority } => add(service, &text, priority, out),
        Command::Ls { filter, search, json } => {
            let category = filter.as_deref().unwrap_or(&filters.default);
            let tasks = match service.view(category, search.as_deref()) {
                Ok(tasks) => tasks,
                Err(err) => return reject(err),
            };

            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&tasks)?)?;
            } else if tasks.is_empty() {
                if filter.is_none() && search.is_none() {
                    writeln!(out, "No tasks found")?;
                } else {
                    writeln!(out, "No tasks matched the provided filters")?;
                }
            } else {
                render::task_table(&tasks, out)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Edit { id, text } => match service.edit(&id, &text) {
            Ok(Some(task)) => {
                writeln!(out, "updated {}: {}", task.id, task.text)?;
                Ok(ExitCode::SUCCESS)
            }
            Ok(None) => Ok(not_found(&id)),
            Err(err) => reject(err),
        },
        Command::Toggle { id } => match service.toggle(&id) {
            Ok(Some(task)) => {
                let verb = if task.completed { "completed" } else { "reopened" };
                writeln!(out, "{verb} {}", task.id)?;
                Ok(ExitCode::SUCCESS)
            }
            Ok(None) => Ok(not_found(&id)),
            Err(err) => reject(err),
        },
        Command::Rm { id } => match service.delete(&id) {
            Ok(Some(task)) => {
                writeln!(out, "deleted {}", task.id)?;
                Ok(ExitCode::SUCCESS)
            }
            Ok(None) => Ok(not_found(&id)),
            Err(err) => reject(err),
        },
        Command::Strategies => {
            for name in service.selector().strategy_names() {
                writeln!(out, "{name}")?;
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn add<B: BlobStore, W: Write>(
    service: &mut TaskService<B>,
    text: &str,
    priority: Priority,
    out: &mut W,
) -> Result<ExitCode> {
    match service.create(text, priority) {
        Ok(task) => {
            writeln!(out, "added {} [{}] {}", task.id, task.priority, task.text)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => reject(err),
    }
}

fn not_found(id: &TaskId) -> ExitCode {
    eprintln!("error: task not found: {id}");
    ExitCode::FAILURE
}

fn reject(err: ServiceError) -> Result<ExitCode> {
    if err.is_unsaved_change() {
        warn!(%err, "Change was applied in memory only");
        eprintln!("warning: changes were not saved: {err}");
        return Ok(ExitCode::FAILURE);
    }
    match err {
        ServiceError::Validation(err) => {
            eprintln!("error: {err}");
            Ok(ExitCode::FAILURE)
        }
        ServiceError::Filter(err) => {
            eprintln!("error: {err} (run `taskboard strategies` for the list)");
            Ok(ExitCode::FAILURE)
        }
        ServiceError::Store(err) => Err(err.into()),
    }
}
