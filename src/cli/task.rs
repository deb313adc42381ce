//! Task CLI commands

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use super::output::Output;
use crate::domain::{decode_line, urgency_key, Task, TaskDate, TaskList, RECURRENCE_KEY};
use crate::storage::Workspace;

fn load(workspace: &Workspace, output: &Output, command: &str) -> Result<TaskList> {
    let tasks = workspace.load()?;
    output.verbose_ctx(
        command,
        &format!(
            "Loaded {} tasks from {}",
            tasks.len(),
            workspace.todo_path().display()
        ),
    );
    Ok(tasks)
}

/// Splits 1-based line numbers into list positions and numbers with no task
fn resolve_lines(workspace: &Workspace, tasks: &TaskList, lines: &[usize]) -> (Vec<(usize, usize)>, Vec<usize>) {
    let mut found = Vec::new();
    let mut missing = Vec::new();
    for &line in lines.iter().collect::<BTreeSet<_>>() {
        match workspace.line_index(tasks, line) {
            Ok(index) => found.push((line, index)),
            Err(_) => missing.push(line),
        }
    }
    (found, missing)
}

fn warn_missing(output: &Output, missing: &[usize]) {
    if !missing.is_empty() {
        let lines: Vec<_> = missing.iter().map(usize::to_string).collect();
        output.warn(&format!("No task on line(s): {}", lines.join(", ")));
    }
}

pub fn add(workspace: &Workspace, output: &Output, text: &str, now: NaiveDateTime) -> Result<()> {
    let mut tasks = load(workspace, output, "add")?;
    let mut added = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let mut task = decode_line(line);
        if task.creation_date.is_none() {
            task.creation_date = Some(TaskDate::Date(now.date()));
        }
        tasks.add(task);
        added.push(tasks.len());
    }

    if added.is_empty() {
        anyhow::bail!("Nothing to add: task text is empty");
    }

    workspace.save(&tasks)?;
    output.verbose_ctx("add", &format!("Saved {} tasks", tasks.len()));

    let added: Vec<(usize, &Task)> = added
        .into_iter()
        .filter_map(|line| tasks.get(line - 1).map(|task| (line, task)))
        .collect();

    if output.is_json() {
        let items: Vec<_> = added
            .iter()
            .map(|(line, task)| serde_json::json!({ "line": line, "task": task.to_export() }))
            .collect();
        output.data(&items);
    } else {
        for (line, task) in added {
            output.success(&format!("Added task {}: {}", line, output.task_line(task)));
        }
    }

    Ok(())
}

pub fn complete(
    workspace: &Workspace,
    output: &Output,
    lines: &[usize],
    now: NaiveDateTime,
) -> Result<()> {
    let mut tasks = load(workspace, output, "do")?;
    let (found, missing) = resolve_lines(workspace, &tasks, lines);
    warn_missing(output, &missing);

    let mut snapshots = TaskList::new();
    let mut results = Vec::new();

    for (line, index) in found {
        let Some(task) = tasks.get_mut(index) else {
            continue;
        };
        if task.completed {
            output.warn(&format!("Task {} is already completed", line));
            continue;
        }

        let snapshot = task
            .mark_completed(now)
            .with_context(|| format!("Failed to complete task on line {}", line))?;

        let recurring = task.is_recurring();
        if let Some(snapshot) = snapshot {
            output.verbose_ctx(
                "do",
                &format!("Task {} recurs ({})", line, task.tag(RECURRENCE_KEY).unwrap_or("")),
            );
            snapshots.add(snapshot);
        }
        results.push((line, task.clone(), recurring));
    }

    if results.is_empty() {
        return Ok(());
    }

    // Completed occurrences reach the archive before their due dates advance
    if !snapshots.is_empty() {
        workspace.append_to_archive(&snapshots)?;
        output.verbose_ctx(
            "do",
            &format!(
                "Recorded {} completed occurrence(s) in {}",
                snapshots.len(),
                workspace.archive_path().display()
            ),
        );
    }
    workspace.save(&tasks)?;

    if output.is_json() {
        let items: Vec<_> = results
            .iter()
            .map(|(line, task, recurring)| {
                serde_json::json!({
                    "line": line,
                    "recurring": recurring,
                    "task": task.to_export(),
                })
            })
            .collect();
        output.data(&items);
    } else {
        for (line, task, recurring) in &results {
            if *recurring {
                let due = task.due_date.map(|d| d.to_string()).unwrap_or_default();
                output.success(&format!(
                    "Task {} recurs, next due {}: {}",
                    line,
                    due,
                    output.task_line(task)
                ));
            } else {
                output.success(&format!("Completed task {}: {}", line, output.task_line(task)));
            }
        }
    }

    Ok(())
}

pub fn remove(workspace: &Workspace, output: &Output, lines: &[usize]) -> Result<()> {
    let mut tasks = load(workspace, output, "rm")?;
    let (found, missing) = resolve_lines(workspace, &tasks, lines);
    warn_missing(output, &missing);

    let mut removed = Vec::new();
    for &(line, index) in found.iter().rev() {
        if let Some(task) = tasks.remove_at(index) {
            removed.push((line, task));
        }
    }
    removed.reverse();

    if removed.is_empty() {
        return Ok(());
    }

    workspace.save(&tasks)?;
    output.verbose_ctx("rm", &format!("{} tasks remain", tasks.len()));

    if output.is_json() {
        let items: Vec<_> = removed
            .iter()
            .map(|(line, task)| serde_json::json!({ "line": line, "task": task.to_export() }))
            .collect();
        output.data(&items);
    } else {
        for (line, task) in &removed {
            output.success(&format!("Removed task {}: {}", line, output.task_line(task)));
        }
    }

    Ok(())
}

pub fn list(
    workspace: &Workspace,
    output: &Output,
    filter: Option<&str>,
    sort: bool,
    now: NaiveDateTime,
) -> Result<()> {
    let tasks = load(workspace, output, "ls")?;

    let mut shown: Vec<(usize, &Task)> = tasks
        .iter()
        .enumerate()
        .map(|(index, task)| (index + 1, task))
        .filter(|(_, task)| filter.map_or(true, |text| task.to_string().contains(text)))
        .collect();

    if sort {
        shown.sort_by_cached_key(|(_, task)| urgency_key(task, now));
    }
    output.verbose_ctx(
        "ls",
        &format!("Showing {} of {} tasks (filter: {:?})", shown.len(), tasks.len(), filter),
    );

    if output.is_json() {
        let items: Vec<_> = shown.iter().map(|(_, task)| task.to_export()).collect();
        output.data(&items);
        return Ok(());
    }

    if shown.is_empty() {
        output.text("No tasks");
    }
    for (line, task) in shown {
        output.numbered(line, task);
    }

    Ok(())
}

pub fn sort(workspace: &Workspace, output: &Output, reverse: bool, now: NaiveDateTime) -> Result<()> {
    let mut tasks = load(workspace, output, "sort")?;
    tasks.sort(now, reverse);
    workspace.save(&tasks)?;

    let order = if reverse { "least" } else { "most" };
    output.success(&format!("Sorted {} tasks, {} urgent first", tasks.len(), order));
    Ok(())
}

pub fn next(workspace: &Workspace, output: &Output, now: NaiveDateTime) -> Result<()> {
    let tasks = load(workspace, output, "next")?;
    let next = tasks.most_urgent(now);

    if output.is_json() {
        output.data(&next.map(Task::to_export));
        return Ok(());
    }

    match next.and_then(|task| tasks.index_of(task).map(|index| (index + 1, task))) {
        Some((line, task)) => output.numbered(line, task),
        None => output.text("No open tasks"),
    }
    Ok(())
}

pub fn archive(workspace: &Workspace, output: &Output) -> Result<()> {
    let mut tasks = load(workspace, output, "archive")?;
    let done = workspace.archive_completed(&mut tasks)?;

    output.verbose_ctx("archive", &format!("{} tasks remain", tasks.len()));
    if output.is_json() {
        output.data(&serde_json::json!({
            "archived": done.len(),
            "archive_file": workspace.archive_path().display().to_string(),
        }));
    } else {
        output.success(&format!(
            "Archived {} completed tasks to {}",
            done.len(),
            workspace.archive_path().display()
        ));
    }
    Ok(())
}
