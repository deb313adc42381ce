//! List maintenance commands: merge, dedup and consistency checks

use std::path::Path;

use anyhow::Result;

use super::output::Output;
use crate::domain::{MergeStrategy, Task};
use crate::storage::{TodoFile, Workspace};

fn task_label(task: &Task) -> String {
    match &task.id {
        Some(id) => id.clone(),
        None => task.description.clone(),
    }
}

pub fn merge(
    workspace: &Workspace,
    output: &Output,
    file: &Path,
    hard: bool,
    prefer_other: bool,
) -> Result<()> {
    if !file.is_file() {
        anyhow::bail!("File not found: {}", file.display());
    }

    let mut tasks = workspace.load()?;
    let other = TodoFile::new(file).read()?;
    output.verbose_ctx(
        "merge",
        &format!(
            "Merging {} tasks from {} into {} tasks",
            other.len(),
            file.display(),
            tasks.len()
        ),
    );

    let configured = workspace.config().merge;
    let strategy = MergeStrategy {
        hard: hard || configured.hard,
        self_priority: configured.self_priority && !prefer_other,
    };
    output.verbose_ctx("merge", &format!("Strategy: {:?}", strategy));

    let report = tasks.merge(other, strategy);
    workspace.save(&tasks)?;

    if output.is_json() {
        let merged: Vec<_> = report
            .conflicts
            .iter()
            .map(|c| {
                serde_json::json!({
                    "line": c.index + 1,
                    "original": c.original.to_export(),
                    "conflicts": c.conflicts,
                })
            })
            .collect();
        output.data(&serde_json::json!({
            "added": report.added,
            "skipped": report.skipped,
            "merged": merged,
        }));
        return Ok(());
    }

    output.success(&format!(
        "Merged {}: {} added, {} skipped, {} merged",
        file.display(),
        report.added,
        report.skipped,
        report.merged()
    ));
    for conflict in report.conflicting() {
        output.text(&format!(
            "Conflict on line {} ({}): {}",
            conflict.index + 1,
            conflict.original,
            conflict.conflicts.fields().join(", ")
        ));
    }
    Ok(())
}

pub fn dedup(workspace: &Workspace, output: &Output) -> Result<()> {
    let mut tasks = workspace.load()?;
    let before = tasks.len();
    let removed = tasks.deduplicate();
    output.verbose_ctx("dedup", &format!("{} -> {} tasks", before, tasks.len()));

    if removed > 0 {
        workspace.save(&tasks)?;
    }

    if output.is_json() {
        output.data(&serde_json::json!({ "removed": removed }));
    } else {
        output.success(&format!("Removed {} duplicate tasks", removed));
    }
    Ok(())
}

pub fn check(workspace: &Workspace, output: &Output) -> Result<()> {
    let tasks = workspace.load()?;

    let cycles: Vec<Vec<String>> = tasks
        .detect_cycles()
        .into_iter()
        .map(|cycle| cycle.into_iter().map(task_label).collect())
        .collect();
    let orphans = tasks.orphan_dependencies();
    let duplicates = tasks.duplicate_ids();
    output.verbose_ctx(
        "check",
        &format!(
            "{} cycles, {} orphan dependencies, {} duplicate ids",
            cycles.len(),
            orphans.len(),
            duplicates.len()
        ),
    );

    let problems = cycles.len() + orphans.len() + duplicates.len();

    if output.is_json() {
        let orphans: Vec<_> = orphans
            .iter()
            .map(|o| serde_json::json!({ "line": o.index + 1, "dependency": o.dependency }))
            .collect();
        let duplicates: Vec<_> = duplicates
            .iter()
            .map(|(id, positions)| {
                let lines: Vec<_> = positions.iter().map(|p| p + 1).collect();
                serde_json::json!({ "id": id, "lines": lines })
            })
            .collect();
        output.data(&serde_json::json!({
            "cycles": cycles,
            "orphans": orphans,
            "duplicate_ids": duplicates,
        }));
    } else {
        for cycle in &cycles {
            output.text(&format!("Cycle: {}", cycle.join(" -> ")));
        }
        for orphan in &orphans {
            output.text(&format!(
                "Orphan dependency on line {}: +{}",
                orphan.index + 1,
                orphan.dependency
            ));
        }
        for (id, positions) in &duplicates {
            let lines: Vec<_> = positions.iter().map(|p| (p + 1).to_string()).collect();
            output.text(&format!("Duplicate id {} on lines {}", id, lines.join(", ")));
        }
        if problems == 0 {
            output.success("No problems found");
        }
    }

    if problems > 0 {
        anyhow::bail!("Found {} problem(s) in {}", problems, workspace.todo_path().display());
    }
    Ok(())
}
