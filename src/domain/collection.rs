//! Ordered task collections
//!
//! A [`TaskList`] is the in-memory form of one todo.txt file. It owns its
//! tasks by value and is index-addressable; positions are 0-based here and
//! only become line numbers at the command-line surface.

use std::cmp::Reverse;

use chrono::NaiveDateTime;
use indexmap::IndexMap;

use super::codec::{decode_line, encode_line, RenderOptions};
use super::graph::{self, DependencyGraph};
use super::merge::{MergeStrategy, TaskConflicts};
use super::task::Task;
use super::urgency::urgency_key;

/// A task that was merged field by field with an incoming copy
#[derive(Debug, Clone, PartialEq)]
pub struct MergeConflict {
    /// Position of the merged task in the receiving list
    pub index: usize,
    /// The receiving task as it was before the merge
    pub original: Task,
    pub conflicts: TaskConflicts,
}

/// Outcome of [`TaskList::merge`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    /// Incoming tasks appended as new
    pub added: usize,
    /// Incoming tasks that already existed line for line
    pub skipped: usize,
    /// Incoming tasks matched by id and merged in place
    pub conflicts: Vec<MergeConflict>,
}

impl MergeReport {
    /// Merged tasks whose fields actually disagreed
    pub fn conflicting(&self) -> impl Iterator<Item = &MergeConflict> {
        self.conflicts.iter().filter(|c| c.conflicts.has_conflicts())
    }

    pub fn merged(&self) -> usize {
        self.conflicts.len()
    }
}

/// A dependency that names no task id
#[derive(Debug, Clone, PartialEq)]
pub struct OrphanDependency<'a> {
    pub index: usize,
    pub task: &'a Task,
    pub dependency: &'a str,
}

/// An ordered list of tasks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Decodes a block of todo.txt text
    ///
    /// Blank lines and lines starting with `#` are skipped.
    pub fn from_text(text: &str) -> Self {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(decode_line)
            .collect()
    }

    /// Encodes every task, one line each, with a trailing newline
    pub fn to_text(&self, options: &RenderOptions) -> String {
        self.tasks
            .iter()
            .map(|task| encode_line(task, options) + "\n")
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Task> {
        self.tasks.get_mut(index)
    }

    pub fn add(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Task> {
        (index < self.tasks.len()).then(|| self.tasks.remove(index))
    }

    /// Removes the first task equal to `task`
    pub fn remove(&mut self, task: &Task) -> bool {
        match self.index_of(task) {
            Some(index) => {
                self.tasks.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn index_of(&self, task: &Task) -> Option<usize> {
        self.tasks.iter().position(|t| t == task)
    }

    pub fn contains(&self, task: &Task) -> bool {
        self.tasks.contains(task)
    }

    pub fn find(&self, predicate: impl Fn(&Task) -> bool) -> Option<&Task> {
        self.tasks.iter().find(|task| predicate(task))
    }

    pub fn find_all(&self, predicate: impl Fn(&Task) -> bool) -> Vec<&Task> {
        self.tasks.iter().filter(|task| predicate(task)).collect()
    }

    /// Copies the matching tasks into a new list
    pub fn filter(&self, predicate: impl Fn(&Task) -> bool) -> TaskList {
        self.tasks
            .iter()
            .filter(|task| predicate(task))
            .cloned()
            .collect()
    }

    /// Sorts by urgency, most urgent first unless `reverse`
    pub fn sort(&mut self, now: NaiveDateTime, reverse: bool) {
        if reverse {
            self.tasks
                .sort_by_cached_key(|task| Reverse(urgency_key(task, now)));
        } else {
            self.tasks.sort_by_cached_key(|task| urgency_key(task, now));
        }
    }

    /// Sorts with an arbitrary key, keeping the order of equal tasks
    pub fn sort_by_key<K: Ord>(&mut self, key: impl FnMut(&Task) -> K) {
        self.tasks.sort_by_key(key);
    }

    /// The most urgent open task
    pub fn most_urgent(&self, now: NaiveDateTime) -> Option<&Task> {
        self.tasks
            .iter()
            .filter(|task| !task.completed)
            .min_by_key(|task| urgency_key(task, now))
    }

    /// Removes completed tasks and returns them in their original order
    pub fn archive(&mut self) -> TaskList {
        let (done, open): (Vec<Task>, Vec<Task>) = std::mem::take(&mut self.tasks)
            .into_iter()
            .partition(|task| task.completed);
        self.tasks = open;
        Self { tasks: done }
    }

    /// Drops every task equal to an earlier one, returning how many went
    pub fn deduplicate(&mut self) -> usize {
        let before = self.tasks.len();
        let mut unique: Vec<Task> = Vec::with_capacity(before);
        for task in std::mem::take(&mut self.tasks) {
            if !unique.contains(&task) {
                unique.push(task);
            }
        }
        self.tasks = unique;
        before - self.tasks.len()
    }

    /// Folds another list into this one
    ///
    /// Each incoming task is skipped if an identical line already exists,
    /// merged field by field into the first task sharing its `id`, or
    /// appended otherwise.
    pub fn merge(&mut self, other: TaskList, strategy: MergeStrategy) -> MergeReport {
        let plain = RenderOptions::plain();
        let mut lines: Vec<String> = self
            .tasks
            .iter()
            .map(|task| encode_line(task, &plain))
            .collect();
        let mut report = MergeReport::default();

        for incoming in other {
            let line = encode_line(&incoming, &plain);
            if lines.contains(&line) {
                report.skipped += 1;
                continue;
            }

            let matching = incoming
                .id
                .as_ref()
                .and_then(|id| self.tasks.iter().position(|t| t.id.as_ref() == Some(id)));

            match matching {
                Some(index) => {
                    let target = &mut self.tasks[index];
                    let original = target.clone();
                    let conflicts = target.merge(&incoming, strategy);
                    lines[index] = encode_line(target, &plain);
                    report.conflicts.push(MergeConflict {
                        index,
                        original,
                        conflicts,
                    });
                }
                None => {
                    self.tasks.push(incoming);
                    lines.push(line);
                    report.added += 1;
                }
            }
        }

        report
    }

    /// Dependency cycles among tasks with ids
    pub fn detect_cycles(&self) -> Vec<Vec<&Task>> {
        DependencyGraph::from_tasks(&self.tasks)
            .cycles()
            .into_iter()
            .map(|cycle| cycle.into_iter().map(|index| &self.tasks[index]).collect())
            .collect()
    }

    /// Every dependency that matches no task id
    pub fn orphan_dependencies(&self) -> Vec<OrphanDependency<'_>> {
        graph::orphan_dependencies(&self.tasks)
            .into_iter()
            .map(|(index, dependency)| OrphanDependency {
                index,
                task: &self.tasks[index],
                dependency,
            })
            .collect()
    }

    /// Ids carried by more than one task, with the positions of those tasks
    pub fn duplicate_ids(&self) -> Vec<(&str, Vec<usize>)> {
        let mut by_id: IndexMap<&str, Vec<usize>> = IndexMap::new();
        for (index, task) in self.tasks.iter().enumerate() {
            if let Some(id) = task.id.as_deref() {
                by_id.entry(id).or_default().push(index);
            }
        }
        by_id
            .into_iter()
            .filter(|(_, positions)| positions.len() > 1)
            .collect()
    }
}

impl FromIterator<Task> for TaskList {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Self {
            tasks: iter.into_iter().collect(),
        }
    }
}

impl Extend<Task> for TaskList {
    fn extend<I: IntoIterator<Item = Task>>(&mut self, iter: I) {
        self.tasks.extend(iter);
    }
}

impl IntoIterator for TaskList {
    type Item = Task;
    type IntoIter = std::vec::IntoIter<Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.into_iter()
    }
}

impl<'a> IntoIterator for &'a TaskList {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}
