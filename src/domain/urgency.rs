//! Urgency ranking
//!
//! Tasks are ordered by an [`UrgencyKey`] derived from their fields and a
//! reference "now". Smaller keys are more urgent. Components, compared in
//! order:
//!
//! 1. open tasks before completed ones
//! 2. adjusted due date (see [`adjusted_due`])
//! 3. priority value, missing priority counts as `-1`
//! 4. creation date, missing counts as the earliest instant
//! 5. more dependencies, contexts and tags first
//! 6. description

use std::cmp::Ordering;

use chrono::{Days, NaiveDateTime};

use super::task::{Task, TaskDate};

/// Sort key for urgency ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrgencyKey {
    pub completed: bool,
    pub due: NaiveDateTime,
    pub priority: i16,
    pub created: NaiveDateTime,
    /// Negated metadata count
    pub metadata: i64,
    pub description: String,
}

impl Ord for UrgencyKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.completed
            .cmp(&other.completed)
            .then_with(|| self.due.cmp(&other.due))
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| self.created.cmp(&other.created))
            .then_with(|| self.metadata.cmp(&other.metadata))
            .then_with(|| self.description.cmp(&other.description))
    }
}

impl PartialOrd for UrgencyKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn plus_one_day(dt: NaiveDateTime) -> NaiveDateTime {
    dt.checked_add_days(Days::new(1)).unwrap_or(NaiveDateTime::MAX)
}

/// Due instant used for ranking
///
/// A missing due date counts as `now + 1 day` and a pure date as midnight.
/// Anything still in the future afterwards is pushed back one more day, so
/// tasks due today or overdue rank ahead of future tasks.
pub fn adjusted_due(due_date: Option<TaskDate>, now: NaiveDateTime) -> NaiveDateTime {
    let due = due_date.map_or_else(|| plus_one_day(now), TaskDate::to_datetime);
    if due > now {
        plus_one_day(due)
    } else {
        due
    }
}

/// Builds the urgency key of a task
pub fn urgency_key(task: &Task, now: NaiveDateTime) -> UrgencyKey {
    UrgencyKey {
        completed: task.completed,
        due: adjusted_due(task.due_date, now),
        priority: task.priority.map_or(-1, |p| i16::from(p.value())),
        created: task
            .creation_date
            .map_or(NaiveDateTime::MIN, TaskDate::to_datetime),
        metadata: -(task.metadata_count() as i64),
        description: task.description.clone(),
    }
}

/// Three-way urgency comparison of two tasks
pub fn compare(a: &Task, b: &Task, now: NaiveDateTime) -> Ordering {
    urgency_key(a, now).cmp(&urgency_key(b, now))
}
