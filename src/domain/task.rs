//! Task domain model
//!
//! A task is one line of a todo.txt file: an optional completion marker,
//! priority letter and creation date, followed by free text interleaved with
//! `+dependency`, `@context` and `key:value` tokens.
//!
//! The `id` and `rec` keys have dedicated fields so they can never collide
//! with ordinary tags; `due` is parsed into [`Task::due_date`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::recurrence::Recurrence;

#[derive(Debug, Error, PartialEq)]
pub enum TaskError {
    #[error("Priority must be between 0 and 25 (A-Z), got {0}")]
    InvalidPriority(i64),

    #[error("Unknown recurrence unit '{unit}' in '{expression}'")]
    InvalidRecurrenceUnit { unit: char, expression: String },

    #[error("Invalid recurrence expression: '{0}'")]
    InvalidRecurrence(String),

    #[error("Invalid date: '{0}'")]
    InvalidDate(String),
}

/// Task priority, `A` (0, most important) through `Z` (25)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const HIGHEST: Priority = Priority(0);
    pub const LOWEST: Priority = Priority(25);

    /// Creates a priority, failing outside `0..=25`
    pub fn new(value: i64) -> Result<Self, TaskError> {
        match u8::try_from(value) {
            Ok(v) if v <= Self::LOWEST.0 => Ok(Self(v)),
            _ => Err(TaskError::InvalidPriority(value)),
        }
    }

    /// Creates a priority from its letter (case-insensitive)
    pub fn from_letter(letter: char) -> Result<Self, TaskError> {
        if letter.is_ascii_alphabetic() {
            Ok(Self(letter.to_ascii_uppercase() as u8 - b'A'))
        } else {
            Err(TaskError::InvalidPriority(letter as i64 - 'A' as i64))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn letter(self) -> char {
        (b'A' + self.0) as char
    }
}

impl TryFrom<i64> for Priority {
    type Error = TaskError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A calendar date or a date with time of day
///
/// Dates and date-times are distinct values: `2023-01-01` is not equal to
/// `2023-01-01T00:00:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TaskDate {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

impl TaskDate {
    /// Parses an ISO date or date-time, returning `None` on failure
    ///
    /// Date-times with a UTC offset keep their wall-clock time; the offset
    /// itself is dropped.
    pub fn try_parse(s: &str) -> Option<Self> {
        if s.contains('T') {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
                .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
                .map(TaskDate::DateTime)
        } else {
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .ok()
                .map(TaskDate::Date)
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, TaskDate::Date(_))
    }

    pub fn date(self) -> NaiveDate {
        match self {
            TaskDate::Date(date) => date,
            TaskDate::DateTime(dt) => dt.date(),
        }
    }

    /// Returns the instant this value denotes; a pure date means midnight
    pub fn to_datetime(self) -> NaiveDateTime {
        match self {
            TaskDate::Date(date) => date.and_time(NaiveTime::MIN),
            TaskDate::DateTime(dt) => dt,
        }
    }
}

impl fmt::Display for TaskDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskDate::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            TaskDate::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMATS[0])),
        }
    }
}

impl FromStr for TaskDate {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s.trim()).ok_or_else(|| TaskError::InvalidDate(s.to_string()))
    }
}

impl TryFrom<String> for TaskDate {
    type Error = TaskError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskDate> for String {
    fn from(date: TaskDate) -> Self {
        date.to_string()
    }
}

/// Free-form `key:value` tags
///
/// Keeps insertion order for display; equality ignores order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(IndexMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Sets a value; an existing key keeps its position
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut String> {
        self.0.get_mut(key)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Reserved tag keys with dedicated fields
pub const ID_KEY: &str = "id";
pub const RECURRENCE_KEY: &str = "rec";
pub const DUE_KEY: &str = "due";

/// A single task record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Task {
    pub priority: Option<Priority>,
    pub completed: bool,
    pub creation_date: Option<TaskDate>,

    /// Due date; for recurring tasks this is the next occurrence
    pub due_date: Option<TaskDate>,

    /// `+token` markers, in order of appearance (not deduplicated)
    pub dependencies: Vec<String>,

    /// `@token` markers, in order of appearance
    pub contexts: Vec<String>,

    /// Stable identity used to match copies of a task (`id:` tag)
    pub id: Option<String>,

    /// Recurrence expression (`rec:` tag), parsed on completion
    pub recurrence: Option<String>,

    /// All other `key:value` tags
    pub tags: Tags,

    pub description: String,
}

impl Task {
    /// Creates an open task with the given description
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into().trim().to_string(),
            ..Self::default()
        }
    }

    /// Sets the priority from its numeric value, rejecting values outside `0..=25`
    pub fn set_priority(&mut self, value: Option<i64>) -> Result<(), TaskError> {
        self.priority = value.map(Priority::new).transpose()?;
        Ok(())
    }

    /// Sets a tag, routing reserved keys to their dedicated fields
    ///
    /// A `due` value that is not a valid date is dropped.
    pub fn insert_tag(&mut self, key: &str, value: &str) {
        match key {
            ID_KEY => self.id = Some(value.to_string()),
            RECURRENCE_KEY => self.recurrence = Some(value.to_string()),
            DUE_KEY => {
                if let Some(date) = TaskDate::try_parse(value) {
                    self.due_date = Some(date);
                }
            }
            _ => {
                self.tags.insert(key, value);
            }
        }
    }

    /// Looks up a tag, including the `id` and `rec` fields
    pub fn tag(&self, key: &str) -> Option<&str> {
        match key {
            ID_KEY => self.id.as_deref(),
            RECURRENCE_KEY => self.recurrence.as_deref(),
            _ => self.tags.get(key),
        }
    }

    /// All tags in display order: `id`, the free-form tags, then `rec`
    pub fn all_tags(&self) -> Vec<(&str, &str)> {
        let mut tags = Vec::with_capacity(self.tag_count());
        if let Some(id) = &self.id {
            tags.push((ID_KEY, id.as_str()));
        }
        tags.extend(self.tags.iter());
        if let Some(rec) = &self.recurrence {
            tags.push((RECURRENCE_KEY, rec.as_str()));
        }
        tags
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len() + usize::from(self.id.is_some()) + usize::from(self.recurrence.is_some())
    }

    /// Number of dependencies, contexts and tags attached to the task
    pub fn metadata_count(&self) -> usize {
        self.dependencies.len() + self.contexts.len() + self.tag_count()
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Computes the next due date from the `rec` expression
    ///
    /// Returns `Ok(None)` for tasks without recurrence.
    pub fn next_due_date(&self, now: NaiveDateTime) -> Result<Option<TaskDate>, TaskError> {
        let Some(expression) = self.recurrence.as_deref() else {
            return Ok(None);
        };
        let recurrence: Recurrence = expression.parse()?;
        recurrence.next_due(self.due_date, now).map(Some)
    }

    /// Marks the task as done
    ///
    /// A recurring task stays open with its due date advanced to the next
    /// occurrence; the completed occurrence is returned as a snapshot. On a
    /// recurrence error the task is left untouched.
    pub fn mark_completed(&mut self, now: NaiveDateTime) -> Result<Option<Task>, TaskError> {
        let Some(next_due) = self.next_due_date(now)? else {
            self.completed = true;
            return Ok(None);
        };

        let mut snapshot = self.clone();
        snapshot.completed = true;

        self.completed = false;
        self.due_date = Some(next_due);
        Ok(Some(snapshot))
    }

    /// Returns true if the due date lies before `now`
    ///
    /// Pure dates compare against today's date, so a task due today is not
    /// overdue.
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        match self.due_date {
            None => false,
            Some(TaskDate::Date(date)) => date < now.date(),
            Some(TaskDate::DateTime(dt)) => dt < now,
        }
    }

    /// Returns true if the task has a description, a priority and a due date
    pub fn is_full_task(&self) -> bool {
        !self.description.is_empty() && self.priority.is_some() && self.due_date.is_some()
    }

    /// Returns true if the task can be scheduled (has a `dur` estimate)
    pub fn is_plannable(&self) -> bool {
        !self.description.is_empty() && self.tags.contains_key("dur")
    }

    /// Flat key/value export consumed by JSON rendering
    pub fn to_export(&self) -> TaskExport {
        TaskExport {
            priority: self.priority,
            description: self.description.clone(),
            completed: self.completed,
            due_date: self.due_date,
            contexts: self.contexts.clone(),
            tags: self
                .all_tags()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            dependencies: self.dependencies.clone(),
            creation_date: self.creation_date,
        }
    }

    /// Rebuilds a task from its export
    pub fn from_export(export: TaskExport) -> Self {
        let mut task = Task {
            priority: export.priority,
            completed: export.completed,
            creation_date: export.creation_date,
            dependencies: export.dependencies,
            contexts: export.contexts,
            description: export.description.trim().to_string(),
            ..Task::default()
        };
        for (key, value) in &export.tags {
            task.insert_tag(key, value);
        }
        if export.due_date.is_some() {
            task.due_date = export.due_date;
        }
        task
    }
}

/// Structured form of a task
///
/// Field names and their optionality are a stable contract for JSON output:
/// absent priority and dates serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskExport {
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<TaskDate>,
    #[serde(default)]
    pub contexts: Vec<String>,
    #[serde(default)]
    pub tags: IndexMap<String, String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub creation_date: Option<TaskDate>,
}

impl From<&Task> for TaskExport {
    fn from(task: &Task) -> Self {
        task.to_export()
    }
}

impl From<TaskExport> for Task {
    fn from(export: TaskExport) -> Self {
        Task::from_export(export)
    }
}
