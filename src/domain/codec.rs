//! todo.txt line grammar
//!
//! Decoding consumes a line left to right:
//!
//! ```text
//! [x ] [(A) ] [2023-01-01 ] words +dependency @context key:value due:2023-02-01
//! ```
//!
//! Decoding never fails. Tokens that look like dates but do not parse stay
//! where they are, and a `due:` value that is not a date is dropped.
//!
//! Encoding writes fields in a canonical order, so `encode(decode(line))`
//! normalizes whitespace and token order rather than reproducing the input.
//!
//! A line consisting of `x` alone is a completed task with no description,
//! which is how such a task encodes. An open task described as just `x`
//! therefore does not survive a round trip.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crossterm::style::{Color, Stylize};
use serde::{Deserialize, Serialize};

use super::task::{Priority, Task, TaskDate, RECURRENCE_KEY};

/// Layout of an encoded line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineFormat {
    /// Plain todo.txt
    #[default]
    Compact,
    /// Fixed-width `[x]` checkbox and priority columns, for listings
    Checkbox,
}

/// Options for [`encode_line`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    /// Add ANSI colors; does not change the text itself
    pub color: bool,
    pub format: LineFormat,
}

impl RenderOptions {
    /// Uncolored todo.txt, the format written to files
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_format(mut self, format: LineFormat) -> Self {
        self.format = format;
        self
    }
}

/// Decodes one todo.txt line
pub fn decode_line(line: &str) -> Task {
    let mut task = Task::default();
    let mut rest = line.trim();

    if let Some(after) = strip_completion_marker(rest) {
        task.completed = true;
        rest = after;
    }

    if let Some((priority, after)) = strip_priority(rest) {
        task.priority = Some(priority);
        rest = after;
    }

    if let Some((date, after)) = strip_date(rest) {
        task.creation_date = Some(date);
        rest = after;

        // Encoding writes the creation date before the priority
        if task.priority.is_none() {
            if let Some((priority, after)) = strip_priority(rest) {
                task.priority = Some(priority);
                rest = after;
            }
        }
    }

    if task.priority.is_none() {
        // An inline `pri:X` token sets the priority but stays in the text,
        // where it is kept as a `pri` tag
        task.priority = inline_priority(rest);
    }

    let mut words = Vec::new();
    for token in rest.split_whitespace() {
        if let Some(dependency) = token.strip_prefix('+') {
            task.dependencies.push(dependency.to_string());
        } else if let Some(context) = token.strip_prefix('@') {
            task.contexts.push(context.to_string());
        } else if let Some((key, value)) = token.split_once(':') {
            task.insert_tag(key, value);
        } else {
            words.push(token);
        }
    }
    task.description = words.join(" ");

    task
}

/// `x` followed by whitespace, or a line that is just `x`
fn strip_completion_marker(s: &str) -> Option<&str> {
    let after = s.strip_prefix('x')?;
    (after.is_empty() || after.starts_with(char::is_whitespace)).then(|| after.trim_start())
}

/// `(X)` with an uppercase letter
fn strip_priority(s: &str) -> Option<(Priority, &str)> {
    match s.as_bytes() {
        [b'(', letter, b')', ..] if letter.is_ascii_uppercase() => {
            let priority = Priority::from_letter(*letter as char).ok()?;
            Some((priority, s[3..].trim_start()))
        }
        _ => None,
    }
}

fn inline_priority(s: &str) -> Option<Priority> {
    let value = s.split_whitespace().find_map(|token| token.strip_prefix("pri:"))?;
    let letter = value.chars().next().filter(char::is_ascii_alphabetic)?;
    Priority::from_letter(letter).ok()
}

/// A leading ISO date or date-time token
fn strip_date(s: &str) -> Option<(TaskDate, &str)> {
    let first = s.split_whitespace().next()?;
    let date = TaskDate::try_parse(first)?;
    Some((date, s[first.len()..].trim_start()))
}

#[derive(Debug, Clone, Copy)]
enum Role {
    /// Marker, priority and description: colored by priority
    Text,
    CreationDate,
    Due,
    Dependency,
    Context,
    Recurrence,
    Tag,
}

struct Painter {
    enabled: bool,
    priority: Option<Priority>,
}

impl Painter {
    fn paint(&self, text: String, role: Role) -> String {
        if !self.enabled {
            return text;
        }
        let color = match role {
            Role::Text => self.priority.and_then(priority_color),
            Role::CreationDate => Some(Color::DarkGrey),
            Role::Due | Role::Recurrence => Some(Color::Blue),
            Role::Dependency => Some(Color::Magenta),
            Role::Context => Some(Color::Cyan),
            Role::Tag => Some(Color::White),
        };
        match color {
            Some(color) => text.with(color).to_string(),
            None => text,
        }
    }
}

fn priority_color(priority: Priority) -> Option<Color> {
    match priority.letter() {
        'A' => Some(Color::Red),
        'B' => Some(Color::Yellow),
        'C' => Some(Color::Green),
        'D' => Some(Color::Blue),
        _ => None,
    }
}

fn single_line(text: &str) -> String {
    text.replace(['\n', '\r'], " ")
}

/// Encodes a task as a single line
///
/// Empty fields are left out, except in [`LineFormat::Checkbox`], which
/// always writes the checkbox and a three-character priority column.
pub fn encode_line(task: &Task, options: &RenderOptions) -> String {
    let painter = Painter {
        enabled: options.color && !task.completed,
        priority: task.priority,
    };
    let mut parts: Vec<String> = Vec::new();

    match options.format {
        LineFormat::Compact => {
            if task.completed {
                parts.push(painter.paint("x".to_string(), Role::Text));
            }
            if let Some(created) = task.creation_date {
                parts.push(painter.paint(created.to_string(), Role::CreationDate));
            }
            if let Some(priority) = task.priority {
                parts.push(painter.paint(format!("({priority})"), Role::Text));
            }
        }
        LineFormat::Checkbox => {
            let checkbox = if task.completed { "[x]" } else { "[ ]" };
            parts.push(painter.paint(checkbox.to_string(), Role::Text));
            let priority = task
                .priority
                .map_or_else(|| "   ".to_string(), |p| format!("({p})"));
            parts.push(painter.paint(priority, Role::Text));
        }
    }

    if !task.description.is_empty() {
        parts.push(painter.paint(single_line(&task.description), Role::Text));
    }
    if let Some(due) = task.due_date {
        parts.push(painter.paint(format!("due:{due}"), Role::Due));
    }
    for dependency in &task.dependencies {
        parts.push(painter.paint(format!("+{}", single_line(dependency)), Role::Dependency));
    }
    for context in &task.contexts {
        parts.push(painter.paint(format!("@{}", single_line(context)), Role::Context));
    }
    for (key, value) in task.all_tags() {
        let role = if key == RECURRENCE_KEY { Role::Recurrence } else { Role::Tag };
        parts.push(painter.paint(single_line(&format!("{key}:{value}")), role));
    }

    let line = parts.join(" ");
    if options.color && task.completed {
        line.dark_grey().crossed_out().to_string()
    } else {
        line
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_line(self, &RenderOptions::plain()))
    }
}

impl FromStr for Task {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(decode_line(s))
    }
}
