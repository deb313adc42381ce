//! todotxt-cli - A todo.txt task manager
//!
//! Tasks live one per line in a plain-text todo.txt file. On top of the line
//! format this crate provides urgency ranking, recurring tasks and
//! reconciliation of two diverging copies of a list (deduplication, merge
//! with conflict reports, dependency cycle checks).

pub mod cli;
pub mod domain;
pub mod storage;

pub use domain::{MergeStrategy, Priority, Task, TaskDate, TaskList};
