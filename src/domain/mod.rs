//! Domain models for todo.txt lists
//!
//! Contains the core logic without any I/O concerns: the task record, the
//! line grammar, urgency ordering, recurrence and list reconciliation.

mod codec;
mod collection;
mod graph;
mod merge;
mod recurrence;
mod task;
mod urgency;

pub use codec::{decode_line, encode_line, LineFormat, RenderOptions};
pub use collection::{MergeConflict, MergeReport, OrphanDependency, TaskList};
pub use graph::{orphan_dependencies, DependencyGraph};
pub use merge::{merge_task, MergeStrategy, TaskConflicts};
pub use recurrence::{Interval, Recurrence};
pub use task::{Priority, Tags, Task, TaskDate, TaskError, TaskExport, RECURRENCE_KEY};
pub use urgency::{adjusted_due, compare, urgency_key, UrgencyKey};
