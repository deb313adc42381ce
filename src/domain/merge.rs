//! Field-level merge of two copies of a task
//!
//! The receiving task ("ours") folds in an incoming copy ("theirs"). Scalar
//! fields follow one rule: an empty value on our side adopts theirs, two
//! different non-empty values are a conflict. Conflicts keep our value
//! unless the strategy asks for a hard merge that prefers the other side.
//!
//! Empty means absent for optional fields, `""` for text and `false` for the
//! completion flag. A priority of `A` (0) is present.
//!
//! Contexts and dependencies are set-unioned without conflict tracking; tags
//! are merged per key with the scalar rule.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::task::{Task, ID_KEY, RECURRENCE_KEY};

/// How conflicting values are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStrategy {
    /// Allow conflicting values to be overwritten
    pub hard: bool,
    /// On conflict, keep the receiver's value even in a hard merge
    pub self_priority: bool,
}

impl Default for MergeStrategy {
    fn default() -> Self {
        Self {
            hard: false,
            self_priority: true,
        }
    }
}

impl MergeStrategy {
    /// True when conflicting values are replaced by the incoming ones
    pub fn overwrites(&self) -> bool {
        self.hard && !self.self_priority
    }
}

/// Which fields disagreed during a merge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskConflicts {
    pub priority: bool,
    pub description: bool,
    pub completed: bool,
    pub due_date: bool,
    pub creation_date: bool,
    /// One flag per tag key present on both sides
    pub tags: IndexMap<String, bool>,
}

impl TaskConflicts {
    pub fn has_conflicts(&self) -> bool {
        !self.fields().is_empty()
    }

    /// Names of the conflicting fields, tags as `tags.<key>`
    pub fn fields(&self) -> Vec<String> {
        let scalars = [
            ("priority", self.priority),
            ("description", self.description),
            ("completed", self.completed),
            ("due_date", self.due_date),
            ("creation_date", self.creation_date),
        ];
        scalars
            .into_iter()
            .filter(|(_, conflict)| *conflict)
            .map(|(name, _)| name.to_string())
            .chain(
                self.tags
                    .iter()
                    .filter(|(_, conflict)| **conflict)
                    .map(|(key, _)| format!("tags.{key}")),
            )
            .collect()
    }
}

/// Values that can be empty for merge purposes
trait Blank {
    fn is_blank(&self) -> bool;
}

impl<T> Blank for Option<T> {
    fn is_blank(&self) -> bool {
        self.is_none()
    }
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Blank for bool {
    fn is_blank(&self) -> bool {
        !*self
    }
}

/// Applies the scalar rule to one field, returning true on conflict
fn merge_field<T: Blank + Clone + PartialEq>(ours: &mut T, theirs: &T, overwrite: bool) -> bool {
    if theirs.is_blank() || ours == theirs {
        return false;
    }
    if ours.is_blank() {
        *ours = theirs.clone();
        return false;
    }
    if overwrite {
        *ours = theirs.clone();
    }
    true
}

/// Merges a dedicated tag field; `None` when the key is not on both sides
fn merge_reserved_tag(
    ours: &mut Option<String>,
    theirs: &Option<String>,
    overwrite: bool,
) -> Option<bool> {
    match (ours.as_mut(), theirs) {
        (Some(ours), Some(theirs)) => Some(merge_field(ours, theirs, overwrite)),
        (None, Some(theirs)) => {
            *ours = Some(theirs.clone());
            None
        }
        _ => None,
    }
}

fn union_into(ours: &mut Vec<String>, theirs: &[String]) {
    for value in theirs {
        if !ours.contains(value) {
            ours.push(value.clone());
        }
    }
}

/// Folds `theirs` into `ours` and reports the fields that disagreed
pub fn merge_task(ours: &mut Task, theirs: &Task, strategy: MergeStrategy) -> TaskConflicts {
    let overwrite = strategy.overwrites();
    let mut conflicts = TaskConflicts::default();

    macro_rules! merge_scalar {
        ($field:ident) => {
            conflicts.$field = merge_field(&mut ours.$field, &theirs.$field, overwrite);
        };
    }

    merge_scalar!(priority);
    merge_scalar!(description);
    merge_scalar!(completed);
    merge_scalar!(due_date);
    merge_scalar!(creation_date);

    union_into(&mut ours.contexts, &theirs.contexts);
    union_into(&mut ours.dependencies, &theirs.dependencies);

    if let Some(conflict) = merge_reserved_tag(&mut ours.id, &theirs.id, overwrite) {
        conflicts.tags.insert(ID_KEY.to_string(), conflict);
    }
    for (key, value) in theirs.tags.iter() {
        match ours.tags.get_mut(key) {
            Some(existing) => {
                let conflict = merge_field(existing, &value.to_string(), overwrite);
                conflicts.tags.insert(key.to_string(), conflict);
            }
            None => {
                ours.tags.insert(key, value);
            }
        }
    }
    if let Some(conflict) = merge_reserved_tag(&mut ours.recurrence, &theirs.recurrence, overwrite)
    {
        conflicts.tags.insert(RECURRENCE_KEY.to_string(), conflict);
    }

    conflicts
}

impl Task {
    /// Folds another copy of this task into it; see [`merge_task`]
    pub fn merge(&mut self, other: &Task, strategy: MergeStrategy) -> TaskConflicts {
        merge_task(self, other, strategy)
    }
}
