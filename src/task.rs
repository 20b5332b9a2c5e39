//! Task entities and current-state storage.
//!
//! The task registry holds current state only. History is derived from
//! the change log and never read back into the registry; at any instant a
//! tracked field has exactly one current value here.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ids;
use crate::milestone::MilestoneStore;
use crate::storage::Storage;
use crate::workflow::{TaskKind, TaskPriority, TaskStatus};

const TASK_ID_PREFIX: &str = "tsk";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    /// Planned duration in days
    pub duration: i64,
    pub milestone_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Snapshot of the tracked-field values, used as a diff baseline
    pub fn tracked_fields(&self) -> TrackedFields {
        TrackedFields {
            name: self.name.clone(),
            description: self.description.clone(),
            status: self.status,
            priority: self.priority,
            kind: self.kind,
            duration: self.duration,
            milestone_id: self.milestone_id.clone(),
        }
    }

    /// Overwrite the tracked fields with new values
    pub fn apply_fields(&mut self, fields: &TrackedFields) {
        self.name = fields.name.clone();
        self.description = fields.description.clone();
        self.status = fields.status;
        self.priority = fields.priority;
        self.kind = fields.kind;
        self.duration = fields.duration;
        self.milestone_id = fields.milestone_id.clone();
    }
}

/// The complete set of tracked-field values for one task
///
/// Every tracked field is present; a partial patch is not representable.
/// Callers that want patch semantics start from a task's current snapshot
/// and overwrite individual fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedFields {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub duration: i64,
    pub milestone_id: String,
}

impl TrackedFields {
    /// Input-shape validation; reference checks live with the stores
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("task name cannot be empty".to_string()));
        }
        if self.duration < 0 {
            return Err(Error::Validation(
                "task duration must be >= 0 days".to_string(),
            ));
        }
        Ok(())
    }
}

/// Registry of all tasks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRegistry {
    pub tasks: Vec<Task>,
}

/// Inputs for creating a task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    /// Milestone id or unambiguous prefix
    pub milestone: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub kind: TaskKind,
    pub duration: i64,
}

/// Filters for `TaskStore::list`
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Keep tasks whose milestone is any of these (full ids)
    pub milestones: Option<Vec<String>>,
    pub status: Option<TaskStatus>,
    /// `Some(true)` keeps done tasks, `Some(false)` open ones
    pub done: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct TaskStore {
    storage: Storage,
}

impl TaskStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Create a task under a milestone
    ///
    /// Creation is a system save: the task appears in the registry with
    /// its initial values and no change records are written.
    pub fn create(&self, new: NewTask) -> Result<Task> {
        let milestone_id = MilestoneStore::new(self.storage.clone()).resolve_id(&new.milestone)?;

        let fields = TrackedFields {
            name: new.name.trim().to_string(),
            description: new.description,
            status: new.status,
            priority: new.priority,
            kind: new.kind,
            duration: new.duration,
            milestone_id,
        };
        fields.validate()?;

        self.storage
            .update_registry(&self.storage.tasks_file(), |registry: &mut TaskRegistry| {
                let existing: HashSet<String> =
                    registry.tasks.iter().map(|t| t.id.clone()).collect();
                let now = Utc::now();
                let mut task = Task {
                    id: ids::generate_id(TASK_ID_PREFIX, &existing),
                    name: String::new(),
                    description: String::new(),
                    status: TaskStatus::default(),
                    priority: TaskPriority::default(),
                    kind: TaskKind::default(),
                    duration: 0,
                    milestone_id: String::new(),
                    created_at: now,
                    updated_at: now,
                };
                task.apply_fields(&fields);
                registry.tasks.push(task.clone());
                Ok(task)
            })
    }

    /// Look up a task by id or unambiguous prefix
    pub fn get(&self, id: &str) -> Result<Task> {
        let resolved = self.resolve_id(id)?;
        let registry: TaskRegistry = self.storage.read_registry(&self.storage.tasks_file())?;
        registry
            .tasks
            .into_iter()
            .find(|task| task.id == resolved)
            .ok_or_else(|| Error::TaskNotFound(resolved))
    }

    /// Resolve user input to a full task id
    pub fn resolve_id(&self, input: &str) -> Result<String> {
        let registry: TaskRegistry = self.storage.read_registry(&self.storage.tasks_file())?;
        let stored: Vec<String> = registry.tasks.iter().map(|t| t.id.clone()).collect();
        ids::try_resolve(input, &stored)?
            .ok_or_else(|| Error::TaskNotFound(input.trim().to_string()))
    }

    /// Check whether an exact task id exists
    pub fn exists(&self, id: &str) -> Result<bool> {
        let registry: TaskRegistry = self.storage.read_registry(&self.storage.tasks_file())?;
        Ok(registry.tasks.iter().any(|task| task.id == id))
    }

    /// List tasks matching the filter, ascending by creation
    pub fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let registry: TaskRegistry = self.storage.read_registry(&self.storage.tasks_file())?;
        let mut tasks = registry.tasks;

        if let Some(milestones) = &filter.milestones {
            tasks.retain(|task| milestones.iter().any(|id| *id == task.milestone_id));
        }
        if let Some(status) = filter.status {
            tasks.retain(|task| task.status == status);
        }
        if let Some(done) = filter.done {
            tasks.retain(|task| task.status.is_done() == done);
        }

        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(tasks)
    }

    /// Write a task's current state back to the registry
    ///
    /// Fails with `TaskNotFound` when the task was removed between the
    /// caller's read and this write (stale read).
    pub fn save(&self, task: &Task) -> Result<()> {
        let task = task.clone();
        self.storage
            .update_registry(&self.storage.tasks_file(), |registry: &mut TaskRegistry| {
                let slot = registry
                    .tasks
                    .iter_mut()
                    .find(|stored| stored.id == task.id)
                    .ok_or_else(|| Error::TaskNotFound(task.id.clone()))?;
                *slot = task;
                Ok(())
            })
    }

    /// Remove a task from the registry
    ///
    /// Change records for the task are left in place as orphaned audit
    /// data; removal never cascades into the change log.
    pub fn remove(&self, id: &str) -> Result<Task> {
        let resolved = self.resolve_id(id)?;
        self.storage
            .update_registry(&self.storage.tasks_file(), |registry: &mut TaskRegistry| {
                let idx = registry
                    .tasks
                    .iter()
                    .position(|task| task.id == resolved)
                    .ok_or_else(|| Error::TaskNotFound(resolved.clone()))?;
                Ok(registry.tasks.remove(idx))
            })
    }
}
