//! Nudges: lightweight "please look at this" pokes on a task.
//!
//! Nudges live outside the change log. They are not field changes and
//! never show up in task history; they get their own append-only file at
//! `.trk/nudges.jsonl`, shared across tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lock::{FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::storage::Storage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNudge {
    pub task_id: String,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NudgeLog {
    storage: Storage,
}

impl NudgeLog {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Record a nudge; nudging is always attributed, so an actor is required
    pub fn nudge(&self, task_id: &str, actor: &str) -> Result<TaskNudge> {
        let actor = actor.trim();
        if actor.is_empty() {
            return Err(Error::Validation("a nudge requires an actor".to_string()));
        }

        let nudge = TaskNudge {
            task_id: task_id.to_string(),
            actor: actor.to_string(),
            created_at: Utc::now(),
        };

        let path = self.storage.nudges_file();
        let lock_path = path.with_extension("jsonl.lock");
        let _lock = FileLock::acquire(&lock_path, DEFAULT_LOCK_TIMEOUT_MS)?;
        self.storage.append_jsonl(&path, &nudge)?;

        tracing::debug!(task = %nudge.task_id, actor = %nudge.actor, "recorded nudge");
        Ok(nudge)
    }

    /// All nudges for a task, newest first
    pub fn for_task(&self, task_id: &str) -> Result<Vec<TaskNudge>> {
        let mut nudges: Vec<TaskNudge> = self
            .storage
            .read_jsonl(&self.storage.nudges_file())?
            .into_iter()
            .filter(|n: &TaskNudge| n.task_id == task_id)
            .collect();
        nudges.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(nudges)
    }
}
