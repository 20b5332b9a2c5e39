//! The append-only change log.
//!
//! Every field-level task change is one immutable `ChangeRecord`, stored
//! as a line in `.trk/changes/<task-id>.jsonl`. Records are assigned a
//! monotonically increasing id (`seq`) at append time from a shared
//! counter; `for_task` returns records ascending by creation timestamp
//! with `seq` as the tie-break, which is the only ordering the history
//! grouper relies on.
//!
//! Records are never rewritten or deleted. Removing a task leaves its log
//! file in place.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lock::{FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::storage::Storage;

/// Identifier assigned to a change record at append time
pub type RecordId = u64;

/// The field a change record refers to
///
/// `Comment` is a pseudo-field: it never exists on the task itself and
/// only carries the free-text annotation attached to a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeField {
    Name,
    Description,
    Status,
    Priority,
    Type,
    Duration,
    Milestone,
    Comment,
}

impl ChangeField {
    /// Stable string code used for storage
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeField::Name => "name",
            ChangeField::Description => "description",
            ChangeField::Status => "status",
            ChangeField::Priority => "priority",
            ChangeField::Type => "type",
            ChangeField::Duration => "duration",
            ChangeField::Milestone => "milestone",
            ChangeField::Comment => "comment",
        }
    }

    /// Human-readable label for history output
    pub fn label(&self) -> &'static str {
        match self {
            ChangeField::Name => "Name",
            ChangeField::Description => "Description",
            ChangeField::Status => "Status",
            ChangeField::Priority => "Priority",
            ChangeField::Type => "Type",
            ChangeField::Duration => "Duration",
            ChangeField::Milestone => "Milestone",
            ChangeField::Comment => "Comment",
        }
    }
}

impl fmt::Display for ChangeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable field-level change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub seq: RecordId,
    pub task_id: String,
    pub actor: String,
    pub field: ChangeField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A change record before the log has assigned its id
#[derive(Debug, Clone, PartialEq)]
pub struct NewChangeRecord {
    pub task_id: String,
    pub actor: String,
    pub field: ChangeField,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One field's before/after values within a save
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDelta {
    pub field: ChangeField,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// Append-only store of change records, keyed by task
#[derive(Debug, Clone)]
pub struct ChangeLog {
    storage: Storage,
}

impl ChangeLog {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Append one record, assigning the next record id
    pub fn append(&self, record: NewChangeRecord) -> Result<ChangeRecord> {
        let mut stored = self.append_all(vec![record])?;
        stored
            .pop()
            .ok_or_else(|| Error::Storage("change log append returned no record".to_string()))
    }

    /// Append one save's records, assigning consecutive record ids
    ///
    /// All records are written under a single lock acquisition so their
    /// ids are contiguous, but there is no transaction: a crash mid-way
    /// leaves the records written so far in the log.
    pub fn append_all(&self, records: Vec<NewChangeRecord>) -> Result<Vec<ChangeRecord>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let lock_path = self.storage.changes_dir().join("log.lock");
        let _lock = FileLock::acquire(&lock_path, DEFAULT_LOCK_TIMEOUT_MS)?;

        let first = self.allocate_ids(records.len() as u64)?;

        let mut stored = Vec::with_capacity(records.len());
        for (offset, record) in records.into_iter().enumerate() {
            let record = ChangeRecord {
                seq: first + offset as u64,
                task_id: record.task_id,
                actor: record.actor,
                field: record.field,
                old_value: record.old_value,
                new_value: record.new_value,
                created_at: record.created_at,
            };
            let path = self.storage.changes_file(&record.task_id);
            self.storage.append_jsonl(&path, &record)?;
            stored.push(record);
        }

        tracing::debug!(
            count = stored.len(),
            first_id = first,
            "appended change records"
        );
        Ok(stored)
    }

    /// All records for a task, ascending by creation then insertion order
    ///
    /// Works for any task id, including removed tasks whose records were
    /// left behind.
    pub fn for_task(&self, task_id: &str) -> Result<Vec<ChangeRecord>> {
        let path = self.storage.changes_file(task_id);
        let mut records: Vec<ChangeRecord> = self.storage.read_jsonl(&path)?;
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.seq.cmp(&b.seq))
        });
        Ok(records)
    }

    /// Reserve `count` consecutive record ids; caller holds the log lock
    fn allocate_ids(&self, count: u64) -> Result<RecordId> {
        let path = self.storage.changes_seq_file();
        let next: RecordId = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            raw.trim().parse().map_err(|_| {
                Error::Storage(format!("change log id counter is corrupt: {:?}", raw.trim()))
            })?
        } else {
            1
        };

        crate::lock::write_atomic_str(&path, &(next + count).to_string())?;
        Ok(next)
    }
}
