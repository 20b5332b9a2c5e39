//! History reconstruction from change records.
//!
//! Records that share a save (same timestamp, same actor) are folded back
//! into one `ChangeGroup` so history reads as "who changed what, when".
//! Grouping is adjacency-based over the input order: a group ends as soon
//! as the next record carries a different timestamp or actor, and a later
//! record with a matching key starts a fresh group rather than rejoining
//! an earlier one. On the ordering `ChangeLog::for_task` guarantees, the
//! records of one save are always contiguous.
//!
//! The grouper is a lazy single-pass iterator. It never buffers more than
//! the group under construction, so a caller can stop early without
//! paying for the rest of the log.

use std::iter::Peekable;
use std::vec;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::change::{ChangeField, ChangeLog, ChangeRecord, FieldDelta};
use crate::error::Result;

/// One save as seen in history: its field deltas plus the comment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeGroup {
    pub actor: String,
    pub created_at: DateTime<Utc>,
    pub fields: Vec<FieldDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ChangeGroup {
    fn start(record: ChangeRecord) -> Self {
        let mut group = ChangeGroup {
            actor: record.actor.clone(),
            created_at: record.created_at,
            fields: Vec::new(),
            comment: None,
        };
        group.absorb(record);
        group
    }

    fn absorb(&mut self, record: ChangeRecord) {
        match record.field {
            ChangeField::Comment => self.comment = record.new_value,
            field => self.fields.push(FieldDelta {
                field,
                old: record.old_value,
                new: record.new_value,
            }),
        }
    }
}

/// Lazy iterator folding adjacent same-save records into groups
#[derive(Debug)]
pub struct GroupedChanges<I: Iterator<Item = ChangeRecord>> {
    records: Peekable<I>,
}

impl<I: Iterator<Item = ChangeRecord>> Iterator for GroupedChanges<I> {
    type Item = ChangeGroup;

    fn next(&mut self) -> Option<ChangeGroup> {
        let mut group = ChangeGroup::start(self.records.next()?);
        while let Some(record) = self
            .records
            .next_if(|r| r.created_at == group.created_at && r.actor == group.actor)
        {
            group.absorb(record);
        }
        Some(group)
    }
}

/// Group an already-ordered record stream
pub fn group_changes<I>(records: I) -> GroupedChanges<I::IntoIter>
where
    I: IntoIterator<Item = ChangeRecord>,
{
    GroupedChanges {
        records: records.into_iter().peekable(),
    }
}

/// A task's history, oldest save first
///
/// Reading the log again restarts the iteration from the beginning.
pub fn grouped_history(
    log: &ChangeLog,
    task_id: &str,
) -> Result<GroupedChanges<vec::IntoIter<ChangeRecord>>> {
    Ok(group_changes(log.for_task(task_id)?))
}
