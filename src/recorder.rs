//! Change recording at task save time.
//!
//! A save compares the stored task (the baseline) against the proposed
//! field set and appends one `ChangeRecord` per field that actually
//! differs, all stamped with the same save timestamp and actor. A
//! non-empty comment always produces a record, whether or not any field
//! changed. Saves without an actor update the task but record nothing.
//!
//! There is no transaction across the change log and the task registry:
//! records are appended first, then the task is written. Concurrent
//! saves of the same task are last-write-wins on the registry while both
//! save's records remain in the log.

use chrono::{DateTime, Utc};

use crate::change::{ChangeField, ChangeLog, ChangeRecord, FieldDelta, NewChangeRecord};
use crate::error::{Error, Result};
use crate::milestone::MilestoneStore;
use crate::storage::Storage;
use crate::task::{Task, TaskStore, TrackedFields};

/// Result of one save: the updated task plus whatever was recorded
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub task: Task,
    pub records: Vec<ChangeRecord>,
    pub saved_at: DateTime<Utc>,
}

impl SaveOutcome {
    /// True when the save produced no change records
    pub fn is_silent(&self) -> bool {
        self.records.is_empty()
    }
}

/// Compare two complete field sets and report every field that differs
///
/// Pure: no clock, no storage. Deltas come out in a fixed field order so
/// the records of one save are stored deterministically.
pub fn diff_fields(baseline: &TrackedFields, proposed: &TrackedFields) -> Vec<FieldDelta> {
    let mut deltas = Vec::new();

    if baseline.name != proposed.name {
        deltas.push(FieldDelta {
            field: ChangeField::Name,
            old: text_value(&baseline.name),
            new: text_value(&proposed.name),
        });
    }
    if baseline.description != proposed.description {
        deltas.push(FieldDelta {
            field: ChangeField::Description,
            old: text_value(&baseline.description),
            new: text_value(&proposed.description),
        });
    }
    if baseline.status != proposed.status {
        deltas.push(FieldDelta {
            field: ChangeField::Status,
            old: Some(baseline.status.as_str().to_string()),
            new: Some(proposed.status.as_str().to_string()),
        });
    }
    if baseline.priority != proposed.priority {
        deltas.push(FieldDelta {
            field: ChangeField::Priority,
            old: Some(baseline.priority.as_str().to_string()),
            new: Some(proposed.priority.as_str().to_string()),
        });
    }
    if baseline.kind != proposed.kind {
        deltas.push(FieldDelta {
            field: ChangeField::Type,
            old: Some(baseline.kind.as_str().to_string()),
            new: Some(proposed.kind.as_str().to_string()),
        });
    }
    if baseline.duration != proposed.duration {
        deltas.push(FieldDelta {
            field: ChangeField::Duration,
            old: Some(baseline.duration.to_string()),
            new: Some(proposed.duration.to_string()),
        });
    }
    if baseline.milestone_id != proposed.milestone_id {
        deltas.push(FieldDelta {
            field: ChangeField::Milestone,
            old: text_value(&baseline.milestone_id),
            new: text_value(&proposed.milestone_id),
        });
    }

    deltas
}

/// Empty text stores as an absent value
fn text_value(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Applies proposed fields to a task and records what changed
#[derive(Debug, Clone)]
pub struct ChangeRecorder {
    tasks: TaskStore,
    milestones: MilestoneStore,
    log: ChangeLog,
}

impl ChangeRecorder {
    pub fn new(storage: Storage) -> Self {
        Self {
            tasks: TaskStore::new(storage.clone()),
            milestones: MilestoneStore::new(storage.clone()),
            log: ChangeLog::new(storage),
        }
    }

    /// Save `proposed` over `baseline`, recording field-level changes
    ///
    /// `proposed.milestone_id` must be a full id; prefix resolution is the
    /// caller's job. Validation runs before anything is written. The task
    /// is saved even when no field differs, so `updated_at` always
    /// reflects the save. With no actor the save is a system save: the
    /// task is updated and nothing is recorded.
    pub fn record_changes(
        &self,
        baseline: &Task,
        proposed: TrackedFields,
        actor: Option<&str>,
        comment: Option<&str>,
    ) -> Result<SaveOutcome> {
        proposed.validate()?;
        if !self.milestones.exists(&proposed.milestone_id)? {
            return Err(Error::MilestoneNotFound(proposed.milestone_id.clone()));
        }

        let saved_at = Utc::now();
        let actor = actor.map(str::trim).filter(|a| !a.is_empty());
        let comment = comment.map(str::trim).filter(|c| !c.is_empty());

        let records = match actor {
            Some(actor) => {
                let mut pending: Vec<NewChangeRecord> =
                    diff_fields(&baseline.tracked_fields(), &proposed)
                        .into_iter()
                        .map(|delta| NewChangeRecord {
                            task_id: baseline.id.clone(),
                            actor: actor.to_string(),
                            field: delta.field,
                            old_value: delta.old,
                            new_value: delta.new,
                            created_at: saved_at,
                        })
                        .collect();
                if let Some(comment) = comment {
                    pending.push(NewChangeRecord {
                        task_id: baseline.id.clone(),
                        actor: actor.to_string(),
                        field: ChangeField::Comment,
                        old_value: None,
                        new_value: Some(comment.to_string()),
                        created_at: saved_at,
                    });
                }
                self.log.append_all(pending)?
            }
            None => {
                tracing::debug!(task = %baseline.id, "system save, skipping change records");
                Vec::new()
            }
        };

        let mut task = baseline.clone();
        task.apply_fields(&proposed);
        task.updated_at = saved_at;
        self.tasks.save(&task)?;

        tracing::debug!(
            task = %task.id,
            records = records.len(),
            "saved task"
        );
        Ok(SaveOutcome {
            task,
            records,
            saved_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::CompanyStore;
    use crate::project::{NewProject, ProjectStore};
    use crate::task::NewTask;
    use crate::workflow::{TaskKind, TaskPriority, TaskStatus};

    fn setup() -> (tempfile::TempDir, Storage, String) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Storage::new(dir.path().to_path_buf());
        storage.init().expect("init storage");
        let company = CompanyStore::new(storage.clone())
            .create("Acme")
            .expect("create company");
        let project = ProjectStore::new(storage.clone())
            .create(NewProject {
                name: "Apollo".to_string(),
                company: company.id,
                ..NewProject::default()
            })
            .expect("create project");
        let milestone = MilestoneStore::new(storage.clone())
            .create("Beta", &project.id, None)
            .expect("create milestone");
        (dir, storage, milestone.id)
    }

    fn make_task(storage: &Storage, milestone: &str, name: &str) -> Task {
        TaskStore::new(storage.clone())
            .create(NewTask {
                name: name.to_string(),
                description: String::new(),
                milestone: milestone.to_string(),
                status: TaskStatus::New,
                priority: TaskPriority::Normal,
                kind: TaskKind::Request,
                duration: 1,
            })
            .expect("create task")
    }

    #[test]
    fn diff_reports_only_differing_fields() {
        let (_dir, storage, milestone_id) = setup();
        let task = make_task(&storage, &milestone_id, "Ship login");

        let mut proposed = task.tracked_fields();
        proposed.status = TaskStatus::Research;
        proposed.duration = 3;

        let deltas = diff_fields(&task.tracked_fields(), &proposed);
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].field, ChangeField::Status);
        assert_eq!(deltas[0].old.as_deref(), Some("new"));
        assert_eq!(deltas[0].new.as_deref(), Some("research"));
        assert_eq!(deltas[1].field, ChangeField::Duration);
        assert_eq!(deltas[1].old.as_deref(), Some("1"));
        assert_eq!(deltas[1].new.as_deref(), Some("3"));
    }

    #[test]
    fn diff_of_identical_fields_is_empty() {
        let (_dir, storage, milestone_id) = setup();
        let task = make_task(&storage, &milestone_id, "Ship login");
        assert!(diff_fields(&task.tracked_fields(), &task.tracked_fields()).is_empty());
    }

    #[test]
    fn emptied_text_is_recorded_as_absent() {
        let (_dir, storage, milestone_id) = setup();
        let recorder = ChangeRecorder::new(storage.clone());

        let task = TaskStore::new(storage.clone())
            .create(NewTask {
                name: "Ship login".to_string(),
                description: "first pass".to_string(),
                milestone: milestone_id,
                status: TaskStatus::New,
                priority: TaskPriority::Normal,
                kind: TaskKind::Request,
                duration: 1,
            })
            .expect("create task");

        let mut proposed = task.tracked_fields();
        proposed.description = String::new();
        let outcome = recorder
            .record_changes(&task, proposed, Some("alice"), None)
            .expect("save");

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].field, ChangeField::Description);
        assert_eq!(outcome.records[0].old_value.as_deref(), Some("first pass"));
        assert_eq!(outcome.records[0].new_value, None);
    }

    #[test]
    fn records_of_one_save_share_timestamp_and_actor() {
        let (_dir, storage, milestone_id) = setup();
        let recorder = ChangeRecorder::new(storage.clone());
        let task = make_task(&storage, &milestone_id, "Ship login");

        let mut proposed = task.tracked_fields();
        proposed.status = TaskStatus::Research;
        proposed.priority = TaskPriority::High;
        let outcome = recorder
            .record_changes(&task, proposed, Some("alice"), Some("picked up"))
            .expect("save");

        assert_eq!(outcome.records.len(), 3);
        for record in &outcome.records {
            assert_eq!(record.created_at, outcome.saved_at);
            assert_eq!(record.actor, "alice");
        }
        assert_eq!(outcome.records[1].seq, outcome.records[0].seq + 1);
        assert_eq!(outcome.records[2].seq, outcome.records[1].seq + 1);
        assert_eq!(outcome.task.updated_at, outcome.saved_at);
    }

    #[test]
    fn comment_is_recorded_without_field_changes() {
        let (_dir, storage, milestone_id) = setup();
        let recorder = ChangeRecorder::new(storage.clone());
        let task = make_task(&storage, &milestone_id, "Ship login");

        let outcome = recorder
            .record_changes(
                &task,
                task.tracked_fields(),
                Some("alice"),
                Some("looks fine"),
            )
            .expect("save");

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].field, ChangeField::Comment);
        assert_eq!(outcome.records[0].old_value, None);
        assert_eq!(outcome.records[0].new_value.as_deref(), Some("looks fine"));
    }

    #[test]
    fn blank_comment_records_nothing() {
        let (_dir, storage, milestone_id) = setup();
        let recorder = ChangeRecorder::new(storage.clone());
        let task = make_task(&storage, &milestone_id, "Ship login");

        let outcome = recorder
            .record_changes(&task, task.tracked_fields(), Some("alice"), Some("   "))
            .expect("save");

        assert!(outcome.is_silent());
    }

    #[test]
    fn system_save_updates_task_without_records() {
        let (_dir, storage, milestone_id) = setup();
        let recorder = ChangeRecorder::new(storage.clone());
        let task = make_task(&storage, &milestone_id, "Ship login");

        let mut proposed = task.tracked_fields();
        proposed.status = TaskStatus::Closed;
        let outcome = recorder
            .record_changes(&task, proposed, None, Some("nobody sees this"))
            .expect("save");

        assert!(outcome.is_silent());
        assert_eq!(outcome.task.status, TaskStatus::Closed);
        assert!(ChangeLog::new(storage)
            .for_task(&outcome.task.id)
            .expect("read log")
            .is_empty());
    }

    #[test]
    fn whitespace_actor_is_a_system_save() {
        let (_dir, storage, milestone_id) = setup();
        let recorder = ChangeRecorder::new(storage.clone());
        let task = make_task(&storage, &milestone_id, "Ship login");

        let mut proposed = task.tracked_fields();
        proposed.status = TaskStatus::Research;
        let outcome = recorder
            .record_changes(&task, proposed, Some("  "), None)
            .expect("save");

        assert!(outcome.is_silent());
        assert_eq!(outcome.task.status, TaskStatus::Research);
    }

    #[test]
    fn invalid_fields_are_rejected_before_writing() {
        let (_dir, storage, milestone_id) = setup();
        let recorder = ChangeRecorder::new(storage.clone());
        let task = make_task(&storage, &milestone_id, "Ship login");

        let mut proposed = task.tracked_fields();
        proposed.name = String::new();
        let err = recorder
            .record_changes(&task, proposed, Some("alice"), None)
            .expect_err("empty name must fail");
        assert!(matches!(err, Error::Validation(_)));

        assert!(ChangeLog::new(storage.clone())
            .for_task(&task.id)
            .expect("read log")
            .is_empty());
        let stored = TaskStore::new(storage).get(&task.id).expect("reload");
        assert_eq!(stored.name, "Ship login");
    }

    #[test]
    fn unknown_milestone_is_rejected_before_writing() {
        let (_dir, storage, milestone_id) = setup();
        let recorder = ChangeRecorder::new(storage.clone());
        let task = make_task(&storage, &milestone_id, "Ship login");

        let mut proposed = task.tracked_fields();
        proposed.milestone_id = "mls-zzzzzzzz".to_string();
        let err = recorder
            .record_changes(&task, proposed, Some("alice"), None)
            .expect_err("unknown milestone must fail");
        assert!(matches!(err, Error::MilestoneNotFound(_)));

        assert!(ChangeLog::new(storage)
            .for_task(&task.id)
            .expect("read log")
            .is_empty());
    }

    #[test]
    fn milestone_change_records_both_ids() {
        let (_dir, storage, milestone_id) = setup();
        let recorder = ChangeRecorder::new(storage.clone());
        let task = make_task(&storage, &milestone_id, "Ship login");

        let project_id = ProjectStore::new(storage.clone())
            .list(None)
            .expect("list projects")[0]
            .id
            .clone();
        let other = MilestoneStore::new(storage.clone())
            .create("GA", &project_id, None)
            .expect("create milestone");

        let mut proposed = task.tracked_fields();
        proposed.milestone_id = other.id.clone();
        let outcome = recorder
            .record_changes(&task, proposed, Some("alice"), None)
            .expect("save");

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].field, ChangeField::Milestone);
        assert_eq!(
            outcome.records[0].old_value.as_deref(),
            Some(milestone_id.as_str())
        );
        assert_eq!(
            outcome.records[0].new_value.as_deref(),
            Some(other.id.as_str())
        );
    }

    #[test]
    fn save_of_identical_fields_records_nothing() {
        let (_dir, storage, milestone_id) = setup();
        let recorder = ChangeRecorder::new(storage.clone());
        let task = make_task(&storage, &milestone_id, "Ship login");

        let outcome = recorder
            .record_changes(&task, task.tracked_fields(), Some("alice"), None)
            .expect("save");

        assert!(outcome.is_silent());
        assert!(outcome.task.updated_at >= task.updated_at);
    }
}
