//! trk task command implementations.

use std::path::PathBuf;

use crate::actor;
use crate::change::{ChangeLog, ChangeRecord, FieldDelta};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::history::{grouped_history, ChangeGroup};
use crate::milestone::MilestoneStore;
use crate::nudge::{NudgeLog, TaskNudge};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::recorder::ChangeRecorder;
use crate::storage::Storage;
use crate::task::{NewTask, Task, TaskFilter, TaskStore};
use crate::workflow::{TaskKind, TaskPriority, TaskStatus};

pub struct NewOptions {
    pub name: String,
    pub milestone: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub kind: Option<String>,
    pub duration: Option<i64>,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ShowOptions {
    pub id: String,
    pub history: bool,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub milestone: Option<String>,
    pub project: Option<String>,
    pub status: Option<String>,
    pub done: bool,
    pub open: bool,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct EditOptions {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub kind: Option<String>,
    pub duration: Option<i64>,
    pub milestone: Option<String>,
    pub comment: Option<String>,
    pub actor: Option<String>,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct CommentOptions {
    pub id: String,
    pub text: String,
    pub actor: Option<String>,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct HistoryOptions {
    pub id: String,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct NudgeOptions {
    pub id: String,
    pub actor: Option<String>,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct NudgesOptions {
    pub id: String,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct RmOptions {
    pub id: String,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct TaskDetail {
    #[serde(flatten)]
    task: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    history: Option<Vec<ChangeGroup>>,
}

#[derive(serde::Serialize)]
struct TaskListOutput {
    total: usize,
    tasks: Vec<Task>,
}

#[derive(serde::Serialize)]
struct TaskSaveOutput {
    task: Task,
    records: Vec<ChangeRecord>,
}

#[derive(serde::Serialize)]
struct TaskHistoryOutput {
    id: String,
    total: usize,
    groups: Vec<ChangeGroup>,
}

#[derive(serde::Serialize)]
struct TaskNudgeOutput {
    #[serde(flatten)]
    nudge: TaskNudge,
}

#[derive(serde::Serialize)]
struct TaskNudgesOutput {
    id: String,
    total: usize,
    nudges: Vec<TaskNudge>,
}

struct TaskContext {
    storage: Storage,
    tasks: TaskStore,
    actor: Option<String>,
}

fn load_context(dir: Option<PathBuf>, actor_name: Option<String>) -> Result<TaskContext> {
    let storage = super::open_tracker(dir.as_deref())?;
    let actor = actor::resolve_actor(&storage, actor_name.as_deref())?;
    Ok(TaskContext {
        tasks: TaskStore::new(storage.clone()),
        storage,
        actor,
    })
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let ctx = load_context(options.dir, None)?;
    let config = Config::load_from_dir(ctx.storage.root())?;

    let status: TaskStatus = match options.status.as_deref() {
        Some(value) => value.parse()?,
        None => config.tasks.default_status()?,
    };
    let priority: TaskPriority = match options.priority.as_deref() {
        Some(value) => value.parse()?,
        None => config.tasks.default_priority()?,
    };
    let kind: TaskKind = match options.kind.as_deref() {
        Some(value) => value.parse()?,
        None => config.tasks.default_kind()?,
    };
    let duration = options.duration.unwrap_or(config.tasks.default_duration);

    let task = ctx.tasks.create(NewTask {
        name: options.name,
        description: options.description.unwrap_or_default(),
        milestone: options.milestone,
        status,
        priority,
        kind,
        duration,
    })?;

    let mut human = HumanOutput::new("Task created");
    human.push_summary("ID", task.id.clone());
    human.push_summary("Name", task.name.clone());
    human.push_summary("Status", task.status.to_string());
    human.push_summary("Priority", task.priority.to_string());
    human.push_summary("Type", task.kind.to_string());
    human.push_summary("Duration", format!("{}d", task.duration));
    human.push_summary("Milestone", task.milestone_id.clone());
    human.push_next_step(format!("trk task edit {} --status research", task.id));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task new",
        &task,
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let ctx = load_context(options.dir, None)?;
    let task = ctx.tasks.get(&options.id)?;

    let history = if options.history {
        let log = ChangeLog::new(ctx.storage.clone());
        Some(grouped_history(&log, &task.id)?.collect::<Vec<_>>())
    } else {
        None
    };

    let mut human = HumanOutput::new(format!("Task {}", task.id));
    push_task_summary(&mut human, &task);
    if let Some(groups) = &history {
        for group in groups {
            human.push_detail(format_group(group));
        }
    }

    let detail = TaskDetail { task, history };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task show",
        &detail,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(options.dir, None)?;

    if options.milestone.is_some() && options.project.is_some() {
        return Err(Error::InvalidArgument(
            "use either --milestone or --project, not both".to_string(),
        ));
    }

    let milestones = if let Some(milestone) = options.milestone.as_deref() {
        Some(vec![MilestoneStore::new(ctx.storage.clone()).resolve_id(milestone)?])
    } else if let Some(project) = options.project.as_deref() {
        let ids = MilestoneStore::new(ctx.storage.clone())
            .list(Some(project))?
            .into_iter()
            .map(|m| m.id)
            .collect();
        Some(ids)
    } else {
        None
    };

    let status: Option<TaskStatus> = options.status.as_deref().map(str::parse).transpose()?;
    let done = if options.done {
        Some(true)
    } else if options.open {
        Some(false)
    } else {
        None
    };

    let tasks = ctx.tasks.list(&TaskFilter {
        milestones,
        status,
        done,
    })?;
    let output = TaskListOutput {
        total: tasks.len(),
        tasks,
    };

    let mut human = HumanOutput::new("Tasks");
    human.push_summary("Total", output.total.to_string());
    for task in &output.tasks {
        human.push_detail(format!(
            "{} [{}] {} ({}, {}d)",
            task.id, task.status, task.name, task.priority, task.duration
        ));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task list",
        &output,
        Some(&human),
    )
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let ctx = load_context(options.dir, options.actor)?;
    let task = ctx.tasks.get(&options.id)?;

    let mut proposed = task.tracked_fields();
    if let Some(name) = options.name {
        proposed.name = name;
    }
    if let Some(description) = options.description {
        proposed.description = description;
    }
    if let Some(status) = options.status.as_deref() {
        proposed.status = status.parse()?;
    }
    if let Some(priority) = options.priority.as_deref() {
        proposed.priority = priority.parse()?;
    }
    if let Some(kind) = options.kind.as_deref() {
        proposed.kind = kind.parse()?;
    }
    if let Some(duration) = options.duration {
        proposed.duration = duration;
    }
    if let Some(milestone) = options.milestone.as_deref() {
        proposed.milestone_id = MilestoneStore::new(ctx.storage.clone()).resolve_id(milestone)?;
    }

    let recorder = ChangeRecorder::new(ctx.storage.clone());
    let outcome = recorder.record_changes(
        &task,
        proposed,
        ctx.actor.as_deref(),
        options.comment.as_deref(),
    )?;

    let header = if outcome.is_silent() {
        "No task changes recorded"
    } else {
        "Task updated"
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("ID", outcome.task.id.clone());
    if ctx.actor.is_none() {
        human.push_warning("no actor set; this save was not recorded in history");
        human.push_next_step("trk actor set <name>");
    }
    for record in &outcome.records {
        human.push_detail(format_record(record));
    }
    human.push_next_step(format!("trk task history {}", outcome.task.id));

    let output = TaskSaveOutput {
        task: outcome.task,
        records: outcome.records,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task edit",
        &output,
        Some(&human),
    )
}

pub fn run_comment(options: CommentOptions) -> Result<()> {
    let ctx = load_context(options.dir, options.actor)?;
    let task = ctx.tasks.get(&options.id)?;

    let text = options.text.trim();
    if text.is_empty() {
        return Err(Error::InvalidArgument(
            "comment cannot be empty".to_string(),
        ));
    }
    let actor_name = ctx.actor.as_deref().ok_or_else(|| {
        Error::InvalidArgument("comment requires an actor (trk actor set <name>)".to_string())
    })?;

    let recorder = ChangeRecorder::new(ctx.storage.clone());
    let outcome = recorder.record_changes(&task, task.tracked_fields(), Some(actor_name), Some(text))?;

    let mut human = HumanOutput::new("Comment added");
    human.push_summary("ID", outcome.task.id.clone());
    human.push_summary("Actor", actor_name.to_string());
    human.push_summary("Comment", text.to_string());
    human.push_next_step(format!("trk task history {}", outcome.task.id));

    let output = TaskSaveOutput {
        task: outcome.task,
        records: outcome.records,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task comment",
        &output,
        Some(&human),
    )
}

pub fn run_history(options: HistoryOptions) -> Result<()> {
    let ctx = load_context(options.dir, None)?;

    // A removed task keeps its change file; accept the exact id when the
    // registry no longer knows it.
    let resolved = match ctx.tasks.resolve_id(&options.id) {
        Ok(resolved) => resolved,
        Err(Error::TaskNotFound(_))
            if ctx.storage.changes_file(options.id.trim()).exists() =>
        {
            options.id.trim().to_string()
        }
        Err(err) => return Err(err),
    };

    let log = ChangeLog::new(ctx.storage.clone());
    let groups: Vec<ChangeGroup> = grouped_history(&log, &resolved)?.collect();

    let mut human = HumanOutput::new(format!("History for {resolved}"));
    human.push_summary("Saves", groups.len().to_string());
    for group in &groups {
        human.push_detail(format_group(group));
    }

    let output = TaskHistoryOutput {
        id: resolved,
        total: groups.len(),
        groups,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task history",
        &output,
        Some(&human),
    )
}

pub fn run_nudge(options: NudgeOptions) -> Result<()> {
    let ctx = load_context(options.dir, options.actor)?;
    let resolved = ctx.tasks.resolve_id(&options.id)?;

    let actor_name = ctx.actor.as_deref().ok_or_else(|| {
        Error::InvalidArgument("nudge requires an actor (trk actor set <name>)".to_string())
    })?;

    let nudge = NudgeLog::new(ctx.storage.clone()).nudge(&resolved, actor_name)?;

    let mut human = HumanOutput::new(format!("Nudged {resolved}"));
    human.push_summary("Actor", nudge.actor.clone());
    human.push_summary("At", nudge.created_at.to_rfc3339());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task nudge",
        &TaskNudgeOutput { nudge },
        Some(&human),
    )
}

pub fn run_nudges(options: NudgesOptions) -> Result<()> {
    let ctx = load_context(options.dir, None)?;
    let resolved = ctx.tasks.resolve_id(&options.id)?;

    let nudges = NudgeLog::new(ctx.storage.clone()).for_task(&resolved)?;

    let mut human = HumanOutput::new(format!("Nudges for {resolved}"));
    human.push_summary("Total", nudges.len().to_string());
    for nudge in &nudges {
        human.push_detail(format!(
            "[{}] {}",
            nudge.created_at.to_rfc3339(),
            nudge.actor
        ));
    }

    let output = TaskNudgesOutput {
        id: resolved,
        total: nudges.len(),
        nudges,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task nudges",
        &output,
        Some(&human),
    )
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let ctx = load_context(options.dir, None)?;
    let removed = ctx.tasks.remove(&options.id)?;

    let mut human = HumanOutput::new("Task removed");
    human.push_summary("ID", removed.id.clone());
    human.push_summary("Name", removed.name.clone());
    human.push_warning("change history for this task is kept");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task rm",
        &removed,
        Some(&human),
    )
}

fn push_task_summary(human: &mut HumanOutput, task: &Task) {
    human.push_summary("Name", task.name.clone());
    if !task.description.is_empty() {
        human.push_summary("Description", task.description.clone());
    }
    human.push_summary("Status", task.status.to_string());
    human.push_summary("Priority", task.priority.to_string());
    human.push_summary("Type", task.kind.to_string());
    human.push_summary("Duration", format!("{}d", task.duration));
    human.push_summary("Milestone", task.milestone_id.clone());
    human.push_summary("Created", task.created_at.to_rfc3339());
    human.push_summary("Updated", task.updated_at.to_rfc3339());
}

fn format_group(group: &ChangeGroup) -> String {
    let mut parts: Vec<String> = group.fields.iter().map(format_delta).collect();
    if let Some(comment) = &group.comment {
        parts.push(format!("comment \"{comment}\""));
    }
    format!(
        "[{}] {}: {}",
        group.created_at.to_rfc3339(),
        group.actor,
        parts.join(", ")
    )
}

fn format_record(record: &ChangeRecord) -> String {
    format_delta(&FieldDelta {
        field: record.field,
        old: record.old_value.clone(),
        new: record.new_value.clone(),
    })
}

fn format_delta(delta: &FieldDelta) -> String {
    match (&delta.old, &delta.new) {
        (Some(old), Some(new)) => format!("{} {} -> {}", delta.field.label(), old, new),
        (None, Some(new)) => format!("{} set to {}", delta.field.label(), new),
        (Some(old), None) => format!("{} cleared (was {})", delta.field.label(), old),
        (None, None) => delta.field.label().to_string(),
    }
}
