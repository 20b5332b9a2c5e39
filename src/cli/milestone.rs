//! trk milestone command implementations.

use std::path::PathBuf;

use crate::error::Result;
use crate::milestone::{parse_due_date, Milestone, MilestoneProgress, MilestoneStore};
use crate::output::{emit_success, HumanOutput, OutputOptions};

pub struct NewOptions {
    pub name: String,
    pub project: String,
    pub due: Option<String>,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub project: Option<String>,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ShowOptions {
    pub id: String,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct MilestoneListOutput {
    total: usize,
    milestones: Vec<Milestone>,
}

#[derive(serde::Serialize)]
struct MilestoneDetail {
    #[serde(flatten)]
    milestone: Milestone,
    progress: MilestoneProgress,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let storage = super::open_tracker(options.dir.as_deref())?;
    let due_date = options.due.as_deref().map(parse_due_date).transpose()?;
    let milestone = MilestoneStore::new(storage).create(&options.name, &options.project, due_date)?;

    let mut human = HumanOutput::new("Milestone created");
    human.push_summary("ID", milestone.id.clone());
    human.push_summary("Name", milestone.name.clone());
    human.push_summary("Project", milestone.project_id.clone());
    if let Some(due) = milestone.due_date {
        human.push_summary("Due", due.to_string());
    }
    human.push_next_step(format!("trk task new <name> --milestone {}", milestone.id));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "milestone new",
        &milestone,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let storage = super::open_tracker(options.dir.as_deref())?;
    let milestones = MilestoneStore::new(storage).list(options.project.as_deref())?;
    let output = MilestoneListOutput {
        total: milestones.len(),
        milestones,
    };

    let mut human = HumanOutput::new("Milestones");
    human.push_summary("Total", output.total.to_string());
    for milestone in &output.milestones {
        let due = milestone
            .due_date
            .map(|d| format!(" (due {d})"))
            .unwrap_or_default();
        human.push_detail(format!(
            "{} {}{} (project {})",
            milestone.id, milestone.name, due, milestone.project_id
        ));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "milestone list",
        &output,
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let storage = super::open_tracker(options.dir.as_deref())?;
    let store = MilestoneStore::new(storage);
    let milestone = store.get(&options.id)?;
    let progress = store.progress(&milestone.id)?;

    let mut human = HumanOutput::new(format!("Milestone {}", milestone.id));
    human.push_summary("Name", milestone.name.clone());
    human.push_summary("Project", milestone.project_id.clone());
    if let Some(due) = milestone.due_date {
        human.push_summary("Due", due.to_string());
    }
    human.push_summary("Created", milestone.created_at.to_rfc3339());
    human.push_summary(
        "Progress",
        format!("{}% ({}/{} done)", progress.percent, progress.done, progress.total),
    );

    let detail = MilestoneDetail {
        milestone,
        progress,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "milestone show",
        &detail,
        Some(&human),
    )
}
