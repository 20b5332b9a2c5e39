//! trk project command implementations.

use std::path::PathBuf;

use crate::error::Result;
use crate::milestone::{Milestone, MilestoneStore};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::project::{NewProject, Project, ProjectStore};

pub struct NewOptions {
    pub name: String,
    pub company: String,
    pub description: Option<String>,
    pub managers: Vec<String>,
    pub people: Vec<String>,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub company: Option<String>,
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
struct ProjectListOutput {
    total: usize,
    projects: Vec<Project>,
}

#[derive(serde::Serialize)]
struct ProjectDetail {
    #[serde(flatten)]
    project: Project,
    milestones: Vec<Milestone>,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let storage = super::open_tracker(options.dir.as_deref())?;
    let project = ProjectStore::new(storage).create(NewProject {
        name: options.name,
        description: options.description,
        company: options.company,
        managers: options.managers,
        people: options.people,
    })?;

    let mut human = HumanOutput::new("Project created");
    human.push_summary("ID", project.id.clone());
    human.push_summary("Name", project.name.clone());
    human.push_summary("Company", project.company_id.clone());
    if let Some(description) = project.description.as_ref() {
        human.push_summary("Description", description.clone());
    }
    if !project.managers.is_empty() {
        human.push_summary("Managers", project.managers.join(", "));
    }
    if !project.people.is_empty() {
        human.push_summary("People", project.people.join(", "));
    }
    human.push_next_step(format!("trk milestone new <name> --project {}", project.id));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "project new",
        &project,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let storage = super::open_tracker(options.dir.as_deref())?;
    let projects = ProjectStore::new(storage).list(options.company.as_deref())?;
    let output = ProjectListOutput {
        total: projects.len(),
        projects,
    };

    let mut human = HumanOutput::new("Projects");
    human.push_summary("Total", output.total.to_string());
    for project in &output.projects {
        human.push_detail(format!(
            "{} {} (company {})",
            project.id, project.name, project.company_id
        ));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "project list",
        &output,
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let storage = super::open_tracker(options.dir.as_deref())?;
    let project = ProjectStore::new(storage.clone()).get(&options.id)?;
    let milestones = MilestoneStore::new(storage).list(Some(&project.id))?;

    let mut human = HumanOutput::new(format!("Project {}", project.id));
    human.push_summary("Name", project.name.clone());
    human.push_summary("Company", project.company_id.clone());
    if let Some(description) = project.description.as_ref() {
        human.push_summary("Description", description.clone());
    }
    if !project.managers.is_empty() {
        human.push_summary("Managers", project.managers.join(", "));
    }
    if !project.people.is_empty() {
        human.push_summary("People", project.people.join(", "));
    }
    human.push_summary("Created", project.created_at.to_rfc3339());
    human.push_summary("Milestones", milestones.len().to_string());
    for milestone in &milestones {
        let due = milestone
            .due_date
            .map(|d| format!(" (due {d})"))
            .unwrap_or_default();
        human.push_detail(format!("{} {}{}", milestone.id, milestone.name, due));
    }

    let detail = ProjectDetail {
        project,
        milestones,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "project show",
        &detail,
        Some(&human),
    )
}
