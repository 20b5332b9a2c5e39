//! trk company command implementations.

use std::path::PathBuf;

use crate::company::{Company, CompanyStore};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::project::{Project, ProjectStore};

pub struct NewOptions {
    pub name: String,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
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
struct CompanyListOutput {
    total: usize,
    companies: Vec<Company>,
}

#[derive(serde::Serialize)]
struct CompanyDetail {
    #[serde(flatten)]
    company: Company,
    projects: Vec<Project>,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let storage = super::open_tracker(options.dir.as_deref())?;
    let company = CompanyStore::new(storage).create(&options.name)?;

    let mut human = HumanOutput::new("Company created");
    human.push_summary("ID", company.id.clone());
    human.push_summary("Name", company.name.clone());
    human.push_next_step(format!("trk project new <name> --company {}", company.id));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "company new",
        &company,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let storage = super::open_tracker(options.dir.as_deref())?;
    let companies = CompanyStore::new(storage).list()?;
    let output = CompanyListOutput {
        total: companies.len(),
        companies,
    };

    let mut human = HumanOutput::new("Companies");
    human.push_summary("Total", output.total.to_string());
    for company in &output.companies {
        human.push_detail(format!("{} {}", company.id, company.name));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "company list",
        &output,
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let storage = super::open_tracker(options.dir.as_deref())?;
    let company = CompanyStore::new(storage.clone()).get(&options.id)?;
    let projects = ProjectStore::new(storage).list(Some(&company.id))?;

    let mut human = HumanOutput::new(format!("Company {}", company.id));
    human.push_summary("Name", company.name.clone());
    human.push_summary("Created", company.created_at.to_rfc3339());
    human.push_summary("Projects", projects.len().to_string());
    for project in &projects {
        human.push_detail(format!("{} {}", project.id, project.name));
    }

    let detail = CompanyDetail { company, projects };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "company show",
        &detail,
        Some(&human),
    )
}
