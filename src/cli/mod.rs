//! Command-line interface for trk
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule.

use std::path::Path;

use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::storage::Storage;

mod actor;
mod company;
mod init;
mod milestone;
mod project;
mod task;

/// trk - project and task tracking
///
/// A CLI tracker for companies, projects, milestones, and tasks, with a
/// field-level change history for every task.
#[derive(Parser, Debug)]
#[command(name = "trk")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the tracker root (defaults to current directory)
    #[arg(long, global = true, env = "TRK_DIR")]
    pub dir: Option<std::path::PathBuf>,

    /// Actor identity recorded on task changes
    #[arg(long, global = true, env = "TRK_ACTOR")]
    pub actor: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a tracker in the current directory
    Init,

    /// Set or show actor identity
    #[command(subcommand)]
    Actor(ActorCommands),

    /// Company management
    #[command(subcommand)]
    Company(CompanyCommands),

    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Milestone management
    #[command(subcommand)]
    Milestone(MilestoneCommands),

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),
}

/// Actor subcommands
#[derive(Subcommand, Debug)]
pub enum ActorCommands {
    /// Set actor identity
    Set {
        /// Actor name
        name: String,
    },

    /// Show current actor
    Show,
}

/// Company subcommands
#[derive(Subcommand, Debug)]
pub enum CompanyCommands {
    /// Create a company
    New {
        /// Company name
        name: String,
    },

    /// List companies
    List,

    /// Show one company
    Show {
        /// Company id or unambiguous prefix
        id: String,
    },
}

/// Project subcommands
#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a project under a company
    New {
        /// Project name
        name: String,

        /// Company id or unambiguous prefix
        #[arg(long)]
        company: String,

        /// Project description
        #[arg(long)]
        description: Option<String>,

        /// Manager name (repeatable)
        #[arg(long = "manager")]
        managers: Vec<String>,

        /// Member name (repeatable)
        #[arg(long = "person")]
        people: Vec<String>,
    },

    /// List projects
    List {
        /// Only projects of this company
        #[arg(long)]
        company: Option<String>,
    },

    /// Show one project
    Show {
        /// Project id or unambiguous prefix
        id: String,
    },
}

/// Milestone subcommands
#[derive(Subcommand, Debug)]
pub enum MilestoneCommands {
    /// Create a milestone under a project
    New {
        /// Milestone name
        name: String,

        /// Project id or unambiguous prefix
        #[arg(long)]
        project: String,

        /// Due date
        #[arg(long, value_name = "YYYY-MM-DD")]
        due: Option<String>,
    },

    /// List milestones
    List {
        /// Only milestones of this project
        #[arg(long)]
        project: Option<String>,
    },

    /// Show one milestone with its progress
    Show {
        /// Milestone id or unambiguous prefix
        id: String,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task under a milestone
    New {
        /// Task name
        name: String,

        /// Milestone id or unambiguous prefix
        #[arg(long)]
        milestone: String,

        /// Task description
        #[arg(long)]
        description: Option<String>,

        /// Status: new, research, process, review, accepted, resolved, closed
        #[arg(long)]
        status: Option<String>,

        /// Priority: urgent, high, normal, low
        #[arg(long)]
        priority: Option<String>,

        /// Type: request, bug
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<String>,

        /// Planned duration in days
        #[arg(long)]
        duration: Option<i64>,
    },

    /// Show one task
    Show {
        /// Task id or unambiguous prefix
        id: String,

        /// Include grouped change history
        #[arg(long)]
        history: bool,
    },

    /// List tasks
    List {
        /// Only tasks of this milestone
        #[arg(long)]
        milestone: Option<String>,

        /// Only tasks of this project (any of its milestones)
        #[arg(long)]
        project: Option<String>,

        /// Only tasks with this status
        #[arg(long)]
        status: Option<String>,

        /// Only resolved or closed tasks
        #[arg(long, conflicts_with = "open")]
        done: bool,

        /// Only tasks that are not resolved or closed
        #[arg(long)]
        open: bool,
    },

    /// Edit tracked fields, recording what changed
    Edit {
        /// Task id or unambiguous prefix
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description (empty string clears it)
        #[arg(long)]
        description: Option<String>,

        /// New status
        #[arg(long)]
        status: Option<String>,

        /// New priority
        #[arg(long)]
        priority: Option<String>,

        /// New type
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<String>,

        /// New duration in days
        #[arg(long)]
        duration: Option<i64>,

        /// Move to another milestone
        #[arg(long)]
        milestone: Option<String>,

        /// Comment to attach to this save
        #[arg(long)]
        comment: Option<String>,
    },

    /// Attach a comment to a task without changing fields
    Comment {
        /// Task id or unambiguous prefix
        id: String,

        /// Comment text
        text: String,
    },

    /// Show a task's grouped change history
    History {
        /// Task id or unambiguous prefix
        id: String,
    },

    /// Nudge a task
    Nudge {
        /// Task id or unambiguous prefix
        id: String,
    },

    /// List a task's nudges, newest first
    Nudges {
        /// Task id or unambiguous prefix
        id: String,
    },

    /// Remove a task (its change history is kept)
    Rm {
        /// Task id or unambiguous prefix
        id: String,
    },
}

/// Locate the tracker for a command, walking up from the start directory
pub(crate) fn open_tracker(dir: Option<&Path>) -> Result<Storage> {
    match dir {
        Some(dir) => Storage::discover(dir),
        None => Storage::discover(&std::env::current_dir()?),
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => init::run(init::InitOptions {
                dir: self.dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Actor(cmd) => match cmd {
                ActorCommands::Set { name } => actor::run_set(actor::SetOptions {
                    name,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                ActorCommands::Show => actor::run_show(actor::ShowOptions {
                    actor: self.actor,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::Company(cmd) => match cmd {
                CompanyCommands::New { name } => company::run_new(company::NewOptions {
                    name,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                CompanyCommands::List => company::run_list(company::ListOptions {
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                CompanyCommands::Show { id } => company::run_show(company::ShowOptions {
                    id,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::Project(cmd) => match cmd {
                ProjectCommands::New {
                    name,
                    company,
                    description,
                    managers,
                    people,
                } => project::run_new(project::NewOptions {
                    name,
                    company,
                    description,
                    managers,
                    people,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                ProjectCommands::List { company } => project::run_list(project::ListOptions {
                    company,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                ProjectCommands::Show { id } => project::run_show(project::ShowOptions {
                    id,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::Milestone(cmd) => match cmd {
                MilestoneCommands::New { name, project, due } => {
                    milestone::run_new(milestone::NewOptions {
                        name,
                        project,
                        due,
                        dir: self.dir,
                        json: self.json,
                        quiet: self.quiet,
                    })
                }
                MilestoneCommands::List { project } => {
                    milestone::run_list(milestone::ListOptions {
                        project,
                        dir: self.dir,
                        json: self.json,
                        quiet: self.quiet,
                    })
                }
                MilestoneCommands::Show { id } => milestone::run_show(milestone::ShowOptions {
                    id,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::Task(cmd) => match cmd {
                TaskCommands::New {
                    name,
                    milestone,
                    description,
                    status,
                    priority,
                    kind,
                    duration,
                } => task::run_new(task::NewOptions {
                    name,
                    milestone,
                    description,
                    status,
                    priority,
                    kind,
                    duration,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Show { id, history } => task::run_show(task::ShowOptions {
                    id,
                    history,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::List {
                    milestone,
                    project,
                    status,
                    done,
                    open,
                } => task::run_list(task::ListOptions {
                    milestone,
                    project,
                    status,
                    done,
                    open,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Edit {
                    id,
                    name,
                    description,
                    status,
                    priority,
                    kind,
                    duration,
                    milestone,
                    comment,
                } => task::run_edit(task::EditOptions {
                    id,
                    name,
                    description,
                    status,
                    priority,
                    kind,
                    duration,
                    milestone,
                    comment,
                    actor: self.actor,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Comment { id, text } => task::run_comment(task::CommentOptions {
                    id,
                    text,
                    actor: self.actor,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::History { id } => task::run_history(task::HistoryOptions {
                    id,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Nudge { id } => task::run_nudge(task::NudgeOptions {
                    id,
                    actor: self.actor,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Nudges { id } => task::run_nudges(task::NudgesOptions {
                    id,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Rm { id } => task::run_rm(task::RmOptions {
                    id,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
        }
    }
}
