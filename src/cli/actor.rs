//! trk actor command implementation
//!
//! Provides actor identity helpers (set/show).

use std::path::PathBuf;

use crate::actor;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

/// Options for `trk actor set`
pub struct SetOptions {
    pub name: String,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Options for `trk actor show`
pub struct ShowOptions {
    pub actor: Option<String>,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct ActorSetReport {
    actor: String,
    path: PathBuf,
}

#[derive(serde::Serialize)]
struct ActorShowReport {
    /// `None` means changes would be saved without records
    actor: Option<String>,
}

pub fn run_set(options: SetOptions) -> Result<()> {
    let storage = super::open_tracker(options.dir.as_deref())?;

    actor::persist_actor(&storage, &options.name)?;

    let actor_name = options.name.trim().to_string();
    let actor_path = storage.actor_file();

    let report = ActorSetReport {
        actor: actor_name.clone(),
        path: actor_path.clone(),
    };

    let mut human = HumanOutput::new(format!("trk actor set: {actor_name}"));
    human.push_summary("actor", actor_name);
    human.push_summary("path", actor_path.display().to_string());
    human.push_next_step("trk task list");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "actor set",
        &report,
        Some(&human),
    )?;

    Ok(())
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let storage = super::open_tracker(options.dir.as_deref())?;

    let actor_name = actor::resolve_actor(&storage, options.actor.as_deref())?;

    let report = ActorShowReport {
        actor: actor_name.clone(),
    };

    let header = match &actor_name {
        Some(name) => format!("trk actor: {name}"),
        None => "trk actor: not set".to_string(),
    };

    let mut human = HumanOutput::new(header);
    human.push_summary(
        "actor",
        actor_name.clone().unwrap_or_else(|| "(none)".to_string()),
    );

    if actor_name.is_none() {
        human.push_warning("actor not set; task saves will not be recorded in history");
        human.push_next_step("trk actor set <name>");
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "actor show",
        &report,
        Some(&human),
    )?;

    Ok(())
}
