//! trk init command implementation
//!
//! Creates the tracker data directory and default config.

use std::path::{Path, PathBuf};

use crate::config::{Config, CONFIG_FILE};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::storage::Storage;

pub struct InitOptions {
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct InitReport {
    root: PathBuf,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    config: bool,
    trk_dir: bool,
}

pub fn run(opts: InitOptions) -> Result<()> {
    let root = match opts.dir {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    let storage = Storage::new(root.clone());
    let created_trk_dir = !storage.is_initialized();
    storage.init()?;
    let created_config = ensure_config(&root)?;

    let report = InitReport {
        root: root.clone(),
        created: InitCreated {
            config: created_config,
            trk_dir: created_trk_dir,
        },
    };

    let mut created_items = Vec::new();
    if created_config {
        created_items.push(CONFIG_FILE);
    }
    if created_trk_dir {
        created_items.push(".trk/");
    }

    let header = if created_items.is_empty() {
        "trk init: nothing to do".to_string()
    } else {
        "trk init: initialized tracker".to_string()
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("root", root.display().to_string());
    human.push_summary(
        "created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    human.push_next_step("trk actor set <name>");
    human.push_next_step("trk company new <name>");

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "init",
        &report,
        Some(&human),
    )?;

    Ok(())
}

fn ensure_config(root: &Path) -> Result<bool> {
    let config_path = root.join(CONFIG_FILE);
    if config_path.exists() {
        if !config_path.is_file() {
            return Err(Error::Storage(format!(
                "{} exists but is not a file: {}",
                CONFIG_FILE,
                config_path.display()
            )));
        }
        return Ok(false);
    }

    let config = Config::default();
    config.save(&config_path)?;
    Ok(true)
}
