//! Actor identity management.
//!
//! Actor resolution order:
//! 1) CLI --actor (explicit)
//! 2) TRK_ACTOR environment variable
//! 3) Persisted value in .trk/actor
//! 4) Config default (actor.default)
//!
//! When nothing resolves, the result is `None`: a save without an actor is
//! a system save and produces no change records.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::Storage;

/// Resolve the current actor using CLI, environment, persisted value, and config.
pub fn resolve_actor(storage: &Storage, cli_actor: Option<&str>) -> Result<Option<String>> {
    if let Some(actor) = non_empty(cli_actor) {
        return Ok(Some(actor.to_string()));
    }

    if let Ok(env_actor) = std::env::var("TRK_ACTOR") {
        if let Some(actor) = non_empty(Some(env_actor.as_str())) {
            return Ok(Some(actor.to_string()));
        }
    }

    if let Some(actor) = storage.read_actor() {
        return Ok(Some(actor));
    }

    let config = Config::load_from_dir(storage.root())?;
    Ok(config.actor.default)
}

/// Persist the actor identity in `.trk/actor`.
pub fn persist_actor(storage: &Storage, actor: &str) -> Result<()> {
    let actor = non_empty(Some(actor))
        .ok_or_else(|| Error::InvalidArgument("actor name cannot be empty".to_string()))?;

    storage.write_actor(actor)
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
