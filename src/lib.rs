//! trk - project and task tracking library
//!
//! This library backs the trk CLI: a tracker for companies, projects,
//! milestones, and tasks where every task save is recorded as immutable
//! field-level change records and history is reconstructed by grouping
//! those records back into saves.
//!
//! # Core Concepts
//!
//! - **Registries**: current entity state in locked JSON files under `.trk/`
//! - **Change Log**: append-only field-level records, one JSONL file per task
//! - **Recorder**: diffs baseline against proposed fields at save time
//! - **History**: lazy grouping of records back into per-save change groups
//!
//! # Module Organization
//!
//! - `cli`: command-line interface using clap
//! - `config`: configuration loading from `.trk.toml`
//! - `error`: error types and result aliases
//! - `storage`: file layout, registries, and JSONL stores under `.trk/`
//! - `lock`: file locking and atomic writes for concurrency safety
//! - `ids`: entity id generation and prefix resolution
//! - `workflow`: task status, priority, and type enums
//! - `company`, `project`, `milestone`, `task`: entity stores
//! - `change`: the append-only change log
//! - `recorder`: field diffing and change recording at save time
//! - `history`: grouping change records back into saves
//! - `nudge`: per-task nudge log
//! - `actor`: actor identity resolution

pub mod actor;
pub mod change;
pub mod cli;
pub mod company;
pub mod config;
pub mod error;
pub mod history;
pub mod ids;
pub mod lock;
pub mod milestone;
pub mod nudge;
pub mod output;
pub mod project;
pub mod recorder;
pub mod storage;
pub mod task;
pub mod workflow;

pub use error::{Error, Result};
