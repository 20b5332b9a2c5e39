//! Milestone entities.
//!
//! A milestone belongs to one project and owns tasks. Progress is derived
//! from the statuses of its tasks, never stored.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ids;
use crate::project::ProjectStore;
use crate::storage::Storage;
use crate::task::{TaskFilter, TaskStore};

const MILESTONE_ID_PREFIX: &str = "mls";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub name: String,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Registry of all milestones
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MilestoneRegistry {
    pub milestones: Vec<Milestone>,
}

/// Task completion summary for one milestone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MilestoneProgress {
    pub total: usize,
    pub done: usize,
    pub percent: u32,
}

#[derive(Debug, Clone)]
pub struct MilestoneStore {
    storage: Storage,
}

impl MilestoneStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Create a milestone under a project
    pub fn create(&self, name: &str, project: &str, due_date: Option<NaiveDate>) -> Result<Milestone> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("milestone name cannot be empty".to_string()));
        }
        let project_id = ProjectStore::new(self.storage.clone()).resolve_id(project)?;

        let name = name.to_string();
        self.storage.update_registry(
            &self.storage.milestones_file(),
            |registry: &mut MilestoneRegistry| {
                let existing: HashSet<String> =
                    registry.milestones.iter().map(|m| m.id.clone()).collect();
                let milestone = Milestone {
                    id: ids::generate_id(MILESTONE_ID_PREFIX, &existing),
                    name,
                    project_id,
                    due_date,
                    created_at: Utc::now(),
                };
                registry.milestones.push(milestone.clone());
                Ok(milestone)
            },
        )
    }

    /// List milestones, ascending by creation, optionally scoped to a project
    pub fn list(&self, project: Option<&str>) -> Result<Vec<Milestone>> {
        let project_id = match project {
            Some(input) => Some(ProjectStore::new(self.storage.clone()).resolve_id(input)?),
            None => None,
        };

        let registry: MilestoneRegistry =
            self.storage.read_registry(&self.storage.milestones_file())?;
        let mut milestones = registry.milestones;
        if let Some(project_id) = project_id {
            milestones.retain(|milestone| milestone.project_id == project_id);
        }
        milestones.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(milestones)
    }

    /// Look up a milestone by id or unambiguous prefix
    pub fn get(&self, id: &str) -> Result<Milestone> {
        let resolved = self.resolve_id(id)?;
        let registry: MilestoneRegistry =
            self.storage.read_registry(&self.storage.milestones_file())?;
        registry
            .milestones
            .into_iter()
            .find(|milestone| milestone.id == resolved)
            .ok_or_else(|| Error::MilestoneNotFound(resolved))
    }

    /// Resolve user input to a full milestone id
    pub fn resolve_id(&self, input: &str) -> Result<String> {
        let registry: MilestoneRegistry =
            self.storage.read_registry(&self.storage.milestones_file())?;
        let stored: Vec<String> = registry.milestones.iter().map(|m| m.id.clone()).collect();
        ids::try_resolve(input, &stored)?
            .ok_or_else(|| Error::MilestoneNotFound(input.trim().to_string()))
    }

    /// Check whether an exact milestone id exists
    pub fn exists(&self, id: &str) -> Result<bool> {
        let registry: MilestoneRegistry =
            self.storage.read_registry(&self.storage.milestones_file())?;
        Ok(registry.milestones.iter().any(|milestone| milestone.id == id))
    }

    /// Share of a milestone's tasks in a done status
    ///
    /// A milestone with no tasks reports zero percent.
    pub fn progress(&self, milestone_id: &str) -> Result<MilestoneProgress> {
        let resolved = self.resolve_id(milestone_id)?;
        let tasks = TaskStore::new(self.storage.clone()).list(&TaskFilter {
            milestones: Some(vec![resolved]),
            ..TaskFilter::default()
        })?;

        let total = tasks.len();
        let done = tasks.iter().filter(|task| task.status.is_done()).count();
        let percent = if total == 0 {
            0
        } else {
            (done * 100 / total) as u32
        };

        Ok(MilestoneProgress { total, done, percent })
    }
}

/// Parse a `YYYY-MM-DD` due date
pub fn parse_due_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        Error::InvalidArgument(format!("invalid due date \"{input}\" (expected YYYY-MM-DD)"))
    })
}
