//! Project entities.
//!
//! A project belongs to one company and carries two membership lists:
//! managers and people. Both are plain user names; trk has no user
//! registry of its own.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::company::CompanyStore;
use crate::error::{Error, Result};
use crate::ids;
use crate::storage::Storage;

const PROJECT_ID_PREFIX: &str = "prj";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub company_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub managers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub people: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Registry of all projects
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectRegistry {
    pub projects: Vec<Project>,
}

/// Inputs for creating a project
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    /// Company id or unambiguous prefix
    pub company: String,
    pub managers: Vec<String>,
    pub people: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ProjectStore {
    storage: Storage,
}

impl ProjectStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Create a project under a company
    pub fn create(&self, new: NewProject) -> Result<Project> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(Error::Validation("project name cannot be empty".to_string()));
        }
        let company_id = CompanyStore::new(self.storage.clone()).resolve_id(&new.company)?;
        let managers = normalize_members(new.managers)?;
        let people = normalize_members(new.people)?;

        let name = name.to_string();
        let description = normalize_description(new.description);
        self.storage
            .update_registry(&self.storage.projects_file(), |registry: &mut ProjectRegistry| {
                let existing: HashSet<String> =
                    registry.projects.iter().map(|p| p.id.clone()).collect();
                let project = Project {
                    id: ids::generate_id(PROJECT_ID_PREFIX, &existing),
                    name,
                    description,
                    company_id,
                    managers,
                    people,
                    created_at: Utc::now(),
                };
                registry.projects.push(project.clone());
                Ok(project)
            })
    }

    /// List projects, ascending by creation, optionally scoped to a company
    pub fn list(&self, company: Option<&str>) -> Result<Vec<Project>> {
        let company_id = match company {
            Some(input) => Some(CompanyStore::new(self.storage.clone()).resolve_id(input)?),
            None => None,
        };

        let registry: ProjectRegistry = self.storage.read_registry(&self.storage.projects_file())?;
        let mut projects = registry.projects;
        if let Some(company_id) = company_id {
            projects.retain(|project| project.company_id == company_id);
        }
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(projects)
    }

    /// Look up a project by id or unambiguous prefix
    pub fn get(&self, id: &str) -> Result<Project> {
        let resolved = self.resolve_id(id)?;
        let registry: ProjectRegistry = self.storage.read_registry(&self.storage.projects_file())?;
        registry
            .projects
            .into_iter()
            .find(|project| project.id == resolved)
            .ok_or_else(|| Error::ProjectNotFound(resolved))
    }

    /// Resolve user input to a full project id
    pub fn resolve_id(&self, input: &str) -> Result<String> {
        let registry: ProjectRegistry = self.storage.read_registry(&self.storage.projects_file())?;
        let stored: Vec<String> = registry.projects.iter().map(|p| p.id.clone()).collect();
        ids::try_resolve(input, &stored)?
            .ok_or_else(|| Error::ProjectNotFound(input.trim().to_string()))
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    let description = description?;
    if description.trim().is_empty() {
        None
    } else {
        Some(description)
    }
}

fn normalize_members(members: Vec<String>) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(members.len());
    for member in members {
        let trimmed = member.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("member name cannot be empty".to_string()));
        }
        if !out.iter().any(|existing: &String| existing == trimmed) {
            out.push(trimmed.to_string());
        }
    }
    Ok(out)
}
