//! Company entities.
//!
//! Companies are the top of the ownership chain: a company owns projects,
//! projects contain milestones, milestones contain tasks.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ids;
use crate::storage::Storage;

const COMPANY_ID_PREFIX: &str = "cmp";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Registry of all companies
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyRegistry {
    pub companies: Vec<Company>,
}

#[derive(Debug, Clone)]
pub struct CompanyStore {
    storage: Storage,
}

impl CompanyStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Create a company
    pub fn create(&self, name: &str) -> Result<Company> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("company name cannot be empty".to_string()));
        }

        let name = name.to_string();
        self.storage
            .update_registry(&self.storage.companies_file(), |registry: &mut CompanyRegistry| {
                let existing: HashSet<String> =
                    registry.companies.iter().map(|c| c.id.clone()).collect();
                let company = Company {
                    id: ids::generate_id(COMPANY_ID_PREFIX, &existing),
                    name,
                    created_at: Utc::now(),
                };
                registry.companies.push(company.clone());
                Ok(company)
            })
    }

    /// List all companies, ascending by creation
    pub fn list(&self) -> Result<Vec<Company>> {
        let registry: CompanyRegistry = self.storage.read_registry(&self.storage.companies_file())?;
        let mut companies = registry.companies;
        companies.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(companies)
    }

    /// Look up a company by id or unambiguous prefix
    pub fn get(&self, id: &str) -> Result<Company> {
        let resolved = self.resolve_id(id)?;
        let registry: CompanyRegistry = self.storage.read_registry(&self.storage.companies_file())?;
        registry
            .companies
            .into_iter()
            .find(|company| company.id == resolved)
            .ok_or_else(|| Error::CompanyNotFound(resolved))
    }

    /// Resolve user input to a full company id
    pub fn resolve_id(&self, input: &str) -> Result<String> {
        let registry: CompanyRegistry = self.storage.read_registry(&self.storage.companies_file())?;
        let stored: Vec<String> = registry.companies.iter().map(|c| c.id.clone()).collect();
        ids::try_resolve(input, &stored)?
            .ok_or_else(|| Error::CompanyNotFound(input.trim().to_string()))
    }
}
