//! Storage layer for trk
//!
//! All persistent state lives under a `.trk/` directory at the tracker
//! root, discovered by walking up from the working directory.
//!
//! # Directory Structure
//!
//! ```text
//! .trk/                         # Tracker data directory
//!   actor                       # Default actor identity
//!   companies.json              # Company registry
//!   projects.json               # Project registry
//!   milestones.json             # Milestone registry
//!   tasks.json                  # Task registry (current state only)
//!   nudges.jsonl                # Append-only task nudges
//!   changes/                    # Append-only change log
//!     <task-id>.jsonl           # One record per line, per task
//!     seq                       # Next record id counter
//! .trk.toml                     # Optional config at the tracker root
//! ```
//!
//! Registries are rewritten atomically under a `<file>.lock` file lock;
//! history files are append-only. A lock covers one file operation, never
//! a whole save, so current-state and history writes can still interleave
//! across processes.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::company::CompanyRegistry;
use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::milestone::MilestoneRegistry;
use crate::project::ProjectRegistry;
use crate::task::TaskRegistry;

/// Name of the tracker data directory
pub const DATA_DIR: &str = ".trk";

/// Storage manager for trk state
#[derive(Debug, Clone)]
pub struct Storage {
    /// Path to the tracker root (where `.trk/` lives)
    root: PathBuf,
}

impl Storage {
    /// Create a storage manager rooted at the given directory
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Discover the tracker root by walking up from `start`
    ///
    /// Returns `TrackerNotFound` when no ancestor contains a `.trk/`
    /// directory.
    pub fn discover(start: &Path) -> Result<Self> {
        let mut dir = start.to_path_buf();
        loop {
            if dir.join(DATA_DIR).is_dir() {
                return Ok(Self::new(dir));
            }
            if !dir.pop() {
                return Err(Error::TrackerNotFound(start.to_path_buf()));
            }
        }
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    /// Path to the tracker root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the `.trk/` data directory
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    /// Path to the actor file
    pub fn actor_file(&self) -> PathBuf {
        self.data_dir().join("actor")
    }

    /// Path to the company registry
    pub fn companies_file(&self) -> PathBuf {
        self.data_dir().join("companies.json")
    }

    /// Path to the project registry
    pub fn projects_file(&self) -> PathBuf {
        self.data_dir().join("projects.json")
    }

    /// Path to the milestone registry
    pub fn milestones_file(&self) -> PathBuf {
        self.data_dir().join("milestones.json")
    }

    /// Path to the task registry
    pub fn tasks_file(&self) -> PathBuf {
        self.data_dir().join("tasks.json")
    }

    /// Path to the nudges file (JSONL format)
    pub fn nudges_file(&self) -> PathBuf {
        self.data_dir().join("nudges.jsonl")
    }

    /// Path to the change log directory
    pub fn changes_dir(&self) -> PathBuf {
        self.data_dir().join("changes")
    }

    /// Path to the change log file for one task (JSONL format)
    pub fn changes_file(&self, task_id: &str) -> PathBuf {
        self.changes_dir().join(format!("{}.jsonl", task_id))
    }

    /// Path to the change record id counter
    pub fn changes_seq_file(&self) -> PathBuf {
        self.changes_dir().join("seq")
    }

    // =========================================================================
    // Directory initialization
    // =========================================================================

    /// Initialize the `.trk/` directory structure
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(self.data_dir())?;
        fs::create_dir_all(self.changes_dir())?;

        // Initialize empty registries where missing
        let companies = self.companies_file();
        if !companies.exists() {
            self.write_json(&companies, &CompanyRegistry::default())?;
        }
        let projects = self.projects_file();
        if !projects.exists() {
            self.write_json(&projects, &ProjectRegistry::default())?;
        }
        let milestones = self.milestones_file();
        if !milestones.exists() {
            self.write_json(&milestones, &MilestoneRegistry::default())?;
        }
        let tasks = self.tasks_file();
        if !tasks.exists() {
            self.write_json(&tasks, &TaskRegistry::default())?;
        }

        // Touch the nudges file if it doesn't exist
        let nudges = self.nudges_file();
        if !nudges.exists() {
            File::create(&nudges)?;
        }

        Ok(())
    }

    /// Check if storage has been initialized
    pub fn is_initialized(&self) -> bool {
        self.data_dir().exists()
    }

    // =========================================================================
    // File I/O helpers (atomic writes for safety)
    // =========================================================================

    /// Write JSON data atomically (write to temp, then rename)
    ///
    /// This ensures that concurrent readers never see partial writes.
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        lock::write_atomic(path, json.as_bytes())
    }

    /// Read JSON data from a file
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }

    /// Append a line to a JSONL file (for nudges, change records)
    ///
    /// Note: This is NOT atomic across processes by itself. Callers that
    /// race other writers must hold a `FileLock` (see `update_registry`
    /// and the change log).
    pub fn append_jsonl<T: Serialize>(&self, path: &Path, record: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(record)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        writeln!(file, "{}", json)?;
        file.sync_all()?;

        Ok(())
    }

    /// Read all records from a JSONL file
    pub fn read_jsonl<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: T = serde_json::from_str(&line)?;
            records.push(record);
        }

        Ok(records)
    }

    // =========================================================================
    // Registry operations (locked read-modify-write)
    // =========================================================================

    /// Read a registry file, returning the default when it doesn't exist
    pub fn read_registry<R>(&self, path: &Path) -> Result<R>
    where
        R: Default + DeserializeOwned,
    {
        if !path.exists() {
            return Ok(R::default());
        }
        let lock_path = registry_lock_path(path);
        let _lock = FileLock::acquire(&lock_path, DEFAULT_LOCK_TIMEOUT_MS)?;
        self.read_json(path)
    }

    /// Mutate a registry file under its lock and write it back atomically
    ///
    /// The closure sees the current registry (default when the file is
    /// missing) and its result is returned to the caller after the write.
    pub fn update_registry<R, T, F>(&self, path: &Path, f: F) -> Result<T>
    where
        R: Default + Serialize + DeserializeOwned,
        F: FnOnce(&mut R) -> Result<T>,
    {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_path = registry_lock_path(path);
        let _lock = FileLock::acquire(&lock_path, DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut registry: R = if path.exists() {
            self.read_json(path)?
        } else {
            R::default()
        };

        let result = f(&mut registry)?;

        let json = serde_json::to_string_pretty(&registry)?;
        lock::write_atomic(path, json.as_bytes())?;

        Ok(result)
    }

    // =========================================================================
    // Actor persistence
    // =========================================================================

    /// Read the persisted default actor identity
    pub fn read_actor(&self) -> Option<String> {
        let path = self.actor_file();
        let actor = fs::read_to_string(&path).ok()?;
        let actor = actor.trim();
        if actor.is_empty() {
            None
        } else {
            Some(actor.to_string())
        }
    }

    /// Write the default actor identity
    pub fn write_actor(&self, actor: &str) -> Result<()> {
        self.init()?; // Ensure directory exists
        let path = self.actor_file();
        lock::write_atomic(&path, actor.as_bytes())
    }
}

fn registry_lock_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.lock", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_storage_paths() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let storage = Storage::new(root.clone());

        assert_eq!(storage.data_dir(), root.join(".trk"));
        assert_eq!(storage.tasks_file(), root.join(".trk/tasks.json"));
        assert_eq!(storage.nudges_file(), root.join(".trk/nudges.jsonl"));
        assert_eq!(
            storage.changes_file("tsk-01234567"),
            root.join(".trk/changes/tsk-01234567.jsonl")
        );
    }

    #[test]
    fn test_init_directories() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf());

        assert!(!storage.is_initialized());
        storage.init().unwrap();

        assert!(storage.is_initialized());
        assert!(storage.data_dir().exists());
        assert!(storage.changes_dir().exists());
        assert!(storage.nudges_file().exists());
        assert!(storage.companies_file().exists());
        assert!(storage.tasks_file().exists());
    }

    #[test]
    fn test_discover_walks_up() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let storage = Storage::new(root.clone());
        storage.init().unwrap();

        let nested = root.join("a/b/c");
        fs::create_dir_all(&nested).unwrap();

        let found = Storage::discover(&nested).unwrap();
        assert_eq!(found.root(), root.as_path());
    }

    #[test]
    fn test_discover_fails_without_data_dir() {
        let temp = TempDir::new().unwrap();
        let result = Storage::discover(temp.path());
        assert!(matches!(result, Err(Error::TrackerNotFound(_))));
    }

    #[test]
    fn test_atomic_write() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf());
        storage.init().unwrap();

        let test_file = storage.data_dir().join("test.json");

        #[derive(Serialize, serde::Deserialize, PartialEq, Debug)]
        struct TestData {
            name: String,
            value: i32,
        }

        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        storage.write_json(&test_file, &data).unwrap();
        let read_back: TestData = storage.read_json(&test_file).unwrap();

        assert_eq!(data, read_back);
    }

    #[test]
    fn test_jsonl_operations() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf());
        storage.init().unwrap();

        #[derive(Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Record {
            id: u32,
            message: String,
        }

        let file = storage.data_dir().join("test.jsonl");

        storage
            .append_jsonl(
                &file,
                &Record {
                    id: 1,
                    message: "first".to_string(),
                },
            )
            .unwrap();
        storage
            .append_jsonl(
                &file,
                &Record {
                    id: 2,
                    message: "second".to_string(),
                },
            )
            .unwrap();

        let records: Vec<Record> = storage.read_jsonl(&file).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[1].id, 2);
    }

    #[test]
    fn test_registry_update_roundtrip() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf());
        storage.init().unwrap();

        #[derive(Default, Serialize, serde::Deserialize)]
        struct Registry {
            entries: Vec<String>,
        }

        let path = storage.data_dir().join("registry.json");

        storage
            .update_registry(&path, |registry: &mut Registry| {
                registry.entries.push("one".to_string());
                Ok(())
            })
            .unwrap();
        storage
            .update_registry(&path, |registry: &mut Registry| {
                registry.entries.push("two".to_string());
                Ok(())
            })
            .unwrap();

        let registry: Registry = storage.read_registry(&path).unwrap();
        assert_eq!(registry.entries, vec!["one", "two"]);
    }

    #[test]
    fn test_actor_persistence() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf());

        // Initially no actor
        assert!(storage.read_actor().is_none());

        storage.write_actor("alice").unwrap();

        assert_eq!(storage.read_actor(), Some("alice".to_string()));
    }
}
