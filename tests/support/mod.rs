use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;
use trk::change::ChangeRecord;
use trk::storage::Storage;

pub struct TestTracker {
    dir: TempDir,
}

impl TestTracker {
    /// Temp directory with an initialized `.trk/` data directory.
    pub fn init() -> Result<Self, Box<dyn std::error::Error>> {
        let tracker = Self::empty()?;
        tracker.storage().init()?;
        Ok(tracker)
    }

    /// Bare temp directory without tracker state.
    pub fn empty() -> Result<Self, Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn storage(&self) -> Storage {
        Storage::new(self.dir.path().to_path_buf())
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_trk_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        self.write_file(".trk.toml", contents)
    }

    pub fn trk_dir(&self) -> PathBuf {
        self.dir.path().join(".trk")
    }

    pub fn changes_dir(&self) -> PathBuf {
        self.trk_dir().join("changes")
    }

    pub fn read_actor_file(&self) -> std::io::Result<String> {
        fs::read_to_string(self.trk_dir().join("actor"))
    }

    pub fn read_changes(
        &self,
        task_id: &str,
    ) -> Result<Vec<ChangeRecord>, Box<dyn std::error::Error>> {
        let path = self.changes_dir().join(format!("{task_id}.jsonl"));
        if !path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&path)?;
        let mut records = Vec::new();
        for line in contents.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let record: ChangeRecord = serde_json::from_str(trimmed)?;
            records.push(record);
        }
        Ok(records)
    }
}

pub fn trk_cmd() -> Command {
    let mut cmd = Command::cargo_bin("trk").expect("trk binary");
    cmd.env_remove("TRK_ACTOR");
    cmd.env_remove("TRK_DIR");
    cmd
}
