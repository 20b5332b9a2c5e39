//! Configuration loading and management
//!
//! Handles parsing of `.trk.toml` configuration files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::workflow::{TaskKind, TaskPriority, TaskStatus};

/// Name of the config file at the tracker root
pub const CONFIG_FILE: &str = ".trk.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Actor configuration
    #[serde(default)]
    pub actor: ActorConfig,

    /// Task defaults
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// Actor-related configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Default actor name when none specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Defaults applied when `task new` omits a field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Status for new tasks
    #[serde(default = "default_task_status")]
    pub default_status: String,

    /// Priority for new tasks
    #[serde(default = "default_task_priority")]
    pub default_priority: String,

    /// Type for new tasks
    #[serde(default = "default_task_type")]
    pub default_type: String,

    /// Duration for new tasks, in days
    #[serde(default = "default_task_duration")]
    pub default_duration: i64,
}

fn default_task_status() -> String {
    TaskStatus::default().as_str().to_string()
}

fn default_task_priority() -> String {
    TaskPriority::default().as_str().to_string()
}

fn default_task_type() -> String {
    TaskKind::default().as_str().to_string()
}

fn default_task_duration() -> i64 {
    1
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_status: default_task_status(),
            default_priority: default_task_priority(),
            default_type: default_task_type(),
            default_duration: default_task_duration(),
        }
    }
}

impl TasksConfig {
    /// Parsed default status
    pub fn default_status(&self) -> Result<TaskStatus> {
        self.default_status.parse()
    }

    /// Parsed default priority
    pub fn default_priority(&self) -> Result<TaskPriority> {
        self.default_priority.parse()
    }

    /// Parsed default type
    pub fn default_kind(&self) -> Result<TaskKind> {
        self.default_type.parse()
    }

    fn validate(&self) -> Result<()> {
        self.default_status
            .parse::<TaskStatus>()
            .map_err(|err| Error::InvalidConfig(format!("tasks.default_status: {err}")))?;
        self.default_priority
            .parse::<TaskPriority>()
            .map_err(|err| Error::InvalidConfig(format!("tasks.default_priority: {err}")))?;
        self.default_type
            .parse::<TaskKind>()
            .map_err(|err| Error::InvalidConfig(format!("tasks.default_type: {err}")))?;
        if self.default_duration < 0 {
            return Err(Error::InvalidConfig(
                "tasks.default_duration must be >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a `.trk.toml` file
    pub fn load(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|err| Error::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the tracker root, or return defaults when
    /// the file is missing
    pub fn load_from_dir(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &PathBuf) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if let Some(actor) = &self.actor.default {
            if actor.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "actor.default cannot be empty".to_string(),
                ));
            }
        }
        self.tasks.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert!(cfg.actor.default.is_none());
        assert_eq!(cfg.tasks.default_status, "new");
        assert_eq!(cfg.tasks.default_priority, "normal");
        assert_eq!(cfg.tasks.default_type, "request");
        assert_eq!(cfg.tasks.default_duration, 1);
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".trk.toml");
        let content = r#"
[actor]
default = "alice"

[tasks]
default_status = "research"
default_priority = "high"
default_type = "bug"
default_duration = 3
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.actor.default.as_deref(), Some("alice"));
        assert_eq!(cfg.tasks.default_status().expect("status"), TaskStatus::Research);
        assert_eq!(
            cfg.tasks.default_priority().expect("priority"),
            TaskPriority::High
        );
        assert_eq!(cfg.tasks.default_kind().expect("kind"), TaskKind::Bug);
        assert_eq!(cfg.tasks.default_duration, 3);
    }

    #[test]
    fn unknown_status_code_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".trk.toml");
        let content = r#"
[tasks]
default_status = "wip"
"#;
        fs::write(&path, content.trim()).expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            Error::InvalidConfig(msg) => assert!(msg.contains("tasks.default_status")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn negative_duration_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".trk.toml");
        let content = r#"
[tasks]
default_duration = -1
"#;
        fs::write(&path, content.trim()).expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn empty_actor_default_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".trk.toml");
        fs::write(&path, "[actor]\ndefault = \"  \"").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn load_from_dir_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_dir(dir.path()).expect("load config");
        assert_eq!(cfg.tasks.default_status, "new");
    }

    #[test]
    fn load_from_dir_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".trk.toml");
        fs::write(&path, "[tasks]\ndefault_priority = \"low\"").expect("write config");

        let cfg = Config::load_from_dir(dir.path()).expect("load config");
        assert_eq!(cfg.tasks.default_priority, "low");
    }

    #[test]
    fn save_writes_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.toml");
        let cfg = Config::default();
        cfg.save(&path).expect("save config");

        let written = fs::read_to_string(&path).expect("read config");
        assert!(written.contains("default_status = \"new\""));
    }
}
