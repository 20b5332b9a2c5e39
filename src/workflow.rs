//! Task workflow vocabulary
//!
//! Status, priority, and type are closed enums persisted as fixed
//! snake_case string codes. Parsing and comparison go through the enum;
//! the storage representation never leaks into diff logic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Lifecycle status of a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    New,
    Research,
    Process,
    Review,
    Accepted,
    Resolved,
    Closed,
}

impl TaskStatus {
    /// All status codes, in workflow order
    pub const ALL: [TaskStatus; 7] = [
        TaskStatus::New,
        TaskStatus::Research,
        TaskStatus::Process,
        TaskStatus::Review,
        TaskStatus::Accepted,
        TaskStatus::Resolved,
        TaskStatus::Closed,
    ];

    /// Stable string code used for storage and display
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::New => "new",
            TaskStatus::Research => "research",
            TaskStatus::Process => "process",
            TaskStatus::Review => "review",
            TaskStatus::Accepted => "accepted",
            TaskStatus::Resolved => "resolved",
            TaskStatus::Closed => "closed",
        }
    }

    /// Terminal statuses count toward milestone progress
    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Resolved | TaskStatus::Closed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| Error::Validation(unknown_code("status", s, &TaskStatus::ALL.map(|v| v.as_str()))))
    }
}

/// Urgency of a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Urgent,
    High,
    #[default]
    Normal,
    Low,
}

impl TaskPriority {
    /// All priority codes, most urgent first
    pub const ALL: [TaskPriority; 4] = [
        TaskPriority::Urgent,
        TaskPriority::High,
        TaskPriority::Normal,
        TaskPriority::Low,
    ];

    /// Stable string code used for storage and display
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Urgent => "urgent",
            TaskPriority::High => "high",
            TaskPriority::Normal => "normal",
            TaskPriority::Low => "low",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskPriority::ALL
            .iter()
            .find(|priority| priority.as_str() == s)
            .copied()
            .ok_or_else(|| {
                Error::Validation(unknown_code("priority", s, &TaskPriority::ALL.map(|v| v.as_str())))
            })
    }
}

/// Kind of work a task represents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    #[default]
    Request,
    Bug,
}

impl TaskKind {
    /// All type codes
    pub const ALL: [TaskKind; 2] = [TaskKind::Request, TaskKind::Bug];

    /// Stable string code used for storage and display
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Request => "request",
            TaskKind::Bug => "bug",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskKind::ALL
            .iter()
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| Error::Validation(unknown_code("type", s, &TaskKind::ALL.map(|v| v.as_str()))))
    }
}

fn unknown_code(what: &str, got: &str, expected: &[&str]) -> String {
    format!(
        "unknown {} \"{}\" (expected one of: {})",
        what,
        got,
        expected.join(", ")
    )
}
