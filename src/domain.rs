use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    #[default]
    Unknown,
    PowerShell,
    Bash,
    Zsh,
    Cmd,
}

impl ShellKind {
    pub const ALL: [ShellKind; 5] = [
        ShellKind::Unknown,
        ShellKind::PowerShell,
        ShellKind::Bash,
        ShellKind::Zsh,
        ShellKind::Cmd,
    ];

    /// Next shell in the filter cycle. `Unknown` doubles as "no filter", so
    /// the cycle wraps back to it after `Cmd`.
    pub fn next(self) -> Self {
        match self {
            ShellKind::Unknown => ShellKind::PowerShell,
            ShellKind::PowerShell => ShellKind::Bash,
            ShellKind::Bash => ShellKind::Zsh,
            ShellKind::Zsh => ShellKind::Cmd,
            ShellKind::Cmd => ShellKind::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShellKind::Unknown => "unknown",
            ShellKind::PowerShell => "powershell",
            ShellKind::Bash => "bash",
            ShellKind::Zsh => "zsh",
            ShellKind::Cmd => "cmd",
        }
    }
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ShellKind {
    type Err = EntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "unknown" => Ok(ShellKind::Unknown),
            "powershell" | "pwsh" => Ok(ShellKind::PowerShell),
            "bash" => Ok(ShellKind::Bash),
            "zsh" => Ok(ShellKind::Zsh),
            "cmd" => Ok(ShellKind::Cmd),
            other => Err(EntryError::UnknownShell(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    #[error("command entry has an empty {0}")]
    Empty(&'static str),
    #[error("unknown shell kind: {0:?}")]
    UnknownShell(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntry {
    pub id: String,
    pub command: String,
    pub directory: String,
    pub timestamp: DateTime<Local>,
    #[serde(default)]
    pub shell: ShellKind,
    #[serde(default)]
    pub exit_code: i32,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl CommandEntry {
    pub fn validate(&self) -> Result<(), EntryError> {
        if self.id.trim().is_empty() {
            return Err(EntryError::Empty("identifier"));
        }
        if self.command.trim().is_empty() {
            return Err(EntryError::Empty("command"));
        }
        if self.directory.trim().is_empty() {
            return Err(EntryError::Empty("directory"));
        }
        if self.timestamp.timestamp() == 0 && self.timestamp.timestamp_subsec_nanos() == 0 {
            return Err(EntryError::Empty("timestamp"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryStat {
    pub path: String,
    pub command_count: usize,
    pub last_used: DateTime<Local>,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    History,
    Tree,
    Search,
}

impl ViewMode {
    pub fn next(self) -> Self {
        match self {
            ViewMode::History => ViewMode::Tree,
            ViewMode::Tree => ViewMode::Search,
            ViewMode::Search => ViewMode::History,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewMode::History => "History",
            ViewMode::Tree => "Directories",
            ViewMode::Search => "Search",
        }
    }
}
