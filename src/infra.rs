use crate::domain::{CommandEntry, DirectoryStat, EntryError};
use crate::paths;
use anyhow::{Result, bail};
use chrono::{DateTime, Local};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;

/// Storage the browser reads from. Implementations must be safe to call
/// from several blocking tasks at once.
pub trait HistoryStore: Send + Sync {
    fn commands_by_directory(&self, dir: &str) -> Result<Vec<CommandEntry>>;
    fn directories_with_history(&self) -> Result<Vec<String>>;
    fn search_commands(&self, pattern: &str, dir: &str) -> Result<Vec<CommandEntry>>;
    fn record(&self, entry: &CommandEntry) -> Result<()>;
    fn close(&self) -> Result<()>;

    /// Whether [`HistoryStore::directory_stats`] is implemented. Callers
    /// check this once and otherwise derive stats from per-directory lists.
    fn supports_directory_stats(&self) -> bool {
        false
    }

    fn directory_stats(&self) -> Result<Vec<DirectoryStat>> {
        bail!("directory stats are not supported by this store")
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access history file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("refusing to record invalid entry: {0}")]
    InvalidEntry(#[from] EntryError),
    #[error("failed to encode command entry: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("history store is closed")]
    Closed,
}

#[derive(Debug)]
pub struct JsonlHistoryStore {
    path: PathBuf,
    closed: Mutex<bool>,
}

impl JsonlHistoryStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(Self {
            path,
            closed: Mutex::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_lock<T>(
        &self,
        op: impl FnOnce(&Path) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let closed = self
            .closed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *closed {
            return Err(StoreError::Closed);
        }
        op(&self.path)
    }

    fn read_all(&self) -> Result<Vec<CommandEntry>, StoreError> {
        self.with_lock(read_entries)
    }
}

fn read_entries(path: &Path) -> Result<Vec<CommandEntry>, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let mut entries = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<CommandEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(err) => warn!(line = idx + 1, %err, "skipping unreadable history line"),
        }
    }
    Ok(entries)
}

fn newest_first(mut entries: Vec<CommandEntry>) -> Vec<CommandEntry> {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries
}

impl HistoryStore for JsonlHistoryStore {
    fn commands_by_directory(&self, dir: &str) -> Result<Vec<CommandEntry>> {
        let wanted = paths::normalize(dir);
        let entries = self
            .read_all()?
            .into_iter()
            .filter(|entry| paths::normalize(&entry.directory) == wanted)
            .collect();
        Ok(newest_first(entries))
    }

    fn directories_with_history(&self) -> Result<Vec<String>> {
        let dirs: BTreeSet<String> = self
            .read_all()?
            .iter()
            .map(|entry| paths::normalize(&entry.directory))
            .collect();
        Ok(dirs.into_iter().collect())
    }

    fn search_commands(&self, pattern: &str, dir: &str) -> Result<Vec<CommandEntry>> {
        let needle = pattern.to_lowercase();
        let scope = paths::normalize(dir);
        let entries = self
            .read_all()?
            .into_iter()
            .filter(|entry| scope.is_empty() || paths::normalize(&entry.directory) == scope)
            .filter(|entry| entry.command.to_lowercase().contains(&needle))
            .collect();
        Ok(newest_first(entries))
    }

    fn record(&self, entry: &CommandEntry) -> Result<()> {
        entry.validate().map_err(StoreError::from)?;
        let mut line = serde_json::to_string(entry).map_err(StoreError::from)?;
        line.push('\n');

        self.with_lock(|path| {
            let io_err = |source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            };
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(io_err)?;
            file.write_all(line.as_bytes()).map_err(io_err)
        })?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut closed = self
            .closed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *closed = true;
        Ok(())
    }

    fn supports_directory_stats(&self) -> bool {
        true
    }

    fn directory_stats(&self) -> Result<Vec<DirectoryStat>> {
        let mut by_dir: BTreeMap<String, (usize, DateTime<Local>)> = BTreeMap::new();
        for entry in self.read_all()? {
            by_dir
                .entry(paths::normalize(&entry.directory))
                .and_modify(|(count, last)| {
                    *count += 1;
                    if entry.timestamp > *last {
                        *last = entry.timestamp;
                    }
                })
                .or_insert((1, entry.timestamp));
        }

        Ok(by_dir
            .into_iter()
            .map(|(path, (command_count, last_used))| DirectoryStat {
                active: Path::new(&path).is_dir(),
                path,
                command_count,
                last_used,
            })
            .collect())
    }
}
