use crate::domain::ViewMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "dirhist";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub config_version: u32,
    pub history_file: Option<PathBuf>,
    pub default_view: String,
    pub show_filters: bool,
    pub show_preview: bool,
    pub log_level: String,
    pub theme: ThemeConfig,
}

/// Colour names accepted by ratatui (`"cyan"`, `"lightgreen"`, `"#ff8800"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub accent: String,
    pub selection_fg: String,
    pub selection_bg: String,
    pub muted: String,
    pub error: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: 1,
            history_file: None,
            default_view: "history".to_string(),
            show_filters: false,
            show_preview: false,
            log_level: "info".to_string(),
            theme: ThemeConfig::default(),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            accent: "cyan".to_string(),
            selection_fg: "black".to_string(),
            selection_bg: "lightgreen".to_string(),
            muted: "darkgray".to_string(),
            error: "lightred".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_or_default() -> Result<Self> {
        let path = config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        let parsed = toml::from_str::<AppConfig>(&raw)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;

        Ok(parsed)
    }

    pub fn initial_view(&self) -> ViewMode {
        match self.default_view.trim().to_ascii_lowercase().as_str() {
            "tree" | "directories" => ViewMode::Tree,
            _ => ViewMode::History,
        }
    }

    pub fn history_path(&self) -> Result<PathBuf> {
        match &self.history_file {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("history.jsonl")),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("could not resolve config directory")?;
    Ok(base.join(APP_DIR).join("config.toml"))
}

pub fn data_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir().context("could not resolve data directory")?;
    Ok(base.join(APP_DIR))
}
