use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Quiet period after the last editor change before it is written to disk
    #[serde(default = "default_save_debounce")]
    pub save_debounce_ms: u64,

    /// Suffix that marks a file as a diagram
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Location of the key-value store holding the last opened directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    /// Background colour given to documents that do not specify one
    #[serde(default = "default_background")]
    pub default_background: String,

    /// Font family id given to documents that do not specify one
    #[serde(default = "default_font_family")]
    pub default_font_family: u32,

    /// Roughness given to documents that do not specify one
    #[serde(default = "default_roughness")]
    pub default_roughness: u32,
}

fn default_save_debounce() -> u64 {
    1000
}
fn default_file_extension() -> String {
    ".excalidraw".to_string()
}
fn default_background() -> String {
    "#ffffff".to_string()
}
fn default_font_family() -> u32 {
    1
}
fn default_roughness() -> u32 {
    1
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            save_debounce_ms: default_save_debounce(),
            file_extension: default_file_extension(),
            store_path: None,
            default_background: default_background(),
            default_font_family: default_font_family(),
            default_roughness: default_roughness(),
        }
    }
}

impl AppConfig {
    /// Default config file path for this platform
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = project_dirs() {
            dirs.config_dir().join("config.json")
        } else {
            PathBuf::from("sketchdir-config.json")
        }
    }

    /// Load config from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&data).with_context(|| "failed to parse config JSON")?;
        Ok(config)
    }

    /// Load config if the file exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file path
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config dir {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    /// Where the last-directory store lives, explicit or per-platform default
    pub fn resolved_store_path(&self) -> PathBuf {
        if let Some(path) = &self.store_path {
            return path.clone();
        }
        if let Some(dirs) = project_dirs() {
            dirs.data_dir().join("store.json")
        } else {
            PathBuf::from("sketchdir-store.json")
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "sketchdir", "sketchdir")
}
