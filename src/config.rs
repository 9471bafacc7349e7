use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::map::DEFAULT_ZOOM;
use crate::workout::{Coords, WorkoutKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub zoom_level: u8,
    /// Starting position used when none is given on the command line
    pub home: Option<Coords>,
    pub default_kind: WorkoutKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zoom_level: DEFAULT_ZOOM,
            home: None,
            default_kind: WorkoutKind::Running,
        }
    }
}

/// Effective settings for one run: command line over config over defaults
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    pub position: Option<Coords>,
    pub zoom_level: u8,
    pub default_kind: WorkoutKind,
}

impl RuntimeSettings {
    pub fn resolve(config: &Config, position: Option<Coords>, zoom_level: Option<u8>) -> Self {
        Self {
            position: position.or(config.home),
            zoom_level: zoom_level.unwrap_or(config.zoom_level),
            default_kind: config.default_kind,
        }
    }
}

impl From<&RuntimeSettings> for Config {
    fn from(rs: &RuntimeSettings) -> Self {
        Self {
            zoom_level: rs.zoom_level,
            home: rs.position,
            default_kind: rs.default_kind,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => tracing::warn!("ignoring unreadable config {}: {e}", self.path.display()),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
