use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::app_dirs::AppDirs;
use crate::transform::CoordinateTransform;

/// How a single death marker looks on the rendered map
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarkerStyle {
    pub radius: f64,
    pub stroke_width: f64,
    /// RGBA
    pub stroke_color: [u8; 4],
    /// RGBA
    pub fill_color: [u8; 4],
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            radius: 20.0,
            stroke_width: 10.0,
            stroke_color: [255, 0, 0, 255],
            fill_color: [255, 255, 255, 255],
        }
    }
}

/// Rendering surface size plus everything needed to place and draw markers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub width: u32,
    pub height: u32,
    pub transform: CoordinateTransform,
    pub marker: MarkerStyle,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 8417,
            height: 5000,
            transform: CoordinateTransform::default(),
            marker: MarkerStyle::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sessions_dir: Option<PathBuf>,
    pub background_image: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub map: MapConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sessions_dir: AppDirs::noita_sessions_dir(),
            background_image: AppDirs::default_map_path(),
            output: None,
            map: MapConfig::default(),
        }
    }
}

impl Config {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(AppDirs::DEFAULT_OUTPUT))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] io::Error),
    #[error("config encoding: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", AppDirs::APP_NAME) {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("noita-deathmap.json")
        };
        Self { path }
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
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "ignoring invalid config");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            sessions_dir: Some(PathBuf::from("/games/noita/sessions")),
            background_image: Some(PathBuf::from("/games/noita/map.png")),
            output: Some(PathBuf::from("out.png")),
            map: MapConfig {
                width: 100,
                height: 50,
                transform: CoordinateTransform {
                    scale: 2.0,
                    offset_x: 1.0,
                    offset_y: 2.0,
                },
                marker: MarkerStyle {
                    radius: 3.0,
                    stroke_width: 1.0,
                    stroke_color: [0, 0, 255, 255],
                    fill_color: [0, 0, 0, 128],
                },
            },
        };
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn missing_or_broken_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"map": {"marker": {"radius": 8.0}}}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.map.marker.radius, 8.0);
        assert_eq!(cfg.map.marker.stroke_width, 10.0);
        assert_eq!(cfg.map.width, 8417);
        assert_eq!(cfg.map.height, 5000);
    }

    #[test]
    fn output_defaults_to_working_directory_png() {
        let cfg = Config {
            output: None,
            ..Config::default()
        };
        assert_eq!(cfg.output_path(), PathBuf::from("noita-deaths.png"));
    }
}
