use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub const APP_NAME: &'static str = "noita-deathmap";
    pub const DEFAULT_OUTPUT: &'static str = "noita-deaths.png";

    /// Where Noita keeps one `*_stats.xml` per finished run
    pub fn noita_sessions_dir() -> Option<PathBuf> {
        BaseDirs::new()
            .map(|base| {
                base.home_dir()
                    .join("AppData")
                    .join("LocalLow")
                    .join("Nolla_Games_Noita")
                    .join("save00")
                    .join("stats")
                    .join("sessions")
            })
            .filter(|dir| dir.is_dir())
    }

    /// Where the background map is looked for when none is configured
    pub fn default_map_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", Self::APP_NAME)
            .map(|proj_dirs| proj_dirs.data_local_dir().join("map.png"))
    }

    pub fn log_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(Self::APP_NAME);
            Some(state_dir.join(format!("{}.log", Self::APP_NAME)))
        } else {
            ProjectDirs::from("", "", Self::APP_NAME).map(|proj_dirs| {
                proj_dirs
                    .data_local_dir()
                    .join(format!("{}.log", Self::APP_NAME))
            })
        }
    }
}
