use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

use crate::config::Config;
use crate::export::export_csv;
use crate::picker::{load_sessions, FixedFolder, FolderPicker};
use crate::render::MapView;
use crate::session::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browse,
    /// Typing a folder path; holds the text entered so far
    EnterFolder(String),
}

/// What the caller has to do after a key was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Redraw,
    OpenViewer(PathBuf),
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub config: Config,
    pub store: SessionStore,
    pub view: MapView,
    pub mode: Mode,
    pub csv_output: Option<PathBuf>,
    pub status: Option<String>,
    pub loaded_at: Option<DateTime<Local>>,
    /// Where the last pick's map was written, if it was
    pub saved: Option<PathBuf>,
    last_folder: Option<PathBuf>,
}

impl App {
    /// Mounts the map surface and tries the configured background.
    /// A background that fails to load only means markers are never drawn.
    pub fn new(config: Config) -> Self {
        let mut view = MapView::new(config.map);
        view.mount();
        let mut status = None;
        if let Some(path) = &config.background_image {
            if view.load_background(path).is_err() {
                status = Some(format!("map image not available: {}", path.display()));
            }
        }

        Self {
            last_folder: config.sessions_dir.clone(),
            config,
            store: SessionStore::new(),
            view,
            mode: Mode::Browse,
            csv_output: None,
            status,
            loaded_at: None,
            saved: None,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.config.output_path()
    }

    pub fn last_folder(&self) -> Option<&Path> {
        self.last_folder.as_deref()
    }

    /// Ask `picker` for a folder and replace all sessions with what it holds.
    /// Backing out of the pick leaves an empty map.
    pub fn pick<F: FolderPicker + ?Sized>(&mut self, picker: &mut F) {
        let sessions = match picker.pick() {
            Some(dir) => {
                let sessions = load_sessions(&dir);
                self.last_folder = Some(dir);
                sessions
            }
            None => Vec::new(),
        };
        self.store.replace(sessions);
        self.loaded_at = Some(Local::now());
        self.status = Some(self.publish());
    }

    pub fn load_folder<P: AsRef<Path>>(&mut self, dir: P) {
        self.pick(&mut FixedFolder::new(dir));
    }

    /// Repaint and write whatever outputs are configured; returns a status line
    fn publish(&mut self) -> String {
        self.saved = None;
        let count = self.store.len();
        let mut parts = vec![format!("{count} death{}", if count == 1 { "" } else { "s" })];

        if let (Some(path), Some(sessions)) = (&self.csv_output, self.store.sessions()) {
            match export_csv(path, sessions, &self.config.map.transform) {
                Ok(()) => parts.push(format!("csv: {}", path.display())),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "csv export failed");
                    parts.push(format!("csv failed: {e}"));
                }
            }
        }

        if self.view.refresh(&self.store) {
            let output = self.output_path();
            match self.view.save(&output) {
                Ok(()) => {
                    parts.push(format!("saved {}", output.display()));
                    self.saved = Some(output);
                }
                Err(e) => {
                    warn!(path = %output.display(), error = %e, "could not write map");
                    parts.push(format!("save failed: {e}"));
                }
            }
        } else if !self.view.has_background() {
            parts.push("no map image, nothing drawn".to_string());
        }

        parts.join(" | ")
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }

        match &mut self.mode {
            Mode::Browse => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
                KeyCode::Char('o') => {
                    let prefill = self
                        .last_folder
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    self.mode = Mode::EnterFolder(prefill);
                    Action::Redraw
                }
                KeyCode::Char('v') => self.saved.clone().map_or(Action::None, Action::OpenViewer),
                _ => Action::None,
            },
            Mode::EnterFolder(input) => match key.code {
                KeyCode::Enter => {
                    let dir = PathBuf::from(input.trim());
                    self.mode = Mode::Browse;
                    self.load_folder(dir);
                    Action::Redraw
                }
                KeyCode::Esc => {
                    self.mode = Mode::Browse;
                    self.pick(&mut FixedFolder::cancelled());
                    Action::Redraw
                }
                KeyCode::Backspace => {
                    input.pop();
                    Action::Redraw
                }
                KeyCode::Char(c) => {
                    input.push(c);
                    Action::Redraw
                }
                _ => Action::None,
            },
        }
    }
}
