use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::extractor::{extract_sessions, FileBlob};
use crate::session::SessionRecord;

/// Non-recursive listing of the regular files in `dir`, sorted by file name.
///
/// A folder that cannot be read is reported and treated like an empty pick.
pub fn list_folder<P: AsRef<Path>>(dir: P) -> Vec<FileBlob> {
    let dir = dir.as_ref();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "could not list sessions folder");
            return Vec::new();
        }
    };

    let mut blobs: Vec<FileBlob> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| FileBlob::new(entry.path()))
        .collect();
    blobs.sort_by(|a, b| a.path().cmp(b.path()));
    blobs
}

/// List `dir` and extract every death position found in it
pub fn load_sessions<P: AsRef<Path>>(dir: P) -> Vec<SessionRecord> {
    let dir = dir.as_ref();
    let blobs = list_folder(dir);
    let sessions = extract_sessions(&blobs);
    info!(
        dir = %dir.display(),
        files = blobs.len(),
        sessions = sessions.len(),
        "loaded sessions folder"
    );
    sessions
}

/// Something that asks the user for a sessions folder
pub trait FolderPicker {
    /// `None` when the user backed out of the choice
    fn pick(&mut self) -> Option<PathBuf>;
}

/// Always picks the same folder
#[derive(Debug, Clone)]
pub struct FixedFolder {
    path: Option<PathBuf>,
}

impl FixedFolder {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
        }
    }

    pub fn cancelled() -> Self {
        Self { path: None }
    }
}

impl FolderPicker for FixedFolder {
    fn pick(&mut self) -> Option<PathBuf> {
        self.path.clone()
    }
}
