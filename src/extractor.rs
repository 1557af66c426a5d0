use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::session::SessionRecord;

/// Files that are not named like this are never opened
pub const STATS_SUFFIX: &str = "stats.xml";

const ROOT_TAG: &str = "Stats";
const STATS_TAG: &str = "stats";
const DEATH_X_ATTR: &str = "death_pos.x";
const DEATH_Y_ATTR: &str = "death_pos.y";

/// Anything with a file name and readable text content
pub trait SessionBlob {
    fn name(&self) -> &str;
    fn text(&self) -> io::Result<String>;
}

/// A file on disk, read lazily when extraction gets to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    name: String,
    path: PathBuf,
}

impl FileBlob {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionBlob for FileBlob {
    fn name(&self) -> &str {
        &self.name
    }

    /// Bytes that are not valid UTF-8 are replaced, so a stray byte in an
    /// unrelated attribute does not cost the whole record
    fn text(&self) -> io::Result<String> {
        fs::read(&self.path).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// An in-memory file, handy for tests and for callers that already hold the bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBlob {
    pub name: String,
    pub contents: String,
}

impl MemoryBlob {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

impl SessionBlob for MemoryBlob {
    fn name(&self) -> &str {
        &self.name
    }

    fn text(&self) -> io::Result<String> {
        Ok(self.contents.clone())
    }
}

/// Why a stats file produced no record. Only ever logged.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("could not read file: {0}")]
    Unreadable(#[from] io::Error),
    #[error("invalid xml: {0}")]
    InvalidXml(#[from] roxmltree::Error),
    #[error("missing <{0}> element")]
    MissingNode(&'static str),
    #[error("more than one <{0}> element")]
    RepeatedNode(&'static str),
    #[error("missing attribute {0}")]
    MissingAttribute(&'static str),
    #[error("{attr}={value:?} is not a usable coordinate")]
    InvalidCoordinate { attr: &'static str, value: String },
}

pub fn is_stats_file(name: &str) -> bool {
    name.ends_with(STATS_SUFFIX)
}

/// Parse one stats document into its death position.
///
/// Zero counts as missing, so a death at exactly 0 on either axis is dropped
/// along with empty, non-numeric and non-finite values.
pub fn parse_session(text: &str) -> Result<SessionRecord, SkipReason> {
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();
    if !root.has_tag_name(ROOT_TAG) {
        return Err(SkipReason::MissingNode(ROOT_TAG));
    }

    let mut stats_nodes = root
        .children()
        .filter(|n| n.is_element() && n.has_tag_name(STATS_TAG));
    let stats = stats_nodes
        .next()
        .ok_or(SkipReason::MissingNode(STATS_TAG))?;
    if stats_nodes.next().is_some() {
        return Err(SkipReason::RepeatedNode(STATS_TAG));
    }

    let x = coordinate(stats.attribute(DEATH_X_ATTR), DEATH_X_ATTR)?;
    let y = coordinate(stats.attribute(DEATH_Y_ATTR), DEATH_Y_ATTR)?;

    Ok(SessionRecord::new(x, y))
}

fn coordinate(raw: Option<&str>, attr: &'static str) -> Result<f64, SkipReason> {
    let raw = raw.ok_or(SkipReason::MissingAttribute(attr))?;
    let trimmed = raw.trim();
    let value = if trimmed.is_empty() {
        0.0
    } else {
        trimmed.parse::<f64>().unwrap_or(f64::NAN)
    };

    if value.is_finite() && value != 0.0 {
        Ok(value)
    } else {
        Err(SkipReason::InvalidCoordinate {
            attr,
            value: raw.to_string(),
        })
    }
}

fn blob_to_session<B: SessionBlob>(blob: &B) -> Option<SessionRecord> {
    let parsed = blob
        .text()
        .map_err(SkipReason::from)
        .and_then(|text| parse_session(&text));

    match parsed {
        Ok(record) => Some(record),
        Err(reason) => {
            debug!(file = blob.name(), %reason, "skipping session file");
            None
        }
    }
}

/// Pull every valid death position out of `blobs`.
///
/// Files are read and parsed in parallel; the result keeps the input order
/// of the files that yielded a record. Nothing here fails: bad files are
/// simply absent from the output.
#[instrument(skip_all, fields(files = blobs.len()))]
pub fn extract_sessions<B: SessionBlob + Sync>(blobs: &[B]) -> Vec<SessionRecord> {
    let sessions: Vec<SessionRecord> = blobs
        .par_iter()
        .filter(|blob| is_stats_file(blob.name()))
        .filter_map(blob_to_session)
        .collect();

    debug!(sessions = sessions.len(), "extraction finished");
    sessions
}
