//! Local reference corpus used for plagiarism comparison.
//!
//! Entries are `.txt` files under the configured corpus directory, loaded
//! once at startup. Reads take a snapshot so an in-flight comparison never
//! observes a partially applied append.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid corpus entry id: {0:?}")]
    InvalidId(String),
}

#[derive(Debug, Clone)]
pub struct CorpusEntry {
    /// File stem the entry was loaded from, or the id passed to `append`.
    pub id: String,
    pub text: String,
}

pub struct CorpusStore {
    dir: PathBuf,
    entries: RwLock<Vec<CorpusEntry>>,
}

impl CorpusStore {
    /// Load every `.txt` file under `dir` (recursively). A missing
    /// directory yields an empty corpus, not an error.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        let mut entries = Vec::new();

        if dir.is_dir() {
            load_dir(&dir, &mut entries)?;
        } else {
            tracing::warn!(dir = %dir.display(), "corpus directory not found, starting empty");
        }

        entries.sort_by(|a, b| a.id.cmp(&b.id));
        tracing::info!(count = entries.len(), dir = %dir.display(), "loaded corpus");

        Ok(Self {
            dir,
            entries: RwLock::new(entries),
        })
    }

    /// An empty in-memory store rooted at `dir` (created on first append).
    pub fn empty(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of all entries, copy-on-read.
    pub fn entries(&self) -> Vec<CorpusEntry> {
        self.entries.read().expect("corpus lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("corpus lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist a new entry and make it visible to subsequent comparisons.
    ///
    /// The file write happens before the in-memory insert, so a failed
    /// append leaves the snapshot unchanged.
    pub fn append(&self, id: &str, text: &str) -> Result<(), StoreError> {
        let file_name = sanitize_id(id)?;
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.dir.join(format!("{file_name}.txt")), text)?;

        let mut entries = self.entries.write().expect("corpus lock poisoned");
        entries.push(CorpusEntry {
            id: file_name,
            text: text.to_string(),
        });
        Ok(())
    }
}

fn load_dir(dir: &Path, entries: &mut Vec<CorpusEntry>) -> Result<(), StoreError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            load_dir(&path, entries)?;
        } else if path.extension().is_some_and(|ext| ext == "txt") {
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    let id = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    entries.push(CorpusEntry {
                        id,
                        text: content.trim().to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable corpus file");
                }
            }
        }
    }
    Ok(())
}

/// Turn an arbitrary id into a safe file stem. Spaces become underscores;
/// a trailing `.pdf`/`.txt` is dropped; path separators are rejected.
fn sanitize_id(id: &str) -> Result<String, StoreError> {
    let stem = id
        .trim()
        .trim_end_matches(".pdf")
        .trim_end_matches(".txt")
        .replace(' ', "_");

    if stem.is_empty() || stem.contains(['/', '\\']) || stem.starts_with('.') {
        return Err(StoreError::InvalidId(id.to_string()));
    }
    Ok(stem)
}
