//! File-backed persistence for the theme queue.
//!
//! Two JSON Lines resources under the data directory: `themes_pending.jsonl`,
//! the FIFO of themes waiting to be produced, and `themes_consumed.jsonl`,
//! the append-only log of every theme ever handed out. Reads fail open: a
//! missing or corrupt resource loads as empty, with a loud log line, so the
//! pipeline regenerates instead of stalling. Writes go through a temp file
//! and rename, so a crash mid-write never leaves a truncated resource.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::theme::Theme;

pub const PENDING_FILE: &str = "themes_pending.jsonl";
pub const CONSUMED_FILE: &str = "themes_consumed.jsonl";

/// One line of the consumed log: the theme plus when it was handed out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumedRecord {
    #[serde(flatten)]
    pub theme: Theme,
    pub consumed_at: DateTime<Utc>,
}

impl ConsumedRecord {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            consumed_at: Utc::now(),
        }
    }
}

/// In-memory snapshot of both collections, as read from disk.
#[derive(Debug, Default)]
pub struct StoreSnapshot {
    pub pending: Vec<Theme>,
    pub consumed: Vec<ConsumedRecord>,
}

/// Handle to the two queue resources on disk.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    pending_path: PathBuf,
    consumed_path: PathBuf,
}

impl ThemeStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            pending_path: data_dir.join(PENDING_FILE),
            consumed_path: data_dir.join(CONSUMED_FILE),
        }
    }

    pub fn pending_path(&self) -> &Path {
        &self.pending_path
    }

    pub fn consumed_path(&self) -> &Path {
        &self.consumed_path
    }

    /// Reads both collections. Never fails: losing dedup history to a corrupt
    /// file is recoverable, while refusing to start the pipeline is not.
    pub fn load(&self) -> StoreSnapshot {
        let pending = read_jsonl(&self.pending_path);
        let consumed = read_jsonl(&self.consumed_path);
        debug!(
            pending = pending.len(),
            consumed = consumed.len(),
            "Loaded theme store"
        );
        StoreSnapshot { pending, consumed }
    }

    /// Writes both collections back, each through its own atomic rename.
    ///
    /// Pending is written first: if the consumed write is lost to a crash,
    /// the popped theme disappears instead of coming back for a second
    /// production.
    pub fn persist(&self, pending: &[Theme], consumed: &[ConsumedRecord]) -> Result<(), StoreError> {
        write_jsonl(&self.pending_path, pending)?;
        write_jsonl(&self.consumed_path, consumed)?;
        debug!(
            pending = pending.len(),
            consumed = consumed.len(),
            "Persisted theme store"
        );
        Ok(())
    }
}

fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "Queue resource absent, starting empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(
                error = %e,
                path = %path.display(),
                "Failed to read queue resource, treating it as empty"
            );
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(
                    error = %e,
                    path = %path.display(),
                    line = index + 1,
                    "Corrupt queue resource, discarding its contents and starting empty"
                );
                return Vec::new();
            }
        }
    }
    records
}

fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    for record in records {
        let line = serde_json::to_string(record).map_err(|source| StoreError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        writeln!(tmp, "{line}").map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    tmp.persist(path).map_err(|e| StoreError::Write {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
