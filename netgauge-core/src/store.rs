use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::compare::{ComparisonResult, compare};
use crate::report::{SessionReport, is_report_id};

/// Alias accepted by [`SessionStore::load`] for the newest stored report.
pub const LATEST: &str = "latest";

const LATEST_FILE: &str = "latest.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error at `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("report `{0}` not found")]
    NotFound(String),

    #[error("report `{0}` already exists")]
    AlreadyExists(String),

    #[error("invalid report id `{0}`")]
    InvalidId(String),

    #[error("failed to encode report: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode `{path}`: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// The requested report does not exist or could never exist.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidId(_))
    }

    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Canonical on-disk encoding: pretty JSON plus a trailing newline.
pub fn encode_report(report: &SessionReport) -> Result<Vec<u8>, StoreError> {
    let mut bytes = serde_json::to_vec_pretty(report).map_err(StoreError::Encode)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Reports stored as `<id>.json` files in one directory, with `latest.json` mirroring the newest.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Writes `report` once. Existing reports are never overwritten.
    pub fn save(&self, report: &SessionReport) -> Result<PathBuf, StoreError> {
        if !is_report_id(&report.id) {
            return Err(StoreError::InvalidId(report.id.clone()));
        }

        std::fs::create_dir_all(&self.dir).map_err(|err| StoreError::io(&self.dir, err))?;

        let bytes = encode_report(report)?;
        let path = self.path_for(&report.id);

        self.write_temp(&bytes)?
            .persist_noclobber(&path)
            .map_err(|err| {
                if err.error.kind() == io::ErrorKind::AlreadyExists {
                    StoreError::AlreadyExists(report.id.clone())
                } else {
                    StoreError::io(&path, err.error)
                }
            })?;

        let latest = self.dir.join(LATEST_FILE);
        self.write_temp(&bytes)?
            .persist(&latest)
            .map_err(|err| StoreError::io(&latest, err.error))?;

        tracing::debug!(path = %path.display(), "report saved");
        Ok(path)
    }

    /// Loads a report by id; [`LATEST`] resolves to the newest one.
    pub fn load(&self, id: &str) -> Result<SessionReport, StoreError> {
        if id == LATEST {
            return self.latest();
        }
        if !is_report_id(id) {
            return Err(StoreError::InvalidId(id.to_string()));
        }

        let path = self.path_for(id);
        let bytes = std::fs::read(&path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                StoreError::NotFound(id.to_string())
            } else {
                StoreError::io(&path, err)
            }
        })?;

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode { path, source })
    }

    /// Stored report ids, oldest first. A missing directory is an empty store.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::io(&self.dir, err)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| StoreError::io(&self.dir, err))?;
            let name = entry.file_name();
            let Some(id) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if is_report_id(id) {
                ids.push(id.to_string());
            }
        }

        // Ids are fixed-width UTC timestamps, so lexical order is chronological.
        ids.sort();
        Ok(ids)
    }

    pub fn latest(&self) -> Result<SessionReport, StoreError> {
        let ids = self.list()?;
        let id = ids
            .last()
            .ok_or_else(|| StoreError::NotFound(LATEST.to_string()))?;
        self.load(id)
    }

    pub fn compare(&self, before_id: &str, after_id: &str) -> Result<ComparisonResult, StoreError> {
        let before = self.load(before_id)?;
        let after = self.load(after_id)?;
        Ok(compare(&before, &after))
    }

    fn write_temp(&self, bytes: &[u8]) -> Result<NamedTempFile, StoreError> {
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|err| StoreError::io(&self.dir, err))?;
        tmp.write_all(bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|err| StoreError::io(tmp.path(), err))?;
        Ok(tmp)
    }
}
