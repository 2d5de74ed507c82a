use super::SnapshotStore;
use crate::error::{EngineError, Result};
use crate::types::snapshot::{RankedRow, Snapshot};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

pub const FORMAT_VERSION: u32 = 1;
const FILE_PREFIX: &str = "snapshot-";
const FILE_SUFFIX: &str = ".json";

#[derive(Serialize)]
struct SnapshotFileOut<'a> {
    format_version: u32,
    as_of: NaiveDate,
    generated_at: DateTime<Utc>,
    digest: String,
    rows: &'a [RankedRow],
}

#[derive(Deserialize)]
struct SnapshotFileIn {
    format_version: u32,
    as_of: NaiveDate,
    digest: String,
    rows: Vec<RankedRow>,
}

/// Snapshot store backed by one JSON file per cycle in a directory.
#[derive(Debug)]
pub struct FsSnapshotStore {
    dir: PathBuf,
    store: SnapshotStore,
}

impl FsSnapshotStore {
    /// Loads every snapshot file in `dir`. A missing directory is an empty store.
    pub fn open(dir: &Path, retention: Option<usize>) -> Result<Self> {
        let mut store = SnapshotStore::new(retention);
        for (as_of, path) in list_snapshot_files(dir) {
            let snapshot = load_snapshot_file(&path)?;
            if snapshot.as_of() != as_of {
                return Err(EngineError::SnapshotIntegrity(format!(
                    "{}: file name says {as_of} but content is dated {}",
                    path.display(),
                    snapshot.as_of()
                )));
            }
            store.append(snapshot)?;
        }
        debug!(
            dir = %dir.display(),
            addressable = store.len(),
            latest = ?store.latest().map(Snapshot::as_of),
            "opened snapshot store"
        );
        Ok(Self {
            dir: dir.to_path_buf(),
            store,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Writes the snapshot file, then appends it to the in-memory store.
    pub fn persist(&mut self, snapshot: Snapshot) -> Result<PathBuf> {
        self.store.check_order(snapshot.as_of())?;
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(snapshot_file_name(snapshot.as_of()));
        let encoded = encode_snapshot(&snapshot)?;
        fs::write(&path, encoded)?;
        info!(path = %path.display(), rows = snapshot.len(), "persisted snapshot");
        self.store.append(snapshot)?;
        Ok(path)
    }
}

pub fn snapshot_file_name(as_of: NaiveDate) -> String {
    format!("{FILE_PREFIX}{}{FILE_SUFFIX}", as_of.format("%Y-%m-%d"))
}

fn parse_snapshot_file_name(name: &str) -> Option<NaiveDate> {
    let stem = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}

/// Snapshot files directly inside `dir`, oldest first.
fn list_snapshot_files(dir: &Path) -> Vec<(NaiveDate, PathBuf)> {
    let mut files: Vec<(NaiveDate, PathBuf)> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let as_of = parse_snapshot_file_name(entry.file_name().to_str()?)?;
            Some((as_of, entry.path().to_path_buf()))
        })
        .collect();
    files.sort();
    files
}

fn rows_digest(rows: &[RankedRow]) -> Result<String> {
    let bytes = serde_json::to_vec(rows)?;
    Ok(sha256_hex(&bytes))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{digest:x}")
}

pub fn encode_snapshot(snapshot: &Snapshot) -> Result<String> {
    let file = SnapshotFileOut {
        format_version: FORMAT_VERSION,
        as_of: snapshot.as_of(),
        generated_at: Utc::now(),
        digest: rows_digest(snapshot.rows())?,
        rows: snapshot.rows(),
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

pub fn decode_snapshot(content: &str) -> Result<Snapshot> {
    let file: SnapshotFileIn = serde_json::from_str(content)?;
    if file.format_version != FORMAT_VERSION {
        return Err(EngineError::SnapshotIntegrity(format!(
            "unsupported format_version {} (expected {FORMAT_VERSION})",
            file.format_version
        )));
    }
    let actual = rows_digest(&file.rows)?;
    if actual != file.digest {
        return Err(EngineError::SnapshotIntegrity(format!(
            "{}: digest mismatch (recorded {}, computed {actual})",
            file.as_of, file.digest
        )));
    }
    Snapshot::new(file.as_of, file.rows)
}

pub fn load_snapshot_file(path: &Path) -> Result<Snapshot> {
    if !path.exists() {
        return Err(EngineError::SnapshotNotFound(path.display().to_string()));
    }
    let content = fs::read_to_string(path)?;
    decode_snapshot(&content).map_err(|e| match e {
        EngineError::Json(err) => {
            EngineError::SnapshotIntegrity(format!("{}: {err}", path.display()))
        }
        other => other,
    })
}
