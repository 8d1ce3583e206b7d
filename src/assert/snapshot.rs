//! Snapshot storage
//!
//! One file per key under the snapshot directory. The first check for a
//! key writes the received value; later checks compare against it.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SNAPSHOT_EXT: &str = "snap";

/// What a snapshot check did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotStatus {
    Written,
    Matched,
    Updated,
}

/// Keyed read-or-write-once snapshot store
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    dir: PathBuf,
    update: bool,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            update: false,
        }
    }

    /// Overwrite stored snapshots instead of comparing
    pub fn with_update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Key for a test title: whitespace runs and path separators become `_`
    pub fn key_for(title: &str) -> String {
        let mut key = String::with_capacity(title.len());
        let mut in_gap = false;
        for c in title.chars() {
            if c.is_whitespace() || c == '/' || c == '\\' {
                if !in_gap {
                    key.push('_');
                }
                in_gap = true;
            } else {
                key.push(c);
                in_gap = false;
            }
        }
        key
    }

    pub fn path_for(&self, title: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{SNAPSHOT_EXT}", Self::key_for(title)))
    }

    /// Literal string form stored on disk: strings verbatim, everything
    /// else as compact JSON
    pub fn literal(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Compare `received` with the snapshot stored for `title`, writing it
    /// when none exists yet
    pub fn check(&self, title: &str, received: &Value) -> Result<SnapshotStatus> {
        let path = self.path_for(title);
        let actual = Self::literal(received);

        if !path.exists() {
            self.write(&path, &actual)?;
            info!("Snapshot written: {}", path.display());
            return Ok(SnapshotStatus::Written);
        }

        let stored = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;

        if stored == actual {
            debug!("Snapshot matched: {}", path.display());
            return Ok(SnapshotStatus::Matched);
        }

        if self.update {
            self.write(&path, &actual)?;
            info!("Snapshot updated: {}", path.display());
            return Ok(SnapshotStatus::Updated);
        }

        bail!("Snapshot mismatch for '{title}': expected {stored}, received {actual}")
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create directory: {}", self.dir.display()))?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write snapshot: {}", path.display()))
    }
}
