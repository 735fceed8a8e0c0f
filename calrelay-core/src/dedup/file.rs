//! Flat-file backend: one id per line, sorted, rewritten atomically.
//!
//! Writers take an exclusive lock on a `.lock` sidecar and merge with
//! whatever is on disk, so overlapping runs never drop each other's ids.

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use super::{DedupStore, check_id};
use crate::error::{RelayError, RelayResult};

pub struct FileStore {
    path: PathBuf,
    ids: BTreeSet<String>,
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.to_path_buf().into_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn read_ids(path: &Path) -> RelayResult<BTreeSet<String>> {
    if !path.exists() {
        return Ok(BTreeSet::new());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| RelayError::Store(format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(content
        .lines()
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

impl FileStore {
    /// Load the id list at `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> RelayResult<Self> {
        Ok(FileStore {
            path: path.to_path_buf(),
            ids: read_ids(path)?,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Held until dropped.
    fn lock(&self) -> RelayResult<File> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let lock_path = sibling(&self.path, ".lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        file.lock_exclusive()?;
        Ok(file)
    }

    fn write(&self, ids: &BTreeSet<String>) -> RelayResult<()> {
        let temp = sibling(&self.path, ".tmp");
        let content: Vec<&str> = ids.iter().map(String::as_str).collect();
        std::fs::write(&temp, content.join("\n"))?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn merge_and_write(&self, ids: &[String]) -> RelayResult<BTreeSet<String>> {
        let _lock = self.lock()?;
        let mut next = read_ids(&self.path)?;
        let before = next.len();
        next.extend(ids.iter().cloned());
        if next.len() != before {
            self.write(&next)?;
        }
        Ok(next)
    }
}

impl DedupStore for FileStore {
    fn exists(&self, id: &str) -> RelayResult<bool> {
        check_id(id)?;
        Ok(self.ids.contains(id))
    }

    fn record(&mut self, ids: &[String]) -> RelayResult<()> {
        for id in ids {
            check_id(id)?;
            if id.contains('\n') {
                return Err(RelayError::Store(format!(
                    "event id {:?} cannot be stored in a line-based file",
                    id
                )));
            }
        }
        if ids.is_empty() {
            return Ok(());
        }

        let next = self
            .merge_and_write(ids)
            .map_err(|e| RelayError::Store(format!("Failed to write {}: {}", self.path.display(), e)))?;
        self.ids = next;
        Ok(())
    }
}
