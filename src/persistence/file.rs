//! File-backed snapshot store.
//!
//! Layout: `<root>/<kind>/<id>.json`, one pretty-printed JSON snapshot per
//! file, written atomically with a `.bak` of the previous version.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::{Snapshot, SnapshotKind, SnapshotRef, SnapshotStore};
use crate::error::{Error, Result};
use crate::util::{blocking, blocking_with_timeout, write_atomic};
use crate::{llog, llog_debug};

const IO_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    root: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(root: &Path, reference: &SnapshotRef) -> PathBuf {
        root.join(reference.kind().dir_name())
            .join(format!("{}.json", reference.id()))
    }

    /// Write under an explicit identifier, replacing any previous version.
    pub async fn save_as(&self, reference: &SnapshotRef, snapshot: &Snapshot) -> Result<()> {
        if reference.kind() != snapshot.kind {
            return Err(Error::Validation(format!(
                "cannot store a {} snapshot as a {}",
                snapshot.kind,
                reference.kind()
            )));
        }
        let contents = serde_json::to_vec_pretty(snapshot)?;
        let path = Self::path_for(&self.root, reference);
        llog_debug!(
            "FileSnapshotStore::save {} nodes={} path={}",
            reference,
            snapshot.nodes.len(),
            path.display()
        );
        blocking(move || write_atomic(&path, &contents)).await?;
        llog!("Saved {}", reference);
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn save(&self, snapshot: &Snapshot) -> Result<SnapshotRef> {
        let reference = SnapshotRef::new(snapshot.kind, Uuid::new_v4().to_string())?;
        self.save_as(&reference, snapshot).await?;
        Ok(reference)
    }

    async fn load(&self, reference: &SnapshotRef) -> Result<Snapshot> {
        let path = Self::path_for(&self.root, reference);
        llog_debug!("FileSnapshotStore::load {} path={}", reference, path.display());
        let missing = reference.to_string();

        let snapshot: Snapshot = blocking_with_timeout(IO_TIMEOUT, move || {
            if !path.exists() {
                return Err(Error::SnapshotNotFound(missing));
            }
            let contents = fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        })
        .await?;

        if snapshot.kind != reference.kind() {
            return Err(Error::Validation(format!(
                "{} holds a {} snapshot",
                reference, snapshot.kind
            )));
        }
        Ok(snapshot)
    }

    async fn list(&self, kind: SnapshotKind) -> Result<Vec<String>> {
        let dir = self.root.join(kind.dir_name());
        blocking(move || {
            if !dir.exists() {
                return Ok(Vec::new());
            }
            let mut ids: Vec<String> = fs::read_dir(&dir)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
                .collect();
            ids.sort();
            Ok(ids)
        })
        .await
    }
}
