use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Container;
use crate::engine::SnapshotRecord;
use crate::error::{LibcorralError, Result};
use crate::gate::Precondition;

// Layout of the timestamp the engine stores next to each snapshot.
const TIMESTAMP_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// A point in time copy of a container's storage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Engine assigned, `snap<N>`.
    pub name: String,
    pub comment_path: PathBuf,
    pub timestamp: String,
    pub path: PathBuf,
}

impl Snapshot {
    /// Wall clock time the snapshot was taken, in the host's local time.
    pub fn created(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.timestamp.trim(), TIMESTAMP_FORMAT).ok()
    }
}

impl From<SnapshotRecord> for Snapshot {
    fn from(record: SnapshotRecord) -> Self {
        Self {
            name: record.name,
            comment_path: record.comment_path,
            timestamp: record.timestamp,
            path: record.path,
        }
    }
}

impl Container {
    /// Snapshots the container's storage. The container has to be stopped so
    /// the copy is consistent.
    pub fn create_snapshot(&self) -> Result<Snapshot> {
        self.snapshot_with(None)
    }

    /// Like [`Container::create_snapshot`], storing the contents of
    /// `comment_file` alongside the snapshot.
    pub fn create_snapshot_with_comment(&self, comment_file: &Path) -> Result<Snapshot> {
        self.snapshot_with(Some(comment_file))
    }

    fn snapshot_with(&self, comment_file: Option<&Path>) -> Result<Snapshot> {
        self.make_sure(Precondition::DEFINED | Precondition::NOT_RUNNING)?;

        let inner = self.write();
        tracing::debug!(name = %inner.name(), ?comment_file, "snapshotting container");
        let index = inner.engine().snapshot(comment_file);
        if index < 0 {
            tracing::error!(name = %inner.name(), "engine failed to snapshot container");
            return Err(LibcorralError::CreateSnapshotFailed { name: inner.name() });
        }

        let name = format!("snap{index}");
        let listed = inner
            .engine()
            .snapshot_list()
            .and_then(|records| records.into_iter().find(|record| record.name == name));
        Ok(listed.map(Snapshot::from).unwrap_or(Snapshot {
            name,
            ..Default::default()
        }))
    }

    /// Snapshots of the container, oldest first.
    ///
    /// A container without snapshots reports `NoSnapshot` rather than an
    /// empty list.
    pub fn snapshots(&self) -> Result<Vec<Snapshot>> {
        self.make_sure(Precondition::DEFINED)?;

        let inner = self.write();
        match inner.engine().snapshot_list() {
            Some(records) if !records.is_empty() => {
                Ok(records.into_iter().map(Snapshot::from).collect())
            }
            Some(_) => Err(LibcorralError::NoSnapshot { name: inner.name() }),
            None => {
                tracing::warn!(name = %inner.name(), "engine failed to list snapshots");
                Err(LibcorralError::NoSnapshot { name: inner.name() })
            }
        }
    }

    /// Materializes `snapshot` as a new, independent container `new_name`.
    pub fn restore_snapshot(&self, snapshot: &Snapshot, new_name: &str) -> Result<()> {
        self.make_sure(Precondition::DEFINED)?;

        let inner = self.write();
        tracing::debug!(name = %inner.name(), snapshot = %snapshot.name, new_name, "restoring snapshot");
        if !inner.engine().snapshot_restore(&snapshot.name, new_name) {
            tracing::error!(name = %inner.name(), snapshot = %snapshot.name, "engine failed to restore snapshot");
            return Err(LibcorralError::RestoreSnapshotFailed {
                name: inner.name(),
                snapshot: snapshot.name.clone(),
                new_name: new_name.into(),
            });
        }
        Ok(())
    }

    pub fn destroy_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        self.make_sure(Precondition::DEFINED)?;

        let inner = self.write();
        tracing::debug!(name = %inner.name(), snapshot = %snapshot.name, "destroying snapshot");
        if !inner.engine().snapshot_destroy(&snapshot.name) {
            return Err(LibcorralError::DestroySnapshotFailed {
                name: inner.name(),
                snapshot: snapshot.name.clone(),
            });
        }
        Ok(())
    }

    pub fn destroy_all_snapshots(&self) -> Result<()> {
        self.make_sure(Precondition::DEFINED)?;

        let inner = self.write();
        tracing::debug!(name = %inner.name(), "destroying all snapshots");
        if !inner.engine().snapshot_destroy_all() {
            return Err(LibcorralError::DestroyAllSnapshotsFailed { name: inner.name() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Datelike, Timelike};

    use super::*;
    use crate::engine::memory::{MemoryEngine, Primitive};

    fn created(engine: &MemoryEngine) -> Result<Container> {
        let container = Container::new(engine, "rubik", None)?;
        container.create("busybox", &[])?;
        Ok(container)
    }

    #[test]
    fn test_snapshot_round_trip() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = created(&engine)?;

        let first = container.create_snapshot()?;
        let second = container.create_snapshot()?;
        assert_eq!(first.name, "snap0");
        assert_eq!(second.name, "snap1");

        let names: Vec<String> = container.snapshots()?.into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["snap0", "snap1"]);

        container.destroy_snapshot(&first)?;
        let names: Vec<String> = container.snapshots()?.into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["snap1"]);
        Ok(())
    }

    #[test]
    fn test_no_snapshot() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = created(&engine)?;

        let err = container.snapshots().unwrap_err();
        assert!(matches!(err, LibcorralError::NoSnapshot { .. }));
        assert!(!err.is_engine_failure());
        Ok(())
    }

    #[test]
    fn test_snapshot_requires_stopped() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = created(&engine)?;
        container.start()?;

        assert!(matches!(
            container.create_snapshot(),
            Err(LibcorralError::AlreadyRunning { .. })
        ));
        assert_eq!(engine.calls("rubik", Primitive::Snapshot), 0);
        Ok(())
    }

    #[test]
    fn test_snapshot_with_comment() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = created(&engine)?;

        let snapshot = container.create_snapshot_with_comment(Path::new("/tmp/comment"))?;
        assert_eq!(snapshot.comment_path, Path::new("/tmp/comment"));
        Ok(())
    }

    #[test]
    fn test_restore_snapshot() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = created(&engine)?;
        let snapshot = container.create_snapshot()?;

        container.restore_snapshot(&snapshot, "rubik-restored")?;
        assert!(Container::new(&engine, "rubik-restored", None)?.defined());
        assert!(container.defined());
        assert_eq!(container.snapshots()?.len(), 1);

        let missing = Snapshot {
            name: "snap9".into(),
            ..Default::default()
        };
        assert!(matches!(
            container.restore_snapshot(&missing, "other"),
            Err(LibcorralError::RestoreSnapshotFailed { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_destroy_missing_snapshot() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = created(&engine)?;

        let missing = Snapshot {
            name: "snap3".into(),
            ..Default::default()
        };
        assert!(matches!(
            container.destroy_snapshot(&missing),
            Err(LibcorralError::DestroySnapshotFailed { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_destroy_all_snapshots() -> Result<()> {
        let engine = MemoryEngine::default();
        let container = created(&engine)?;
        container.create_snapshot()?;
        container.create_snapshot()?;

        container.destroy_all_snapshots()?;
        assert!(matches!(
            container.snapshots(),
            Err(LibcorralError::NoSnapshot { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_created_timestamp() {
        let snapshot = Snapshot {
            name: "snap0".into(),
            timestamp: "2024:03:17 09:41:05".into(),
            ..Default::default()
        };
        let created = snapshot.created().unwrap();
        assert_eq!((created.year(), created.month(), created.day()), (2024, 3, 17));
        assert_eq!((created.hour(), created.minute()), (9, 41));

        let garbled = Snapshot {
            timestamp: "yesterday".into(),
            ..snapshot
        };
        assert_eq!(garbled.created(), None);
    }
}
