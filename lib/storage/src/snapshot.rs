// Snapshot support for descriptor libraries
use atomicwrites::{AtomicFile, OverwriteBehavior};
use geosearch_core::descriptor::SCHEMA_VERSION;
use geosearch_core::{Descriptor, Error, ModelId, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Version of the snapshot file layout, independent of the descriptor schema
pub const SNAPSHOT_VERSION: u32 = 1;

/// One stored model
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub id: ModelId,
    pub descriptor: Arc<Descriptor>,
}

/// Whole-library snapshot: `{version, entries: [{id, descriptor}]}`
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub version: u32,
    pub entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    pub fn new(entries: Vec<SnapshotEntry>) -> Self {
        Self { version: SNAPSHOT_VERSION, entries }
    }
}

/// On-disk form read before descriptors are checked for their schema version
#[derive(Deserialize)]
struct RawSnapshot {
    version: u32,
    entries: Vec<RawEntry>,
}

#[derive(Deserialize)]
struct RawEntry {
    id: ModelId,
    descriptor: serde_json::Value,
}

/// Write `snapshot` as JSON, replacing `path` atomically.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let data = serde_json::to_vec(snapshot)?;
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(&data))
        .map_err(|e| Error::Persistence(format!("writing {}: {}", path.display(), e)))
}

/// Read a snapshot, dropping descriptors built with another schema version.
///
/// A descriptor without a `schemaVersion` counts as foreign.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let data = std::fs::read(path)?;
    let raw: RawSnapshot = serde_json::from_slice(&data)?;
    if raw.version != SNAPSHOT_VERSION {
        return Err(Error::Persistence(format!(
            "unsupported snapshot version {} in {}",
            raw.version,
            path.display()
        )));
    }

    let mut entries = Vec::with_capacity(raw.entries.len());
    for entry in raw.entries {
        let version = entry.descriptor.get("schemaVersion").and_then(|v| v.as_u64());
        if version != Some(SCHEMA_VERSION as u64) {
            warn!(
                model_id = %entry.id,
                version = ?version,
                expected = SCHEMA_VERSION,
                "skipping snapshot entry with foreign schema version"
            );
            continue;
        }
        let descriptor: Descriptor = serde_json::from_value(entry.descriptor)?;
        entries.push(SnapshotEntry { id: entry.id, descriptor: Arc::new(descriptor) });
    }

    Ok(Snapshot::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geosearch_core::{build_descriptor, primitives, DescriptorOptions};
    use tempfile::tempdir;

    fn cube_entry(id: &str) -> SnapshotEntry {
        let descriptor =
            build_descriptor(&primitives::unit_cube(), &DescriptorOptions::default()).unwrap();
        SnapshotEntry { id: ModelId::from(id), descriptor: Arc::new(descriptor) }
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("library.json");

        write_snapshot(&path, &Snapshot::new(vec![cube_entry("a"), cube_entry("b")])).unwrap();
        let loaded = read_snapshot(&path).unwrap();

        assert_eq!(loaded.version, SNAPSHOT_VERSION);
        assert_eq!(loaded.entries.len(), 2);
        assert_eq!(loaded.entries[1].id, ModelId::from("b"));
        assert_eq!(loaded.entries[0].descriptor, cube_entry("a").descriptor);
    }

    #[test]
    fn test_foreign_schema_entries_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("library.json");
        write_snapshot(&path, &Snapshot::new(vec![cube_entry("keep"), cube_entry("old")])).unwrap();

        let mut json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        json["entries"][1]["descriptor"]["schemaVersion"] = serde_json::json!(SCHEMA_VERSION + 1);
        std::fs::write(&path, serde_json::to_vec(&json).unwrap()).unwrap();

        let loaded = read_snapshot(&path).unwrap();
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.entries[0].id, ModelId::from("keep"));
    }

    #[test]
    fn test_untagged_entries_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("library.json");
        let entries = vec![cube_entry("tagged"), cube_entry("untagged")];
        write_snapshot(&path, &Snapshot::new(entries)).unwrap();

        let mut json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        json["entries"][1]["descriptor"].as_object_mut().unwrap().remove("schemaVersion");
        std::fs::write(&path, serde_json::to_vec(&json).unwrap()).unwrap();

        let loaded = read_snapshot(&path).unwrap();
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.entries[0].id, ModelId::from("tagged"));
    }

    #[test]
    fn test_unknown_snapshot_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("library.json");
        std::fs::write(&path, br#"{"version": 99, "entries": []}"#).unwrap();
        assert!(matches!(read_snapshot(&path), Err(Error::Persistence(_))));
    }

    #[test]
    fn test_missing_and_corrupt_files() {
        let dir = tempdir().unwrap();
        assert!(matches!(read_snapshot(&dir.path().join("absent.json")), Err(Error::Io(_))));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(matches!(read_snapshot(&path), Err(Error::Serialization(_))));
    }
}
