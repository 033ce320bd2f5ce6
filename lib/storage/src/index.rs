use crate::snapshot::{read_snapshot, write_snapshot, Snapshot, SnapshotEntry};
use ahash::AHashMap;
use geosearch_core::descriptor::SCHEMA_VERSION;
use geosearch_core::{
    build_descriptor, CancelToken, Descriptor, DescriptorOptions, Mesh, ModelId, Result,
};
use geosearch_similarity::{RankOptions, Ranker, SimilarityResult};
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Summary of an index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub total_descriptors: usize,
    pub schema_version: u32,
}

/// In-memory library of model descriptors
///
/// One writer at a time, any number of concurrent readers. Ranking holds the
/// read lock for a whole pass, so results always come from a single
/// consistent view of the library.
#[derive(Debug, Default)]
pub struct DescriptorIndex {
    entries: RwLock<AHashMap<ModelId, Arc<Descriptor>>>,
}

impl DescriptorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a descriptor, returning the one it replaced.
    pub fn upsert(&self, id: ModelId, descriptor: Descriptor) -> Option<Arc<Descriptor>> {
        self.entries.write().insert(id, Arc::new(descriptor))
    }

    /// Build a descriptor for `mesh` and store it under `id`.
    pub fn insert_mesh(
        &self,
        id: ModelId,
        mesh: &Mesh,
        options: &DescriptorOptions,
    ) -> Result<Arc<Descriptor>> {
        let descriptor = Arc::new(build_descriptor(mesh, options)?);
        self.entries.write().insert(id, descriptor.clone());
        Ok(descriptor)
    }

    pub fn remove(&self, id: &ModelId) -> Option<Arc<Descriptor>> {
        self.entries.write().remove(id)
    }

    pub fn get(&self, id: &ModelId) -> Option<Arc<Descriptor>> {
        self.entries.read().get(id).cloned()
    }

    pub fn contains(&self, id: &ModelId) -> bool {
        self.entries.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// All ids, sorted
    pub fn ids(&self) -> Vec<ModelId> {
        let mut ids: Vec<ModelId> = self.entries.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Point-in-time copy of every entry, sorted by id
    pub fn entries(&self) -> Vec<(ModelId, Arc<Descriptor>)> {
        let mut entries: Vec<_> = self
            .entries
            .read()
            .iter()
            .map(|(id, d)| (id.clone(), d.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Replace the whole library with descriptors built from `meshes`.
    ///
    /// Builds run in parallel; the swap happens only if every build
    /// succeeds, otherwise the first error is returned and the index is left
    /// untouched.
    pub fn rebuild(
        &self,
        meshes: &[(ModelId, Mesh)],
        options: &DescriptorOptions,
    ) -> Result<usize> {
        let built: Vec<(ModelId, Arc<Descriptor>)> = meshes
            .par_iter()
            .map(|(id, mesh)| -> Result<(ModelId, Arc<Descriptor>)> {
                Ok((id.clone(), Arc::new(build_descriptor(mesh, options)?)))
            })
            .collect::<Result<_>>()?;

        let built: AHashMap<ModelId, Arc<Descriptor>> = built.into_iter().collect();
        let count = built.len();
        *self.entries.write() = built;
        info!(descriptors = count, "rebuilt descriptor index");
        Ok(count)
    }

    /// Rank every stored descriptor against `query`.
    pub fn rank(
        &self,
        query: &Descriptor,
        ranker: &Ranker,
        options: &RankOptions,
    ) -> Vec<SimilarityResult> {
        let entries = self.entries.read();
        ranker.rank(query, entries.iter().map(|(id, d)| (id, d.as_ref())), options)
    }

    pub fn rank_with_cancel(
        &self,
        query: &Descriptor,
        ranker: &Ranker,
        options: &RankOptions,
        cancel: &CancelToken,
    ) -> Result<Vec<SimilarityResult>> {
        let entries = self.entries.read();
        let candidates = entries.iter().map(|(id, d)| (id, d.as_ref()));
        ranker.rank_with_cancel(query, candidates, options, cancel)
    }

    /// Models most similar to the stored model `id`, excluding itself.
    ///
    /// An unknown id yields no results.
    pub fn similar_to(
        &self,
        id: &ModelId,
        ranker: &Ranker,
        options: &RankOptions,
    ) -> Vec<SimilarityResult> {
        let entries = self.entries.read();
        let Some(query) = entries.get(id) else {
            debug!(model_id = %id, "similarity query for unknown model");
            return Vec::new();
        };

        let candidates = entries
            .iter()
            .filter(|(other, _)| *other != id)
            .map(|(other, d)| (other, d.as_ref()));
        ranker.rank(query, candidates, options)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_descriptors: self.len(),
            schema_version: SCHEMA_VERSION,
        }
    }

    /// Write the library to `path` as a JSON snapshot.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let entries: Vec<SnapshotEntry> = self
            .entries()
            .into_iter()
            .map(|(id, descriptor)| SnapshotEntry { id, descriptor })
            .collect();
        let count = entries.len();
        write_snapshot(path, &Snapshot::new(entries))?;
        info!(descriptors = count, path = %path.display(), "saved descriptor index");
        Ok(())
    }

    /// Load a library previously written by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let snapshot = read_snapshot(path)?;
        let mut entries: AHashMap<ModelId, Arc<Descriptor>> =
            AHashMap::with_capacity(snapshot.entries.len());
        for entry in snapshot.entries {
            if entries.insert(entry.id.clone(), entry.descriptor).is_some() {
                warn!(
                    model_id = %entry.id,
                    path = %path.display(),
                    "duplicate id in snapshot; keeping the later entry"
                );
            }
        }
        info!(descriptors = entries.len(), path = %path.display(), "loaded descriptor index");
        Ok(Self { entries: RwLock::new(entries) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geosearch_core::{primitives, Error};
    use tempfile::tempdir;

    fn everything() -> RankOptions {
        RankOptions { threshold: 0.0, limit: 100, prefilter: None }
    }

    fn sample_index() -> DescriptorIndex {
        let index = DescriptorIndex::new();
        let options = DescriptorOptions::default();
        index.insert_mesh(ModelId::from("cube"), &primitives::unit_cube(), &options).unwrap();
        let slightly_off = primitives::cuboid(1.0, 1.2, 0.9);
        index.insert_mesh(ModelId::from("box"), &slightly_off, &options).unwrap();
        let sphere = primitives::icosphere(0.62, 2);
        index.insert_mesh(ModelId::from("sphere"), &sphere, &options).unwrap();
        index
    }

    #[test]
    fn test_basic_operations() {
        let index = sample_index();
        assert_eq!(index.len(), 3);
        assert!(!index.is_empty());
        assert!(index.contains(&ModelId::from("cube")));
        assert_eq!(
            index.ids(),
            vec![ModelId::from("box"), ModelId::from("cube"), ModelId::from("sphere")]
        );

        let removed = index.remove(&ModelId::from("box")).unwrap();
        assert_eq!(removed.face_count, 12);
        assert!(index.get(&ModelId::from("box")).is_none());
        assert_eq!(
            index.stats(),
            IndexStats { total_descriptors: 2, schema_version: SCHEMA_VERSION }
        );
    }

    #[test]
    fn test_upsert_replaces() {
        let index = sample_index();
        let sphere = index.get(&ModelId::from("sphere")).unwrap();
        let previous = index.upsert(ModelId::from("cube"), (*sphere).clone()).unwrap();
        assert_eq!(previous.face_count, 12);
        assert_eq!(index.get(&ModelId::from("cube")).unwrap().face_count, sphere.face_count);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_insert_invalid_mesh_leaves_index_unchanged() {
        let index = sample_index();
        let options = DescriptorOptions::default();
        let result = index.insert_mesh(ModelId::from("bad"), &Mesh::default(), &options);
        assert!(matches!(result, Err(Error::EmptyMesh)));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_similar_to_excludes_self() {
        let index = sample_index();
        let results = index.similar_to(&ModelId::from("cube"), &Ranker::default(), &everything());
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.model_id != ModelId::from("cube")));
        assert_eq!(results[0].model_id, ModelId::from("box"));
    }

    #[test]
    fn test_similar_to_unknown_id() {
        let index = sample_index();
        let ranker = Ranker::default();
        let results = index.similar_to(&ModelId::from("missing"), &ranker, &everything());
        assert!(results.is_empty());
    }

    #[test]
    fn test_rank_includes_self() {
        let index = sample_index();
        let query = index.get(&ModelId::from("sphere")).unwrap();
        let results = index.rank(&query, &Ranker::default(), &everything());
        assert_eq!(results[0].model_id, ModelId::from("sphere"));
        assert_eq!(results[0].similarity, 1.0);
    }

    #[test]
    fn test_rebuild_swaps_all_or_nothing() {
        let index = sample_index();
        let options = DescriptorOptions::default();

        let bad = vec![
            (ModelId::from(1u64), primitives::unit_cube()),
            (ModelId::from(2u64), Mesh::default()),
        ];
        assert!(index.rebuild(&bad, &options).is_err());
        assert_eq!(index.len(), 3);

        let good = vec![
            (ModelId::from(1u64), primitives::unit_cube()),
            (ModelId::from(2u64), primitives::torus(2.0, 0.5, 16, 8)),
        ];
        assert_eq!(index.rebuild(&good, &options).unwrap(), 2);
        assert_eq!(index.ids(), vec![ModelId::from(1u64), ModelId::from(2u64)]);
        assert_eq!(index.get(&ModelId::from(2u64)).unwrap().genus, 1);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("library.json");
        let index = sample_index();
        index.save(&path).unwrap();

        let loaded = DescriptorIndex::load(&path).unwrap();
        assert_eq!(loaded.ids(), index.ids());
        assert_eq!(loaded.get(&ModelId::from("cube")), index.get(&ModelId::from("cube")));

        let before = index.similar_to(&ModelId::from("cube"), &Ranker::default(), &everything());
        let after = loaded.similar_to(&ModelId::from("cube"), &Ranker::default(), &everything());
        assert_eq!(before, after);
    }

    #[test]
    fn test_concurrent_readers() {
        let index = Arc::new(sample_index());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let index = index.clone();
                std::thread::spawn(move || {
                    let ranker = Ranker::default();
                    index.similar_to(&ModelId::from("cube"), &ranker, &everything()).len()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 2);
        }
    }

    #[test]
    fn test_load_keeps_last_duplicate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("library.json");
        let options = DescriptorOptions::default();
        let cube = Arc::new(build_descriptor(&primitives::unit_cube(), &options).unwrap());
        let torus = primitives::torus(2.0, 0.5, 16, 8);
        let ring = Arc::new(build_descriptor(&torus, &options).unwrap());

        let entries = vec![
            SnapshotEntry { id: ModelId::from("part"), descriptor: cube },
            SnapshotEntry { id: ModelId::from("part"), descriptor: ring.clone() },
        ];
        write_snapshot(&path, &Snapshot::new(entries)).unwrap();

        let loaded = DescriptorIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get(&ModelId::from("part")).unwrap(), ring);
    }
}
