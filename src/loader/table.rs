//! Resolved-batch handle table

use std::collections::HashMap;

use uuid::Uuid;

use crate::engine::LoadHandle;
use crate::loader::types::LoadResult;

/// Mapping from clip identity to engine load handle for the most recently
/// resolved batch.
///
/// Built once, at success resolution, and used to validate that a handle
/// belongs to the current batch before delegating playback to the engine.
/// Releasing the batch's samples does not clear the table; the engine
/// treats operations on unloaded handles as no-ops.
#[derive(Debug, Clone, Default)]
pub struct HandleTable {
    by_clip: HashMap<Uuid, LoadHandle>,
}

impl HandleTable {
    pub(crate) fn from_results(results: &[LoadResult]) -> Self {
        let by_clip = results.iter().map(|r| (r.clip_id, r.handle)).collect();
        Self { by_clip }
    }

    /// Whether `handle` belongs to this batch
    pub fn contains(&self, handle: LoadHandle) -> bool {
        self.by_clip.values().any(|h| *h == handle)
    }

    /// Engine handle for a clip identity, if it was part of this batch
    pub fn handle_for(&self, clip_id: Uuid) -> Option<LoadHandle> {
        self.by_clip.get(&clip_id).copied()
    }

    /// All tracked handles, in no particular order
    pub fn handles(&self) -> impl Iterator<Item = LoadHandle> + '_ {
        self.by_clip.values().copied()
    }

    /// Number of tracked clips
    pub fn len(&self) -> usize {
        self.by_clip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_clip.is_empty()
    }
}
