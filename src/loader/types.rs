//! Request and result types shared across the loader

use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use crate::engine::LoadHandle;

/// Where a clip's encoded bytes come from
#[derive(Debug, Clone)]
pub enum ClipSource {
    /// Read the file at submission time
    File(PathBuf),

    /// Bytes already resident in memory
    Bytes(Arc<Vec<u8>>),
}

/// One clip to load as part of a batch
#[derive(Debug, Clone)]
pub struct ClipRequest {
    /// Logical identity of the clip; meaning is owned by the caller
    pub clip_id: Uuid,

    /// Source bytes for the clip
    pub source: ClipSource,

    /// Millisecond position hint into the clip timeline
    pub start_time: Option<u64>,

    /// Total clip duration hint in milliseconds
    pub total_time: Option<u64>,
}

impl ClipRequest {
    /// Whole-buffer request with no timing hints
    pub fn new(clip_id: Uuid, source: ClipSource) -> Self {
        Self {
            clip_id,
            source,
            start_time: None,
            total_time: None,
        }
    }

    /// Attach timing hints; zero values select the whole buffer
    pub fn with_timing(mut self, start_time: u64, total_time: u64) -> Self {
        self.start_time = Some(start_time);
        self.total_time = Some(total_time);
        self
    }
}

/// Tri-state decode outcome for one submitted clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Submitted, completion event not yet seen
    Pending,

    /// Decoded and playable
    Ready,

    /// Engine reported a decode failure
    Failed,
}

/// Per-clip outcome, reported back to the caller when the batch resolves
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// Back-reference to the originating request's identity
    pub clip_id: Uuid,

    /// Engine-assigned handle from submission
    pub handle: LoadHandle,

    /// Decode state; mutated at most once after submission
    pub state: LoadState,
}

/// Derive the byte range to submit for a request.
///
/// With both hints present and nonzero, the offset is the truncated
/// proportional position `start / total` into the buffer and the range
/// runs to the end of the buffer. Zero or missing hints select the whole
/// buffer from offset 0.
pub(crate) fn byte_range(
    start_time: Option<u64>,
    total_time: Option<u64>,
    available: usize,
) -> (usize, usize) {
    let start = start_time.unwrap_or(0);
    let total = total_time.unwrap_or(0);
    if start == 0 || total == 0 {
        return (0, available);
    }
    let offset = ((start as f64 / total as f64) * available as f64) as usize;
    let offset = offset.min(available);
    (offset, available - offset)
}
