//! Audio engine abstraction
//!
//! The low-latency pool that actually decodes, holds, and mixes clips lives
//! behind the [`AudioEngine`] trait. The loader core never touches audio
//! bytes beyond marshaling them into [`ClipData`]; decode completion comes
//! back asynchronously as [`EngineEvent`]s on the channel the engine
//! receives at construction time.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::EngineSettings;
use crate::error::Result;
use crate::events::EngineEvent;

/// Engine-assigned identifier for a loaded clip, unique within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadHandle(pub u32);

/// Engine-assigned identifier for one active playback stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayHandle(pub u32);

/// Marshaled clip bytes handed to the engine for decoding
///
/// The range invariant holds at construction: `offset + length` never
/// exceeds `bytes.len()`.
#[derive(Debug, Clone)]
pub struct ClipData {
    /// Encoded source bytes, shared with the originating request
    pub bytes: Arc<Vec<u8>>,

    /// Start of the range to decode
    pub offset: usize,

    /// Length of the range to decode
    pub length: usize,

    /// Decode priority hint
    pub priority: u32,
}

/// Stream parameters for starting playback.
///
/// Defaults select full-volume, single-shot playback at normal rate.
#[derive(Debug, Clone)]
pub struct PlayParams {
    pub left_volume: f32,
    pub right_volume: f32,
    pub priority: u32,
    /// Number of repeats after the first play; 0 plays once
    pub loop_count: i32,
    /// Playback rate multiplier
    pub rate: f32,
}

impl Default for PlayParams {
    fn default() -> Self {
        Self {
            left_volume: 1.0,
            right_volume: 1.0,
            priority: 1,
            loop_count: 0,
            rate: 1.0,
        }
    }
}

/// The low-latency audio pool capability.
///
/// Implementations own decoding, sample storage, and mixing. Each
/// submitted load is reported exactly once through the event sender
/// supplied to the [`EngineFactory`]; duplicate reports are tolerated
/// upstream. `stop` and `unload` on handles the pool no longer knows are
/// no-ops by contract.
pub trait AudioEngine: Send + Sync {
    /// Submit a clip byte range for asynchronous decode into the pool
    fn submit_load(&self, data: ClipData) -> Result<LoadHandle>;

    /// Start playback of a loaded clip. `None` when the engine cannot
    /// allocate a stream.
    fn play(&self, handle: LoadHandle, params: &PlayParams) -> Option<PlayHandle>;

    /// Stop one active stream
    fn stop(&self, handle: PlayHandle);

    /// Pause every active stream
    fn pause_all(&self);

    /// Release pool resources held for one loaded clip
    fn unload(&self, handle: LoadHandle);
}

/// One-time constructor for the shared engine resource.
///
/// Invoked lazily on the first load path and never again once it has
/// succeeded; a failed acquisition is retried by the next batch.
pub type EngineFactory = Box<
    dyn Fn(mpsc::UnboundedSender<EngineEvent>, &EngineSettings) -> Result<Arc<dyn AudioEngine>>
        + Send
        + Sync,
>;
