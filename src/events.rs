//! Engine notification events
//!
//! The audio engine reports decode completion asynchronously on the event
//! channel it receives at construction time. Events are delivered at most
//! once per load handle; the loader tolerates duplicates and stragglers
//! that arrive after a batch has resolved.

use crate::engine::LoadHandle;

/// Asynchronous notifications emitted by the audio engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// A submitted load finished decoding.
    LoadComplete {
        /// Handle assigned at submission time
        handle: LoadHandle,

        /// True when the clip decoded and is playable
        success: bool,
    },
}
