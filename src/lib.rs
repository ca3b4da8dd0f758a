//! # clip-pool
//!
//! Batch loader for short audio clips backed by a low-latency playback
//! pool.
//!
//! **Purpose:** Submit a batch of clip byte ranges to an audio engine,
//! track their asynchronous decode completions, arbitrate the race between
//! aggregate success and a deadline, and notify the caller exactly once
//! per batch. Once a batch resolves, the loader services `play`/`stop`
//! against the handle table built from the results.
//!
//! **Architecture:** One loader task serializes every session transition;
//! the engine is a capability behind the [`engine::AudioEngine`] trait,
//! acquired lazily and shared process-wide.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod loader;

pub use config::{Config, EngineSettings};
pub use engine::{AudioEngine, ClipData, EngineFactory, LoadHandle, PlayHandle, PlayParams};
pub use error::{Error, LoadError, Result};
pub use events::EngineEvent;
pub use loader::{
    BatchOutcome, ClipLoader, ClipRequest, ClipSource, HandleTable, LoadCallback, LoadResult,
    LoadState,
};
