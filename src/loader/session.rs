//! Batch load session state machine
//!
//! One [`LoadSession`] tracks one batch from submission to its single
//! terminal outcome. The session owns its result set, its callback, and
//! its own absorbing `resolved` flag; once any terminal transition has
//! fired, every later engine event or timer expiry against the session is
//! a no-op. The flag lives inside the session instance, never in the
//! loader, so a superseded batch can never suppress or trigger its
//! successor's callback.
//!
//! All transitions are applied on the loader task, strictly sequentially.
//! When the last pending clip's completion and the deadline race, whichever
//! message is processed first wins and the other is absorbed.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::engine::LoadHandle;
use crate::error::LoadError;
use crate::loader::types::{LoadResult, LoadState};

/// Terminal outcome delivered to the batch callback
#[derive(Debug)]
pub enum BatchOutcome {
    /// Every clip decoded; results are in request order
    Ready(Vec<LoadResult>),

    /// The batch failed as a whole
    Failed(LoadError),
}

/// Exactly-once notification for one batch
pub type LoadCallback = Box<dyn FnOnce(BatchOutcome) + Send + 'static>;

/// State machine for one batch of clip loads
pub(crate) struct LoadSession {
    /// Loader-assigned sequence number, used to discard stale timer fires
    seq: u64,

    /// One entry per submitted clip, in request order
    results: Vec<LoadResult>,

    /// Taken on first resolution; its absence makes a second dispatch
    /// structurally impossible
    callback: Option<LoadCallback>,

    /// Absorbing terminal flag
    resolved: bool,
}

impl LoadSession {
    pub(crate) fn new(seq: u64, callback: LoadCallback) -> Self {
        Self {
            seq,
            results: Vec::new(),
            callback: Some(callback),
            resolved: false,
        }
    }

    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Record one submitted clip. Handles are engine-assigned and unique
    /// within the session.
    pub(crate) fn record_submission(&mut self, clip_id: Uuid, handle: LoadHandle) {
        self.results.push(LoadResult {
            clip_id,
            handle,
            state: LoadState::Pending,
        });
    }

    /// Apply one engine completion event.
    ///
    /// The matching result moves out of `Pending` at most once; duplicate
    /// events, unknown handles, and anything arriving after resolution are
    /// ignored.
    pub(crate) fn record_completion(&mut self, handle: LoadHandle, success: bool) {
        if self.resolved {
            debug!("Ignoring engine event for resolved session (handle={:?})", handle);
            return;
        }
        match self.results.iter_mut().find(|r| r.handle == handle) {
            Some(result) if result.state == LoadState::Pending => {
                result.state = if success {
                    LoadState::Ready
                } else {
                    LoadState::Failed
                };
            }
            Some(_) => {
                debug!("Duplicate engine event for handle {:?}", handle);
            }
            None => {
                debug!("Engine event for unknown handle {:?}", handle);
            }
        }
    }

    /// Whether the batch has reached aggregate success.
    ///
    /// Success requires every clip `Ready`. A `Failed` clip does not end
    /// the batch early; the timeout is the only failure exit for a batch
    /// that submitted cleanly.
    pub(crate) fn is_complete(&self) -> bool {
        !self.resolved
            && !self.results.is_empty()
            && self.results.iter().all(|r| r.state == LoadState::Ready)
    }

    /// Dispatch the success outcome. The handle table must already be
    /// published so the callback can start playback immediately.
    pub(crate) fn resolve_success(&mut self) {
        if self.resolved {
            return;
        }
        self.resolved = true;
        if let Some(callback) = self.callback.take() {
            callback(BatchOutcome::Ready(self.results.clone()));
        }
    }

    /// Timer expiry. Returns true when this fire resolved the session;
    /// a timer reaching an already-resolved session is absorbed.
    pub(crate) fn on_timeout(&mut self) -> bool {
        if self.resolved {
            return false;
        }
        let outstanding = self
            .results
            .iter()
            .filter(|r| r.state != LoadState::Ready)
            .count();
        warn!(
            "Batch load timed out with {}/{} clips outstanding",
            outstanding,
            self.results.len()
        );
        self.resolved = true;
        if let Some(callback) = self.callback.take() {
            callback(BatchOutcome::Failed(LoadError::Timeout));
        }
        true
    }

    /// Submission fault: the whole batch fails, even if some clips had
    /// already decoded. Loads already handed to the engine are left to
    /// complete asynchronously; their events are absorbed.
    pub(crate) fn fail_submission(&mut self, detail: String) {
        if self.resolved {
            return;
        }
        self.resolved = true;
        if let Some(callback) = self.callback.take() {
            callback(BatchOutcome::Failed(LoadError::Submission(detail)));
        }
    }

    /// Result snapshot for table construction
    pub(crate) fn results(&self) -> &[LoadResult] {
        &self.results
    }
}
