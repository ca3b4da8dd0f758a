//! Batch clip loading
//!
//! The loader accepts a batch of clip requests and a callback, submits the
//! batch to the audio engine, and arbitrates the race between aggregate
//! decode completion and the batch deadline. The caller hears back exactly
//! once per started batch; afterwards, playback is serviced through the
//! handle table built from the resolved results.
//!
//! One spawned task owns all session state. New-batch commands, engine
//! completion events, and timer expiries all arrive on the same unbounded
//! channel and are applied in arrival order, so no session transition ever
//! races another. Engine events that arrive while a batch is still
//! submitting queue up behind the in-flight command and are examined only
//! once the full request set has been recorded.

mod session;
mod table;
mod types;

pub use session::{BatchOutcome, LoadCallback};
pub use table::HandleTable;
pub use types::{ClipRequest, ClipSource, LoadResult, LoadState};

use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::engine::{AudioEngine, ClipData, EngineFactory, LoadHandle, PlayHandle, PlayParams};
use crate::error::{LoadError, Result};
use crate::events::EngineEvent;
use session::LoadSession;
use types::byte_range;

/// Messages processed by the loader task
enum LoaderMessage {
    /// Start a new batch, superseding any batch still in flight
    Load {
        requests: Vec<ClipRequest>,
        callback: LoadCallback,
    },

    /// Relayed engine notification
    Engine(EngineEvent),

    /// Deadline expiry for the batch with this sequence number
    Timeout { seq: u64 },
}

/// State shared between the loader task and the playback surface
struct LoaderShared {
    /// Lazily acquired engine; empty until the first load path runs
    engine: OnceCell<Arc<dyn AudioEngine>>,

    /// Handle table of the most recently resolved batch
    table: RwLock<Option<HandleTable>>,
}

/// Facade over the batch-load session machinery.
///
/// Creating a loader spawns its task; the engine itself is not constructed
/// until the first `load` call reaches it. Dropping the loader closes the
/// command channel and the task winds down once outstanding timers drain.
pub struct ClipLoader {
    tx: mpsc::UnboundedSender<LoaderMessage>,
    shared: Arc<LoaderShared>,
}

impl ClipLoader {
    /// Create a loader. Must be called within a Tokio runtime.
    pub fn new(config: Config, factory: EngineFactory) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(LoaderShared {
            engine: OnceCell::new(),
            table: RwLock::new(None),
        });

        let task = LoaderTask {
            config,
            factory,
            shared: Arc::clone(&shared),
            tx: tx.downgrade(),
            session: None,
            next_seq: 0,
        };
        tokio::spawn(task.run(rx));

        Self { tx, shared }
    }

    /// Start loading a batch, replacing any batch still in flight.
    ///
    /// An empty request set fails synchronously with
    /// [`LoadError::NoRequests`]: no timer is armed, no session is created,
    /// and an in-flight batch is left untouched. Every other terminal
    /// outcome arrives through `callback`, exactly once.
    pub fn load(&self, requests: Vec<ClipRequest>, callback: LoadCallback) {
        if requests.is_empty() {
            warn!("load() called with an empty request set");
            callback(BatchOutcome::Failed(LoadError::NoRequests));
            return;
        }
        if self
            .tx
            .send(LoaderMessage::Load { requests, callback })
            .is_err()
        {
            error!("Loader task is gone; dropping load request");
        }
    }

    /// Start playback of a clip from the most recently resolved batch with
    /// default stream parameters.
    ///
    /// `None` means the handle does not belong to the most recently
    /// resolved batch, or the engine could not allocate a stream.
    pub fn play(&self, handle: LoadHandle) -> Option<PlayHandle> {
        self.play_with(handle, &PlayParams::default())
    }

    /// [`play`](Self::play) with explicit stream parameters
    pub fn play_with(&self, handle: LoadHandle, params: &PlayParams) -> Option<PlayHandle> {
        let recognized = self
            .shared
            .table
            .read()
            .unwrap()
            .as_ref()
            .is_some_and(|table| table.contains(handle));
        if !recognized {
            debug!("Play request for unrecognized handle {:?}", handle);
            return None;
        }
        self.shared.engine.get()?.play(handle, params)
    }

    /// Stop one active stream. Delegated unconditionally; stopping a
    /// stream the engine no longer knows is a no-op.
    pub fn stop(&self, handle: PlayHandle) {
        if let Some(engine) = self.shared.engine.get() {
            engine.stop(handle);
        }
    }

    /// Engine handle for a clip identity, if it is part of the most
    /// recently resolved batch.
    pub fn handle_for(&self, clip_id: Uuid) -> Option<LoadHandle> {
        self.shared
            .table
            .read()
            .unwrap()
            .as_ref()
            .and_then(|table| table.handle_for(clip_id))
    }

    /// Pause all streams and request unload of every tracked clip, once
    /// per call. The engine resource itself stays warm for the next batch,
    /// and the handle table is kept; the engine treats operations on
    /// unloaded handles as no-ops. Safe to call repeatedly.
    pub fn release_all(&self) {
        let engine = match self.shared.engine.get() {
            Some(engine) => engine,
            None => return,
        };
        engine.pause_all();
        let table = self.shared.table.read().unwrap();
        if let Some(table) = table.as_ref() {
            info!("Releasing {} loaded clips", table.len());
            for handle in table.handles() {
                engine.unload(handle);
            }
        }
    }
}

/// Task-side state: the active session and the engine plumbing
struct LoaderTask {
    config: Config,
    factory: EngineFactory,
    shared: Arc<LoaderShared>,

    /// Weak self-sender for timers and the event relay, so the task does
    /// not keep its own channel open after the loader is dropped
    tx: mpsc::WeakUnboundedSender<LoaderMessage>,

    /// The currently active session; replaced wholesale on each load
    session: Option<LoadSession>,

    /// Monotonic batch sequence counter
    next_seq: u64,
}

impl LoaderTask {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<LoaderMessage>) {
        debug!("Clip loader task started");
        while let Some(message) = rx.recv().await {
            match message {
                LoaderMessage::Load { requests, callback } => {
                    self.start_batch(requests, callback).await;
                }
                LoaderMessage::Engine(EngineEvent::LoadComplete { handle, success }) => {
                    self.on_load_complete(handle, success);
                }
                LoaderMessage::Timeout { seq } => {
                    self.on_timeout(seq);
                }
            }
        }
        debug!("Clip loader task exiting");
    }

    /// Acquire the shared engine, constructing it exactly once.
    ///
    /// A failed acquisition leaves the cell empty, so the next batch
    /// retries the factory.
    async fn engine(&mut self) -> Result<Arc<dyn AudioEngine>> {
        self.shared
            .engine
            .get_or_try_init(|| async {
                let settings = self.config.engine;
                info!("Creating audio engine (max_streams={})", settings.max_streams);

                let (event_tx, mut event_rx) = mpsc::unbounded_channel();
                let relay_tx = self.tx.clone();
                tokio::spawn(async move {
                    while let Some(event) = event_rx.recv().await {
                        let tx = match relay_tx.upgrade() {
                            Some(tx) => tx,
                            None => break,
                        };
                        if tx.send(LoaderMessage::Engine(event)).is_err() {
                            break;
                        }
                    }
                });

                (self.factory)(event_tx, &settings)
            })
            .await
            .map(Arc::clone)
    }

    /// Begin a new batch, superseding any session still in flight.
    ///
    /// The superseded session keeps its own absorbing flag, so its late
    /// timer and engine events can neither fire its callback nor touch the
    /// new session.
    async fn start_batch(&mut self, requests: Vec<ClipRequest>, callback: LoadCallback) {
        self.next_seq += 1;
        let seq = self.next_seq;
        if let Some(old) = self.session.take() {
            if !old.is_resolved() {
                info!("Superseding unresolved batch (seq={})", old.seq());
            }
        }
        let mut session = LoadSession::new(seq, callback);

        let engine = match self.engine().await {
            Ok(engine) => engine,
            Err(e) => {
                error!("Engine acquisition failed: {}", e);
                session.fail_submission(e.to_string());
                self.session = Some(session);
                return;
            }
        };

        // The deadline covers everything below, including per-clip byte
        // reads.
        let timeout = self.config.load_timeout();
        let timer_tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(tx) = timer_tx.upgrade() {
                let _ = tx.send(LoaderMessage::Timeout { seq });
            }
        });

        info!("Loading batch of {} clips (seq={})", requests.len(), seq);
        for request in &requests {
            match self.submit_one(engine.as_ref(), request).await {
                Ok(handle) => {
                    debug!(
                        "Submitted clip {} as handle {:?} (seq={})",
                        request.clip_id, handle, seq
                    );
                    session.record_submission(request.clip_id, handle);
                }
                Err(e) => {
                    warn!("Submission failed for clip {}: {}", request.clip_id, e);
                    session.fail_submission(e.to_string());
                    break;
                }
            }
        }
        self.session = Some(session);
    }

    /// Read a request's bytes and hand the derived range to the engine
    async fn submit_one(
        &mut self,
        engine: &dyn AudioEngine,
        request: &ClipRequest,
    ) -> Result<LoadHandle> {
        let bytes = match &request.source {
            ClipSource::File(path) => Arc::new(tokio::fs::read(path).await?),
            ClipSource::Bytes(bytes) => Arc::clone(bytes),
        };
        let (offset, length) = byte_range(request.start_time, request.total_time, bytes.len());
        engine.submit_load(ClipData {
            bytes,
            offset,
            length,
            priority: self.config.submit_priority,
        })
    }

    fn on_load_complete(&mut self, handle: LoadHandle, success: bool) {
        let session = match self.session.as_mut() {
            Some(session) => session,
            None => {
                debug!("Engine event with no active session (handle={:?})", handle);
                return;
            }
        };
        session.record_completion(handle, success);
        if session.is_complete() {
            // Publish the table before dispatching so the callback can
            // start playback immediately.
            let table = HandleTable::from_results(session.results());
            info!(
                "Batch resolved: {} clips ready (seq={})",
                table.len(),
                session.seq()
            );
            *self.shared.table.write().unwrap() = Some(table);
            session.resolve_success();
        }
    }

    fn on_timeout(&mut self, seq: u64) {
        match self.session.as_mut() {
            Some(session) if session.seq() == seq => {
                session.on_timeout();
            }
            _ => {
                debug!("Stale timer fire (seq={})", seq);
            }
        }
    }
}
