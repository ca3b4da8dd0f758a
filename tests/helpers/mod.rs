//! Shared test helpers: a scriptable audio engine and callback capture
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use clip_pool::{
    AudioEngine, BatchOutcome, ClipData, EngineEvent, EngineFactory, EngineSettings, Error,
    LoadCallback, LoadHandle, PlayHandle, PlayParams, Result,
};

/// Scriptable in-memory engine.
///
/// Records every call and lets the test emit completion events on demand
/// through the event channel the factory received.
pub struct FakeEngine {
    event_tx: mpsc::UnboundedSender<EngineEvent>,
    pub settings: EngineSettings,
    next_handle: AtomicU32,
    next_play: AtomicU32,
    fail_submission: AtomicBool,
    submissions: Mutex<Vec<(LoadHandle, ClipData)>>,
    plays: Mutex<Vec<(LoadHandle, PlayParams)>>,
    stops: Mutex<Vec<PlayHandle>>,
    unloads: Mutex<Vec<LoadHandle>>,
    pauses: AtomicU32,
}

impl FakeEngine {
    fn new(event_tx: mpsc::UnboundedSender<EngineEvent>, settings: EngineSettings) -> Self {
        Self {
            event_tx,
            settings,
            next_handle: AtomicU32::new(1),
            next_play: AtomicU32::new(1),
            fail_submission: AtomicBool::new(false),
            submissions: Mutex::new(Vec::new()),
            plays: Mutex::new(Vec::new()),
            stops: Mutex::new(Vec::new()),
            unloads: Mutex::new(Vec::new()),
            pauses: AtomicU32::new(0),
        }
    }

    /// Emit one completion event for a handle
    pub fn complete(&self, handle: LoadHandle, success: bool) {
        let _ = self
            .event_tx
            .send(EngineEvent::LoadComplete { handle, success });
    }

    /// Emit completion events for every submission seen so far
    pub fn complete_all(&self, success: bool) {
        for handle in self.submitted_handles() {
            self.complete(handle, success);
        }
    }

    /// Make subsequent `submit_load` calls fail
    pub fn set_fail_submission(&self, fail: bool) {
        self.fail_submission.store(fail, Ordering::SeqCst);
    }

    pub fn submissions(&self) -> Vec<(LoadHandle, ClipData)> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn submitted_handles(&self) -> Vec<LoadHandle> {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .map(|(handle, _)| *handle)
            .collect()
    }

    pub fn plays(&self) -> Vec<(LoadHandle, PlayParams)> {
        self.plays.lock().unwrap().clone()
    }

    pub fn stops(&self) -> Vec<PlayHandle> {
        self.stops.lock().unwrap().clone()
    }

    pub fn unloads(&self) -> Vec<LoadHandle> {
        self.unloads.lock().unwrap().clone()
    }

    pub fn pause_count(&self) -> u32 {
        self.pauses.load(Ordering::SeqCst)
    }
}

impl AudioEngine for FakeEngine {
    fn submit_load(&self, data: ClipData) -> Result<LoadHandle> {
        if self.fail_submission.load(Ordering::SeqCst) {
            return Err(Error::Engine("submission refused".to_string()));
        }
        let handle = LoadHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.submissions.lock().unwrap().push((handle, data));
        Ok(handle)
    }

    fn play(&self, handle: LoadHandle, params: &PlayParams) -> Option<PlayHandle> {
        self.plays.lock().unwrap().push((handle, params.clone()));
        Some(PlayHandle(self.next_play.fetch_add(1, Ordering::SeqCst)))
    }

    fn stop(&self, handle: PlayHandle) {
        self.stops.lock().unwrap().push(handle);
    }

    fn pause_all(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }

    fn unload(&self, handle: LoadHandle) {
        self.unloads.lock().unwrap().push(handle);
    }
}

/// Factory-side observer: exposes the created engine to the test and can
/// script factory failures.
#[derive(Default)]
pub struct EngineProbe {
    engine: Mutex<Option<Arc<FakeEngine>>>,
    fail_factory: AtomicBool,
    factory_calls: AtomicU32,
}

impl EngineProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The engine built by the factory. Panics if no load has created it.
    pub fn engine(&self) -> Arc<FakeEngine> {
        self.try_engine().expect("engine not created yet")
    }

    pub fn try_engine(&self) -> Option<Arc<FakeEngine>> {
        self.engine.lock().unwrap().clone()
    }

    pub fn set_fail_factory(&self, fail: bool) {
        self.fail_factory.store(fail, Ordering::SeqCst);
    }

    pub fn factory_calls(&self) -> u32 {
        self.factory_calls.load(Ordering::SeqCst)
    }
}

/// Engine factory wired to a probe
pub fn fake_factory(probe: &Arc<EngineProbe>) -> EngineFactory {
    let probe = Arc::clone(probe);
    Box::new(move |event_tx, settings| {
        probe.factory_calls.fetch_add(1, Ordering::SeqCst);
        if probe.fail_factory.load(Ordering::SeqCst) {
            return Err(Error::Engine("no audio device".to_string()));
        }
        let engine = Arc::new(FakeEngine::new(event_tx, *settings));
        *probe.engine.lock().unwrap() = Some(Arc::clone(&engine));
        let engine: Arc<dyn AudioEngine> = engine;
        Ok(engine)
    })
}

/// Opt-in log output while debugging tests: RUST_LOG=debug cargo test
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// Callback that forwards its outcome to a channel the test can await
pub fn capture_outcome() -> (LoadCallback, mpsc::UnboundedReceiver<BatchOutcome>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback: LoadCallback = Box::new(move |outcome| {
        let _ = tx.send(outcome);
    });
    (callback, rx)
}

/// Wait until the engine exists and has seen `count` submissions.
///
/// Polls on a 1ms cadence so file-backed submissions, which hop through
/// the blocking pool, have time to land; under paused Tokio time the
/// sleeps resolve instantly.
pub async fn wait_for_submissions(probe: &EngineProbe, count: usize) {
    for _ in 0..500 {
        if let Some(engine) = probe.try_engine() {
            if engine.submissions().len() >= count {
                return;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }
    panic!("engine never saw {} submissions", count);
}

/// Give the loader task time to drain its queue, then assert no outcome
/// was dispatched.
pub async fn assert_no_outcome(rx: &mut mpsc::UnboundedReceiver<BatchOutcome>) {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    assert!(
        rx.try_recv().is_err(),
        "no callback should have fired here"
    );
}
