//! Resource loading seam.
//!
//! A `ResourceLoader` knows how to fetch the full resource and the preview
//! metadata for a pattern. An `Executor` decides where that work runs and
//! hands back `LoadOutcome`s for the owner thread to apply.
//!
//! ## Threading
//!
//! `LoadWorker` runs every load on its own short-lived thread, so a load that
//! hangs (a FIFO in the content directory, a stalled mount) delays nothing
//! else. Threads are detached, so dropping the worker never waits on one.
//! Results travel back over an mpsc channel and are collected with a
//! non-blocking `try_recv()` from the owner's event loop, so all coordinator
//! and controller state stays on a single thread.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error};
use thiserror::Error;

use crate::catalog::PatternId;
use crate::preview::PreviewData;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceLoadError {
    #[error("no resource for pattern '{id}'")]
    NotFound { id: PatternId },

    #[error("pattern '{id}' is not in the catalog")]
    UnknownPattern { id: PatternId },

    #[error("failed to read resource for '{id}': {message}")]
    Io { id: PatternId, message: String },

    #[error("failed to decode resource for '{id}': {message}")]
    Decode { id: PatternId, message: String },

    #[error("failed to start load for '{id}': {message}")]
    SpawnFailed { id: PatternId, message: String },
}

/// Capability to fetch pattern resources. Implementations may block.
pub trait ResourceLoader: Send + Sync {
    /// Warm the full resource for `id`.
    fn load_full(&self, id: &PatternId) -> Result<(), ResourceLoadError>;

    /// Fetch the lightweight preview shown in the hover panel.
    fn load_preview(&self, id: &PatternId) -> Result<PreviewData, ResourceLoadError>;
}

impl<L: ResourceLoader + ?Sized> ResourceLoader for Arc<L> {
    fn load_full(&self, id: &PatternId) -> Result<(), ResourceLoadError> {
        (**self).load_full(id)
    }

    fn load_preview(&self, id: &PatternId) -> Result<PreviewData, ResourceLoadError> {
        (**self).load_preview(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    Full(PatternId),
    Preview { id: PatternId, generation: u64 },
}

impl LoadRequest {
    pub fn id(&self) -> &PatternId {
        match self {
            Self::Full(id) | Self::Preview { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Full {
        id: PatternId,
        result: Result<(), ResourceLoadError>,
    },
    Preview {
        id: PatternId,
        generation: u64,
        result: Result<PreviewData, ResourceLoadError>,
    },
}

/// Run a request against a loader, producing the matching outcome.
pub fn execute(loader: &dyn ResourceLoader, req: LoadRequest) -> LoadOutcome {
    match req {
        LoadRequest::Full(id) => {
            let result = loader.load_full(&id);
            LoadOutcome::Full { id, result }
        }
        LoadRequest::Preview { id, generation } => {
            let result = loader.load_preview(&id);
            LoadOutcome::Preview { id, generation, result }
        }
    }
}

/// The outcome of `req` when it could not be run at all.
pub fn fail(req: LoadRequest, error: ResourceLoadError) -> LoadOutcome {
    match req {
        LoadRequest::Full(id) => LoadOutcome::Full { id, result: Err(error) },
        LoadRequest::Preview { id, generation } => LoadOutcome::Preview {
            id,
            generation,
            result: Err(error),
        },
    }
}

/// Where loads run.
pub trait Executor {
    /// Start a load. Never blocks on the load itself.
    fn submit(&mut self, req: LoadRequest);

    /// Collect every outcome that has finished since the last call.
    fn drain(&mut self) -> Vec<LoadOutcome>;
}

// ---------------------------------------------------------------------------
// InlineExecutor: runs on submit, delivers on drain
// ---------------------------------------------------------------------------

/// Runs the loader synchronously inside `submit` but holds the outcome until
/// the next `drain`, so completions still arrive as deferred events.
pub struct InlineExecutor<L> {
    loader: L,
    ready: VecDeque<LoadOutcome>,
}

impl<L: ResourceLoader> InlineExecutor<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            ready: VecDeque::new(),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }
}

impl<L: ResourceLoader> Executor for InlineExecutor<L> {
    fn submit(&mut self, req: LoadRequest) {
        let outcome = execute(&self.loader, req);
        self.ready.push_back(outcome);
    }

    fn drain(&mut self) -> Vec<LoadOutcome> {
        self.ready.drain(..).collect()
    }
}

// ---------------------------------------------------------------------------
// LoadWorker: one detached thread per load
// ---------------------------------------------------------------------------

pub struct LoadWorker {
    loader: Arc<dyn ResourceLoader>,
    res_tx: mpsc::Sender<LoadOutcome>,
    res_rx: mpsc::Receiver<LoadOutcome>,
    /// Requests that never got a thread, answered on the next drain.
    rejected: Vec<LoadOutcome>,
}

impl LoadWorker {
    pub fn new(loader: Arc<dyn ResourceLoader>) -> Self {
        let (res_tx, res_rx) = mpsc::channel::<LoadOutcome>();
        Self {
            loader,
            res_tx,
            res_rx,
            rejected: Vec::new(),
        }
    }

    /// Block until one outcome arrives or `timeout` passes.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<LoadOutcome> {
        self.res_rx.recv_timeout(timeout).ok()
    }
}

impl Executor for LoadWorker {
    fn submit(&mut self, req: LoadRequest) {
        let loader = Arc::clone(&self.loader);
        let res_tx = self.res_tx.clone();
        let job = req.clone();
        // JoinHandle dropped: the thread is detached.
        let spawned = thread::Builder::new()
            .name(format!("load-{}", req.id()))
            .spawn(move || {
                debug!("load: {job:?}");
                let start = Instant::now();
                let outcome = execute(loader.as_ref(), job);
                debug!(
                    "load: done in {:.1}ms",
                    start.elapsed().as_secs_f64() * 1000.0
                );
                // Receiver gone means the owner has quit.
                let _ = res_tx.send(outcome);
            });
        if let Err(e) = spawned {
            error!("load: cannot start thread for {req:?}: {e}");
            let id = req.id().clone();
            self.rejected.push(fail(
                req,
                ResourceLoadError::SpawnFailed { id, message: e.to_string() },
            ));
        }
    }

    fn drain(&mut self) -> Vec<LoadOutcome> {
        let mut out = std::mem::take(&mut self.rejected);
        while let Ok(outcome) = self.res_rx.try_recv() {
            out.push(outcome);
        }
        out
    }
}
