//! Background execution of extraction requests.
//!
//! # Flow
//!
//! ```text
//! Caller                               Background (rayon)
//! ┌───────────────────┐
//! │ serialize volume  │
//! │ build request     │
//! └─────────┬─────────┘
//!           │ submit()  (request moved, buffers follow)
//!           ▼
//!                                      ┌────────────────────┐
//!                                      │ handle_request()   │
//!                                      │ deserialize → mesh │
//!                                      │ → serialize        │
//!                                      └─────────┬──────────┘
//!                                                │ bounded(1) reply
//! ┌───────────────────┐                          │
//! │ poll() / wait()   │◄─────────────────────────┘
//! │ deserialize meshes│
//! └───────────────────┘
//! ```
//!
//! Exactly one reply is sent per request. A panic in the background context
//! or a context that exits without replying is reported as
//! [`SurfaceError::TransportFailure`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{self as channel, Receiver, RecvError, TryRecvError};

use crate::error::{Result, SurfaceError};
use crate::isosurface::IsoSurfaceExtractor;
use crate::types::SurfaceMap;

use super::handler::{handle_request, handle_request_with, receive_response};
use super::message::{ExtractionRequest, ExtractionResponse};

type Reply = Result<ExtractionResponse>;

/// Identifier for tracking submitted requests in logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
  fn next() -> Self {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    Self(COUNTER.fetch_add(1, Ordering::Relaxed))
  }

  pub fn get(self) -> u64 {
    self.0
  }
}

/// Configuration for a dedicated background pool.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutorConfig {
  /// Worker thread count; `None` lets rayon decide.
  pub num_threads: Option<usize>,

  /// Worker thread name prefix; threads are named `{prefix}-{index}`.
  pub thread_name_prefix: Option<String>,
}

impl ExecutorConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_num_threads(mut self, num_threads: usize) -> Self {
    self.num_threads = Some(num_threads);
    self
  }

  pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.thread_name_prefix = Some(prefix.into());
    self
  }
}

/// Background context for extraction requests.
///
/// Either rayon's global pool or a dedicated pool shared by every request
/// submitted through this executor.
#[derive(Clone, Default)]
pub struct ExtractionExecutor {
  pool: Option<Arc<rayon::ThreadPool>>,
}

impl ExtractionExecutor {
  /// Executor on rayon's global pool.
  pub fn global() -> Self {
    Self { pool: None }
  }

  /// Executor on a dedicated pool.
  pub fn new(config: ExecutorConfig) -> Result<Self> {
    let mut builder = rayon::ThreadPoolBuilder::new();

    if let Some(num_threads) = config.num_threads {
      builder = builder.num_threads(num_threads);
    }
    if let Some(prefix) = config.thread_name_prefix {
      builder = builder.thread_name(move |index| format!("{prefix}-{index}"));
    }

    let pool = builder
      .build()
      .map_err(|e| SurfaceError::transport(format!("failed to start worker pool: {e}")))?;

    Ok(Self {
      pool: Some(Arc::new(pool)),
    })
  }

  /// Number of worker threads available.
  pub fn num_threads(&self) -> usize {
    match &self.pool {
      Some(pool) => pool.current_num_threads(),
      None => rayon::current_num_threads(),
    }
  }

  /// Submit a request to the default handler (non-blocking).
  pub fn submit(&self, request: ExtractionRequest) -> PendingExtraction {
    self.dispatch(request, handle_request)
  }

  /// Submit a request handled with a custom extractor (non-blocking).
  pub fn submit_with<E>(&self, extractor: Arc<E>, request: ExtractionRequest) -> PendingExtraction
  where
    E: IsoSurfaceExtractor + ?Sized + 'static,
  {
    self.dispatch(request, move |request| handle_request_with(&*extractor, request))
  }

  /// Move `request` into the background context and run `handler` on it.
  pub fn dispatch<F>(&self, request: ExtractionRequest, handler: F) -> PendingExtraction
  where
    F: FnOnce(ExtractionRequest) -> Reply + Send + 'static,
  {
    let id = RequestId::next();
    let (sender, receiver) = channel::bounded::<Reply>(1);

    tracing::debug!(
      request = id.get(),
      scalar_bytes = request.volume.scalars.as_bytes().len(),
      "dispatching extraction request"
    );

    let job = move || {
      let reply = match panic::catch_unwind(AssertUnwindSafe(|| handler(request))) {
        Ok(reply) => reply,
        Err(payload) => Err(SurfaceError::transport(format!(
          "worker panicked: {}",
          panic_message(payload.as_ref())
        ))),
      };
      // Receiver dropped = terminated
      let _ = sender.send(reply);
    };

    match &self.pool {
      Some(pool) => pool.spawn(job),
      None => rayon::spawn(job),
    }

    PendingExtraction::new(id, receiver)
  }
}

impl std::fmt::Debug for ExtractionExecutor {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ExtractionExecutor")
      .field("dedicated", &self.pool.is_some())
      .field("num_threads", &self.num_threads())
      .finish()
  }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    (*s).to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic payload".to_string()
  }
}

/// Handle to a request running in the background.
#[derive(Debug)]
pub struct PendingExtraction {
  id: RequestId,
  receiver: Option<Receiver<Reply>>,
}

impl PendingExtraction {
  pub(crate) fn new(id: RequestId, receiver: Receiver<Reply>) -> Self {
    Self {
      id,
      receiver: Some(receiver),
    }
  }

  pub fn id(&self) -> RequestId {
    self.id
  }

  /// True until a reply (or failure) has been taken.
  pub fn is_pending(&self) -> bool {
    self.receiver.is_some()
  }

  /// Poll for the reply (non-blocking).
  ///
  /// Returns `None` while the request is running, and after the reply has
  /// already been taken.
  pub fn poll(&mut self) -> Option<Result<SurfaceMap>> {
    let receiver = self.receiver.as_ref()?;

    match receiver.try_recv() {
      Ok(reply) => {
        self.receiver = None;
        Some(self.finish(reply))
      }
      Err(TryRecvError::Empty) => None,
      Err(TryRecvError::Disconnected) => {
        self.receiver = None;
        Some(Err(self.vanished()))
      }
    }
  }

  /// Block until the reply arrives.
  pub fn wait(mut self) -> Result<SurfaceMap> {
    let receiver = self
      .receiver
      .take()
      .ok_or_else(|| SurfaceError::transport("reply already taken"))?;

    match receiver.recv() {
      Ok(reply) => self.finish(reply),
      Err(RecvError) => Err(self.vanished()),
    }
  }

  /// Abandon the request. The background work runs to completion and its
  /// reply is discarded.
  pub fn terminate(mut self) {
    tracing::debug!(request = self.id.get(), "extraction terminated");
    self.receiver = None;
  }

  fn finish(&self, reply: Reply) -> Result<SurfaceMap> {
    let surfaces = reply.and_then(receive_response);
    match &surfaces {
      Ok(map) => tracing::debug!(request = self.id.get(), labels = map.len(), "extraction complete"),
      Err(e @ SurfaceError::TransportFailure { .. }) => {
        tracing::warn!(request = self.id.get(), error = %e, "extraction transport failed")
      }
      Err(e) => tracing::debug!(request = self.id.get(), error = %e, "extraction failed"),
    }
    surfaces
  }

  fn vanished(&self) -> SurfaceError {
    tracing::warn!(request = self.id.get(), "worker exited without replying");
    SurfaceError::transport("worker exited without replying")
  }
}

#[cfg(test)]
#[path = "worker_test.rs"]
mod worker_test;
