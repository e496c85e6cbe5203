//! Cross-context execution of the surface pipeline.
//!
//! [`labelmap_to_surfaces`] runs the pipeline either on the calling thread
//! or in a background context. Offloaded requests move their buffers into
//! the background context and back; the result is identical in both modes.
//!
//! # Usage
//!
//! ```ignore
//! // Blocking, on the caller's thread
//! let surfaces = labelmap_to_surfaces(&volume, &ExtractionOptions::default())?.wait()?;
//!
//! // Offloaded, polled each frame
//! let options = ExtractionOptions::default().with_mode(ExecutionMode::Offloaded);
//! let mut extraction = labelmap_to_surfaces(&volume, &options)?;
//! if let Extraction::Pending(pending) = &mut extraction {
//!     if let Some(surfaces) = pending.poll() {
//!         // ...
//!     }
//! }
//! ```

mod handler;
mod message;
mod worker;

pub use handler::{handle_request, handle_request_with, receive_response};
pub use message::{
  ExtractionRequest, ExtractionResponse, RequestOptions, TransferKind, Transferable,
};
pub use worker::{ExecutorConfig, ExtractionExecutor, PendingExtraction, RequestId};

use crate::codec::serialize_volume;
use crate::error::Result;
use crate::pipeline::extract_surfaces;
use crate::types::{LabelValue, SurfaceMap, VolumeImage};

/// Where the pipeline runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
  /// On the calling thread, directly on the caller's volume.
  #[default]
  Synchronous,

  /// In a background context; the volume is serialized and moved.
  Offloaded,
}

/// Options for [`labelmap_to_surfaces`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractionOptions {
  /// Labels to extract; `None` extracts every non-zero label.
  pub segments: Option<Vec<LabelValue>>,

  pub mode: ExecutionMode,
}

impl ExtractionOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_segments(mut self, segments: impl Into<Vec<LabelValue>>) -> Self {
    self.segments = Some(segments.into());
    self
  }

  pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
    self.mode = mode;
    self
  }
}

/// Outcome of [`labelmap_to_surfaces`].
#[derive(Debug)]
pub enum Extraction {
  /// Synchronous result.
  Ready(SurfaceMap),

  /// Offloaded request in flight.
  Pending(PendingExtraction),
}

impl Extraction {
  /// Block until the surfaces are available.
  pub fn wait(self) -> Result<SurfaceMap> {
    match self {
      Extraction::Ready(surfaces) => Ok(surfaces),
      Extraction::Pending(pending) => pending.wait(),
    }
  }

  pub fn is_ready(&self) -> bool {
    matches!(self, Extraction::Ready(_))
  }
}

/// Extract one surface per label, on the calling thread or offloaded to
/// rayon's global pool.
///
/// Synchronous failures are returned directly. Offloaded failures surface
/// from [`PendingExtraction::poll`] or [`PendingExtraction::wait`].
pub fn labelmap_to_surfaces(volume: &VolumeImage, options: &ExtractionOptions) -> Result<Extraction> {
  labelmap_to_surfaces_on(&ExtractionExecutor::global(), volume, options)
}

/// [`labelmap_to_surfaces`] with an explicit background context.
pub fn labelmap_to_surfaces_on(
  executor: &ExtractionExecutor,
  volume: &VolumeImage,
  options: &ExtractionOptions,
) -> Result<Extraction> {
  match options.mode {
    ExecutionMode::Synchronous => {
      extract_surfaces(volume, options.segments.as_deref()).map(Extraction::Ready)
    }
    ExecutionMode::Offloaded => {
      let request = ExtractionRequest::new(serialize_volume(volume), options.segments.clone());
      Ok(Extraction::Pending(executor.submit(request)))
    }
  }
}
