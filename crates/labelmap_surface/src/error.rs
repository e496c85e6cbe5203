//! Error types for extraction, codec and transport failures.

use thiserror::Error;

use crate::types::LabelValue;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SurfaceError>;

/// Failure of a labelmap-to-surface request.
///
/// Every variant is fatal to the call that produced it; no partial result is
/// returned alongside an error.
#[derive(Debug, Error)]
pub enum SurfaceError {
  /// Scalar buffer length does not match the declared dimensions.
  ///
  /// `expected` is `None` when the dimensions themselves are invalid: an
  /// empty axis, or a voxel count past `usize`.
  #[error("scalars length {actual} does not match dimensions {dimensions:?}")]
  ShapeMismatch {
    dimensions: [u32; 3],
    expected: Option<usize>,
    actual: usize,
  },

  /// The iso-surface extractor failed for one label.
  #[error("surface extraction failed for label {label}")]
  ExtractionFailure {
    label: LabelValue,
    #[source]
    cause: IsoSurfaceError,
  },

  /// The background execution context failed or vanished before replying.
  #[error("worker transport failed: {reason}")]
  TransportFailure { reason: String },

  /// A serialized message could not be decoded.
  #[error("malformed message: {reason}")]
  Malformed { reason: String },
}

impl SurfaceError {
  pub(crate) fn malformed(reason: impl Into<String>) -> Self {
    SurfaceError::Malformed {
      reason: reason.into(),
    }
  }

  pub(crate) fn transport(reason: impl Into<String>) -> Self {
    SurfaceError::TransportFailure {
      reason: reason.into(),
    }
  }
}

/// Failure inside an [`IsoSurfaceExtractor`](crate::isosurface::IsoSurfaceExtractor).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum IsoSurfaceError {
  #[error("iso-value {0} is not finite")]
  NonFiniteIsoValue(f32),

  /// More vertices than a `u32` connectivity array can address.
  #[error("{vertices} vertices exceed u32 index range")]
  IndexOverflow { vertices: usize },

  /// Custom extractor failure.
  #[error("{0}")]
  Other(String),
}
