//! labelmap_surface - Per-label surface extraction from 3D labelmaps
//!
//! A labelmap is a regular 3D grid of integer labels where `0` is
//! background. This crate turns it into one closed triangle mesh per label,
//! either on the calling thread or offloaded to a background context with
//! zero-copy buffer hand-off.
//!
//! # Features
//!
//! - **Mask extraction**: per-label binary masks with geometry preserved
//! - **Label discovery**: distinct non-zero labels in ascending order
//! - **Surface Nets**: iso-surfaces at 0.5 with gradient or geometry normals
//! - **Worker protocol**: request/response messages whose buffers move
//!   between contexts, plus a little-endian wire encoding
//!
//! # Example
//!
//! ```ignore
//! use labelmap_surface::{labelmap_to_surfaces, ExtractionOptions, Scalars, VolumeImage};
//!
//! let volume = VolumeImage::with_scalars(
//!     [2, 2, 2],
//!     Scalars::U8(vec![0, 1, 1, 0, 2, 2, 0, 0]),
//! )?;
//!
//! let surfaces = labelmap_to_surfaces(&volume, &ExtractionOptions::default())?.wait()?;
//! for (label, mesh) in &surfaces {
//!     println!("label {label}: {} triangles", mesh.triangle_count());
//! }
//! ```

pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use error::{IsoSurfaceError, Result, SurfaceError};
pub use types::{
  LabelValue, MinMaxAABB, Scalars, SurfaceMap, SurfaceMesh, VolumeImage, IDENTITY_DIRECTION,
};

// Per-label masks and label enumeration
pub mod mask;
pub mod segments;
pub use mask::extract_mask;
pub use segments::discover_labels;

// Iso-surface extraction
pub mod isosurface;
pub use isosurface::{IsoSurfaceConfig, IsoSurfaceExtractor, NormalMode, SurfaceNets};

// Synchronous pipeline
pub mod pipeline;
pub use pipeline::{extract_surfaces, extract_surfaces_timed, extract_surfaces_with, ExtractionStats};

// Transferable forms and wire encoding
pub mod codec;
pub mod wire;
pub use codec::{
  deserialize_mesh, deserialize_volume, serialize_mesh, serialize_volume, SerializedMesh,
  SerializedVolume,
};

// Cross-context execution
pub mod protocol;
pub use protocol::{
  handle_request, labelmap_to_surfaces, labelmap_to_surfaces_on, ExecutionMode, ExecutorConfig,
  Extraction, ExtractionExecutor, ExtractionOptions, ExtractionRequest, ExtractionResponse,
  PendingExtraction,
};

// World placement
pub mod direction;
pub use direction::direction_matrix;
