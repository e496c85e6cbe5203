//! Labelmap Surface Pipeline
//!
//! Turns a labelmap into one surface per label, synchronously on the
//! calling thread.
//!
//! ```text
//! ┌──────────┐     ┌──────────┐     ┌────────────┐     ┌────────────┐
//! │ Discover ├────►│   Mask   ├────►│ Iso-surface├────►│  Collect   │
//! └──────────┘     └──────────┘     └────────────┘     └────────────┘
//!      │                 │                 │                  │
//!  Vec<label>       U8 {0,1} mask     SurfaceMesh        SurfaceMap
//!  (ascending)     (per label)      (iso 0.5, normals)  (empty skipped)
//! ```
//!
//! # Stages
//!
//! 1. **Discover**: distinct non-zero labels, unless the caller names them
//! 2. **Mask**: binary mask for the current label, dropped after use
//! 3. **Iso-surface**: [`IsoSurfaceExtractor`](crate::isosurface::IsoSurfaceExtractor)
//!    at iso-value 0.5 with normals and point merging
//! 4. **Collect**: meshes without points are omitted

pub mod process;

// Test utilities
#[cfg(test)]
pub mod test_utils;

pub use process::{extract_surfaces, extract_surfaces_timed, extract_surfaces_with, ExtractionStats};
