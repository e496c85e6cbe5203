//! Pipeline Orchestrator
//!
//! # Usage
//!
//! ```ignore
//! // Every label in the volume
//! let surfaces = extract_surfaces(&volume, None)?;
//!
//! // Only labels 3 and 7, with a custom extractor
//! let config = IsoSurfaceConfig::default().with_merge_points(false);
//! let surfaces = extract_surfaces_with(&SurfaceNets, &volume, Some(&[3, 7]), &config)?;
//! ```

use std::collections::BTreeSet;

use web_time::Instant;

use crate::error::{Result, SurfaceError};
use crate::isosurface::{IsoSurfaceConfig, IsoSurfaceExtractor, SurfaceNets};
use crate::mask::extract_mask;
use crate::segments::discover_labels;
use crate::types::{LabelValue, SurfaceMap, VolumeImage};

/// Extract one surface per label with the default [`SurfaceNets`] extractor.
///
/// `segments` restricts extraction to the given labels; `None` discovers
/// every non-zero label. Labels producing no geometry are omitted. The first
/// extractor failure aborts the call.
pub fn extract_surfaces(
  volume: &VolumeImage,
  segments: Option<&[LabelValue]>,
) -> Result<SurfaceMap> {
  extract_surfaces_with(&SurfaceNets, volume, segments, &IsoSurfaceConfig::default())
}

/// [`extract_surfaces`] with an explicit extractor and configuration.
#[tracing::instrument(skip_all, name = "pipeline::extract_surfaces")]
pub fn extract_surfaces_with<E: IsoSurfaceExtractor + ?Sized>(
  extractor: &E,
  volume: &VolumeImage,
  segments: Option<&[LabelValue]>,
  config: &IsoSurfaceConfig,
) -> Result<SurfaceMap> {
  run(extractor, volume, segments, config, &mut ExtractionStats::default())
}

/// Extract surfaces with timing information.
///
/// Same as [`extract_surfaces_with`] but also returns per-stage stats.
pub fn extract_surfaces_timed<E: IsoSurfaceExtractor + ?Sized>(
  extractor: &E,
  volume: &VolumeImage,
  segments: Option<&[LabelValue]>,
  config: &IsoSurfaceConfig,
) -> Result<(SurfaceMap, ExtractionStats)> {
  let start = Instant::now();
  let mut stats = ExtractionStats::default();

  let surfaces = run(extractor, volume, segments, config, &mut stats)?;
  stats.total_us = start.elapsed().as_micros() as u64;

  Ok((surfaces, stats))
}

/// Statistics from one extraction call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
  /// Labels visited.
  pub labels_processed: usize,
  /// Meshes inserted into the result.
  pub meshes_produced: usize,
  /// Labels whose mesh had no points.
  pub empty_labels: usize,
  /// Vertices across all produced meshes.
  pub total_vertices: usize,
  /// Triangles across all produced meshes.
  pub total_triangles: usize,
  /// Time spent building masks, in microseconds.
  pub mask_us: u64,
  /// Time spent in the extractor, in microseconds.
  pub mesh_us: u64,
  /// Wall time of the whole call, in microseconds.
  pub total_us: u64,
}

fn run<E: IsoSurfaceExtractor + ?Sized>(
  extractor: &E,
  volume: &VolumeImage,
  segments: Option<&[LabelValue]>,
  config: &IsoSurfaceConfig,
  stats: &mut ExtractionStats,
) -> Result<SurfaceMap> {
  let labels = match segments {
    // Ascending, duplicates collapsed
    Some(segments) => segments.iter().copied().collect::<BTreeSet<_>>().into_iter().collect(),
    None => discover_labels(volume),
  };

  tracing::debug!(
    labels = labels.len(),
    voxels = volume.voxel_count(),
    explicit = segments.is_some(),
    "extracting surfaces"
  );

  let mut surfaces = SurfaceMap::new();

  for label in labels {
    stats.labels_processed += 1;

    let mask_start = Instant::now();
    let mask = extract_mask(volume, label);
    stats.mask_us += mask_start.elapsed().as_micros() as u64;

    let mesh_start = Instant::now();
    let mesh = extractor
      .extract(&mask, config)
      .map_err(|cause| SurfaceError::ExtractionFailure { label, cause })?;
    stats.mesh_us += mesh_start.elapsed().as_micros() as u64;

    if mesh.is_empty() {
      tracing::trace!(label, "no geometry, skipping");
      stats.empty_labels += 1;
      continue;
    }

    tracing::debug!(
      label,
      vertices = mesh.point_count(),
      triangles = mesh.triangle_count(),
      "surface extracted"
    );

    stats.meshes_produced += 1;
    stats.total_vertices += mesh.point_count();
    stats.total_triangles += mesh.triangle_count();
    surfaces.insert(label, mesh);
  }

  Ok(surfaces)
}

#[cfg(test)]
#[path = "process_test.rs"]
mod process_test;
