//! Test utilities for pipeline and protocol tests.
//!
//! Fixture volumes and mock extractors.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::IsoSurfaceError;
use crate::isosurface::{IsoSurfaceConfig, IsoSurfaceExtractor};
use crate::types::{voxel_count, Scalars, SurfaceMesh, VolumeImage, IDENTITY_DIRECTION};

// =============================================================================
// Fixture Volumes
// =============================================================================

/// 2x2x2 volume with labels `[0, 1, 1, 0, 2, 2, 0, 0]`.
pub fn two_label_volume() -> VolumeImage {
  VolumeImage::with_scalars([2, 2, 2], Scalars::U8(vec![0, 1, 1, 0, 2, 2, 0, 0])).unwrap()
}

/// All-background `U8` volume.
pub fn zero_volume(dimensions: [u32; 3]) -> VolumeImage {
  VolumeImage::with_scalars(dimensions, Scalars::U8(vec![0; voxel_count(dimensions).unwrap()])).unwrap()
}

/// `U16` volume holding a ball of `label` centered in the grid.
pub fn sphere_volume(size: u32, radius: f32, label: u16) -> VolumeImage {
  let center = (size as f32 - 1.0) * 0.5;
  let mut values = Vec::with_capacity(voxel_count([size; 3]).unwrap());

  for z in 0..size {
    for y in 0..size {
      for x in 0..size {
        let d = [x, y, z].map(|c| c as f32 - center);
        let inside = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt() <= radius;
        values.push(if inside { label } else { 0 });
      }
    }
  }

  VolumeImage::with_scalars([size; 3], Scalars::U16(values)).unwrap()
}

/// `I16` volume split into slabs along X, labels `1..=count`.
pub fn slab_volume(width_per_label: u32, count: u32) -> VolumeImage {
  let dims = [width_per_label * count, 3, 3];
  let mut values = Vec::with_capacity(voxel_count(dims).unwrap());

  for _z in 0..dims[2] {
    for _y in 0..dims[1] {
      for x in 0..dims[0] {
        values.push((x / width_per_label + 1) as i16);
      }
    }
  }

  VolumeImage::new(
    dims,
    [0.5, 1.0, 2.0],
    [10.0, -5.0, 0.0],
    IDENTITY_DIRECTION,
    Scalars::I16(values),
  )
  .unwrap()
}

// =============================================================================
// Mock Extractors
// =============================================================================

/// Extractor that always fails.
pub struct FailingExtractor;

impl IsoSurfaceExtractor for FailingExtractor {
  fn extract(
    &self,
    _volume: &VolumeImage,
    _config: &IsoSurfaceConfig,
  ) -> Result<SurfaceMesh, IsoSurfaceError> {
    Err(IsoSurfaceError::Other("mock failure".into()))
  }
}

/// Extractor returning empty meshes while counting calls.
#[derive(Default)]
pub struct CountingExtractor {
  pub calls: AtomicUsize,
}

impl CountingExtractor {
  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::Relaxed)
  }
}

impl IsoSurfaceExtractor for CountingExtractor {
  fn extract(
    &self,
    _volume: &VolumeImage,
    _config: &IsoSurfaceConfig,
  ) -> Result<SurfaceMesh, IsoSurfaceError> {
    self.calls.fetch_add(1, Ordering::Relaxed);
    Ok(SurfaceMesh::new())
  }
}

/// Extractor that panics, for transport failure tests.
pub struct PanickingExtractor;

impl IsoSurfaceExtractor for PanickingExtractor {
  fn extract(
    &self,
    _volume: &VolumeImage,
    _config: &IsoSurfaceConfig,
  ) -> Result<SurfaceMesh, IsoSurfaceError> {
    panic!("extractor panicked");
  }
}

/// Points of `mesh` as xyz triples.
pub fn points_of(mesh: &SurfaceMesh) -> Vec<[f32; 3]> {
  mesh.points.chunks_exact(3).map(|p| [p[0], p[1], p[2]]).collect()
}
