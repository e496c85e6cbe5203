//! Iso-surface extraction over regular volumes.
//!
//! The pipeline talks to iso-surface code only through
//! [`IsoSurfaceExtractor`]. The bundled [`SurfaceNets`] extractor contours
//! the scalar field with naive Surface Nets: one vertex per cell that
//! straddles the iso-value, placed at the centroid of the interpolated edge
//! crossings, and one quad per crossing lattice edge.
//!
//! # Processing Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        INPUT                                    │
//! │  volume: VolumeImage     - binary mask (0/1) or any labels      │
//! │  config: IsoSurfaceConfig - iso-value, normals, merging         │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PHASE 1: Shifted Padded Field                │
//! │  sample = iso - value, one background layer on every side       │
//! │  (negative = inside, surfaces at the volume border close)       │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PHASE 2: Cells                               │
//! │  corner mask → skip homogeneous → vertex at crossing centroid   │
//! │  gradient normal from the same 8 samples                        │
//! │  quads for crossing edges 0/1/2, split on shorter diagonal      │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PHASE 3: Finish                              │
//! │  geometry normals (optional), un-merge points (optional)        │
//! │  grid coordinates → origin + index * spacing                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod corner_mask;
mod edge_table;
mod gradient;
mod vertex_calc;

pub use edge_table::{EDGE_CORNERS, EDGE_TABLE};

use glam::Vec3A;

use crate::constants::{
  coord_to_index, corner_index_offsets, padded_dimensions, GRID_PADDING, MASK_ISO_VALUE,
};
use crate::error::IsoSurfaceError;
use crate::types::{SurfaceMesh, VolumeImage};

/// Normal computation strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NormalMode {
  /// Gradient of the field at the vertex's cell.
  #[default]
  Gradient,

  /// Angle-weighted average of adjacent triangle normals.
  Geometry,
}

/// Configuration for iso-surface extraction.
#[derive(Clone, Debug, PartialEq)]
pub struct IsoSurfaceConfig {
  /// Field value the surface passes through.
  pub iso_value: f32,

  /// Emit per-vertex normals.
  pub compute_normals: bool,

  /// Share coincident vertices between adjacent triangles.
  pub merge_points: bool,

  /// How normals are computed when enabled.
  pub normal_mode: NormalMode,
}

impl Default for IsoSurfaceConfig {
  fn default() -> Self {
    Self {
      iso_value: MASK_ISO_VALUE,
      compute_normals: true,
      merge_points: true,
      normal_mode: NormalMode::default(),
    }
  }
}

impl IsoSurfaceConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_iso_value(mut self, iso_value: f32) -> Self {
    self.iso_value = iso_value;
    self
  }

  pub fn with_normals(mut self, compute_normals: bool) -> Self {
    self.compute_normals = compute_normals;
    self
  }

  pub fn with_merge_points(mut self, merge_points: bool) -> Self {
    self.merge_points = merge_points;
    self
  }

  pub fn with_normal_mode(mut self, mode: NormalMode) -> Self {
    self.normal_mode = mode;
    self
  }
}

/// Contract for iso-surface algorithms.
///
/// Given a volume, an iso-value and flags for normals/merging, produce a
/// triangulated mesh in physical space (`origin + index * spacing`). An empty
/// mesh is a valid result.
pub trait IsoSurfaceExtractor: Send + Sync {
  fn extract(
    &self,
    volume: &VolumeImage,
    config: &IsoSurfaceConfig,
  ) -> Result<SurfaceMesh, IsoSurfaceError>;
}

/// Naive Surface Nets extractor.
#[derive(Clone, Copy, Debug, Default)]
pub struct SurfaceNets;

impl IsoSurfaceExtractor for SurfaceNets {
  fn extract(
    &self,
    volume: &VolumeImage,
    config: &IsoSurfaceConfig,
  ) -> Result<SurfaceMesh, IsoSurfaceError> {
    generate(volume, config).map(|output| output.into_mesh(config.compute_normals))
  }
}

/// Indexed triangle output of [`generate`].
#[derive(Debug, Default)]
pub struct IsoSurfaceOutput {
  /// Vertex positions in physical space.
  pub positions: Vec<[f32; 3]>,

  /// Unit normal per vertex (empty when normals are disabled).
  pub normals: Vec<[f32; 3]>,

  /// Triangle indices (3 per triangle).
  pub indices: Vec<u32>,
}

impl IsoSurfaceOutput {
  /// Returns true if no geometry was generated.
  pub fn is_empty(&self) -> bool {
    self.positions.is_empty()
  }

  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }

  /// Convert to the run-length cell array representation.
  pub fn into_mesh(self, with_normals: bool) -> SurfaceMesh {
    let normals = (with_normals && !self.normals.is_empty()).then_some(self.normals.as_slice());
    SurfaceMesh::from_triangles(&self.positions, &self.indices, normals)
  }
}

/// Per-cell vertex lookup over the padded grid.
struct CellIndex {
  data: Vec<u32>,
}

impl CellIndex {
  const NONE: u32 = u32::MAX;

  fn new(len: usize) -> Self {
    Self {
      data: vec![Self::NONE; len],
    }
  }

  #[inline]
  fn get(&self, idx: usize) -> Option<u32> {
    match self.data[idx] {
      Self::NONE => None,
      v => Some(v),
    }
  }

  #[inline]
  fn set(&mut self, idx: usize, vertex: u32) {
    self.data[idx] = vertex;
  }
}

/// Contour `volume` at `config.iso_value`.
pub fn generate(
  volume: &VolumeImage,
  config: &IsoSurfaceConfig,
) -> Result<IsoSurfaceOutput, IsoSurfaceError> {
  if !config.iso_value.is_finite() {
    return Err(IsoSurfaceError::NonFiniteIsoValue(config.iso_value));
  }

  let mut output = IsoSurfaceOutput::default();

  let dims = padded_dimensions(volume.dimensions());
  let field = shifted_field(volume, dims, config.iso_value);
  let offsets = corner_index_offsets(dims);
  let inv_spacing = inverse_spacing(volume.spacing());
  let gradient_normals = config.compute_normals && config.normal_mode == NormalMode::Gradient;

  let mut cells = CellIndex::new(field.len());

  // Pass 1: vertices, gradient normals and triangles
  for z in 0..dims[2] - 1 {
    for y in 0..dims[1] - 1 {
      for x in 0..dims[0] - 1 {
        let base = coord_to_index(dims, x, y, z);
        let samples: [f32; 8] = std::array::from_fn(|i| field[base + offsets[i]]);
        let mask = corner_mask::build(&samples);

        if corner_mask::is_homogeneous(mask) {
          continue;
        }

        // u32::MAX is reserved as the empty-cell marker
        let vertex = match u32::try_from(output.positions.len()) {
          Ok(v) if v != CellIndex::NONE => v,
          _ => {
            return Err(IsoSurfaceError::IndexOverflow {
              vertices: output.positions.len() + 1,
            })
          }
        };

        let edge_mask = EDGE_TABLE[mask as usize];
        let cell_origin = Vec3A::new(x as f32, y as f32, z as f32);
        let position = cell_origin + vertex_calc::compute_position(&samples, edge_mask);

        cells.set(base, vertex);
        output.positions.push(position.to_array());
        if gradient_normals {
          output.normals.push(gradient::compute(&samples, inv_spacing));
        }

        emit_triangles(dims, [x, y, z], edge_mask, mask, &cells, &mut output);
      }
    }
  }

  // Pass 2: grid → physical space
  to_physical(&mut output.positions, volume.origin(), volume.spacing());

  if config.compute_normals && config.normal_mode == NormalMode::Geometry {
    output.normals = gradient::from_geometry(&output.positions, &output.indices);
  }

  if !config.merge_points {
    unshare_vertices(&mut output);
  }

  Ok(output)
}

/// Padded field of `iso - value`, with background (value 0) in the padding.
fn shifted_field(volume: &VolumeImage, dims: [usize; 3], iso_value: f32) -> Vec<f32> {
  let mut field = vec![iso_value; dims[0] * dims[1] * dims[2]];
  let [vx, vy, _] = volume.dimensions().map(|d| d as usize);
  let scalars = volume.scalars();

  for (i, label) in scalars.labels().enumerate() {
    let x = i % vx;
    let y = (i / vx) % vy;
    let z = i / (vx * vy);
    let idx = coord_to_index(dims, x + GRID_PADDING, y + GRID_PADDING, z + GRID_PADDING);
    field[idx] = iso_value - label as f32;
  }

  field
}

fn inverse_spacing(spacing: [f64; 3]) -> Vec3A {
  let inv = spacing.map(|s| {
    if s != 0.0 && s.is_finite() {
      (1.0 / s) as f32
    } else {
      1.0
    }
  });
  Vec3A::from_array(inv)
}

fn to_physical(positions: &mut [[f32; 3]], origin: [f64; 3], spacing: [f64; 3]) {
  let pad = GRID_PADDING as f64;
  for p in positions {
    for axis in 0..3 {
      p[axis] = (origin[axis] + (p[axis] as f64 - pad) * spacing[axis]) as f32;
    }
  }
}

/// Emit triangles for the crossing edges owned by a cell (edges 0, 1, 2).
///
/// Each crossing edge is shared by four cells; the quad joins their
/// vertices and is split along the shorter diagonal. Winding keeps the
/// inside (negative) corner behind the face.
fn emit_triangles(
  dims: [usize; 3],
  pos: [usize; 3],
  edge_mask: u16,
  corner_mask: u8,
  cells: &CellIndex,
  output: &mut IsoSurfaceOutput,
) {
  let flip = (corner_mask & 1) == 0;

  for axis in 0..3 {
    if (edge_mask & (1 << axis)) == 0 {
      continue;
    }

    let u = (axis + 1) % 3;
    let v = (axis + 2) % 3;

    // Padding guarantees crossings never sit on the lower grid faces.
    if pos[u] == 0 || pos[v] == 0 {
      continue;
    }

    let mut pos_b = pos;
    pos_b[u] -= 1;
    pos_b[v] -= 1;

    let mut pos_c = pos;
    pos_c[u] -= 1;

    let mut pos_d = pos;
    pos_d[v] -= 1;

    let lookup = |p: [usize; 3]| cells.get(coord_to_index(dims, p[0], p[1], p[2]));
    let (Some(v_a), Some(v_b), Some(v_c), Some(v_d)) =
      (lookup(pos), lookup(pos_b), lookup(pos_c), lookup(pos_d))
    else {
      continue;
    };

    let p = |i: u32| Vec3A::from_array(output.positions[i as usize]);
    let diag_ab = p(v_a).distance_squared(p(v_b));
    let diag_cd = p(v_c).distance_squared(p(v_d));

    let quad = if diag_ab < diag_cd {
      if flip {
        [v_a, v_d, v_b, v_a, v_b, v_c]
      } else {
        [v_a, v_b, v_d, v_a, v_c, v_b]
      }
    } else if flip {
      [v_c, v_d, v_b, v_c, v_a, v_d]
    } else {
      [v_c, v_b, v_d, v_c, v_d, v_a]
    };

    output.indices.extend_from_slice(&quad);
  }
}

/// Give every triangle its own three vertices.
fn unshare_vertices(output: &mut IsoSurfaceOutput) {
  let has_normals = !output.normals.is_empty();
  let mut positions = Vec::with_capacity(output.indices.len());
  let mut normals = Vec::with_capacity(if has_normals { output.indices.len() } else { 0 });

  for &i in &output.indices {
    positions.push(output.positions[i as usize]);
    if has_normals {
      normals.push(output.normals[i as usize]);
    }
  }

  output.indices = (0..positions.len() as u32).collect();
  output.positions = positions;
  output.normals = normals;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
