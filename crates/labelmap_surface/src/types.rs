//! Core data types for labelmap surface extraction.
//!
//! # Voxel Layout
//!
//! ```text
//! Scalars memory layout (X fastest, then Y, then Z):
//!
//! Address:  0        1        ...  dx-1       dx       ...
//! Content: [0,0,0]  [1,0,0]  ...  [dx-1,0,0] [0,1,0]  ...
//!          └──────────── X ──────────────┘
//!
//! index = x + y * dx + z * dx * dy
//! ```

use std::collections::BTreeMap;

use crate::error::{Result, SurfaceError};

/// Label value stored in a labelmap. `0` is background.
pub type LabelValue = i32;

/// Result mapping from label value to its extracted surface.
///
/// Iterates in ascending label order. Labels that produced no geometry are
/// never present.
pub type SurfaceMap = BTreeMap<LabelValue, SurfaceMesh>;

/// Identity orientation, flattened.
pub const IDENTITY_DIRECTION: [f64; 9] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// Per-voxel label storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scalars {
  U8(Vec<u8>),
  U16(Vec<u16>),
  I16(Vec<i16>),
}

impl Scalars {
  /// Number of voxels.
  pub fn len(&self) -> usize {
    match self {
      Scalars::U8(values) => values.len(),
      Scalars::U16(values) => values.len(),
      Scalars::I16(values) => values.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Label at a flat voxel index.
  #[inline]
  pub fn label_at(&self, index: usize) -> LabelValue {
    match self {
      Scalars::U8(values) => values[index] as LabelValue,
      Scalars::U16(values) => values[index] as LabelValue,
      Scalars::I16(values) => values[index] as LabelValue,
    }
  }

  /// Iterate labels in voxel order.
  pub fn labels(&self) -> Box<dyn Iterator<Item = LabelValue> + '_> {
    match self {
      Scalars::U8(values) => Box::new(values.iter().map(|&v| v as LabelValue)),
      Scalars::U16(values) => Box::new(values.iter().map(|&v| v as LabelValue)),
      Scalars::I16(values) => Box::new(values.iter().map(|&v| v as LabelValue)),
    }
  }

  /// Size of a single element in bytes.
  pub fn element_size(&self) -> usize {
    match self {
      Scalars::U8(_) => 1,
      Scalars::U16(_) | Scalars::I16(_) => 2,
    }
  }

  /// Raw bytes of the backing buffer.
  pub fn as_bytes(&self) -> &[u8] {
    match self {
      Scalars::U8(values) => values,
      Scalars::U16(values) => bytemuck::cast_slice(values),
      Scalars::I16(values) => bytemuck::cast_slice(values),
    }
  }

  /// Address of the backing allocation (used to verify buffer handoff).
  pub(crate) fn buffer_addr(&self) -> usize {
    self.as_bytes().as_ptr() as usize
  }
}

/// Regular 3D grid of labels with pass-through physical geometry.
///
/// `spacing`, `origin` and `direction` are carried unmodified by masking and
/// serialization.
#[derive(Clone, Debug, PartialEq)]
pub struct VolumeImage {
  dimensions: [u32; 3],
  spacing: [f64; 3],
  origin: [f64; 3],
  direction: [f64; 9],
  scalars: Scalars,
}

impl VolumeImage {
  /// Create a volume, checking that `scalars` covers every voxel.
  ///
  /// Every axis must hold at least one voxel and the voxel count must fit
  /// in `usize`; otherwise the shape is rejected.
  pub fn new(
    dimensions: [u32; 3],
    spacing: [f64; 3],
    origin: [f64; 3],
    direction: [f64; 9],
    scalars: Scalars,
  ) -> Result<Self> {
    let expected = voxel_count(dimensions);
    if expected != Some(scalars.len()) {
      return Err(SurfaceError::ShapeMismatch {
        dimensions,
        expected,
        actual: scalars.len(),
      });
    }

    Ok(Self {
      dimensions,
      spacing,
      origin,
      direction,
      scalars,
    })
  }

  /// Create a volume with unit spacing, zero origin and identity direction.
  pub fn with_scalars(dimensions: [u32; 3], scalars: Scalars) -> Result<Self> {
    Self::new(dimensions, [1.0; 3], [0.0; 3], IDENTITY_DIRECTION, scalars)
  }

  pub fn dimensions(&self) -> [u32; 3] {
    self.dimensions
  }

  pub fn spacing(&self) -> [f64; 3] {
    self.spacing
  }

  pub fn origin(&self) -> [f64; 3] {
    self.origin
  }

  pub fn direction(&self) -> [f64; 9] {
    self.direction
  }

  pub fn scalars(&self) -> &Scalars {
    &self.scalars
  }

  /// Total voxel count.
  pub fn voxel_count(&self) -> usize {
    self.scalars.len()
  }

  /// Flat index of voxel `(x, y, z)`.
  #[inline]
  pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
    let [dx, dy, _] = self.dimensions;
    x + y * dx as usize + z * dx as usize * dy as usize
  }

  /// Split into geometry and owned scalars without copying.
  pub(crate) fn into_parts(self) -> (VolumeGeometry, Scalars) {
    (
      VolumeGeometry {
        dimensions: self.dimensions,
        spacing: self.spacing,
        origin: self.origin,
        direction: self.direction,
      },
      self.scalars,
    )
  }

  /// Same geometry as `self`, new scalars of equal length.
  pub(crate) fn derive(&self, scalars: Scalars) -> Self {
    debug_assert_eq!(scalars.len(), self.scalars.len());
    Self {
      dimensions: self.dimensions,
      spacing: self.spacing,
      origin: self.origin,
      direction: self.direction,
      scalars,
    }
  }
}

/// Geometry fields of a [`VolumeImage`] without its scalars.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct VolumeGeometry {
  pub dimensions: [u32; 3],
  pub spacing: [f64; 3],
  pub origin: [f64; 3],
  pub direction: [f64; 9],
}

/// Number of voxels described by `dimensions`.
///
/// `None` when an axis is empty or the product overflows `usize`.
#[inline]
pub fn voxel_count(dimensions: [u32; 3]) -> Option<usize> {
  dimensions
    .iter()
    .try_fold(1usize, |acc, &d| match d {
      0 => None,
      d => acc.checked_mul(d as usize),
    })
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinMaxAABB {
  pub min: [f32; 3],
  pub max: [f32; 3],
}

impl MinMaxAABB {
  /// Create AABB with inverted extents (ready for encapsulation).
  pub fn empty() -> Self {
    Self {
      min: [f32::INFINITY; 3],
      max: [f32::NEG_INFINITY; 3],
    }
  }

  /// Expand AABB to include a point.
  #[inline]
  pub fn encapsulate(&mut self, point: [f32; 3]) {
    for i in 0..3 {
      self.min[i] = self.min[i].min(point[i]);
      self.max[i] = self.max[i].max(point[i]);
    }
  }

  /// Check if AABB is valid (min <= max on all axes).
  pub fn is_valid(&self) -> bool {
    self.min[0] <= self.max[0] && self.min[1] <= self.max[1] && self.min[2] <= self.max[2]
  }
}

impl Default for MinMaxAABB {
  fn default() -> Self {
    Self::empty()
  }
}

/// Vertex count stored before each triangle in [`SurfaceMesh::polys`].
pub const TRIANGLE_CELL_SIZE: u32 = 3;

/// Triangulated surface.
///
/// `polys` is a run-length cell array: `[3, i0, i1, i2, 3, i0, i1, i2, ...]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurfaceMesh {
  /// Vertex positions, xyz per vertex.
  pub points: Vec<f32>,

  /// Triangle connectivity.
  pub polys: Vec<u32>,

  /// Unit normal per vertex, xyz, or `None` when not computed.
  pub normals: Option<Vec<f32>>,
}

impl SurfaceMesh {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build from indexed triangles (3 indices per triangle).
  pub fn from_triangles(positions: &[[f32; 3]], indices: &[u32], normals: Option<&[[f32; 3]]>) -> Self {
    let mut polys = Vec::with_capacity(indices.len() / 3 * 4);
    for tri in indices.chunks_exact(3) {
      polys.push(TRIANGLE_CELL_SIZE);
      polys.extend_from_slice(tri);
    }

    Self {
      points: positions.iter().flatten().copied().collect(),
      polys,
      normals: normals.map(|n| n.iter().flatten().copied().collect()),
    }
  }

  /// Returns true if no geometry was generated.
  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  /// Number of vertices.
  pub fn point_count(&self) -> usize {
    self.points.len() / 3
  }

  /// Number of triangles.
  pub fn triangle_count(&self) -> usize {
    self.polys.len() / (TRIANGLE_CELL_SIZE as usize + 1)
  }

  /// Vertex position by index.
  pub fn point(&self, index: usize) -> [f32; 3] {
    let i = index * 3;
    [self.points[i], self.points[i + 1], self.points[i + 2]]
  }

  /// Iterate triangles as vertex index triples.
  pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
    self
      .polys
      .chunks_exact(TRIANGLE_CELL_SIZE as usize + 1)
      .map(|cell| [cell[1], cell[2], cell[3]])
  }

  /// Bounding box of all points.
  pub fn bounds(&self) -> MinMaxAABB {
    let mut bounds = MinMaxAABB::empty();
    for p in self.points.chunks_exact(3) {
      bounds.encapsulate([p[0], p[1], p[2]]);
    }
    bounds
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
