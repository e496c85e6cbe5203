//! Transferable forms of volumes and meshes.
//!
//! Serialized values own flat buffers that can be moved between execution
//! contexts without copying. Moving a value out leaves the sender without
//! access to its buffers.
//!
//! ```text
//! VolumeImage ──serialize_volume (copy)──► SerializedVolume ──deserialize──► VolumeImage
//!             ──From<VolumeImage> (move)─►
//!
//! SurfaceMesh ──serialize_mesh (move)────► SerializedMesh ───deserialize──► SurfaceMesh
//! ```

use crate::error::{Result, SurfaceError};
use crate::types::{Scalars, SurfaceMesh, VolumeImage};

/// Owned-buffer form of a [`VolumeImage`].
#[derive(Clone, Debug, PartialEq)]
pub struct SerializedVolume {
  pub dimensions: [u32; 3],
  pub spacing: [f64; 3],
  pub origin: [f64; 3],
  /// Heap allocated so the buffer keeps its address when the value moves.
  pub direction: Box<[f64; 9]>,
  pub scalars: Scalars,
}

/// Owned-buffer form of a [`SurfaceMesh`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SerializedMesh {
  pub points: Vec<f32>,
  pub polys: Vec<u32>,
  pub normals: Option<Vec<f32>>,
}

/// Serialize a borrowed volume. The scalar buffer is deep-copied so the
/// caller keeps a usable volume.
pub fn serialize_volume(volume: &VolumeImage) -> SerializedVolume {
  SerializedVolume {
    dimensions: volume.dimensions(),
    spacing: volume.spacing(),
    origin: volume.origin(),
    direction: Box::new(volume.direction()),
    scalars: volume.scalars().clone(),
  }
}

impl From<VolumeImage> for SerializedVolume {
  /// Serialize an owned volume, moving its scalar buffer.
  fn from(volume: VolumeImage) -> Self {
    let (geometry, scalars) = volume.into_parts();
    Self {
      dimensions: geometry.dimensions,
      spacing: geometry.spacing,
      origin: geometry.origin,
      direction: Box::new(geometry.direction),
      scalars,
    }
  }
}

/// Rebuild a volume, validating the scalar length against the dimensions.
pub fn deserialize_volume(data: SerializedVolume) -> Result<VolumeImage> {
  VolumeImage::new(
    data.dimensions,
    data.spacing,
    data.origin,
    *data.direction,
    data.scalars,
  )
}

/// Serialize a mesh by moving its buffers.
pub fn serialize_mesh(mesh: SurfaceMesh) -> SerializedMesh {
  SerializedMesh {
    points: mesh.points,
    polys: mesh.polys,
    normals: mesh.normals,
  }
}

/// Rebuild a mesh, rejecting inconsistent buffers.
pub fn deserialize_mesh(data: SerializedMesh) -> Result<SurfaceMesh> {
  validate_mesh(&data)?;
  Ok(SurfaceMesh {
    points: data.points,
    polys: data.polys,
    normals: data.normals,
  })
}

fn validate_mesh(data: &SerializedMesh) -> Result<()> {
  if data.points.len() % 3 != 0 {
    return Err(SurfaceError::malformed(format!(
      "points length {} is not a multiple of 3",
      data.points.len()
    )));
  }

  if let Some(normals) = &data.normals {
    if normals.len() != data.points.len() {
      return Err(SurfaceError::malformed(format!(
        "normals length {} does not match points length {}",
        normals.len(),
        data.points.len()
      )));
    }
  }

  // Walk the cell array: each cell is a count followed by that many indices
  let point_count = data.points.len() / 3;
  let mut cursor = 0;
  while cursor < data.polys.len() {
    let count = data.polys[cursor] as usize;
    let cell = data
      .polys
      .get(cursor + 1..cursor + 1 + count)
      .ok_or_else(|| SurfaceError::malformed(format!("truncated cell at offset {cursor}")))?;

    if let Some(&index) = cell.iter().find(|&&i| i as usize >= point_count) {
      return Err(SurfaceError::malformed(format!(
        "cell index {index} out of range for {point_count} points"
      )));
    }

    cursor += count + 1;
  }

  Ok(())
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;
