//! Vertex normal computation.
//!
//! Two strategies:
//! - cell-corner gradient of the shifted field (2x2x2 stencil), corrected
//!   for anisotropic voxel spacing
//! - angle-weighted average of adjacent face normals

use glam::Vec3A;

/// Fallback when a normal is undefined.
const FALLBACK_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];

/// Outward normal from 8 shifted corner samples.
///
/// Samples increase away from the foreground, so the gradient points out of
/// the surface. `inv_spacing` converts the index-space gradient to physical
/// space.
#[inline]
pub fn compute(samples: &[f32; 8], inv_spacing: Vec3A) -> [f32; 3] {
  let gx = (samples[1] + samples[3] + samples[5] + samples[7])
    - (samples[0] + samples[2] + samples[4] + samples[6]);
  let gy = (samples[2] + samples[3] + samples[6] + samples[7])
    - (samples[0] + samples[1] + samples[4] + samples[5]);
  let gz = (samples[4] + samples[5] + samples[6] + samples[7])
    - (samples[0] + samples[1] + samples[2] + samples[3]);

  normalize_or_fallback(Vec3A::new(gx, gy, gz) * inv_spacing)
}

/// Normals from triangle geometry, weighting each face by its interior angle
/// at the vertex (Thürmer & Wüthrich, 1998).
pub fn from_geometry(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
  let mut accum = vec![Vec3A::ZERO; positions.len()];

  for tri in indices.chunks_exact(3) {
    let i0 = tri[0] as usize;
    let i1 = tri[1] as usize;
    let i2 = tri[2] as usize;

    let p0 = Vec3A::from_array(positions[i0]);
    let p1 = Vec3A::from_array(positions[i1]);
    let p2 = Vec3A::from_array(positions[i2]);

    let e01 = p1 - p0;
    let e02 = p2 - p0;
    let e12 = p2 - p1;

    let face_normal = e01.cross(e02);
    let face_len_sq = face_normal.length_squared();

    // Degenerate triangle
    if face_len_sq < 1e-12 {
      continue;
    }

    let face_unit = face_normal * face_len_sq.sqrt().recip();

    accum[i0] += face_unit * vertex_angle(e01, e02);
    accum[i1] += face_unit * vertex_angle(-e01, e12);
    accum[i2] += face_unit * vertex_angle(-e02, -e12);
  }

  accum.into_iter().map(normalize_or_fallback).collect()
}

/// Angle between two edge vectors at a vertex.
#[inline]
fn vertex_angle(e1: Vec3A, e2: Vec3A) -> f32 {
  let len1_sq = e1.length_squared();
  let len2_sq = e2.length_squared();

  if len1_sq < 1e-12 || len2_sq < 1e-12 {
    return 0.0;
  }

  let cos_angle = e1.dot(e2) / (len1_sq.sqrt() * len2_sq.sqrt());
  cos_angle.clamp(-1.0, 1.0).acos()
}

#[inline]
fn normalize_or_fallback(v: Vec3A) -> [f32; 3] {
  let len_sq = v.length_squared();
  if len_sq < 1e-12 || !len_sq.is_finite() {
    return FALLBACK_NORMAL;
  }
  (v * len_sq.sqrt().recip()).to_array()
}

#[cfg(test)]
#[path = "gradient_test.rs"]
mod gradient_test;
