//! Vertex position calculation.

pub use glam::Vec3A;

use super::edge_table::{corner_position, EDGE_CORNERS};

/// Vertex position inside the unit cell: centroid of the interpolated
/// crossings on every edge set in `edge_mask`.
#[inline]
pub fn compute_position(samples: &[f32; 8], edge_mask: u16) -> Vec3A {
  let mut sum = Vec3A::ZERO;
  let mut count = 0u32;
  let mut bits = edge_mask;

  while bits != 0 {
    let edge = bits.trailing_zeros() as usize;
    bits &= bits - 1;

    let [c0, c1] = EDGE_CORNERS[edge];
    let s0 = samples[c0 as usize];
    let s1 = samples[c1 as usize];

    // Signs differ on a crossing edge, so the denominator is non-zero.
    let t = s0 / (s0 - s1);

    let p0 = Vec3A::from_array(corner_position(c0));
    let p1 = Vec3A::from_array(corner_position(c1));
    sum += p0 + t * (p1 - p0);
    count += 1;
  }

  if count == 0 {
    return Vec3A::splat(0.5);
  }

  sum / count as f32
}

#[cfg(test)]
#[path = "vertex_calc_test.rs"]
mod vertex_calc_test;
