//! World placement for oblique volumes.
//!
//! Meshes are produced in `origin + index * spacing` space, without the
//! volume's orientation. For rotated acquisitions, apply
//! [`direction_matrix`] to place them in world space:
//!
//! ```text
//! world = T(origin) · D · T(-origin) · p
//! ```

use glam::{DMat3, DMat4, DVec3};

use crate::types::VolumeImage;

/// Rotate about the volume origin by its direction matrix.
///
/// `direction` is read column-major: the first three values are the world
/// direction of the volume's X axis. Identity direction gives the identity
/// matrix.
pub fn direction_matrix(volume: &VolumeImage) -> DMat4 {
  let origin = DVec3::from_array(volume.origin());
  let direction = DMat3::from_cols_array(&volume.direction());

  DMat4::from_translation(origin) * DMat4::from_mat3(direction) * DMat4::from_translation(-origin)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::{Scalars, IDENTITY_DIRECTION};

  fn volume(origin: [f64; 3], direction: [f64; 9]) -> VolumeImage {
    VolumeImage::new([1, 1, 1], [1.0; 3], origin, direction, Scalars::U8(vec![1])).unwrap()
  }

  #[test]
  fn test_identity_direction() {
    let m = direction_matrix(&volume([4.0, -2.0, 9.0], IDENTITY_DIRECTION));
    assert!(m.abs_diff_eq(DMat4::IDENTITY, 1e-12));
  }

  #[test]
  fn test_origin_is_fixed_point() {
    let origin = [10.0, 20.0, 30.0];
    let m = direction_matrix(&volume(origin, [0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 1.0]));

    let p = m.transform_point3(DVec3::from_array(origin));
    assert!(p.abs_diff_eq(DVec3::from_array(origin), 1e-12));
  }

  #[test]
  fn test_rotation_about_origin() {
    // X axis maps to world +Y
    let origin = DVec3::new(1.0, 1.0, 0.0);
    let m = direction_matrix(&volume(
      origin.to_array(),
      [0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 1.0],
    ));

    let p = m.transform_point3(origin + DVec3::X);
    assert!(p.abs_diff_eq(origin + DVec3::Y, 1e-12));

    let q = m.transform_point3(origin + DVec3::Y);
    assert!(q.abs_diff_eq(origin - DVec3::X, 1e-12));
  }

  #[test]
  fn test_half_turn_about_origin() {
    let m = direction_matrix(&volume([-5.0, 0.0, 2.5], [-1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0]));
    let p = m.transform_point3(DVec3::new(-4.0, 0.0, 2.5));
    assert!(p.abs_diff_eq(DVec3::new(-6.0, 0.0, 2.5), 1e-12));
  }
}
