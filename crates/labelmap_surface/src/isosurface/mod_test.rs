use super::*;
use crate::types::{Scalars, IDENTITY_DIRECTION};

fn single_voxel(spacing: [f64; 3], origin: [f64; 3]) -> VolumeImage {
  VolumeImage::new([1, 1, 1], spacing, origin, IDENTITY_DIRECTION, Scalars::U8(vec![1])).unwrap()
}

fn block(dims: [u32; 3], value: u8) -> VolumeImage {
  let n = (dims[0] * dims[1] * dims[2]) as usize;
  VolumeImage::with_scalars(dims, Scalars::U8(vec![value; n])).unwrap()
}

fn center_of(mesh: &SurfaceMesh) -> [f32; 3] {
  let bounds = mesh.bounds();
  std::array::from_fn(|i| (bounds.min[i] + bounds.max[i]) * 0.5)
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
  a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
  [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
  [
    a[1] * b[2] - a[2] * b[1],
    a[2] * b[0] - a[0] * b[2],
    a[0] * b[1] - a[1] * b[0],
  ]
}

#[test]
fn test_single_voxel_is_closed_cube() {
  let mesh = SurfaceNets
    .extract(&single_voxel([1.0; 3], [0.0; 3]), &IsoSurfaceConfig::default())
    .unwrap();

  // One vertex per cell touching the voxel, one quad per crossing edge
  assert_eq!(mesh.point_count(), 8);
  assert_eq!(mesh.triangle_count(), 12);

  let bounds = mesh.bounds();
  for axis in 0..3 {
    assert!((bounds.min[axis] + 1.0 / 6.0).abs() < 1e-5);
    assert!((bounds.max[axis] - 1.0 / 6.0).abs() < 1e-5);
  }
}

#[test]
fn test_triangles_face_outward() {
  let mesh = SurfaceNets
    .extract(&block([3, 2, 4], 1), &IsoSurfaceConfig::default())
    .unwrap();
  let center = center_of(&mesh);

  assert!(mesh.triangle_count() > 0);
  for [i0, i1, i2] in mesh.triangles() {
    let (p0, p1, p2) = (
      mesh.point(i0 as usize),
      mesh.point(i1 as usize),
      mesh.point(i2 as usize),
    );
    let normal = cross(sub(p1, p0), sub(p2, p0));
    let centroid: [f32; 3] = std::array::from_fn(|i| (p0[i] + p1[i] + p2[i]) / 3.0);
    assert!(dot(normal, sub(centroid, center)) > 0.0);
  }
}

#[test]
fn test_gradient_normals_point_outward() {
  let mesh = SurfaceNets
    .extract(&block([2, 2, 2], 1), &IsoSurfaceConfig::default())
    .unwrap();
  let normals = mesh.normals.as_ref().unwrap();
  let center = center_of(&mesh);

  assert_eq!(normals.len(), mesh.points.len());
  for (i, n) in normals.chunks_exact(3).enumerate() {
    let n = [n[0], n[1], n[2]];
    assert!((dot(n, n) - 1.0).abs() < 1e-5);
    assert!(dot(n, sub(mesh.point(i), center)) > 0.0);
  }
}

#[test]
fn test_geometry_normals_point_outward() {
  let config = IsoSurfaceConfig::default().with_normal_mode(NormalMode::Geometry);
  let mesh = SurfaceNets.extract(&block([2, 2, 2], 1), &config).unwrap();
  let normals = mesh.normals.as_ref().unwrap();
  let center = center_of(&mesh);

  for (i, n) in normals.chunks_exact(3).enumerate() {
    assert!(dot([n[0], n[1], n[2]], sub(mesh.point(i), center)) > 0.0);
  }
}

#[test]
fn test_normals_disabled() {
  let config = IsoSurfaceConfig::default().with_normals(false);
  let mesh = SurfaceNets.extract(&block([2, 2, 2], 1), &config).unwrap();
  assert!(mesh.normals.is_none());
  assert!(!mesh.is_empty());
}

#[test]
fn test_empty_field_gives_empty_mesh() {
  let mesh = SurfaceNets
    .extract(&block([4, 4, 4], 0), &IsoSurfaceConfig::default())
    .unwrap();
  assert!(mesh.is_empty());
  assert!(mesh.polys.is_empty());
}

#[test]
fn test_spacing_and_origin_map_to_physical_space() {
  let mesh = SurfaceNets
    .extract(
      &single_voxel([2.0, 1.0, 0.5], [10.0, -4.0, 3.0]),
      &IsoSurfaceConfig::default(),
    )
    .unwrap();
  let bounds = mesh.bounds();

  assert!((bounds.min[0] - (10.0 - 2.0 / 6.0)).abs() < 1e-4);
  assert!((bounds.max[0] - (10.0 + 2.0 / 6.0)).abs() < 1e-4);
  assert!((bounds.min[1] - (-4.0 - 1.0 / 6.0)).abs() < 1e-4);
  assert!((bounds.max[2] - (3.0 + 0.5 / 6.0)).abs() < 1e-4);
}

#[test]
fn test_unmerged_points_are_not_shared() {
  let config = IsoSurfaceConfig::default().with_merge_points(false);
  let merged = SurfaceNets
    .extract(&single_voxel([1.0; 3], [0.0; 3]), &IsoSurfaceConfig::default())
    .unwrap();
  let unmerged = SurfaceNets
    .extract(&single_voxel([1.0; 3], [0.0; 3]), &config)
    .unwrap();

  assert_eq!(unmerged.triangle_count(), merged.triangle_count());
  assert_eq!(unmerged.point_count(), unmerged.triangle_count() * 3);
  assert_eq!(
    unmerged.normals.as_ref().map(Vec::len),
    Some(unmerged.points.len())
  );
  assert_eq!(unmerged.bounds(), merged.bounds());
}

#[test]
fn test_labels_above_one_use_iso_value() {
  // Raw label field contoured at 0.5 encloses every non-zero voxel
  let volume = VolumeImage::with_scalars([1, 1, 1], Scalars::U16(vec![7])).unwrap();
  let mesh = SurfaceNets.extract(&volume, &IsoSurfaceConfig::default()).unwrap();
  assert_eq!(mesh.triangle_count(), 12);
}

#[test]
fn test_non_finite_iso_value_fails() {
  let config = IsoSurfaceConfig::default().with_iso_value(f32::NAN);
  let err = SurfaceNets
    .extract(&single_voxel([1.0; 3], [0.0; 3]), &config)
    .unwrap_err();
  assert!(matches!(err, IsoSurfaceError::NonFiniteIsoValue(_)));
}

#[test]
fn test_indices_in_range() {
  let mut values = vec![0u8; 5 * 5 * 5];
  for (i, v) in values.iter_mut().enumerate() {
    *v = ((i * 7) % 3 == 0) as u8;
  }
  let volume = VolumeImage::with_scalars([5, 5, 5], Scalars::U8(values)).unwrap();
  let mesh = SurfaceNets.extract(&volume, &IsoSurfaceConfig::default()).unwrap();

  let count = mesh.point_count() as u32;
  assert!(mesh.triangles().flatten().all(|i| i < count));
  assert!(mesh.polys.chunks_exact(4).all(|cell| cell[0] == 3));
}

#[test]
fn test_generate_output_counts() {
  let output = generate(&block([2, 2, 2], 1), &IsoSurfaceConfig::default()).unwrap();
  assert!(!output.is_empty());
  assert_eq!(output.indices.len(), output.triangle_count() * 3);
  assert_eq!(output.normals.len(), output.positions.len());
}
