//! Extraction constants and padded-grid indexing.
//!
//! # Padded Grid
//!
//! The contouring grid surrounds the volume with one background sample on
//! every side, so labeled voxels touching the volume boundary still produce
//! closed surfaces:
//!
//! ```text
//!   padded index:   0    1    2   ...   d    d+1
//!                   │    └──── volume ────┘    │
//!                   └─ background      background ┘
//!
//!   padded = d + 2 * GRID_PADDING
//!   volume voxel v  →  padded sample v + GRID_PADDING
//! ```
//!
//! # Cell Corners
//!
//! ```text
//! Cell corner indices (binary: ZYX):
//!   0 = (0,0,0)    4 = (0,0,1)
//!   1 = (1,0,0)    5 = (1,0,1)
//!   2 = (0,1,0)    6 = (0,1,1)
//!   3 = (1,1,0)    7 = (1,1,1)
//! ```

/// Iso-value separating background (0) from foreground (1) in a binary mask.
pub const MASK_ISO_VALUE: f32 = 0.5;

/// Mask value for voxels carrying the target label.
pub const MASK_FOREGROUND: u8 = 1;

/// Mask value for every other voxel.
pub const MASK_BACKGROUND: u8 = 0;

/// Background samples added on each side of every axis before contouring.
pub const GRID_PADDING: usize = 1;

/// Cube corner offsets `(dx, dy, dz)`, indexed by corner bits ZYX.
pub const CORNER_OFFSETS: [[usize; 3]; 8] = [
  [0, 0, 0],
  [1, 0, 0],
  [0, 1, 0],
  [1, 1, 0],
  [0, 0, 1],
  [1, 0, 1],
  [0, 1, 1],
  [1, 1, 1],
];

/// Padded grid dimensions for a volume.
#[inline]
pub const fn padded_dimensions(dimensions: [u32; 3]) -> [usize; 3] {
  [
    dimensions[0] as usize + 2 * GRID_PADDING,
    dimensions[1] as usize + 2 * GRID_PADDING,
    dimensions[2] as usize + 2 * GRID_PADDING,
  ]
}

/// Linear index in a grid laid out X fastest.
#[inline(always)]
pub const fn coord_to_index(dims: [usize; 3], x: usize, y: usize, z: usize) -> usize {
  x + dims[0] * (y + dims[1] * z)
}

/// Inverse of [`coord_to_index`].
#[inline(always)]
pub const fn index_to_coord(dims: [usize; 3], idx: usize) -> (usize, usize, usize) {
  let x = idx % dims[0];
  let y = (idx / dims[0]) % dims[1];
  let z = idx / (dims[0] * dims[1]);
  (x, y, z)
}

/// Linear offsets of the 8 cube corners in a grid of `dims`.
#[inline]
pub const fn corner_index_offsets(dims: [usize; 3]) -> [usize; 8] {
  let mut offsets = [0usize; 8];
  let mut corner = 0;
  while corner < 8 {
    let [dx, dy, dz] = CORNER_OFFSETS[corner];
    offsets[corner] = coord_to_index(dims, dx, dy, dz);
    corner += 1;
  }
  offsets
}

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
