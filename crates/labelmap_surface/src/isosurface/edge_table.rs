//! Cell edge topology and the corner-mask → edge-mask table.
//!
//! ```text
//!       6──────7         Corners (binary ZYX):
//!      /│     /│           0=(0,0,0)  1=(1,0,0)  2=(0,1,0)  3=(1,1,0)
//!     4─┼────5 │           4=(0,0,1)  5=(1,0,1)  6=(0,1,1)  7=(1,1,1)
//!     │ 2────┼─3
//!     │/     │/          +Y
//!     0──────1            │  +Z
//!                         │ /
//!                         └───+X
//! ```
//!
//! Edges 0, 1 and 2 leave corner 0 along X, Y and Z. They are the edges a
//! cell owns during triangulation; every other edge belongs to a neighbour.

/// Edge endpoint corner indices.
pub const EDGE_CORNERS: [[u8; 2]; 12] = [
  [0, 1], // Edge 0:  X axis at Y=0, Z=0
  [0, 2], // Edge 1:  Y axis at X=0, Z=0
  [0, 4], // Edge 2:  Z axis at X=0, Y=0
  [1, 3], // Edge 3:  Y axis at X=1, Z=0
  [1, 5], // Edge 4:  Z axis at X=1, Y=0
  [2, 3], // Edge 5:  X axis at Y=1, Z=0
  [2, 6], // Edge 6:  Z axis at X=0, Y=1
  [3, 7], // Edge 7:  Z axis at X=1, Y=1
  [4, 5], // Edge 8:  X axis at Y=0, Z=1
  [4, 6], // Edge 9:  Y axis at X=0, Z=1
  [5, 7], // Edge 10: Y axis at X=1, Z=1
  [6, 7], // Edge 11: X axis at Y=1, Z=1
];

/// Edge mask per corner mask. Bit `e` is set when edge `e` has exactly one
/// inside endpoint.
pub const EDGE_TABLE: [u16; 256] = generate_edge_table();

const fn generate_edge_table() -> [u16; 256] {
  let mut table = [0u16; 256];
  let mut corner_mask = 0usize;

  while corner_mask < 256 {
    let mut edge_mask = 0u16;
    let mut edge = 0;

    while edge < 12 {
      let inside0 = (corner_mask >> EDGE_CORNERS[edge][0]) & 1;
      let inside1 = (corner_mask >> EDGE_CORNERS[edge][1]) & 1;

      if inside0 != inside1 {
        edge_mask |= 1 << edge;
      }

      edge += 1;
    }

    table[corner_mask] = edge_mask;
    corner_mask += 1;
  }

  table
}

/// Corner position within the unit cell.
#[inline(always)]
pub const fn corner_position(corner: u8) -> [f32; 3] {
  [
    (corner & 1) as f32,
    ((corner >> 1) & 1) as f32,
    ((corner >> 2) & 1) as f32,
  ]
}

#[cfg(test)]
#[path = "edge_table_test.rs"]
mod edge_table_test;
