//! Corner mask computation.
//!
//! The corner mask is an 8-bit value where each bit indicates whether a corner
//! of the 2x2x2 cell is inside the surface (negative shifted sample).

/// Build corner mask from 8 shifted samples.
///
/// Bit `i` is set when `samples[i] < 0`.
#[inline]
pub fn build(samples: &[f32; 8]) -> u8 {
  samples
    .iter()
    .enumerate()
    .fold(0u8, |mask, (i, &s)| mask | (((s < 0.0) as u8) << i))
}

/// True when every corner is on the same side of the surface.
#[inline(always)]
pub fn is_homogeneous(mask: u8) -> bool {
  mask == 0 || mask == u8::MAX
}
