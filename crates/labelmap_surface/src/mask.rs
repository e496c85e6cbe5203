//! Binary mask extraction.
//!
//! ```text
//! labels:  [0, 1, 1, 0, 2, 2, 0, 0]
//! label 2: [0, 0, 0, 0, 1, 1, 0, 0]
//! ```

use crate::constants::{MASK_BACKGROUND, MASK_FOREGROUND};
use crate::types::{LabelValue, Scalars, VolumeImage};

/// Build a `U8` mask of `volume`: `1` where the voxel equals `label`, `0`
/// elsewhere. Geometry is copied; the input is not modified.
///
/// A label absent from the volume yields an all-zero mask.
pub fn extract_mask(volume: &VolumeImage, label: LabelValue) -> VolumeImage {
  let mask = match volume.scalars() {
    Scalars::U8(values) => mask_values(values, label),
    Scalars::U16(values) => mask_values(values, label),
    Scalars::I16(values) => mask_values(values, label),
  };

  volume.derive(Scalars::U8(mask))
}

#[inline]
fn mask_values<T>(values: &[T], label: LabelValue) -> Vec<u8>
where
  T: Copy + Into<LabelValue>,
{
  values
    .iter()
    .map(|&v| {
      if v.into() == label {
        MASK_FOREGROUND
      } else {
        MASK_BACKGROUND
      }
    })
    .collect()
}

#[cfg(test)]
#[path = "mask_test.rs"]
mod mask_test;
