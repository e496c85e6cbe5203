//! Label enumeration.

use std::collections::BTreeSet;

use crate::types::{LabelValue, VolumeImage};

/// Distinct non-zero labels of `volume`, ascending.
pub fn discover_labels(volume: &VolumeImage) -> Vec<LabelValue> {
  let labels: BTreeSet<LabelValue> = volume.scalars().labels().filter(|&v| v != 0).collect();
  labels.into_iter().collect()
}

#[cfg(test)]
#[path = "segments_test.rs"]
mod segments_test;
