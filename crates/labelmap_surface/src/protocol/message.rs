//! Request and response messages exchanged with a background context.

use std::collections::BTreeMap;

use crate::codec::{SerializedMesh, SerializedVolume};
use crate::types::LabelValue;

/// Options carried inside a request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
  /// Labels to extract; `None` extracts every non-zero label.
  pub segments: Option<Vec<LabelValue>>,
}

/// Work request handed to a background context.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractionRequest {
  pub volume: SerializedVolume,
  pub options: RequestOptions,
}

/// Reply from a background context.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractionResponse {
  pub result: BTreeMap<LabelValue, SerializedMesh>,
}

/// Which buffer a [`Transferable`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransferKind {
  Scalars,
  Direction,
  Points,
  Polys,
  Normals,
}

/// A buffer whose ownership moves with its message.
///
/// `addr` identifies the backing allocation; it is unchanged on the receiving
/// side when the buffer was moved rather than copied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Transferable {
  pub kind: TransferKind,
  /// Owning label for mesh buffers.
  pub label: Option<LabelValue>,
  pub byte_len: usize,
  pub addr: usize,
}

impl Transferable {
  fn of<T>(kind: TransferKind, label: Option<LabelValue>, buffer: &[T]) -> Self {
    Self {
      kind,
      label,
      byte_len: std::mem::size_of_val(buffer),
      addr: buffer.as_ptr() as usize,
    }
  }
}

impl ExtractionRequest {
  pub fn new(volume: SerializedVolume, segments: Option<Vec<LabelValue>>) -> Self {
    Self {
      volume,
      options: RequestOptions { segments },
    }
  }

  /// Buffers moved with the request: scalars and direction.
  pub fn transferables(&self) -> Vec<Transferable> {
    vec![
      Transferable {
        kind: TransferKind::Scalars,
        label: None,
        byte_len: self.volume.scalars.as_bytes().len(),
        addr: self.volume.scalars.buffer_addr(),
      },
      Transferable::of(TransferKind::Direction, None, &self.volume.direction[..]),
    ]
  }
}

impl ExtractionResponse {
  /// Buffers moved with the response: points, polys and normals (when
  /// present) of every mesh, in label order.
  pub fn transferables(&self) -> Vec<Transferable> {
    let mut out = Vec::with_capacity(self.result.len() * 3);

    for (&label, mesh) in &self.result {
      out.push(Transferable::of(TransferKind::Points, Some(label), &mesh.points));
      out.push(Transferable::of(TransferKind::Polys, Some(label), &mesh.polys));
      if let Some(normals) = &mesh.normals {
        out.push(Transferable::of(TransferKind::Normals, Some(label), normals));
      }
    }

    out
  }
}
