//! Flat byte encoding of extraction messages.
//!
//! For hand-off across a process or language boundary. All values are
//! little-endian; typed arrays are prefixed with their element count.
//!
//! ```text
//! Request
//! ┌──────┬─────┬──────────┬───────────┬───────────┬─────────────┐
//! │"LMSQ"│ ver │ dims 3×u32│spacing 3×f64│origin 3×f64│direction 9×f64│
//! └──────┴─────┴──────────┴───────────┴───────────┴─────────────┘
//! ┌─────┬───────────┬──────────────┬──────┬─────────────────────┐
//! │ tag │ count u64 │ scalar bytes │ flag │ [count u32, i32...] │
//! └─────┴───────────┴──────────────┴──────┴─────────────────────┘
//!   tag: 0 = u8, 1 = u16, 2 = i16          flag: segments present
//!
//! Response
//! ┌──────┬─────┬─────────────┬──────────────── per entry ─────────────────┐
//! │"LMSR"│ ver │ entries u32 │ label i32, points, polys, flag, [normals]  │
//! └──────┴─────┴─────────────┴────────────────────────────────────────────┘
//!   points/polys/normals: count u64 followed by f32 / u32 / f32 values
//! ```

use std::collections::BTreeMap;

use bytemuck::Pod;

use crate::codec::{SerializedMesh, SerializedVolume};
use crate::error::{Result, SurfaceError};
use crate::protocol::{ExtractionRequest, ExtractionResponse, RequestOptions};
use crate::types::Scalars;

/// Leading bytes of an encoded request.
pub const REQUEST_MAGIC: [u8; 4] = *b"LMSQ";

/// Leading bytes of an encoded response.
pub const RESPONSE_MAGIC: [u8; 4] = *b"LMSR";

/// Current format version.
pub const WIRE_VERSION: u16 = 1;

const TAG_U8: u8 = 0;
const TAG_U16: u8 = 1;
const TAG_I16: u8 = 2;

// =============================================================================
// Encoding
// =============================================================================

/// Encode a request.
pub fn encode_request(request: &ExtractionRequest) -> Vec<u8> {
  let volume = &request.volume;
  let mut out = Vec::with_capacity(128 + volume.scalars.as_bytes().len());

  out.extend_from_slice(&REQUEST_MAGIC);
  out.extend_from_slice(&WIRE_VERSION.to_le_bytes());
  put_values(&mut out, &volume.dimensions);
  put_values(&mut out, &volume.spacing);
  put_values(&mut out, &volume.origin);
  put_values(&mut out, &volume.direction[..]);

  match &volume.scalars {
    Scalars::U8(values) => put_tagged(&mut out, TAG_U8, values),
    Scalars::U16(values) => put_tagged(&mut out, TAG_U16, values),
    Scalars::I16(values) => put_tagged(&mut out, TAG_I16, values),
  }

  match &request.options.segments {
    Some(segments) => {
      out.push(1);
      out.extend_from_slice(&(segments.len() as u32).to_le_bytes());
      put_values(&mut out, segments);
    }
    None => out.push(0),
  }

  out
}

/// Encode a response.
pub fn encode_response(response: &ExtractionResponse) -> Vec<u8> {
  let mut out = Vec::new();

  out.extend_from_slice(&RESPONSE_MAGIC);
  out.extend_from_slice(&WIRE_VERSION.to_le_bytes());
  out.extend_from_slice(&(response.result.len() as u32).to_le_bytes());

  for (&label, mesh) in &response.result {
    out.extend_from_slice(&label.to_le_bytes());
    put_array(&mut out, &mesh.points);
    put_array(&mut out, &mesh.polys);
    match &mesh.normals {
      Some(normals) => {
        out.push(1);
        put_array(&mut out, normals);
      }
      None => out.push(0),
    }
  }

  out
}

fn put_tagged<T: WireValue>(out: &mut Vec<u8>, tag: u8, values: &[T]) {
  out.push(tag);
  put_array(out, values);
}

/// Count-prefixed array.
fn put_array<T: WireValue>(out: &mut Vec<u8>, values: &[T]) {
  out.extend_from_slice(&(values.len() as u64).to_le_bytes());
  put_values(out, values);
}

/// Raw little-endian values, no prefix.
fn put_values<T: WireValue>(out: &mut Vec<u8>, values: &[T]) {
  if cfg!(target_endian = "little") {
    out.extend_from_slice(bytemuck::cast_slice(values));
  } else {
    for v in values {
      out.extend_from_slice(bytemuck::bytes_of(&v.swap_le()));
    }
  }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a request. Trailing bytes are rejected.
pub fn decode_request(bytes: &[u8]) -> Result<ExtractionRequest> {
  let mut reader = Reader::new(bytes);
  reader.header(REQUEST_MAGIC)?;

  let dimensions = reader.fixed::<u32, 3>()?;
  let spacing = reader.fixed::<f64, 3>()?;
  let origin = reader.fixed::<f64, 3>()?;
  let direction = Box::new(reader.fixed::<f64, 9>()?);

  let tag = reader.u8()?;
  let scalars = match tag {
    TAG_U8 => Scalars::U8(reader.array()?),
    TAG_U16 => Scalars::U16(reader.array()?),
    TAG_I16 => Scalars::I16(reader.array()?),
    other => return Err(SurfaceError::malformed(format!("unknown scalar tag {other}"))),
  };

  let segments = if reader.flag()? {
    let count = reader.u32()? as usize;
    Some(reader.values(count)?)
  } else {
    None
  };

  reader.finish()?;

  Ok(ExtractionRequest {
    volume: SerializedVolume {
      dimensions,
      spacing,
      origin,
      direction,
      scalars,
    },
    options: RequestOptions { segments },
  })
}

/// Decode a response. Duplicate labels and trailing bytes are rejected.
pub fn decode_response(bytes: &[u8]) -> Result<ExtractionResponse> {
  let mut reader = Reader::new(bytes);
  reader.header(RESPONSE_MAGIC)?;

  let entries = reader.u32()?;
  let mut result = BTreeMap::new();

  for _ in 0..entries {
    let label = reader.i32()?;
    let points = reader.array()?;
    let polys = reader.array()?;
    let normals = if reader.flag()? {
      Some(reader.array()?)
    } else {
      None
    };

    let mesh = SerializedMesh {
      points,
      polys,
      normals,
    };
    if result.insert(label, mesh).is_some() {
      return Err(SurfaceError::malformed(format!("duplicate label {label}")));
    }
  }

  reader.finish()?;

  Ok(ExtractionResponse { result })
}

/// Cursor over an input buffer.
struct Reader<'a> {
  bytes: &'a [u8],
  pos: usize,
}

impl<'a> Reader<'a> {
  fn new(bytes: &'a [u8]) -> Self {
    Self { bytes, pos: 0 }
  }

  fn take(&mut self, len: usize) -> Result<&'a [u8]> {
    let end = self
      .pos
      .checked_add(len)
      .filter(|&end| end <= self.bytes.len())
      .ok_or_else(|| {
        SurfaceError::malformed(format!(
          "truncated: need {len} bytes at offset {}, have {}",
          self.pos,
          self.bytes.len() - self.pos
        ))
      })?;

    let slice = &self.bytes[self.pos..end];
    self.pos = end;
    Ok(slice)
  }

  fn header(&mut self, magic: [u8; 4]) -> Result<()> {
    if self.take(4)? != magic {
      return Err(SurfaceError::malformed("bad magic"));
    }

    let version = self.u16()?;
    if version != WIRE_VERSION {
      return Err(SurfaceError::malformed(format!("unsupported version {version}")));
    }

    Ok(())
  }

  fn u8(&mut self) -> Result<u8> {
    Ok(self.take(1)?[0])
  }

  fn flag(&mut self) -> Result<bool> {
    match self.u8()? {
      0 => Ok(false),
      1 => Ok(true),
      other => Err(SurfaceError::malformed(format!("invalid flag byte {other}"))),
    }
  }

  fn u16(&mut self) -> Result<u16> {
    Ok(u16::from_le_bytes(self.fixed_bytes()?))
  }

  fn u32(&mut self) -> Result<u32> {
    Ok(u32::from_le_bytes(self.fixed_bytes()?))
  }

  fn i32(&mut self) -> Result<i32> {
    Ok(i32::from_le_bytes(self.fixed_bytes()?))
  }

  fn u64(&mut self) -> Result<u64> {
    Ok(u64::from_le_bytes(self.fixed_bytes()?))
  }

  fn fixed_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    buf.copy_from_slice(self.take(N)?);
    Ok(buf)
  }

  fn fixed<T: WireValue, const N: usize>(&mut self) -> Result<[T; N]> {
    self
      .values::<T>(N)?
      .try_into()
      .map_err(|_| SurfaceError::malformed("fixed array length"))
  }

  /// Count-prefixed array.
  fn array<T: WireValue>(&mut self) -> Result<Vec<T>> {
    let count = usize::try_from(self.u64()?)
      .map_err(|_| SurfaceError::malformed("array length exceeds address space"))?;
    self.values(count)
  }

  fn values<T: WireValue>(&mut self, count: usize) -> Result<Vec<T>> {
    let len = count
      .checked_mul(std::mem::size_of::<T>())
      .ok_or_else(|| SurfaceError::malformed(format!("array of {count} elements overflows")))?;

    // Copies into an aligned buffer; input bytes carry no alignment.
    let mut values: Vec<T> = bytemuck::pod_collect_to_vec(self.take(len)?);
    if cfg!(target_endian = "big") {
      for v in &mut values {
        *v = v.swap_le();
      }
    }
    Ok(values)
  }

  fn finish(self) -> Result<()> {
    match self.bytes.len() - self.pos {
      0 => Ok(()),
      extra => Err(SurfaceError::malformed(format!("{extra} trailing bytes"))),
    }
  }
}

/// Plain value with a fixed little-endian wire form.
trait WireValue: Pod {
  /// Convert between native and little-endian byte order.
  fn swap_le(self) -> Self;
}

macro_rules! int_wire_value {
  ($($t:ty),*) => {
    $(impl WireValue for $t {
      #[inline]
      fn swap_le(self) -> Self {
        <$t>::to_le(self)
      }
    })*
  };
}

int_wire_value!(u8, u16, i16, u32, i32);

impl WireValue for f32 {
  #[inline]
  fn swap_le(self) -> Self {
    f32::from_bits(self.to_bits().to_le())
  }
}

impl WireValue for f64 {
  #[inline]
  fn swap_le(self) -> Self {
    f64::from_bits(self.to_bits().to_le())
  }
}

#[cfg(test)]
#[path = "wire_test.rs"]
mod wire_test;
