//! The variable-length shape descriptor emitted after the header of the
//! first chunk when `input_format` is `TorchArray` or `NumpyArray`.

use crate::errors::{CodecError, CodecResult};

/// The original element-shape of an array input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape {
  pub dims: Vec<u64>,
}

impl Shape {
  pub fn new(dims: Vec<u64>) -> Self {
    Self { dims }
  }

  fn width_for(dim: u64) -> u8 {
    if dim <= u8::MAX as u64 {
      1
    } else if dim <= u16::MAX as u64 {
      2
    } else if dim <= u32::MAX as u64 {
      4
    } else {
      8
    }
  }

  /// Serializes as: 1-byte rank, then per-dimension a 1-byte width selector
  /// (1/2/4/8) followed by the dimension value in that width, little-endian.
  pub(crate) fn write_to(&self, dst: &mut Vec<u8>) -> CodecResult<()> {
    if self.dims.len() > u8::MAX as usize {
      return Err(CodecError::malformed_header(format!(
        "shape rank {} exceeds the 1-byte rank field",
        self.dims.len()
      )));
    }
    dst.push(self.dims.len() as u8);
    for &dim in &self.dims {
      let width = Self::width_for(dim);
      dst.push(width);
      let bytes = dim.to_le_bytes();
      dst.extend_from_slice(&bytes[..width as usize]);
    }
    Ok(())
  }

  /// Parses a shape descriptor from the start of `src`, returning the shape
  /// and the number of bytes consumed.
  pub(crate) fn parse_from(src: &[u8]) -> CodecResult<(Self, usize)> {
    if src.is_empty() {
      return Err(CodecError::chunk_truncated(
        "shape descriptor missing rank byte",
      ));
    }
    let rank = src[0] as usize;
    let mut offset = 1;
    let mut dims = Vec::with_capacity(rank);
    for _ in 0..rank {
      if offset >= src.len() {
        return Err(CodecError::chunk_truncated(
          "shape descriptor truncated before width selector",
        ));
      }
      let width = src[offset] as usize;
      offset += 1;
      if !matches!(width, 1 | 2 | 4 | 8) {
        return Err(CodecError::malformed_header(format!(
          "invalid shape dimension width selector {}",
          width
        )));
      }
      if offset + width > src.len() {
        return Err(CodecError::chunk_truncated(
          "shape descriptor truncated before dimension value",
        ));
      }
      let mut buf = [0u8; 8];
      buf[..width].copy_from_slice(&src[offset..offset + width]);
      dims.push(u64::from_le_bytes(buf));
      offset += width;
    }
    Ok((Self { dims }, offset))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips_mixed_widths() {
    let shape = Shape::new(vec![3, 300, 70_000, 5_000_000_000]);
    let mut buf = Vec::new();
    shape.write_to(&mut buf).unwrap();
    let (parsed, consumed) = Shape::parse_from(&buf).unwrap();
    assert_eq!(parsed, shape);
    assert_eq!(consumed, buf.len());
  }

  #[test]
  fn empty_shape_round_trips() {
    let shape = Shape::new(vec![]);
    let mut buf = Vec::new();
    shape.write_to(&mut buf).unwrap();
    assert_eq!(buf, vec![0]);
    let (parsed, consumed) = Shape::parse_from(&buf).unwrap();
    assert_eq!(parsed.dims, Vec::<u64>::new());
    assert_eq!(consumed, 1);
  }
}
