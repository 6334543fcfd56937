//! A narrow integration seam for callers that want transparent decompression
//! without this crate reaching into their loader: [`ReadPossiblyCompressed`]
//! sniffs the magic bytes and either decodes or passes bytes through
//! unchanged, the same blanket-impl-over-`Read` shape the teacher uses for
//! its own buffered-reading trait.

use crate::constants::MAGIC;
use crate::errors::CodecResult;
use std::io::Read;

/// Reads all of `self` to completion, decompressing it if it starts with
/// this crate's chunk magic and returning the bytes unchanged otherwise.
///
/// This lets a loader that doesn't know (or care) whether its input is
/// compressed call one method and get back the bytes it actually wants,
/// rather than every caller having to duplicate the sniff-then-branch
/// themselves.
pub trait ReadPossiblyCompressed {
  fn read_possibly_compressed(self) -> CodecResult<Vec<u8>>;
}

impl<R: Read> ReadPossiblyCompressed for R {
  fn read_possibly_compressed(mut self) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    self.read_to_end(&mut buf)?;
    if buf.starts_with(&MAGIC) {
      crate::decompress(&buf)
    } else {
      Ok(buf)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{CodecConfig, Dtype};

  #[test]
  fn passes_through_uncompressed_bytes_unchanged() {
    let plain = b"not a zipnn chunk at all".to_vec();
    let out = plain.as_slice().read_possibly_compressed().unwrap();
    assert_eq!(out, plain);
  }

  #[test]
  fn decodes_compressed_bytes() {
    let config = CodecConfig::default().with_bytearray_dtype(Dtype::F32);
    let mut data = Vec::new();
    for i in 0..100u32 {
      data.extend_from_slice(&(i as f32).to_le_bytes());
    }
    let compressed = crate::compress(&data, &config).unwrap();
    let out = compressed.as_slice().read_possibly_compressed().unwrap();
    assert_eq!(out, data);
  }
}
