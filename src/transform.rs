//! The byte-split (de-interleave) transform and its inverse, plus the
//! reversible bit rotation that aligns a float's exponent to a whole byte.
//!
//! Parallelism discipline: a chunk may be subdivided into element-aligned
//! tiles and processed by multiple rayon tasks, but tile boundaries are a
//! performance artifact only — the resulting stream layout is identical to
//! a single-threaded pass, since each tile independently produces the same
//! bytes it would have produced serially and tiles are concatenated in
//! order.

use crate::constants::byte_reorder_code;
use crate::dtype::Dtype;
use crate::errors::{CodecError, CodecResult};
use rayon::prelude::*;

/// Number of leading (most-significant) bytes the U32 truncation path
/// discards before entropy coding, based on the configured
/// `byte_reorder_code`. Returns 0 for every non-truncating code.
pub(crate) fn u32_discarded_high_bytes(code: u8) -> usize {
  match code {
    byte_reorder_code::U32_TRUNCATE_2 => 2,
    byte_reorder_code::U32_TRUNCATE_1 => 3,
    _ => 0,
  }
}

/// Rotates a little-endian w-byte (w in {2, 4}) float word left by one bit
/// so the exponent occupies the top byte exactly, moving the sign bit to
/// the lowest bit of the lowest byte. Reversed by [`rotate_bits_backward`].
#[inline]
fn rotate_bits_forward(word: u32, bits: u32) -> u32 {
  let mask = if bits == 32 {
    u32::MAX
  } else {
    (1u32 << bits) - 1
  };
  ((word << 1) | (word >> (bits - 1))) & mask
}

#[inline]
fn rotate_bits_backward(word: u32, bits: u32) -> u32 {
  let mask = if bits == 32 {
    u32::MAX
  } else {
    (1u32 << bits) - 1
  };
  ((word >> 1) | (word << (bits - 1))) & mask
}

fn apply_bit_rotation_forward(bytes: &mut [u8], width: usize) {
  match width {
    2 => {
      let word = u16::from_le_bytes([bytes[0], bytes[1]]) as u32;
      let rotated = rotate_bits_forward(word, 16) as u16;
      bytes.copy_from_slice(&rotated.to_le_bytes());
    }
    4 => {
      let word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
      let rotated = rotate_bits_forward(word, 32);
      bytes.copy_from_slice(&rotated.to_le_bytes());
    }
    _ => unreachable!("bit rotation only applies to 2- or 4-byte floats"),
  }
}

fn apply_bit_rotation_backward(bytes: &mut [u8], width: usize) {
  match width {
    2 => {
      let word = u16::from_le_bytes([bytes[0], bytes[1]]) as u32;
      let rotated = rotate_bits_backward(word, 16) as u16;
      bytes.copy_from_slice(&rotated.to_le_bytes());
    }
    4 => {
      let word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
      let rotated = rotate_bits_backward(word, 32);
      bytes.copy_from_slice(&rotated.to_le_bytes());
    }
    _ => unreachable!("bit rotation only applies to 2- or 4-byte floats"),
  }
}

/// Element count below which we don't bother spinning up tiles; avoids
/// rayon overhead dwarfing the work on small chunks (e.g. the tail chunk
/// of a small buffer, or tests).
const MIN_ELEMENTS_PER_TILE: usize = 16 * 1024;

fn tile_element_counts(n_elements: usize) -> Vec<usize> {
  if n_elements <= MIN_ELEMENTS_PER_TILE {
    return vec![n_elements];
  }
  let n_tiles = rayon::current_num_threads().max(1);
  let base = n_elements / n_tiles;
  let mut remainder = n_elements % n_tiles;
  let mut tiles = Vec::with_capacity(n_tiles);
  for _ in 0..n_tiles {
    let mut count = base;
    if remainder > 0 {
      count += 1;
      remainder -= 1;
    }
    if count > 0 {
      tiles.push(count);
    }
  }
  tiles
}

/// Splits one chunk's bytes into `effective_width` per-byte-position
/// streams, applying bit rotation first if `bit_reorder_flag` is set.
/// `chunk` must be a multiple of `dtype.width()` in length; the chunk codec
/// guarantees this (padding or rejecting beforehand).
pub(crate) fn split(
  chunk: &[u8],
  dtype: Dtype,
  bit_reorder_flag: bool,
  byte_reorder_code: u8,
) -> CodecResult<Vec<Vec<u8>>> {
  let width = dtype.width();
  if chunk.len() % width != 0 {
    return Err(CodecError::length_mismatch(format!(
      "chunk of {} bytes is not a multiple of element width {}",
      chunk.len(),
      width
    )));
  }
  let n_elements = chunk.len() / width;
  let discarded = u32_discarded_high_bytes(byte_reorder_code);
  let effective_width = width - discarded;

  let tile_counts = tile_element_counts(n_elements);
  let mut tile_offsets = Vec::with_capacity(tile_counts.len());
  let mut acc = 0usize;
  for &count in &tile_counts {
    tile_offsets.push(acc);
    acc += count;
  }

  let tile_results: Vec<Vec<Vec<u8>>> = tile_offsets
    .par_iter()
    .zip(tile_counts.par_iter())
    .map(|(&elem_offset, &elem_count)| {
      let mut streams = vec![Vec::with_capacity(elem_count); effective_width];
      let byte_offset = elem_offset * width;
      for i in 0..elem_count {
        let start = byte_offset + i * width;
        let mut elem = [0u8; 4];
        elem[..width].copy_from_slice(&chunk[start..start + width]);
        if bit_reorder_flag {
          apply_bit_rotation_forward(&mut elem[..width], width);
        }
        for (k, stream) in streams.iter_mut().enumerate() {
          stream.push(elem[k]);
        }
      }
      streams
    })
    .collect();

  let mut streams = vec![Vec::with_capacity(n_elements); effective_width];
  for tile in tile_results {
    for (k, stream_part) in tile.into_iter().enumerate() {
      streams[k].extend_from_slice(&stream_part);
    }
  }
  Ok(streams)
}

/// Inverse of [`split`]: recombines per-byte-position streams into the
/// original chunk bytes. When `effective_width < dtype.width()` (the U32
/// truncation path), the discarded high bytes are reconstructed as zero,
/// matching the spec's requirement that the truncation path is only valid
/// when those bytes were already zero.
pub(crate) fn combine(
  streams: &[Vec<u8>],
  dtype: Dtype,
  bit_reorder_flag: bool,
  byte_reorder_code: u8,
) -> CodecResult<Vec<u8>> {
  let width = dtype.width();
  let discarded = u32_discarded_high_bytes(byte_reorder_code);
  let effective_width = width - discarded;
  if streams.len() != effective_width {
    return Err(CodecError::length_mismatch(format!(
      "expected {} streams for this dtype/reorder code, got {}",
      effective_width,
      streams.len()
    )));
  }
  let n_elements = streams.first().map(|s| s.len()).unwrap_or(0);
  for s in streams {
    if s.len() != n_elements {
      return Err(CodecError::length_mismatch(
        "per-position streams must all have equal length",
      ));
    }
  }

  let tile_counts = tile_element_counts(n_elements);
  let mut tile_offsets = Vec::with_capacity(tile_counts.len());
  let mut acc = 0usize;
  for &count in &tile_counts {
    tile_offsets.push(acc);
    acc += count;
  }

  let tile_results: Vec<Vec<u8>> = tile_offsets
    .par_iter()
    .zip(tile_counts.par_iter())
    .map(|(&elem_offset, &elem_count)| {
      let mut out = Vec::with_capacity(elem_count * width);
      for i in 0..elem_count {
        let mut elem = [0u8; 4];
        for (k, stream) in streams.iter().enumerate() {
          elem[k] = stream[elem_offset + i];
        }
        if bit_reorder_flag {
          apply_bit_rotation_backward(&mut elem[..width], width);
        }
        out.extend_from_slice(&elem[..width]);
      }
      out
    })
    .collect();

  let mut out = Vec::with_capacity(n_elements * width);
  for tile in tile_results {
    out.extend_from_slice(&tile);
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bit_rotation_aligns_f32_exponent() {
    // 1.0_f32 = 0x3F800000 -> bytes LE [00, 00, 80, 3F]
    let bits = 1.0f32.to_bits();
    let mut bytes = bits.to_le_bytes();
    apply_bit_rotation_forward(&mut bytes, 4);
    // top byte should now be the full 8-bit exponent (127 = 0b01111111... shifted)
    // exponent of 1.0 is 127 = 0b01111111; after rotate-left-1 over the whole
    // word, the top byte holds bits 30..23 of the original value, which is
    // exactly the 8-bit exponent field.
    let rotated = u32::from_le_bytes(bytes);
    let top_byte = (rotated >> 24) as u8;
    assert_eq!(top_byte, 127);
  }

  #[test]
  fn bit_rotation_round_trips() {
    for width in [2usize, 4] {
      let mut bytes = vec![0x12u8, 0x34, 0x56, 0x78];
      bytes.truncate(width);
      let original = bytes.clone();
      apply_bit_rotation_forward(&mut bytes, width);
      apply_bit_rotation_backward(&mut bytes, width);
      assert_eq!(bytes, original);
    }
  }

  #[test]
  fn f32_split_combine_round_trips() {
    let floats: Vec<f32> = (0..1000).map(|i| (i as f32) * 0.125 - 40.0).collect();
    let mut chunk = Vec::with_capacity(floats.len() * 4);
    for f in &floats {
      chunk.extend_from_slice(&f.to_le_bytes());
    }
    let streams = split(&chunk, Dtype::F32, true, byte_reorder_code::F32).unwrap();
    assert_eq!(streams.len(), 4);
    assert_eq!(streams[0].len(), floats.len());
    let combined = combine(&streams, Dtype::F32, true, byte_reorder_code::F32).unwrap();
    assert_eq!(combined, chunk);
  }

  #[test]
  fn bf16_split_combine_round_trips_without_rotation() {
    let mut chunk = Vec::new();
    for i in 0..500u16 {
      chunk.extend_from_slice(&i.to_le_bytes());
    }
    let streams = split(&chunk, Dtype::Bf16, false, byte_reorder_code::F16_BF16).unwrap();
    assert_eq!(streams.len(), 2);
    let combined = combine(&streams, Dtype::Bf16, false, byte_reorder_code::F16_BF16).unwrap();
    assert_eq!(combined, chunk);
  }

  #[test]
  fn f8_split_combine_is_identity() {
    let chunk: Vec<u8> = (0..=255u8).collect();
    let streams = split(&chunk, Dtype::F8E4M3, false, byte_reorder_code::F8).unwrap();
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0], chunk);
    let combined = combine(&streams, Dtype::F8E4M3, false, byte_reorder_code::F8).unwrap();
    assert_eq!(combined, chunk);
  }

  #[test]
  fn u32_truncate_to_u16_round_trips_when_high_bytes_are_zero() {
    let values: Vec<u32> = (0..2000u32).map(|i| i * 13 % 60000).collect();
    let mut chunk = Vec::new();
    for v in &values {
      chunk.extend_from_slice(&v.to_le_bytes());
    }
    let streams = split(&chunk, Dtype::U32, false, byte_reorder_code::U32_TRUNCATE_2).unwrap();
    assert_eq!(streams.len(), 2);
    let combined =
      combine(&streams, Dtype::U32, false, byte_reorder_code::U32_TRUNCATE_2).unwrap();
    assert_eq!(combined, chunk);
  }

  #[test]
  fn large_chunk_uses_multiple_tiles_and_still_round_trips() {
    let n = MIN_ELEMENTS_PER_TILE * 4 + 7;
    let floats: Vec<f32> = (0..n).map(|i| (i as f32).sin()).collect();
    let mut chunk = Vec::with_capacity(n * 4);
    for f in &floats {
      chunk.extend_from_slice(&f.to_le_bytes());
    }
    let streams = split(&chunk, Dtype::F32, true, byte_reorder_code::F32).unwrap();
    let combined = combine(&streams, Dtype::F32, true, byte_reorder_code::F32).unwrap();
    assert_eq!(combined, chunk);
  }
}
