//! Magic bytes, header layout offsets, and tuning defaults for the wire
//! format described in the crate's design notes.

/// 2-byte magic at the start of every chunk header.
pub const MAGIC: [u8; 2] = [b'Z', b'N'];

/// Format version written into every header (major, minor, tiny).
pub const VERSION: (u8, u8, u8) = (1, 0, 0);

/// Size in bytes of the fixed chunk header.
pub const HEADER_SIZE: usize = 32;

/// Default chunk size for `compression_chunk` (256 KiB); must be a power of two.
pub const DEFAULT_COMPRESSION_CHUNK: usize = 256 * 1024;

/// Huffman blocks are capped at 128 KiB regardless of the configured chunk size.
pub const HUFFMAN_BLOCK_CAP: usize = 128 * 1024;

/// Default ratio above which a stream is emitted stored-raw instead of entropy-coded.
pub const DEFAULT_COMPRESSION_THRESHOLD: f64 = 0.95;

/// Default zstd quality level.
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Worker pool size never exceeds this even when more cores are available.
pub const MAX_WORKERS: usize = 16;

/// Maximum `size_log` (log2 table size) used by the FSE/tANS backend.
pub const FSE_MAX_SIZE_LOG: u32 = 12;

/// `byte_reorder_code` values for well-known dtype/permutation combinations.
pub mod byte_reorder_code {
  /// F32: four streams, the canonical 4-byte split ordering.
  pub const F32: u8 = 0b1_10_11_100; // 220
  /// BF16 / F16: two streams.
  pub const F16_BF16: u8 = 0b00_01_010; // 10
  /// F8 variants: one stream, identity permutation.
  pub const F8: u8 = 10;
  /// U32 truncation: keep all 4 bytes (no truncation).
  pub const U32_NONE: u8 = 1;
  /// U32 truncation: keep the low 2 bytes, discard the high 2.
  pub const U32_TRUNCATE_2: u8 = 9;
  /// U32 truncation: keep the low byte only, discard the high 3.
  pub const U32_TRUNCATE_1: u8 = 41;
  /// U32 truncation: reserved / all bytes retained, distinct identity tag.
  pub const U32_IDENTITY: u8 = 255;
}

/// `input_format` byte values.
pub mod input_format_code {
  pub const BYTE: u8 = 0;
  pub const TORCH_ARRAY: u8 = 1;
  pub const NUMPY_ARRAY: u8 = 2;
}

/// `entropy_method` byte values.
pub mod entropy_method_code {
  pub const AUTO: u8 = 0;
  pub const HUFFMAN: u8 = 1;
  pub const ZSTD: u8 = 2;
  pub const FSE: u8 = 3;
}

/// Stream frame tag values.
pub mod stream_tag {
  pub const STORED_RAW: u8 = 0;
  pub const HUFFMAN: u8 = 1;
  pub const ZSTD: u8 = 2;
  pub const FSE: u8 = 3;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn header_size_matches_offsets() {
    // offsets 16..24 and 24..32 are the last two fields; header ends at 32.
    assert_eq!(HEADER_SIZE, 32);
  }

  #[test]
  fn compression_chunk_is_power_of_two() {
    assert!(DEFAULT_COMPRESSION_CHUNK.is_power_of_two());
    assert!(HUFFMAN_BLOCK_CAP.is_power_of_two());
  }
}
