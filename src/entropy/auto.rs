//! The `Auto` entropy policy: a per-stream decision between [`EntropyMethod::Huffman`]
//! and [`EntropyMethod::Zstd`] based on a cheap order-0 histogram estimate.
//!
//! Order-0 (byte-frequency) entropy only measures how skewed a stream's
//! value distribution is; it can't see repeated runs or cross-byte
//! correlation the way a dictionary coder can. A stream whose order-0
//! entropy is already low is "all skew, no structure" and Huffman captures
//! that at a fraction of zstd's cost. A stream near 8 bits/symbol may still
//! compress well under zstd if it has repeated substructure that a
//! histogram alone can't reveal, so we hand those to zstd instead.

use crate::config::EntropyMethod;

/// Below this order-0 entropy (bits per byte), Huffman is chosen; at or
/// above it, zstd is chosen instead.
const HUFFMAN_ENTROPY_THRESHOLD_BITS: f64 = 6.0;

pub(crate) fn choose_for_stream(data: &[u8]) -> EntropyMethod {
  if data.is_empty() {
    return EntropyMethod::Huffman;
  }
  let mut freqs = [0u64; 256];
  for &b in data {
    freqs[b as usize] += 1;
  }
  let n = data.len() as f64;
  let entropy_bits = freqs
    .iter()
    .filter(|&&f| f > 0)
    .map(|&f| {
      let p = f as f64 / n;
      -p * p.log2()
    })
    .sum::<f64>();

  if entropy_bits < HUFFMAN_ENTROPY_THRESHOLD_BITS {
    EntropyMethod::Huffman
  } else {
    EntropyMethod::Zstd
  }
}
