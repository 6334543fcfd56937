//! The streaming decoder: accepts bytes incrementally, recognizes as many
//! complete chunk frames as are available, decodes them across the worker
//! pool, and lets the caller pull the decoded bytes out in order.

use crate::chunk;
use crate::constants::{HEADER_SIZE, MAX_WORKERS};
use crate::errors::CodecResult;
use crate::header::ChunkHeader;
use crate::shape::Shape;
use crate::worker_pool::WorkerPool;

/// Walks a byte stream looking for complete chunk frames (a 32-byte header
/// whose declared compressed length is fully present), decodes whichever
/// ones are ready across the worker pool, and buffers the decoded bytes for
/// [`Decoder::pull_decoded`]. Bytes belonging to a chunk that hasn't
/// arrived yet are held back rather than rejected — only a structurally
/// invalid header (bad magic, unsupported version) is treated as fatal,
/// since "not enough bytes yet" and "malformed" are different failure
/// modes (§7).
pub struct Decoder {
  pool: WorkerPool,
  pending: Vec<u8>,
  decoded: Vec<u8>,
  shape: Option<Shape>,
}

impl Decoder {
  /// Creates a decoder with the default worker count (`min(cores, 16)`).
  /// Decoding needs no configuration: every chunk frame is self-describing.
  pub fn new() -> CodecResult<Self> {
    let threads = num_cpus::get().min(MAX_WORKERS);
    Self::with_threads(threads)
  }

  /// Creates a decoder using exactly `threads` workers.
  pub fn with_threads(threads: usize) -> CodecResult<Self> {
    // A pool of size 0 is nonsensical; fall back to 1 rather than erroring,
    // since decode takes no other configuration the caller could adjust.
    let pool = WorkerPool::new(threads.max(1))?;
    Ok(Self {
      pool,
      pending: Vec::new(),
      decoded: Vec::new(),
      shape: None,
    })
  }

  /// Appends `bytes` to the decoder's pending input and decodes as many
  /// complete chunk frames as are now available.
  pub fn feed_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
    self.pending.extend_from_slice(bytes);
    self.drain_ready()
  }

  /// Appends all bytes decoded so far to `out`, clearing the decoder's
  /// internal buffer. Safe to call repeatedly between [`feed_bytes`] calls
  /// to bound memory use on a long stream.
  ///
  /// [`feed_bytes`]: Decoder::feed_bytes
  pub fn pull_decoded(&mut self, out: &mut Vec<u8>) -> CodecResult<()> {
    out.extend_from_slice(&self.decoded);
    self.decoded.clear();
    Ok(())
  }

  /// The element-shape carried by the first array-format chunk seen so
  /// far, if any.
  pub fn shape(&self) -> Option<&Shape> {
    self.shape.as_ref()
  }

  fn drain_ready(&mut self) -> CodecResult<()> {
    let mut offset = 0usize;
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    loop {
      let remaining = &self.pending[offset..];
      if remaining.len() < HEADER_SIZE {
        break;
      }
      let header = ChunkHeader::parse_from(remaining)?;
      let frame_len = HEADER_SIZE + header.compressed_len as usize;
      if remaining.len() < frame_len {
        break;
      }
      ranges.push((offset, frame_len));
      offset += frame_len;
    }
    if ranges.is_empty() {
      return Ok(());
    }

    let pending = &self.pending;
    let results = self.pool.map_ordered(&ranges, |&(start, len), _cancel| {
      chunk::decode_chunk(&pending[start..start + len])
    })?;

    for decoded in results {
      self.decoded.extend_from_slice(&decoded.bytes);
      if self.shape.is_none() {
        self.shape = decoded.shape;
      }
    }
    self.pending.drain(..offset);
    Ok(())
  }
}
