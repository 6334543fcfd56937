//! The streaming encoder: buffers pushed bytes into element-aligned chunks,
//! runs the worker pool over whichever chunks are ready, and emits the
//! concatenation of their self-contained chunk frames.

use crate::chunk;
use crate::config::{CodecConfig, EntropyMethod};
use crate::constants::HUFFMAN_BLOCK_CAP;
use crate::errors::CodecResult;
use crate::shape::Shape;
use crate::worker_pool::WorkerPool;

/// Buffers bytes pushed via [`Encoder::push_bytes`] into chunks of
/// `config.effective_chunk_size()` (aligned down to a whole number of
/// elements, and further capped at [`HUFFMAN_BLOCK_CAP`] when `method` is
/// explicitly [`EntropyMethod::Huffman`]), dispatching ready chunks across
/// the worker pool as soon as they're complete rather than waiting for
/// [`Encoder::finish`].
pub struct Encoder {
  config: CodecConfig,
  pool: WorkerPool,
  shape: Option<Shape>,
  pending: Vec<u8>,
  out: Vec<u8>,
  emitted_any_chunk: bool,
  expected_len: Option<u64>,
  bytes_seen: u64,
  raw_bytes_committed: u64,
  compressed_bytes_committed: u64,
  adaptive_stored_raw: bool,
}

impl Encoder {
  /// Creates an encoder for `config`, validating it up front so a bad
  /// configuration (e.g. a non-power-of-two chunk size) fails immediately
  /// rather than after bytes have already been buffered.
  pub fn new(config: CodecConfig) -> CodecResult<Self> {
    config.validate()?;
    let pool = WorkerPool::new(config.resolved_threads())?;
    Ok(Self {
      config,
      pool,
      shape: None,
      pending: Vec::new(),
      out: Vec::new(),
      emitted_any_chunk: false,
      expected_len: None,
      bytes_seen: 0,
      raw_bytes_committed: 0,
      compressed_bytes_committed: 0,
      adaptive_stored_raw: false,
    })
  }

  /// Attaches the element-shape descriptor to be written after the header
  /// of the very first chunk. Only meaningful when `config.input_format`
  /// is `TorchArray` or `NumpyArray`.
  pub fn with_shape(mut self, shape: Shape) -> Self {
    self.shape = Some(shape);
    self
  }

  /// Hints the total number of bytes that will be pushed across all calls,
  /// so the `check_th_after_percent` adaptive abort (§4.3) has a percentage
  /// to measure against. Single-shot callers ([`crate::compress`]) always
  /// know this up front; true incremental streaming callers that don't know
  /// it simply never trigger the abort, which is always format-safe.
  pub fn with_expected_len(mut self, total_bytes: u64) -> Self {
    self.expected_len = Some(total_bytes);
    self
  }

  /// Appends `bytes` to the encoder's pending input, chunking and emitting
  /// as many complete chunks as are now available.
  pub fn push_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
    self.pending.extend_from_slice(bytes);
    self.drain_chunks(false)
  }

  /// Flushes any remaining pending bytes as a final (possibly short) chunk
  /// and returns the complete compressed byte sequence.
  pub fn finish(mut self) -> CodecResult<Vec<u8>> {
    self.drain_chunks(true)?;
    Ok(self.out)
  }

  fn chunk_byte_cap(&self) -> usize {
    let width = self.config.bytearray_dtype.width();
    let configured = self.config.effective_chunk_size();
    let capped = if self.config.method == EntropyMethod::Huffman {
      configured.min(HUFFMAN_BLOCK_CAP)
    } else {
      configured
    };
    // Chunk boundaries are element-aligned; round down to a whole element.
    capped - (capped % width)
  }

  fn maybe_trigger_adaptive_abort(&mut self) {
    if self.adaptive_stored_raw || self.raw_bytes_committed == 0 {
      return;
    }
    let Some(total) = self.expected_len else {
      return;
    };
    if total == 0 {
      return;
    }
    let percent_done = (self.bytes_seen.saturating_mul(100)) / total;
    if percent_done < self.config.check_th_after_percent as u64 {
      return;
    }
    let ratio = self.compressed_bytes_committed as f64 / self.raw_bytes_committed as f64;
    if ratio >= self.config.compression_threshold {
      self.adaptive_stored_raw = true;
    }
  }

  fn drain_chunks(&mut self, flush_tail: bool) -> CodecResult<()> {
    let cap = self.chunk_byte_cap();
    if cap == 0 {
      return Ok(());
    }

    let mut batch: Vec<Vec<u8>> = Vec::new();
    while self.pending.len() >= cap {
      batch.push(self.pending.drain(..cap).collect());
    }
    // Guarantee a (possibly empty) final chunk so a zero-length input still
    // round-trips to a header-only output that decodes to empty bytes.
    if flush_tail && (!self.pending.is_empty() || !self.emitted_any_chunk) {
      batch.push(std::mem::take(&mut self.pending));
    }
    if batch.is_empty() {
      return Ok(());
    }

    let first_chunk_already_emitted = self.emitted_any_chunk;
    let shape = self.shape.clone();
    let force_stored_raw = self.adaptive_stored_raw;
    let config = &self.config;
    let indexed: Vec<(usize, Vec<u8>)> = batch.into_iter().enumerate().collect();

    let encoded = self.pool.map_ordered(&indexed, |(idx, chunk_bytes), _cancel| {
      let this_shape = if !first_chunk_already_emitted && *idx == 0 {
        shape.as_ref()
      } else {
        None
      };
      if force_stored_raw {
        chunk::encode_chunk_stored_raw(chunk_bytes, config, this_shape)
      } else {
        chunk::encode_chunk(chunk_bytes, config, this_shape)
      }
    })?;

    for ((_, raw_chunk), frame) in indexed.iter().zip(encoded.iter()) {
      self.bytes_seen += raw_chunk.len() as u64;
      self.raw_bytes_committed += raw_chunk.len() as u64;
      self.compressed_bytes_committed += frame.len() as u64;
      self.out.extend_from_slice(frame);
    }
    if !indexed.is_empty() {
      self.emitted_any_chunk = true;
    }
    self.maybe_trigger_adaptive_abort();
    Ok(())
  }
}
