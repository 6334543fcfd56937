//! Per-chunk encode/decode: picks the byte/bit reorder scheme for a chunk's
//! dtype, runs the byte-split transform, entropy-codes (or stores raw) each
//! resulting stream, and assembles/parses the chunk's header, optional
//! shape descriptor, and stream frames.

use crate::config::{CodecConfig, EntropyMethod};
use crate::constants::{stream_tag, HEADER_SIZE};
use crate::dtype::Dtype;
use crate::entropy;
use crate::errors::{CodecError, CodecResult};
use crate::header::ChunkHeader;
use crate::shape::Shape;
use crate::transform;

/// Chooses how many of a U32 chunk's high bytes can be safely discarded:
/// the minimal byte_reorder_code that still losslessly represents every
/// element, so an array of small values (as e.g. NumPy index/id arrays
/// often are) compresses down to one or two streams instead of four.
fn choose_u32_byte_reorder_code(chunk: &[u8]) -> u8 {
  let mut max_value = 0u32;
  for word in chunk.chunks_exact(4) {
    let v = u32::from_le_bytes(word.try_into().unwrap());
    max_value = max_value.max(v);
  }
  if max_value <= u8::MAX as u32 {
    crate::constants::byte_reorder_code::U32_TRUNCATE_1
  } else if max_value <= u16::MAX as u32 {
    crate::constants::byte_reorder_code::U32_TRUNCATE_2
  } else {
    crate::constants::byte_reorder_code::U32_NONE
  }
}

fn log2_exact(value: usize) -> CodecResult<u8> {
  if !value.is_power_of_two() {
    return Err(CodecError::malformed_header(format!(
      "chunk size {} is not a power of two",
      value
    )));
  }
  Ok(value.trailing_zeros() as u8)
}

/// Encodes one chunk of `data` (already a whole number of `config.bytearray_dtype`
/// elements) into a self-contained header + optional shape + stream-frame
/// sequence. `shape` is only written when present (the caller supplies it
/// only for the first chunk of an array-format input).
pub(crate) fn encode_chunk(
  data: &[u8],
  config: &CodecConfig,
  shape: Option<&Shape>,
) -> CodecResult<Vec<u8>> {
  encode_chunk_impl(data, config, shape, false)
}

/// As [`encode_chunk`], but skips entropy coding entirely and emits every
/// stream stored-raw. Used by the encoder's adaptive abort
/// (`check_th_after_percent`): once a prefix of the input shows the overall
/// ratio isn't beating `compression_threshold`, the remaining chunks are
/// written raw instead of spending CPU on entropy attempts unlikely to pay
/// off. Purely a speed decision — the wire format is identical either way.
pub(crate) fn encode_chunk_stored_raw(
  data: &[u8],
  config: &CodecConfig,
  shape: Option<&Shape>,
) -> CodecResult<Vec<u8>> {
  encode_chunk_impl(data, config, shape, true)
}

fn encode_chunk_impl(
  data: &[u8],
  config: &CodecConfig,
  shape: Option<&Shape>,
  force_stored_raw: bool,
) -> CodecResult<Vec<u8>> {
  let dtype = config.bytearray_dtype;
  let width = dtype.width();
  if data.len() % width != 0 {
    return Err(CodecError::length_mismatch(format!(
      "chunk of {} bytes is not a multiple of element width {}",
      data.len(),
      width
    )));
  }

  let byte_reorder_code = if matches!(dtype, Dtype::U32) {
    choose_u32_byte_reorder_code(data)
  } else {
    dtype.info().byte_reorder_code
  };
  let bit_reorder_flag = dtype.info().bit_reorder_default;

  let streams = transform::split(data, dtype, bit_reorder_flag, byte_reorder_code)?;

  let mut body = Vec::new();
  if let Some(shape) = shape {
    shape.write_to(&mut body)?;
  }

  for stream in &streams {
    let (mut tag, mut payload) = if force_stored_raw {
      (stream_tag::STORED_RAW, stream.clone())
    } else {
      let method = if config.method == EntropyMethod::Auto {
        entropy::choose_for_stream(stream)
      } else {
        config.method
      };
      entropy::encode_stream(stream, method, config.zstd_level)?
    };

    if tag != stream_tag::STORED_RAW && !stream.is_empty() {
      let ratio = payload.len() as f64 / stream.len() as f64;
      if ratio > config.compression_threshold {
        tag = stream_tag::STORED_RAW;
        payload = stream.clone();
      }
    }

    body.push(tag);
    body.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    body.extend_from_slice(&payload);
  }

  let header = ChunkHeader {
    byte_reorder_code,
    bit_reorder_flag,
    entropy_method: config.method,
    input_format: config.input_format,
    delta_mode: config.delta_compressed_type,
    lossy_type: 0,
    lossy_factor: 0,
    lossy_was_integerized: false,
    streaming_flag: config.is_streaming,
    streaming_chunk_log2: log2_exact(config.streaming_chunk)?,
    compression_chunk_log2: log2_exact(config.compression_chunk)?,
    dtype,
    uncompressed_len: data.len() as u64,
    compressed_len: body.len() as u64,
  };

  let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
  header.write_to(&mut out);
  out.extend_from_slice(&body);
  Ok(out)
}

/// One decoded chunk: the reconstructed element bytes, the shape descriptor
/// if this chunk carried one, and how many bytes of `src` it consumed.
pub(crate) struct DecodedChunk {
  pub bytes: Vec<u8>,
  pub shape: Option<Shape>,
  pub consumed: usize,
}

/// Parses and decodes one chunk from the start of `src`.
pub(crate) fn decode_chunk(src: &[u8]) -> CodecResult<DecodedChunk> {
  let header = ChunkHeader::parse_from(src)?;
  let body_len = header.compressed_len as usize;
  if src.len() < HEADER_SIZE + body_len {
    return Err(CodecError::chunk_truncated(format!(
      "chunk declares {} body bytes, only {} available",
      body_len,
      src.len().saturating_sub(HEADER_SIZE)
    )));
  }
  let body = &src[HEADER_SIZE..HEADER_SIZE + body_len];
  let mut offset = 0usize;

  let shape = if header.input_format != crate::config::InputFormat::Byte {
    let (shape, consumed) = Shape::parse_from(&body[offset..])?;
    offset += consumed;
    Some(shape)
  } else {
    None
  };

  let width = header.dtype.width();
  let discarded = transform::u32_discarded_high_bytes(header.byte_reorder_code);
  let effective_width = width - discarded;
  if header.uncompressed_len as usize % width != 0 {
    return Err(CodecError::length_mismatch(
      "chunk's declared uncompressed length is not a multiple of its dtype width",
    ));
  }
  let n_elements = header.uncompressed_len as usize / width;

  let mut streams = Vec::with_capacity(effective_width);
  for _ in 0..effective_width {
    if offset + 1 + 8 > body.len() {
      return Err(CodecError::chunk_truncated("stream frame header truncated"));
    }
    let tag = body[offset];
    offset += 1;
    let payload_len =
      u64::from_le_bytes(body[offset..offset + 8].try_into().unwrap()) as usize;
    offset += 8;
    if offset + payload_len > body.len() {
      return Err(CodecError::chunk_truncated("stream frame payload truncated"));
    }
    let payload = &body[offset..offset + payload_len];
    offset += payload_len;
    streams.push(entropy::decode_stream(tag, payload, n_elements)?);
  }

  let bytes = transform::combine(
    &streams,
    header.dtype,
    header.bit_reorder_flag,
    header.byte_reorder_code,
  )?;

  Ok(DecodedChunk {
    bytes,
    shape,
    consumed: HEADER_SIZE + body_len,
  })
}
