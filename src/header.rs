//! The 32-byte chunk header described in the format's data model: magic,
//! version, the byte/bit reorder configuration, entropy method, input
//! format, delta/lossy bookkeeping, chunk size logs, dtype, and the
//! uncompressed/compressed lengths of the chunk that follows.

use crate::config::{DeltaMode, EntropyMethod, InputFormat};
use crate::constants::{entropy_method_code, input_format_code, HEADER_SIZE, MAGIC, VERSION};
use crate::dtype::Dtype;
use crate::errors::{CodecError, CodecResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ChunkHeader {
  pub byte_reorder_code: u8,
  pub bit_reorder_flag: bool,
  pub entropy_method: EntropyMethod,
  pub input_format: InputFormat,
  pub delta_mode: DeltaMode,
  pub lossy_type: u8,
  pub lossy_factor: u8,
  pub lossy_was_integerized: bool,
  pub streaming_flag: bool,
  pub streaming_chunk_log2: u8,
  pub compression_chunk_log2: u8,
  pub dtype: Dtype,
  pub uncompressed_len: u64,
  pub compressed_len: u64,
}

fn entropy_method_to_code(method: EntropyMethod) -> u8 {
  match method {
    EntropyMethod::Auto => entropy_method_code::AUTO,
    EntropyMethod::Huffman => entropy_method_code::HUFFMAN,
    EntropyMethod::Zstd => entropy_method_code::ZSTD,
    EntropyMethod::Fse => entropy_method_code::FSE,
  }
}

fn entropy_method_from_code(code: u8) -> CodecResult<EntropyMethod> {
  match code {
    entropy_method_code::AUTO => Ok(EntropyMethod::Auto),
    entropy_method_code::HUFFMAN => Ok(EntropyMethod::Huffman),
    entropy_method_code::ZSTD => Ok(EntropyMethod::Zstd),
    entropy_method_code::FSE => Ok(EntropyMethod::Fse),
    other => Err(CodecError::malformed_header(format!(
      "unrecognized entropy_method byte {}",
      other
    ))),
  }
}

fn input_format_to_code(format: InputFormat) -> u8 {
  match format {
    InputFormat::Byte => input_format_code::BYTE,
    InputFormat::TorchArray => input_format_code::TORCH_ARRAY,
    InputFormat::NumpyArray => input_format_code::NUMPY_ARRAY,
  }
}

fn input_format_from_code(code: u8) -> CodecResult<InputFormat> {
  match code {
    input_format_code::BYTE => Ok(InputFormat::Byte),
    input_format_code::TORCH_ARRAY => Ok(InputFormat::TorchArray),
    input_format_code::NUMPY_ARRAY => Ok(InputFormat::NumpyArray),
    other => Err(CodecError::malformed_header(format!(
      "unrecognized input_format byte {}",
      other
    ))),
  }
}

impl ChunkHeader {
  /// Serializes the header to exactly [`HEADER_SIZE`] bytes, appended to `dst`.
  pub(crate) fn write_to(&self, dst: &mut Vec<u8>) {
    dst.extend_from_slice(&MAGIC);
    dst.push(VERSION.0);
    dst.push(VERSION.1);
    dst.push(VERSION.2);
    dst.push(self.byte_reorder_code);
    dst.push(self.bit_reorder_flag as u8);
    dst.push(entropy_method_to_code(self.entropy_method));
    dst.push(input_format_to_code(self.input_format));
    dst.push(self.delta_mode.to_code());
    dst.push(self.lossy_type);
    dst.push(self.lossy_factor);
    dst.push(self.lossy_was_integerized as u8);
    let streaming_byte =
      (self.streaming_flag as u8) << 7 | (self.streaming_chunk_log2 & 0x7f);
    dst.push(streaming_byte);
    dst.push(self.compression_chunk_log2);
    dst.push(self.dtype.info().dtype_code);
    dst.extend_from_slice(&self.uncompressed_len.to_le_bytes());
    dst.extend_from_slice(&self.compressed_len.to_le_bytes());
    debug_assert_eq!(dst.len() % HEADER_SIZE, 0);
  }

  /// Parses a header from the first [`HEADER_SIZE`] bytes of `src`.
  pub(crate) fn parse_from(src: &[u8]) -> CodecResult<Self> {
    if src.len() < HEADER_SIZE {
      return Err(CodecError::malformed_header(format!(
        "header requires {} bytes, only {} available",
        HEADER_SIZE,
        src.len()
      )));
    }
    if src[0..2] != MAGIC {
      return Err(CodecError::malformed_header(format!(
        "magic mismatch: expected {:?}, found {:?}",
        MAGIC,
        &src[0..2]
      )));
    }
    let major = src[2];
    if major > VERSION.0 {
      return Err(CodecError::malformed_header(format!(
        "header version major {} exceeds max supported {}",
        major, VERSION.0
      )));
    }

    let byte_reorder_code = src[5];
    let bit_reorder_flag = src[6] != 0;
    let entropy_method = entropy_method_from_code(src[7])?;
    let input_format = input_format_from_code(src[8])?;
    let delta_mode = DeltaMode::from_code(src[9])?;
    let lossy_type = src[10];
    let lossy_factor = src[11];
    let lossy_was_integerized = src[12] != 0;
    let streaming_byte = src[13];
    let streaming_flag = streaming_byte & 0x80 != 0;
    let streaming_chunk_log2 = streaming_byte & 0x7f;
    let compression_chunk_log2 = src[14];
    let dtype = Dtype::from_code(src[15])?;
    let uncompressed_len = u64::from_le_bytes(src[16..24].try_into().unwrap());
    let compressed_len = u64::from_le_bytes(src[24..32].try_into().unwrap());

    Ok(Self {
      byte_reorder_code,
      bit_reorder_flag,
      entropy_method,
      input_format,
      delta_mode,
      lossy_type,
      lossy_factor,
      lossy_was_integerized,
      streaming_flag,
      streaming_chunk_log2,
      compression_chunk_log2,
      dtype,
      uncompressed_len,
      compressed_len,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> ChunkHeader {
    ChunkHeader {
      byte_reorder_code: crate::constants::byte_reorder_code::F32,
      bit_reorder_flag: true,
      entropy_method: EntropyMethod::Auto,
      input_format: InputFormat::Byte,
      delta_mode: DeltaMode::None,
      lossy_type: 0,
      lossy_factor: 0,
      lossy_was_integerized: false,
      streaming_flag: false,
      streaming_chunk_log2: 18,
      compression_chunk_log2: 18,
      dtype: Dtype::F32,
      uncompressed_len: 1 << 20,
      compressed_len: 12345,
    }
  }

  #[test]
  fn round_trips() {
    let header = sample();
    let mut buf = Vec::new();
    header.write_to(&mut buf);
    assert_eq!(buf.len(), HEADER_SIZE);
    let parsed = ChunkHeader::parse_from(&buf).unwrap();
    assert_eq!(parsed, header);
  }

  #[test]
  fn bad_magic_is_rejected() {
    let mut buf = vec![0u8; HEADER_SIZE];
    buf[0] = b'X';
    buf[1] = b'X';
    let err = ChunkHeader::parse_from(&buf).unwrap_err();
    assert_eq!(err.kind, crate::ErrorKind::MalformedHeader);
  }

  #[test]
  fn truncated_header_is_rejected() {
    let buf = vec![0u8; HEADER_SIZE - 1];
    assert!(ChunkHeader::parse_from(&buf).is_err());
  }
}
