//! Per-stream entropy backends: canonical Huffman, a tANS/FSE table coder,
//! a thin `zstd` wrapper, and the `Auto` policy that picks between them.
//!
//! Every backend operates on one already-byte-split stream at a time and is
//! self-describing: its output can be decoded without any external state
//! beyond the stream's own bytes and the [`crate::constants::stream_tag`]
//! that precedes it in the frame.

mod auto;
mod fse;
mod huffman;
mod zstd_backend;

pub(crate) use auto::choose_for_stream;

use crate::config::EntropyMethod;
use crate::constants::stream_tag;
use crate::errors::CodecResult;

/// Encodes `data` with the entropy method tagged in the stream frame (not
/// `Auto`, which is resolved to a concrete method by the chunk codec before
/// this is called), returning the tag byte and the encoded payload.
pub(crate) fn encode_stream(data: &[u8], method: EntropyMethod, zstd_level: i32) -> CodecResult<(u8, Vec<u8>)> {
  match method {
    EntropyMethod::Huffman => Ok((stream_tag::HUFFMAN, huffman::encode(data)?)),
    EntropyMethod::Zstd => Ok((stream_tag::ZSTD, zstd_backend::encode(data, zstd_level)?)),
    EntropyMethod::Fse => Ok((stream_tag::FSE, fse::encode(data)?)),
    EntropyMethod::Auto => unreachable!("Auto must be resolved to a concrete method before encoding"),
  }
}

/// Decodes a stream frame's payload given its tag byte.
pub(crate) fn decode_stream(tag: u8, payload: &[u8], decoded_len: usize) -> CodecResult<Vec<u8>> {
  match tag {
    stream_tag::STORED_RAW => Ok(payload.to_vec()),
    stream_tag::HUFFMAN => huffman::decode(payload, decoded_len),
    stream_tag::ZSTD => zstd_backend::decode(payload, decoded_len),
    stream_tag::FSE => fse::decode(payload, decoded_len),
    other => Err(crate::errors::CodecError::backend_failure(format!(
      "unrecognized stream tag {}",
      other
    ))),
  }
}
