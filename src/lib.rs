#![doc = include_str!("../README.md")]
//! # API notes
//!
//! * `compress`/`decompress` are single-shot: the whole buffer is one chunk
//!   sequence produced in one call. [`Encoder`]/[`Decoder`] expose the
//!   streaming state machines for callers that want to push bytes
//!   incrementally and get back independently-decodable chunk frames.
//! * Every compressed output round-trips through a completely separate
//!   process: all the information needed to decode (dtype, byte/bit reorder,
//!   entropy method, chunk sizes) is carried in the stream itself.

#![deny(clippy::unused_unit)]
#![deny(dead_code)]

#[doc = include_str!("../README.md")]
#[cfg(doctest)]
struct ReadmeDoctest;

pub use config::{BytearrayDtype, CodecConfig, DeltaMode, EntropyMethod, InputFormat};
pub use dtype::Dtype;
pub use errors::{CodecError, CodecResult, ErrorKind};
pub use standalone::{Decoder, Encoder};

mod adapter;
mod bitio;
mod chunk;
mod config;
mod constants;
mod dtype;
mod entropy;
mod errors;
mod header;
mod shape;
mod standalone;
mod transform;
mod worker_pool;

pub use adapter::ReadPossiblyCompressed;
pub use shape::Shape;

/// Compresses `buf`, a contiguous buffer of `config.bytearray_dtype`-typed
/// elements (or raw bytes, if the config's `input_format` is `Byte` and the
/// dtype is treated as opaque), according to `config`.
///
/// This is the non-streaming, single-shot entry point: the whole input is
/// split into fixed-size chunks (the tail chunk may be smaller) and the
/// chunks are processed by a worker pool, but the returned bytes are the
/// concatenation of every chunk frame with no surrounding framing of their
/// own — callers that want to emit chunks incrementally should use
/// [`Encoder`] instead.
pub fn compress(buf: &[u8], config: &CodecConfig) -> CodecResult<Vec<u8>> {
  let mut encoder = Encoder::new(config.clone())?.with_expected_len(buf.len() as u64);
  encoder.push_bytes(buf)?;
  encoder.finish()
}

/// Compresses `buf` as an array of `config.bytearray_dtype`-typed elements
/// carrying an explicit `shape`, written after the first chunk's header so a
/// decoder can recover the original dimensions alongside the flat bytes.
/// `config.input_format` should be `TorchArray` or `NumpyArray`; a `Byte`
/// input format still works but the shape is written and simply unused by
/// [`decompress`], which never returns it (use [`Decoder::shape`] instead).
pub fn compress_array(buf: &[u8], config: &CodecConfig, shape: Shape) -> CodecResult<Vec<u8>> {
  let mut encoder = Encoder::new(config.clone())?
    .with_shape(shape)
    .with_expected_len(buf.len() as u64);
  encoder.push_bytes(buf)?;
  encoder.finish()
}

/// Decompresses a byte sequence produced by [`compress`] or [`Encoder`].
pub fn decompress(buf: &[u8]) -> CodecResult<Vec<u8>> {
  let mut decoder = Decoder::new()?;
  let mut out = Vec::new();
  decoder.feed_bytes(buf)?;
  decoder.pull_decoded(&mut out)?;
  Ok(out)
}

#[cfg(test)]
mod tests;
