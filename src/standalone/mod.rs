//! The streaming state machines built on top of [`crate::chunk`]: an
//! `Encoder` that buffers pushed bytes into element-aligned chunks and
//! emits independently-decodable chunk frames, and a `Decoder` that does
//! the reverse, both able to be fed data incrementally.

mod compressor;
mod decompressor;

pub use compressor::Encoder;
pub use decompressor::Decoder;
