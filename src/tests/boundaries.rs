use crate::config::EntropyMethod;
use crate::{compress, decompress, CodecConfig, Dtype};

fn f32_bytes(n: usize) -> Vec<u8> {
  let mut data = Vec::with_capacity(n * 4);
  for i in 0..n {
    data.extend_from_slice(&((i as f32).sin() * 1000.0).to_le_bytes());
  }
  data
}

fn round_trips(n_elements: usize, chunk_size: usize) {
  let data = f32_bytes(n_elements);
  let config = CodecConfig::default()
    .with_bytearray_dtype(Dtype::F32)
    .with_compression_chunk(chunk_size);
  let compressed = compress(&data, &config).unwrap();
  let decompressed = decompress(&compressed).unwrap();
  assert_eq!(
    decompressed, data,
    "failed for n_elements={n_elements} chunk_size={chunk_size}"
  );
}

#[test]
fn empty_input_decodes_to_empty() {
  let config = CodecConfig::default().with_bytearray_dtype(Dtype::F32);
  let compressed = compress(&[], &config).unwrap();
  assert_eq!(compressed.len(), crate::constants::HEADER_SIZE);
  assert_eq!(decompress(&compressed).unwrap(), Vec::<u8>::new());
}

#[test]
fn single_element_round_trips() {
  round_trips(1, 4096);
}

#[test]
fn exact_chunk_size_and_off_by_one_round_trip() {
  let chunk_size = 4096; // 1024 f32 elements
  let elements_per_chunk = chunk_size / 4;
  for n in [
    elements_per_chunk - 1,
    elements_per_chunk,
    elements_per_chunk + 1,
    2 * elements_per_chunk - 1,
    2 * elements_per_chunk + 1,
  ] {
    round_trips(n, chunk_size);
  }
}

#[test]
fn huffman_chunk_larger_than_128_kib_still_round_trips() {
  // 256 KiB worth of f32 elements with a chunk size above the Huffman
  // per-block cap; the codec must subdivide internally rather than fail.
  let n = (256 * 1024) / 4;
  let data = f32_bytes(n);
  let config = CodecConfig::default()
    .with_bytearray_dtype(Dtype::F32)
    .with_method(EntropyMethod::Huffman)
    .with_compression_chunk(256 * 1024);
  let compressed = compress(&data, &config).unwrap();
  assert_eq!(decompress(&compressed).unwrap(), data);
}
