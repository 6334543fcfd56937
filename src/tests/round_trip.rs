use crate::{compress, compress_array, decompress, CodecConfig, Dtype, Shape};

fn f32_bytes(n: usize) -> Vec<u8> {
  let mut data = Vec::with_capacity(n * 4);
  for i in 0..n {
    data.extend_from_slice(&((i as f32) * 0.37 - 12.0).to_le_bytes());
  }
  data
}

fn bf16_bytes(n: usize) -> Vec<u8> {
  let mut data = Vec::with_capacity(n * 2);
  for i in 0..n {
    let bits = if i % 2 == 0 { 0x0000u16 } else { 0x3F80u16 };
    data.extend_from_slice(&bits.to_le_bytes());
  }
  data
}

fn u32_bytes(n: usize) -> Vec<u8> {
  let mut data = Vec::with_capacity(n * 4);
  for i in 0..n {
    data.extend_from_slice(&((i as u32 * 7) % 40_000).to_le_bytes());
  }
  data
}

#[test]
fn round_trips_every_dtype() {
  for dtype in [
    Dtype::F32,
    Dtype::F16,
    Dtype::Bf16,
    Dtype::F8E4M3,
    Dtype::F8E5M2,
    Dtype::U32,
  ] {
    let width = dtype.width();
    let n = 3000;
    let data: Vec<u8> = match dtype {
      Dtype::F32 => f32_bytes(n),
      Dtype::U32 => u32_bytes(n),
      Dtype::Bf16 => bf16_bytes(n),
      _ => (0..n * width).map(|i| (i % 256) as u8).collect(),
    };
    let config = CodecConfig::default().with_bytearray_dtype(dtype);
    let compressed = compress(&data, &config).unwrap();
    let decompressed = decompress(&compressed).unwrap();
    assert_eq!(decompressed, data, "dtype {:?} failed to round-trip", dtype);
  }
}

#[test]
fn bf16_alternating_zero_one_compresses_well() {
  let data = bf16_bytes(512 * 1024);
  let config = CodecConfig::default().with_bytearray_dtype(Dtype::Bf16);
  let compressed = compress(&data, &config).unwrap();
  assert!(
    (compressed.len() as f64) < 0.15 * (data.len() as f64),
    "expected a highly skewed exponent byte to compress well, got {} of {}",
    compressed.len(),
    data.len()
  );
  assert_eq!(decompress(&compressed).unwrap(), data);
}

#[test]
fn u32_small_values_select_two_byte_truncation() {
  let n = 1 << 18;
  let data = u32_bytes(n);
  let config = CodecConfig::default().with_bytearray_dtype(Dtype::U32);
  let compressed = compress(&data, &config).unwrap();
  assert!(compressed.len() <= data.len() / 2);
  assert_eq!(decompress(&compressed).unwrap(), data);
}

#[test]
fn idempotent_double_compress_and_double_decompress() {
  let data = f32_bytes(5000);
  let config = CodecConfig::default().with_bytearray_dtype(Dtype::F32);
  let once = compress(&data, &config).unwrap();
  let twice = compress(&once, &CodecConfig::default().with_bytearray_dtype(Dtype::F8E4M3)).unwrap();
  let back_once = decompress(&twice).unwrap();
  assert_eq!(back_once, once);
  let back_twice = decompress(&back_once).unwrap();
  assert_eq!(back_twice, data);
}

#[test]
fn array_input_round_trips_with_shape() {
  let data = f32_bytes(64);
  let shape = Shape::new(vec![8, 8]);
  let config = CodecConfig::default()
    .with_bytearray_dtype(Dtype::F32)
    .with_input_format(crate::InputFormat::NumpyArray);
  let compressed = compress_array(&data, &config, shape.clone()).unwrap();
  let mut decoder = crate::Decoder::new().unwrap();
  decoder.feed_bytes(&compressed).unwrap();
  let mut out = Vec::new();
  decoder.pull_decoded(&mut out).unwrap();
  assert_eq!(out, data);
  assert_eq!(decoder.shape(), Some(&shape));
}

#[test]
fn concatenating_two_compressed_outputs_decodes_as_their_concatenation() {
  let config = CodecConfig::default()
    .with_bytearray_dtype(Dtype::F32)
    .with_compression_chunk(4096);
  let a = f32_bytes(1024);
  let b = f32_bytes(777);
  let compressed_a = compress(&a, &config).unwrap();
  let compressed_b = compress(&b, &config).unwrap();

  let mut combined = compressed_a.clone();
  combined.extend_from_slice(&compressed_b);

  let mut decoder = crate::Decoder::new().unwrap();
  decoder.feed_bytes(&combined).unwrap();
  let mut out = Vec::new();
  decoder.pull_decoded(&mut out).unwrap();

  let mut expected = a.clone();
  expected.extend_from_slice(&b);
  assert_eq!(out, expected);
}

#[test]
fn malformed_header_is_rejected_with_no_output() {
  let mut bad = vec![b'X', b'X'];
  bad.extend(vec![0u8; 30]);
  let err = decompress(&bad).unwrap_err();
  assert_eq!(err.kind, crate::ErrorKind::MalformedHeader);
}

#[test]
fn incompressible_random_bytes_still_round_trip() {
  use rand::Rng;
  use rand_xoshiro::rand_core::SeedableRng;

  let mut rng = rand_xoshiro::Xoroshiro128PlusPlus::seed_from_u64(0);
  let data: Vec<u8> = (0..20_000u32).map(|_| rng.gen()).collect();
  let config = CodecConfig::default()
    .with_bytearray_dtype(Dtype::F8E4M3)
    .with_compression_threshold(0.0);
  let compressed = compress(&data, &config).unwrap();
  assert_eq!(decompress(&compressed).unwrap(), data);
}
