use crate::{compress, CodecConfig, Dtype};

fn f32_bytes(n: usize) -> Vec<u8> {
  let mut data = Vec::with_capacity(n * 4);
  for i in 0..n {
    data.extend_from_slice(&((i as f32) * 0.91 - 3.0).to_le_bytes());
  }
  data
}

#[test]
fn thread_count_does_not_change_compressed_bytes() {
  let data = f32_bytes(200_000);
  let baseline = compress(
    &data,
    &CodecConfig::default()
      .with_bytearray_dtype(Dtype::F32)
      .with_compression_chunk(4096)
      .with_threads(1),
  )
  .unwrap();

  for threads in [2, 4, 8] {
    let out = compress(
      &data,
      &CodecConfig::default()
        .with_bytearray_dtype(Dtype::F32)
        .with_compression_chunk(4096)
        .with_threads(threads),
    )
    .unwrap();
    assert_eq!(out, baseline, "threads={threads} produced different bytes");
  }
}

#[test]
fn thread_count_does_not_change_bytes_within_a_single_tiled_chunk() {
  // A chunk large enough that the byte-split transform subdivides it into
  // multiple rayon tiles (see transform::MIN_ELEMENTS_PER_TILE); tiling is a
  // performance artifact and must not perturb the output.
  let data = f32_bytes(200_000);
  let config = |threads: usize| {
    CodecConfig::default()
      .with_bytearray_dtype(Dtype::F32)
      .with_compression_chunk(1 << 20)
      .with_threads(threads)
  };
  let baseline = compress(&data, &config(1)).unwrap();
  for threads in [2, 8] {
    let out = compress(&data, &config(threads)).unwrap();
    assert_eq!(out, baseline, "threads={threads} produced different bytes");
  }
}
