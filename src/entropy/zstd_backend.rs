//! Thin wrapper over the `zstd` crate, used both as an explicit entropy
//! method and as one of the two candidates the `Auto` policy chooses from.

use crate::errors::{CodecError, CodecResult};
use std::io::Write;

pub(crate) fn encode(data: &[u8], level: i32) -> CodecResult<Vec<u8>> {
  let mut encoder = zstd::Encoder::new(Vec::new(), level)
    .map_err(|e| CodecError::backend_failure(format!("zstd encoder init failed: {}", e)))?;
  encoder
    .write_all(data)
    .map_err(|e| CodecError::backend_failure(format!("zstd write failed: {}", e)))?;
  encoder
    .finish()
    .map_err(|e| CodecError::backend_failure(format!("zstd finish failed: {}", e)))
}

pub(crate) fn decode(payload: &[u8], decoded_len: usize) -> CodecResult<Vec<u8>> {
  let mut out = Vec::with_capacity(decoded_len);
  zstd::stream::copy_decode(payload, &mut out)
    .map_err(|e| CodecError::backend_failure(format!("zstd decode failed: {}", e)))?;
  if out.len() != decoded_len {
    return Err(CodecError::backend_failure(
      "zstd decode produced a different length than declared",
    ));
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips() {
    let data: Vec<u8> = (0..5000u32).map(|i| (i % 17) as u8).collect();
    let encoded = encode(&data, 3).unwrap();
    let decoded = decode(&encoded, data.len()).unwrap();
    assert_eq!(decoded, data);
  }

  #[test]
  fn round_trips_empty() {
    let encoded = encode(&[], 3).unwrap();
    let decoded = decode(&encoded, 0).unwrap();
    assert!(decoded.is_empty());
  }
}
