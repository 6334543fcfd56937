use crate::constants::byte_reorder_code;
use crate::errors::{CodecError, CodecResult};
use std::str::FromStr;

/// The element type a buffer is declared to hold.
///
/// Each variant carries per-type constants (width, the `byte_reorder_code`
/// used to split it, and whether the bit-rotation pass applies) via a
/// static table rather than a generic numeric trait: the recognized set is
/// small and fixed, so a tagged enum is simpler than a `NumberLike`-style
/// trait hierarchy would be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Dtype {
  F32,
  F16,
  Bf16,
  F8E4M3,
  F8E5M2,
  U32,
}

/// Per-`Dtype` constants, looked up once per chunk rather than recomputed.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DtypeInfo {
  /// Element width in bytes (1, 2, or 4).
  pub width: usize,
  /// Whether the dtype is a floating-point type (affects eligibility for
  /// bit rotation and the default `byte_reorder_code`).
  pub is_float: bool,
  /// The `byte_reorder_code` this dtype uses by default.
  pub byte_reorder_code: u8,
  /// Whether bit rotation (moving the sign bit into the exponent byte)
  /// applies to this dtype by default.
  pub bit_reorder_default: bool,
  /// The header's one-byte dtype code.
  pub dtype_code: u8,
}

impl Dtype {
  pub(crate) fn info(self) -> DtypeInfo {
    match self {
      Dtype::F32 => DtypeInfo {
        width: 4,
        is_float: true,
        byte_reorder_code: byte_reorder_code::F32,
        bit_reorder_default: true,
        dtype_code: 1,
      },
      Dtype::F16 => DtypeInfo {
        width: 2,
        is_float: true,
        byte_reorder_code: byte_reorder_code::F16_BF16,
        bit_reorder_default: true,
        dtype_code: 2,
      },
      Dtype::Bf16 => DtypeInfo {
        width: 2,
        is_float: true,
        byte_reorder_code: byte_reorder_code::F16_BF16,
        bit_reorder_default: true,
        dtype_code: 3,
      },
      Dtype::F8E4M3 => DtypeInfo {
        width: 1,
        is_float: true,
        byte_reorder_code: byte_reorder_code::F8,
        bit_reorder_default: false,
        dtype_code: 4,
      },
      Dtype::F8E5M2 => DtypeInfo {
        width: 1,
        is_float: true,
        byte_reorder_code: byte_reorder_code::F8,
        bit_reorder_default: false,
        dtype_code: 5,
      },
      Dtype::U32 => DtypeInfo {
        width: 4,
        is_float: false,
        byte_reorder_code: byte_reorder_code::U32_NONE,
        bit_reorder_default: false,
        dtype_code: 6,
      },
    }
  }

  /// Element width in bytes: 1, 2, or 4.
  pub fn width(self) -> usize {
    self.info().width
  }

  pub fn is_float(self) -> bool {
    self.info().is_float
  }

  pub(crate) fn from_code(code: u8) -> CodecResult<Self> {
    match code {
      1 => Ok(Dtype::F32),
      2 => Ok(Dtype::F16),
      3 => Ok(Dtype::Bf16),
      4 => Ok(Dtype::F8E4M3),
      5 => Ok(Dtype::F8E5M2),
      6 => Ok(Dtype::U32),
      other => Err(CodecError::unsupported_dtype(format!(
        "unrecognized dtype code {}",
        other
      ))),
    }
  }
}

impl FromStr for Dtype {
  type Err = CodecError;

  /// Parses a dtype name case-insensitively, mirroring the original
  /// implementation's `EnumMethod`/`EnumLossy`-style string lookup so
  /// configuration callers can thread dtype names through as strings.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "float32" | "f32" => Ok(Dtype::F32),
      "float16" | "f16" => Ok(Dtype::F16),
      "bfloat16" | "bf16" => Ok(Dtype::Bf16),
      "float8_e4m3fn" | "float8_e4m3" | "f8_e4m3" => Ok(Dtype::F8E4M3),
      "float8_e5m2" | "f8_e5m2" => Ok(Dtype::F8E5M2),
      "uint32" | "u32" => Ok(Dtype::U32),
      other => Err(CodecError::unsupported_dtype(format!(
        "unrecognized dtype name '{}'",
        other
      ))),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn widths_are_1_2_or_4() {
    for dtype in [
      Dtype::F32,
      Dtype::F16,
      Dtype::Bf16,
      Dtype::F8E4M3,
      Dtype::F8E5M2,
      Dtype::U32,
    ] {
      assert!([1, 2, 4].contains(&dtype.width()));
    }
  }

  #[test]
  fn code_round_trips() {
    for dtype in [
      Dtype::F32,
      Dtype::F16,
      Dtype::Bf16,
      Dtype::F8E4M3,
      Dtype::F8E5M2,
      Dtype::U32,
    ] {
      let code = dtype.info().dtype_code;
      assert_eq!(Dtype::from_code(code).unwrap(), dtype);
    }
  }

  #[test]
  fn from_str_is_case_insensitive() {
    assert_eq!("FLOAT32".parse::<Dtype>().unwrap(), Dtype::F32);
    assert_eq!("bf16".parse::<Dtype>().unwrap(), Dtype::Bf16);
    assert!("garbage".parse::<Dtype>().is_err());
  }
}
