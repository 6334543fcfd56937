use crate::constants::{
  DEFAULT_COMPRESSION_CHUNK, DEFAULT_COMPRESSION_THRESHOLD, DEFAULT_ZSTD_LEVEL,
};
use crate::errors::{CodecError, CodecResult};
use std::str::FromStr;

/// Which entropy backend a stream (or a whole configuration) should use.
///
/// `Auto` is a per-stream decision: the chunk codec inspects each stream's
/// byte histogram and picks `Huffman` or `Zstd` independently, recording the
/// choice in that stream's tag so decoding never has to repeat the decision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EntropyMethod {
  #[default]
  Auto,
  Huffman,
  Zstd,
  Fse,
}

impl FromStr for EntropyMethod {
  type Err = CodecError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_uppercase().as_str() {
      "AUTO" => Ok(EntropyMethod::Auto),
      "HUFFMAN" => Ok(EntropyMethod::Huffman),
      "ZSTD" => Ok(EntropyMethod::Zstd),
      "FSE" => Ok(EntropyMethod::Fse),
      other => Err(CodecError::unsupported_dtype(format!(
        "unrecognized entropy method '{}'",
        other
      ))),
    }
  }
}

/// Whether the input is raw bytes or has array structure that needs a
/// shape descriptor emitted alongside the first chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputFormat {
  #[default]
  Byte,
  TorchArray,
  NumpyArray,
}

impl FromStr for InputFormat {
  type Err = CodecError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_uppercase().as_str() {
      "BYTE" => Ok(InputFormat::Byte),
      "TORCH" | "TORCH-ARRAY" | "TORCH_ARRAY" => Ok(InputFormat::TorchArray),
      "NUMPY" | "NUMPY-ARRAY" | "NUMPY_ARRAY" => Ok(InputFormat::NumpyArray),
      other => Err(CodecError::unsupported_dtype(format!(
        "unrecognized input format '{}'",
        other
      ))),
    }
  }
}

/// The element type to assume when `input_format` is [`InputFormat::Byte`].
///
/// This is a thin alias over [`crate::Dtype`] kept distinct so the
/// configuration surface matches the external option table (`bytearray_dtype`)
/// rather than exposing the internal dtype representation directly.
pub type BytearrayDtype = crate::Dtype;

/// Whether a companion buffer should be XOR'd against the primary buffer
/// before the byte-split transform runs.
///
/// The XOR pre/post pass itself is an external collaborator (see the
/// crate's design notes): this type only records the mode in configuration
/// and the header so the bookkeeping round-trips; performing the XOR is the
/// caller's responsibility via [`crate::ReadPossiblyCompressed`]-style glue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeltaMode {
  #[default]
  None,
  PairBuffer,
  PairFile,
}

impl DeltaMode {
  pub(crate) fn to_code(self) -> u8 {
    match self {
      DeltaMode::None => 0,
      DeltaMode::PairBuffer => 1,
      DeltaMode::PairFile => 2,
    }
  }

  pub(crate) fn from_code(code: u8) -> CodecResult<Self> {
    match code {
      0 => Ok(DeltaMode::None),
      1 => Ok(DeltaMode::PairBuffer),
      2 => Ok(DeltaMode::PairFile),
      other => Err(CodecError::malformed_header(format!(
        "unrecognized delta_mode byte {}",
        other
      ))),
    }
  }
}

/// All configuration recognized at construction time.
///
/// Some fields (`method`, `input_format`, `delta_compressed_type`) are
/// explicitly stored in the compressed bytes; others (`threads`,
/// `zstd_level`) only affect how compression runs and aren't recoverable
/// from the output.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct CodecConfig {
  /// Entropy backend selection (default: [`EntropyMethod::Auto`]).
  pub method: EntropyMethod,
  /// Governs whether a shape descriptor is emitted (default: [`InputFormat::Byte`]).
  pub input_format: InputFormat,
  /// Element type to assume for [`InputFormat::Byte`] input (default: [`crate::Dtype::F32`]).
  pub bytearray_dtype: BytearrayDtype,
  /// Worker count; `0` means auto (`min(logical_cores, 16)`).
  pub threads: usize,
  /// Chunk size in single-shot mode; must be a power of two (default: 256 KiB).
  pub compression_chunk: usize,
  /// Chunk size in streaming mode; must be a power of two (default: same as `compression_chunk`).
  pub streaming_chunk: usize,
  /// Enables the concatenate-independent-chunks streaming output mode.
  pub is_streaming: bool,
  /// Ratio above which a stream is stored raw instead of entropy-coded (default: 0.95).
  pub compression_threshold: f64,
  /// How far into a multi-chunk input (as a percent, 0-100) the adaptive
  /// stored-raw abort may fire (default: 100, i.e. disabled).
  pub check_th_after_percent: u8,
  /// ZSTD quality level when that backend is selected (default: 3).
  pub zstd_level: i32,
  /// Enables the XOR-against-companion prepass bookkeeping (default: [`DeltaMode::None`]).
  pub delta_compressed_type: DeltaMode,
}

impl Default for CodecConfig {
  fn default() -> Self {
    Self {
      method: EntropyMethod::Auto,
      input_format: InputFormat::Byte,
      bytearray_dtype: crate::Dtype::F32,
      threads: 0,
      compression_chunk: DEFAULT_COMPRESSION_CHUNK,
      streaming_chunk: DEFAULT_COMPRESSION_CHUNK,
      is_streaming: false,
      compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
      check_th_after_percent: 100,
      zstd_level: DEFAULT_ZSTD_LEVEL,
      delta_compressed_type: DeltaMode::None,
    }
  }
}

impl CodecConfig {
  /// Sets [`method`][CodecConfig::method].
  pub fn with_method(mut self, method: EntropyMethod) -> Self {
    self.method = method;
    self
  }

  /// Sets [`input_format`][CodecConfig::input_format].
  pub fn with_input_format(mut self, input_format: InputFormat) -> Self {
    self.input_format = input_format;
    self
  }

  /// Sets [`bytearray_dtype`][CodecConfig::bytearray_dtype].
  pub fn with_bytearray_dtype(mut self, dtype: BytearrayDtype) -> Self {
    self.bytearray_dtype = dtype;
    self
  }

  /// Sets [`threads`][CodecConfig::threads].
  pub fn with_threads(mut self, threads: usize) -> Self {
    self.threads = threads;
    self
  }

  /// Sets [`compression_chunk`][CodecConfig::compression_chunk].
  pub fn with_compression_chunk(mut self, size: usize) -> Self {
    self.compression_chunk = size;
    self
  }

  /// Sets [`streaming_chunk`][CodecConfig::streaming_chunk].
  pub fn with_streaming_chunk(mut self, size: usize) -> Self {
    self.streaming_chunk = size;
    self
  }

  /// Sets [`is_streaming`][CodecConfig::is_streaming].
  pub fn with_streaming(mut self, is_streaming: bool) -> Self {
    self.is_streaming = is_streaming;
    self
  }

  /// Sets [`compression_threshold`][CodecConfig::compression_threshold].
  pub fn with_compression_threshold(mut self, threshold: f64) -> Self {
    self.compression_threshold = threshold;
    self
  }

  /// Sets [`zstd_level`][CodecConfig::zstd_level].
  pub fn with_zstd_level(mut self, level: i32) -> Self {
    self.zstd_level = level;
    self
  }

  /// Sets [`check_th_after_percent`][CodecConfig::check_th_after_percent].
  pub fn with_check_th_after_percent(mut self, percent: u8) -> Self {
    self.check_th_after_percent = percent;
    self
  }

  /// Sets [`delta_compressed_type`][CodecConfig::delta_compressed_type].
  pub fn with_delta_compressed_type(mut self, mode: DeltaMode) -> Self {
    self.delta_compressed_type = mode;
    self
  }

  /// Validates the configuration, returning an error describing the first
  /// problem found. Called internally before any compression work starts.
  pub(crate) fn validate(&self) -> CodecResult<()> {
    if !self.compression_chunk.is_power_of_two() {
      return Err(CodecError::new(
        crate::ErrorKind::MalformedHeader,
        format!(
          "compression_chunk must be a power of two (was {})",
          self.compression_chunk
        ),
      ));
    }
    if !self.streaming_chunk.is_power_of_two() {
      return Err(CodecError::new(
        crate::ErrorKind::MalformedHeader,
        format!(
          "streaming_chunk must be a power of two (was {})",
          self.streaming_chunk
        ),
      ));
    }
    if !(0.0..=1.0).contains(&self.compression_threshold) {
      return Err(CodecError::new(
        crate::ErrorKind::MalformedHeader,
        "compression_threshold must be in [0, 1]",
      ));
    }
    Ok(())
  }

  /// Chunk size actually used, depending on `is_streaming`.
  pub(crate) fn effective_chunk_size(&self) -> usize {
    if self.is_streaming {
      self.streaming_chunk
    } else {
      self.compression_chunk
    }
  }

  /// Resolved worker count: `threads` if nonzero, else `min(cores, 16)`.
  pub(crate) fn resolved_threads(&self) -> usize {
    if self.threads > 0 {
      self.threads
    } else {
      num_cpus::get().min(crate::constants::MAX_WORKERS)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_config_is_valid() {
    assert!(CodecConfig::default().validate().is_ok());
  }

  #[test]
  fn non_power_of_two_chunk_is_rejected() {
    let config = CodecConfig::default().with_compression_chunk(3);
    assert!(config.validate().is_err());
  }

  #[test]
  fn entropy_method_from_str_is_case_insensitive() {
    assert_eq!("zstd".parse::<EntropyMethod>().unwrap(), EntropyMethod::Zstd);
    assert_eq!("Auto".parse::<EntropyMethod>().unwrap(), EntropyMethod::Auto);
  }
}
