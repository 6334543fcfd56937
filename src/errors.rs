use std::error::Error;
use std::fmt::{Display, Formatter};
use std::{fmt, io};

/// The different kinds of errors the codec can return.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
  /// The 2-byte magic didn't match, the version major exceeds what this
  /// build supports, or the header was shorter than 32 bytes.
  MalformedHeader,
  /// The header's dtype byte does not map to a recognized [`crate::Dtype`].
  UnsupportedDtype,
  /// A buffer's length wasn't a multiple of its element width, or a delta
  /// companion buffer had a different length than the primary buffer.
  LengthMismatch,
  /// An entropy backend failed to decode, or (fatal only during decode)
  /// produced output inconsistent with the declared stream length.
  BackendFailure,
  /// A chunk's declared compressed length exceeds the bytes remaining in
  /// the input.
  ChunkTruncated,
  /// A cooperative cancel flag was observed between chunk tasks.
  Cancelled,
  /// Propagated from a `Read`/`Write` implementation passed to the codec.
  Io(io::ErrorKind),
}

/// The error type used in results for all `bytesplit` functionality.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecError {
  pub kind: ErrorKind,
  pub message: String,
}

impl CodecError {
  pub(crate) fn new<S: AsRef<str>>(kind: ErrorKind, message: S) -> Self {
    CodecError {
      kind,
      message: message.as_ref().to_string(),
    }
  }

  pub(crate) fn malformed_header<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::MalformedHeader, message)
  }

  pub(crate) fn unsupported_dtype<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::UnsupportedDtype, message)
  }

  pub(crate) fn length_mismatch<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::LengthMismatch, message)
  }

  pub(crate) fn backend_failure<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::BackendFailure, message)
  }

  pub(crate) fn chunk_truncated<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::ChunkTruncated, message)
  }

  pub(crate) fn cancelled<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::Cancelled, message)
  }
}

impl Display for CodecError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "bytesplit {:?} error: {}", self.kind, &self.message)
  }
}

impl From<io::Error> for CodecError {
  fn from(err: io::Error) -> Self {
    CodecError {
      kind: ErrorKind::Io(err.kind()),
      message: format!("{}", err),
    }
  }
}

impl Error for CodecError {}

pub type CodecResult<T> = Result<T, CodecError>;
