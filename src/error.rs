//! Error types for contract violations at the subject boundary.
//!
//! Errors produced by a stream itself are never wrapped in [`RxError`]: they
//! travel as the subject's own `Err` type to every observer's `error`.

use thiserror::Error;

/// Usage errors raised synchronously by the call that broke the contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RxError {
  /// A construction argument could not be accepted (e.g. a non-numeric
  /// buffer capacity).
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// The operation was invoked through a handle whose subject no longer
  /// exists.
  #[error("receiver is not a live {0}")]
  InvalidReceiver(&'static str),
}

pub type Result<T, E = RxError> = std::result::Result<T, E>;
