use std::{fmt, num::NonZeroUsize, str::FromStr};

use tracing::debug;

use crate::error::RxError;

/// How many values a [`ReplaySubject`](super::ReplaySubject) keeps for late
/// subscribers.
///
/// Always at least 1. Unbounded is simply the largest representable
/// capacity, it takes no separate code path.
///
/// Integer inputs convert infallibly; values below 1 are clamped to 1.
/// Floating point and textual inputs are floored first and rejected with
/// [`RxError::InvalidArgument`] when they are not numbers:
///
/// ```rust
/// use rxreplay::prelude::*;
///
/// assert_eq!(BufferCapacity::try_from(2.9_f64).unwrap().get(), 2);
/// assert_eq!(BufferCapacity::new(0).get(), 1);
/// assert!(BufferCapacity::try_from(f64::INFINITY).unwrap().is_unbounded());
/// assert!("three".parse::<BufferCapacity>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferCapacity(usize);

impl BufferCapacity {
  pub const UNBOUNDED: Self = Self(usize::MAX);

  pub fn new(capacity: usize) -> Self {
    if capacity == 0 {
      debug!("buffer capacity 0 clamped to 1");
    }
    Self(capacity.max(1))
  }

  #[inline]
  pub const fn get(self) -> usize { self.0 }

  #[inline]
  pub const fn is_unbounded(self) -> bool { self.0 == usize::MAX }
}

impl Default for BufferCapacity {
  fn default() -> Self { Self::UNBOUNDED }
}

impl fmt::Display for BufferCapacity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_unbounded() { f.write_str("unbounded") } else { write!(f, "{}", self.0) }
  }
}

impl From<usize> for BufferCapacity {
  fn from(capacity: usize) -> Self { Self::new(capacity) }
}

impl From<NonZeroUsize> for BufferCapacity {
  fn from(capacity: NonZeroUsize) -> Self { Self(capacity.get()) }
}

impl TryFrom<f64> for BufferCapacity {
  type Error = RxError;

  fn try_from(capacity: f64) -> Result<Self, Self::Error> {
    if capacity.is_nan() {
      return Err(RxError::InvalidArgument("buffer capacity is NaN".into()));
    }
    let floored = capacity.floor();
    if floored < 1.0 {
      debug!(capacity, "buffer capacity clamped to 1");
      Ok(Self(1))
    } else if floored >= usize::MAX as f64 {
      Ok(Self::UNBOUNDED)
    } else {
      Ok(Self(floored as usize))
    }
  }
}

impl TryFrom<i64> for BufferCapacity {
  type Error = RxError;

  fn try_from(capacity: i64) -> Result<Self, Self::Error> {
    if capacity < 1 {
      debug!(capacity, "buffer capacity clamped to 1");
      return Ok(Self(1));
    }
    Ok(Self(usize::try_from(capacity).unwrap_or(usize::MAX)))
  }
}

impl FromStr for BufferCapacity {
  type Err = RxError;

  /// Accepts anything `f64` parses (including `inf`) plus `unbounded`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("unbounded") {
      return Ok(Self::UNBOUNDED);
    }
    let capacity = s
      .parse::<f64>()
      .map_err(|_| RxError::InvalidArgument(format!("buffer capacity `{s}` is not a number")))?;
    Self::try_from(capacity)
  }
}

impl TryFrom<&str> for BufferCapacity {
  type Error = RxError;

  fn try_from(s: &str) -> Result<Self, Self::Error> { s.parse() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn integers_clamp_to_one() {
    assert_eq!(BufferCapacity::new(0).get(), 1);
    assert_eq!(BufferCapacity::from(5usize).get(), 5);
    assert_eq!(BufferCapacity::try_from(-3i64), Ok(BufferCapacity::new(1)));
    assert_eq!(BufferCapacity::try_from(7i64).map(BufferCapacity::get), Ok(7));
  }

  #[test]
  fn floats_are_floored() {
    assert_eq!(BufferCapacity::try_from(3.7_f64).map(BufferCapacity::get), Ok(3));
    assert_eq!(BufferCapacity::try_from(0.5_f64).map(BufferCapacity::get), Ok(1));
    assert_eq!(BufferCapacity::try_from(-2.0_f64).map(BufferCapacity::get), Ok(1));
    assert_eq!(BufferCapacity::try_from(f64::NEG_INFINITY).map(BufferCapacity::get), Ok(1));
  }

  #[test]
  fn infinity_is_unbounded() {
    assert_eq!(BufferCapacity::try_from(f64::INFINITY), Ok(BufferCapacity::UNBOUNDED));
    assert_eq!(BufferCapacity::try_from(1e300_f64), Ok(BufferCapacity::UNBOUNDED));
    assert_eq!(BufferCapacity::default(), BufferCapacity::UNBOUNDED);
  }

  #[test]
  fn nan_is_rejected() {
    assert!(matches!(BufferCapacity::try_from(f64::NAN), Err(RxError::InvalidArgument(_))));
  }

  #[test]
  fn parse_text() {
    assert_eq!("4".parse::<BufferCapacity>().map(BufferCapacity::get), Ok(4));
    assert_eq!(" 2.5 ".parse::<BufferCapacity>().map(BufferCapacity::get), Ok(2));
    assert_eq!("Unbounded".parse::<BufferCapacity>(), Ok(BufferCapacity::UNBOUNDED));
    assert_eq!("inf".parse::<BufferCapacity>(), Ok(BufferCapacity::UNBOUNDED));
    assert!(matches!("NaN".parse::<BufferCapacity>(), Err(RxError::InvalidArgument(_))));
    assert!(matches!(BufferCapacity::try_from("foo"), Err(RxError::InvalidArgument(_))));
  }

  #[test]
  fn display() {
    assert_eq!(BufferCapacity::new(3).to_string(), "3");
    assert_eq!(BufferCapacity::UNBOUNDED.to_string(), "unbounded");
  }
}
