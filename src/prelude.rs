//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Error types
pub use crate::error::RxError;
// Creation functions
pub use crate::observable;
// Core traits
pub use crate::observable::Observable;
pub use crate::observer::{AllObserver, BoxedObserver, DynObserver, FnMutObserver, Observer};
// Subject
pub use crate::subject::*;
// Subscription
pub use crate::subscription::*;
