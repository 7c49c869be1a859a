//! # rxreplay: bounded replay subjects
//!
//! A [`ReplaySubject`] is a multicast source that remembers the last N
//! values it emitted and hands them to every new subscriber before
//! forwarding live notifications.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxreplay::prelude::*;
//!
//! let mut subject = ReplaySubject::<_, ()>::with_capacity(2);
//! subject.next("first");
//! subject.next("second");
//! subject.next("third");
//!
//! // Prints "second" then "third".
//! subject.clone().subscribe(|v| println!("Value: {}", v));
//! subject.complete();
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ReplaySubject`] | Multicast subject with a bounded replay buffer |
//! | [`Subject`] | Plain multicast subject, no replay |
//! | [`Observable`] | Anything that can be subscribed to |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Subscription`] | Handle to cancel an active subscription |
//!
//! Everything is single-threaded: handles are `Rc` based and observers may
//! borrow from the caller's stack frame.
//!
//! [`ReplaySubject`]: subject::ReplaySubject
//! [`Subject`]: subject::Subject
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription

pub mod error;
pub mod observable;
pub mod observer;
pub mod prelude;
pub mod rc;
pub mod subject;
pub mod subscription;

// Re-export the prelude module
pub use prelude::*;

// Bring the README into Cargo-driven doctests.
#[cfg(doctest)]
mod __markdown_doctests {
  mod readme {
    #![doc = include_str!("../README.md")]
  }
}
