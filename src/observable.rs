//! The `Observable` trait: anything that observers can subscribe to.

use crate::{
  observer::{AllObserver, FnMutObserver, Observer},
  subscription::Subscription,
};

mod from_iter;
pub use from_iter::*;

/// A source of values that delivers them to subscribed observers.
///
/// `subscribe_with` is the only required method. The other `subscribe_*`
/// methods wrap closures into an [`Observer`] and forward to it.
pub trait Observable<'a, Item, Err>: Sized {
  /// Handle used to cancel the subscription.
  type Unsub: Subscription;

  /// Subscribes a full observer.
  fn subscribe_with<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'a;

  /// Subscribes a `next` handler, ignoring `error` and `complete`.
  #[inline]
  fn subscribe<N>(self, next: N) -> Self::Unsub
  where
    N: FnMut(Item) + 'a,
  {
    self.subscribe_with(FnMutObserver(next))
  }

  /// Subscribes `next` and `error` handlers, ignoring `complete`.
  #[inline]
  fn subscribe_err<N, E>(self, next: N, error: E) -> Self::Unsub
  where
    N: FnMut(Item) + 'a,
    E: FnOnce(Err) + 'a,
  {
    self.subscribe_with(AllObserver { next, error, complete: || {} })
  }

  /// Subscribes a handler for every notification.
  ///
  /// * `error`: A handler for a terminal event resulting from an error.
  /// * `complete`: A handler for a terminal event resulting from successful
  ///   completion.
  #[inline]
  fn subscribe_all<N, E, C>(self, next: N, error: E, complete: C) -> Self::Unsub
  where
    N: FnMut(Item) + 'a,
    E: FnOnce(Err) + 'a,
    C: FnOnce() + 'a,
  {
    self.subscribe_with(AllObserver { next, error, complete })
  }
}
