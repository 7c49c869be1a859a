use std::collections::VecDeque;

use tracing::{debug, trace};

use super::{
  subject_subscription::SubjectSubscription,
  subscribers::{broadcast_complete, broadcast_error, broadcast_value, Slot, Subscribers},
};
use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
  rc::{MutRc, WeakMutRc},
};

/// Lifecycle of a subject.
///
/// Leaves `Active` at most once. The recorded signal is handed to every
/// observer that subscribes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TerminalState<Err> {
  #[default]
  Active,
  Completed,
  Failed(Err),
}

impl<Err> TerminalState<Err> {
  #[inline]
  pub fn is_active(&self) -> bool { matches!(self, TerminalState::Active) }

  #[inline]
  pub fn is_stopped(&self) -> bool { !self.is_active() }
}

enum Event<Item, Err> {
  Next(u64, Item),
  Error(Err),
  Complete,
}

pub(crate) struct SubjectCore<'a, Item, Err> {
  pub(crate) subscribers: Subscribers<'a, Item, Err>,
  terminal: TerminalState<Err>,
  /// Values accepted so far; also the sequence number of the next value.
  emitted: u64,
  pending: VecDeque<Event<Item, Err>>,
  dispatching: bool,
}

impl<'a, Item, Err> Default for SubjectCore<'a, Item, Err> {
  fn default() -> Self {
    Self {
      subscribers: Subscribers::default(),
      terminal: TerminalState::Active,
      emitted: 0,
      pending: VecDeque::new(),
      dispatching: false,
    }
  }
}

/// Subject: A hot observable that multicasts values to many observers.
///
/// The `Subject` acts as both an `Observer` and an `Observable`. Clones share
/// the same subscriber list, so the usual pattern is to keep one handle for
/// emitting and clone it for every `subscribe`.
///
/// # Terminal signals
///
/// The first `complete` or `error` wins. It is delivered once to every
/// current observer, and replayed immediately to anyone subscribing later.
/// Values emitted after that are dropped.
///
/// # Re-Entrancy Policy
///
/// - **Emissions are re-entrant.** Calling `next`/`error`/`complete` on the
///   same `Subject` from within one of its callbacks queues the notification.
///   The outermost emission delivers it once the current delivery finishes,
///   so every observer sees notifications in emission order and no observer
///   is ever entered twice.
/// - **Subscription mutations apply immediately.** A `subscribe` from inside
///   a callback attaches right away but does not receive the in-progress
///   value nor values queued before it. An `unsubscribe` stops delivery
///   before the next notification.
///
/// # Example
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxreplay::prelude::*;
///
/// let subject = Subject::<i32, ()>::new();
/// let results = Rc::new(RefCell::new(vec![]));
/// let c_results = results.clone();
///
/// subject.clone().subscribe(move |v| c_results.borrow_mut().push(v));
///
/// subject.clone().next(1);
/// subject.clone().next(2);
/// assert_eq!(*results.borrow(), vec![1, 2]);
/// ```
pub struct Subject<'a, Item, Err> {
  core: MutRc<SubjectCore<'a, Item, Err>>,
}

impl<'a, Item, Err> Subject<'a, Item, Err> {
  pub fn new() -> Self { Self { core: MutRc::default() } }

  /// Get the number of current subscribers.
  pub fn subscriber_count(&self) -> usize { self.core.rc_deref().subscribers.len() }

  /// Check if there are no subscribers.
  pub fn is_empty(&self) -> bool { self.subscriber_count() == 0 }

  /// `true` once `complete` or `error` has been called.
  pub fn is_stopped(&self) -> bool { self.core.rc_deref().terminal.is_stopped() }

  /// Number of values accepted so far.
  pub(crate) fn emitted(&self) -> u64 { self.core.rc_deref().emitted }

  pub fn downgrade(&self) -> WeakSubject<'a, Item, Err> {
    WeakSubject { core: self.core.downgrade() }
  }
}

impl<'a, Item, Err: Clone> Subject<'a, Item, Err> {
  pub fn terminal_state(&self) -> TerminalState<Err> { self.core.rc_deref().terminal.clone() }

  /// Attaches `observer` so it receives values numbered `since` and later.
  ///
  /// On a stopped subject the recorded terminal signal is delivered right
  /// away and the returned subscription is already closed.
  pub(crate) fn subscribe_since(
    &self, observer: BoxedObserver<'a, Item, Err>, since: u64,
  ) -> SubjectSubscription<'a, Item, Err> {
    if observer.is_closed() {
      return SubjectSubscription::closed();
    }
    let terminal = {
      let mut core = self.core.rc_deref_mut();
      if core.terminal.is_active() {
        let slot = Slot::new(observer, since);
        let id = core.subscribers.add(slot.clone());
        trace!(id, since, "observer subscribed");
        return SubjectSubscription::new(self.core.clone(), id, slot);
      }
      core.terminal.clone()
    };
    match terminal {
      TerminalState::Active => {}
      TerminalState::Completed => observer.complete(),
      TerminalState::Failed(err) => observer.error(err),
    }
    trace!("late observer received the terminal signal");
    SubjectSubscription::closed()
  }
}

impl<'a, Item: Clone, Err: Clone> Subject<'a, Item, Err> {
  /// Sends `value` to every current observer. Dropped once stopped.
  pub fn emit(&self, value: Item) {
    {
      let mut core = self.core.rc_deref_mut();
      if core.terminal.is_stopped() {
        trace!("value dropped, subject already stopped");
        return;
      }
      let seq = core.emitted;
      core.emitted += 1;
      core.pending.push_back(Event::Next(seq, value));
    }
    self.dispatch();
  }

  /// Completes every observer and stops the subject. Ignored if the subject
  /// has already stopped.
  pub fn emit_complete(&self) {
    {
      let mut core = self.core.rc_deref_mut();
      if core.terminal.is_stopped() {
        trace!("completion ignored, subject already stopped");
        return;
      }
      core.terminal = TerminalState::Completed;
      core.pending.push_back(Event::Complete);
    }
    debug!("subject completed");
    self.dispatch();
  }

  /// Sends `err` to every observer and stops the subject. Ignored if the
  /// subject has already stopped.
  pub fn emit_error(&self, err: Err) {
    {
      let mut core = self.core.rc_deref_mut();
      if core.terminal.is_stopped() {
        trace!("error ignored, subject already stopped");
        return;
      }
      core.terminal = TerminalState::Failed(err.clone());
      core.pending.push_back(Event::Error(err));
    }
    debug!("subject failed");
    self.dispatch();
  }

  /// Delivers queued notifications, unless an outer call on this thread is
  /// already doing so.
  fn dispatch(&self) {
    {
      let mut core = self.core.rc_deref_mut();
      if core.dispatching {
        trace!(pending = core.pending.len(), "re-entrant emission queued");
        return;
      }
      core.dispatching = true;
    }
    let _guard = DispatchGuard(&self.core);
    loop {
      let (event, targets) = {
        let mut core = self.core.rc_deref_mut();
        let Some(event) = core.pending.pop_front() else { break };
        let targets = match &event {
          Event::Next(seq, _) => core.subscribers.value_targets(*seq),
          Event::Error(_) | Event::Complete => core.subscribers.drain_all(),
        };
        (event, targets)
      };
      match event {
        Event::Next(_, value) => broadcast_value(&targets, value),
        Event::Error(err) => broadcast_error(targets, err),
        Event::Complete => broadcast_complete(targets),
      }
    }
  }
}

/// Clears the dispatching flag even if an observer panics mid-delivery.
struct DispatchGuard<'g, 'a, Item, Err>(&'g MutRc<SubjectCore<'a, Item, Err>>);

impl<'g, 'a, Item, Err> Drop for DispatchGuard<'g, 'a, Item, Err> {
  fn drop(&mut self) {
    if let Some(mut core) = self.0.try_rc_deref_mut() {
      core.dispatching = false;
    }
  }
}

// ============================================================================
// Standard Traits
// ============================================================================

impl<'a, Item, Err> Clone for Subject<'a, Item, Err> {
  fn clone(&self) -> Self { Self { core: self.core.clone() } }
}

impl<'a, Item, Err> Default for Subject<'a, Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<'a, Item, Err> std::fmt::Debug for Subject<'a, Item, Err> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subject")
      .field("subscribers", &self.subscriber_count())
      .field("stopped", &self.is_stopped())
      .finish()
  }
}

impl<'a, Item: Clone, Err: Clone> Observer<Item, Err> for Subject<'a, Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { self.emit(value) }

  #[inline]
  fn error(self, err: Err) { self.emit_error(err) }

  #[inline]
  fn complete(self) { self.emit_complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.is_stopped() }
}

impl<'a, Item, Err: Clone> Observable<'a, Item, Err> for Subject<'a, Item, Err> {
  type Unsub = SubjectSubscription<'a, Item, Err>;

  fn subscribe_with<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'a,
  {
    let since = self.emitted();
    self.subscribe_since(Box::new(observer), since)
  }
}

/// Non-owning handle to a [`Subject`].
pub struct WeakSubject<'a, Item, Err> {
  core: WeakMutRc<SubjectCore<'a, Item, Err>>,
}

impl<'a, Item, Err> WeakSubject<'a, Item, Err> {
  pub fn upgrade(&self) -> Option<Subject<'a, Item, Err>> {
    self.core.upgrade().map(|core| Subject { core })
  }
}

impl<'a, Item, Err> Clone for WeakSubject<'a, Item, Err> {
  fn clone(&self) -> Self { Self { core: self.core.clone() } }
}

// ============================================================================
// Tests
// ============================================================================
