use std::fmt;

use tracing::trace;

use super::{
  capacity::BufferCapacity,
  replay_buffer::{ReplayBuffer, Snapshot},
  replay_source::ReplaySource,
  subject_core::{Subject, TerminalState, WeakSubject},
  subject_subscription::SubjectSubscription,
};
use crate::{
  error::{Result, RxError},
  observable::Observable,
  observer::Observer,
  rc::{MutRc, WeakMutRc},
};

/// A [`Subject`] that replays its most recent values to new subscribers.
///
/// Every value passed to `next` is stored in a bounded buffer before it is
/// multicast. A subscriber first receives the buffered values, oldest first,
/// then continues with live values and the terminal signal. The buffer stops
/// changing once the subject completes or fails; late subscribers still get
/// the buffered values followed by that signal.
///
/// Like [`Subject`], clones share state: keep one handle for emitting and
/// clone it for each `subscribe`.
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxreplay::prelude::*;
///
/// let mut subject = ReplaySubject::<i32, ()>::with_capacity(3);
/// subject.next(1);
/// subject.next(2);
/// subject.next(3);
/// subject.next(4); // 1 is trimmed off
///
/// let seen = Rc::new(RefCell::new(vec![]));
/// let c_seen = seen.clone();
/// subject.clone().subscribe(move |v| c_seen.borrow_mut().push(v));
/// assert_eq!(*seen.borrow(), vec![2, 3, 4]);
///
/// // Values pushed after the subscribe are delivered immediately.
/// subject.next(5);
/// assert_eq!(*seen.borrow(), vec![2, 3, 4, 5]);
/// ```
pub struct ReplaySubject<'a, Item, Err> {
  buffer: MutRc<ReplayBuffer<Item>>,
  subject: Subject<'a, Item, Err>,
}

impl<'a, Item, Err> ReplaySubject<'a, Item, Err> {
  /// Creates a subject that keeps every value.
  pub fn new() -> Self { Self::with_capacity(BufferCapacity::UNBOUNDED) }

  /// Creates a subject that keeps the last `capacity` values.
  pub fn with_capacity(capacity: impl Into<BufferCapacity>) -> Self {
    let capacity = capacity.into();
    trace!(%capacity, "replay subject created");
    Self { buffer: MutRc::own(ReplayBuffer::new(capacity)), subject: Subject::new() }
  }

  /// Like [`with_capacity`](Self::with_capacity), for capacities that may not
  /// be numbers at all (`f64`, text).
  ///
  /// Fails with [`RxError::InvalidArgument`] at construction, never later.
  pub fn try_with_capacity<C>(capacity: C) -> Result<Self>
  where
    C: TryInto<BufferCapacity, Error = RxError>,
  {
    Ok(Self::with_capacity(capacity.try_into()?))
  }

  pub fn capacity(&self) -> BufferCapacity { self.buffer.rc_deref().capacity() }

  /// Number of values currently held for replay.
  pub fn buffered_len(&self) -> usize { self.buffer.rc_deref().len() }

  pub fn subscriber_count(&self) -> usize { self.subject.subscriber_count() }

  /// `true` once `complete` or `error` has been called.
  pub fn is_stopped(&self) -> bool { self.subject.is_stopped() }

  pub fn downgrade(&self) -> WeakReplaySubject<'a, Item, Err> {
    WeakReplaySubject { buffer: self.buffer.downgrade(), subject: self.subject.downgrade() }
  }
}

impl<'a, Item: Clone, Err> ReplaySubject<'a, Item, Err> {
  /// The values a subscriber would be replayed right now.
  pub fn buffered(&self) -> Snapshot<Item> { self.buffer.rc_deref_mut().snapshot() }
}

impl<'a, Item, Err: Clone> ReplaySubject<'a, Item, Err> {
  pub fn terminal_state(&self) -> TerminalState<Err> { self.subject.terminal_state() }
}

impl<'a, Item: Clone, Err: Clone> ReplaySubject<'a, Item, Err> {
  fn push(&self, value: Item) {
    if self.subject.is_stopped() {
      trace!("value dropped, replay subject already stopped");
      return;
    }
    // The buffer is updated first so a subscription made while the value is
    // being delivered already sees it in the backlog.
    self.buffer.rc_deref_mut().append(value.clone());
    self.subject.emit(value);
  }

  fn finish(&self, err: Option<Err>) {
    if self.subject.is_stopped() {
      return;
    }
    self.buffer.rc_deref_mut().freeze();
    match err {
      Some(err) => self.subject.emit_error(err),
      None => self.subject.emit_complete(),
    }
  }
}

impl<'a, Item: Clone, Err: Clone> Observer<Item, Err> for ReplaySubject<'a, Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { self.push(value) }

  #[inline]
  fn error(self, err: Err) { self.finish(Some(err)) }

  #[inline]
  fn complete(self) { self.finish(None) }

  #[inline]
  fn is_closed(&self) -> bool { self.is_stopped() }
}

impl<'a, Item, Err> Observable<'a, Item, Err> for ReplaySubject<'a, Item, Err>
where
  Item: Clone + 'a,
  Err: Clone + 'a,
{
  type Unsub = SubjectSubscription<'a, Item, Err>;

  fn subscribe_with<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'a,
  {
    ReplaySource { buffer: &self.buffer, subject: &self.subject }.subscribe(observer)
  }
}

impl<'a, Item, Err> Clone for ReplaySubject<'a, Item, Err> {
  fn clone(&self) -> Self { Self { buffer: self.buffer.clone(), subject: self.subject.clone() } }
}

impl<'a, Item, Err> Default for ReplaySubject<'a, Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<'a, Item, Err> fmt::Display for ReplaySubject<'a, Item, Err> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("ReplaySubject") }
}

impl<'a, Item, Err> fmt::Debug for ReplaySubject<'a, Item, Err> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ReplaySubject")
      .field("capacity", &self.capacity())
      .field("buffered", &self.buffered_len())
      .field("subscribers", &self.subscriber_count())
      .field("stopped", &self.is_stopped())
      .finish()
  }
}

/// Non-owning handle to a [`ReplaySubject`].
///
/// Operations through a handle whose subject has been dropped fail with
/// [`RxError::InvalidReceiver`] instead of acting on stale state.
pub struct WeakReplaySubject<'a, Item, Err> {
  buffer: WeakMutRc<ReplayBuffer<Item>>,
  subject: WeakSubject<'a, Item, Err>,
}

impl<'a, Item, Err> WeakReplaySubject<'a, Item, Err> {
  pub fn upgrade(&self) -> Option<ReplaySubject<'a, Item, Err>> {
    Some(ReplaySubject { buffer: self.buffer.upgrade()?, subject: self.subject.upgrade()? })
  }

  fn live(&self) -> Result<ReplaySubject<'a, Item, Err>> {
    self.upgrade().ok_or(RxError::InvalidReceiver("ReplaySubject"))
  }
}

impl<'a, Item: Clone, Err: Clone> WeakReplaySubject<'a, Item, Err> {
  pub fn try_next(&self, value: Item) -> Result<()> {
    self.live()?.push(value);
    Ok(())
  }

  pub fn try_complete(&self) -> Result<()> {
    self.live()?.finish(None);
    Ok(())
  }

  pub fn try_error(&self, err: Err) -> Result<()> {
    self.live()?.finish(Some(err));
    Ok(())
  }

  pub fn try_subscribe<O>(&self, observer: O) -> Result<SubjectSubscription<'a, Item, Err>>
  where
    O: Observer<Item, Err> + 'a,
    Item: 'a,
    Err: 'a,
  {
    Ok(self.live()?.subscribe_with(observer))
  }
}

impl<'a, Item, Err> Clone for WeakReplaySubject<'a, Item, Err> {
  fn clone(&self) -> Self { Self { buffer: self.buffer.clone(), subject: self.subject.clone() } }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;
  use crate::subscription::Subscription;

  #[derive(Debug, Clone, PartialEq)]
  enum Note<T> {
    Next(T),
    Error(&'static str),
    Complete,
  }

  type Log<T> = Rc<RefCell<Vec<Note<T>>>>;

  fn record<T: Clone + 'static>(
    subject: &ReplaySubject<'static, T, &'static str>,
  ) -> (Log<T>, SubjectSubscription<'static, T, &'static str>) {
    let log: Log<T> = Rc::new(RefCell::new(vec![]));
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    let sub = subject.clone().subscribe_all(
      move |v| l1.borrow_mut().push(Note::Next(v)),
      move |e| l2.borrow_mut().push(Note::Error(e)),
      move || l3.borrow_mut().push(Note::Complete),
    );
    (log, sub)
  }

  #[test]
  fn replays_trimmed_backlog() {
    let mut subject = ReplaySubject::with_capacity(2);
    subject.next("first");
    subject.next("second");
    subject.next("third");
    let (log, _) = record(&subject);

    assert_eq!(*log.borrow(), vec![Note::Next("second"), Note::Next("third")]);
  }

  #[test]
  fn unbounded_replays_everything() {
    let mut subject = ReplaySubject::new();
    subject.next("first");
    subject.next("second");
    subject.next("third");
    let (log, _) = record(&subject);

    assert_eq!(
      *log.borrow(),
      vec![Note::Next("first"), Note::Next("second"), Note::Next("third")]
    );
    assert!(subject.capacity().is_unbounded());
  }

  #[test]
  fn next_reaches_existing_subscribers() {
    let mut subject = ReplaySubject::with_capacity(2);
    let (log, _) = record(&subject);
    subject.next("foo");
    subject.next("bar");

    assert_eq!(*log.borrow(), vec![Note::Next("foo"), Note::Next("bar")]);
  }

  #[test]
  fn error_passes_through() {
    let mut subject = ReplaySubject::with_capacity(2);
    let (log, _) = record(&subject);
    subject.next("foo");
    subject.clone().error("test error");

    assert_eq!(*log.borrow(), vec![Note::Next("foo"), Note::Error("test error")]);
  }

  #[test]
  fn error_is_replayed_to_late_subscribers() {
    let mut subject = ReplaySubject::with_capacity(2);
    subject.clone().subscribe_err(|_| {}, |_| {});
    subject.next("foo");
    subject.clone().error("test error");
    let (log, sub) = record(&subject);

    assert_eq!(*log.borrow(), vec![Note::Next("foo"), Note::Error("test error")]);
    assert!(sub.is_closed());
    assert_eq!(subject.terminal_state(), TerminalState::Failed("test error"));
  }

  #[test]
  fn complete_is_replayed_to_late_subscribers() {
    let mut subject = ReplaySubject::with_capacity(2);
    subject.next("first");
    subject.next("second");
    subject.clone().complete();
    let (log, _) = record(&subject);

    assert_eq!(
      *log.borrow(),
      vec![Note::Next("first"), Note::Next("second"), Note::Complete]
    );
  }

  #[test]
  fn buffer_freezes_after_terminal() {
    let mut subject = ReplaySubject::<_, &'static str>::with_capacity(4);
    subject.next(1);
    subject.clone().complete();
    subject.next(2);
    subject.clone().error("ignored");

    assert_eq!(subject.buffered().as_slice(), &[1]);
    assert_eq!(subject.terminal_state(), TerminalState::Completed);
  }

  #[test]
  fn unsubscribe_stops_live_delivery() {
    let mut subject = ReplaySubject::with_capacity(3);
    subject.next(1);
    let (log, sub) = record(&subject);
    subject.next(2);
    sub.unsubscribe();
    subject.next(3);

    assert_eq!(*log.borrow(), vec![Note::Next(1), Note::Next(2)]);
    assert_eq!(subject.subscriber_count(), 0);
  }

  #[test]
  fn weak_handle_rejects_dead_receiver() {
    let subject = ReplaySubject::<i32, &'static str>::with_capacity(1);
    let weak = subject.downgrade();
    assert_eq!(weak.try_next(1), Ok(()));
    assert_eq!(subject.buffered().as_slice(), &[1]);

    drop(subject);
    assert_eq!(weak.try_next(2), Err(RxError::InvalidReceiver("ReplaySubject")));
    assert_eq!(weak.try_complete(), Err(RxError::InvalidReceiver("ReplaySubject")));
    assert_eq!(weak.try_error("x"), Err(RxError::InvalidReceiver("ReplaySubject")));
    assert!(weak.try_subscribe(crate::observer::FnMutObserver(|_: i32| {})).is_err());
  }

  #[test]
  fn invalid_capacity_fails_at_construction() {
    let err = ReplaySubject::<i32, ()>::try_with_capacity("many").map(|_| ());
    assert!(matches!(err, Err(RxError::InvalidArgument(_))));
    let err = ReplaySubject::<i32, ()>::try_with_capacity(f64::NAN).map(|_| ());
    assert!(matches!(err, Err(RxError::InvalidArgument(_))));

    let subject = ReplaySubject::<i32, ()>::try_with_capacity(0.0_f64);
    assert_eq!(subject.map(|s| s.capacity().get()), Ok(1));
  }

  #[test]
  fn values_evicted_during_replay_still_arrive() {
    let mut subject = ReplaySubject::<i32, &'static str>::with_capacity(1);
    subject.next(0);

    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let mut producer = subject.clone();
    subject.clone().subscribe(move |v| {
      c_seen.borrow_mut().push(v);
      if v == 0 {
        producer.next(1);
        producer.next(2);
      }
    });
    subject.next(3);

    assert_eq!(*seen.borrow(), vec![0, 1, 2, 3]);
    assert_eq!(subject.buffered().as_slice(), &[3]);
  }

  #[test]
  fn complete_during_replay_follows_backlog() {
    let mut subject = ReplaySubject::with_capacity(3);
    subject.next(1);
    subject.next(2);

    let log: Log<i32> = Rc::new(RefCell::new(vec![]));
    let (l1, l2) = (log.clone(), log.clone());
    let mut finisher = Some(subject.clone());
    let sub = subject.clone().subscribe_all(
      move |v| {
        l1.borrow_mut().push(Note::Next(v));
        if let Some(finisher) = finisher.take() {
          finisher.complete();
        }
      },
      |_: &'static str| {},
      move || l2.borrow_mut().push(Note::Complete),
    );

    assert_eq!(*log.borrow(), vec![Note::Next(1), Note::Next(2), Note::Complete]);
    assert!(sub.is_closed());
    assert!(subject.is_stopped());
  }

  #[test]
  fn string_tag() {
    let subject = ReplaySubject::<i32, ()>::new();
    assert_eq!(subject.to_string(), "ReplaySubject");
    assert!(format!("{subject:?}").starts_with("ReplaySubject {"));
  }
}
