use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use smallvec::SmallVec;

use crate::{
  observer::{BoxedObserver, Observer},
  subscription::DynamicSubscriptions,
};

/// Observers selected for one delivery. Collected up front so no borrow of
/// the subject is held while callbacks run.
pub(crate) type Targets<'a, Item, Err> = SmallVec<[Rc<Slot<'a, Item, Err>>; 2]>;

/// One observer attached to a subject.
///
/// `since` is the sequence number of the first value this observer takes
/// live. Everything older reached it through replay, or predates it.
pub(crate) struct Slot<'a, Item, Err> {
  observer: RefCell<Option<BoxedObserver<'a, Item, Err>>>,
  closed: Cell<bool>,
  since: u64,
}

impl<'a, Item, Err> Slot<'a, Item, Err> {
  pub(crate) fn new(observer: BoxedObserver<'a, Item, Err>, since: u64) -> Rc<Self> {
    Rc::new(Self { observer: RefCell::new(Some(observer)), closed: Cell::new(false), since })
  }

  #[inline]
  pub(crate) fn is_closed(&self) -> bool { self.closed.get() }

  /// Detaches the observer. Safe to call from inside the observer's own
  /// callback: the observer is then dropped once that callback returns.
  pub(crate) fn close(&self) {
    self.closed.set(true);
    if let Ok(mut observer) = self.observer.try_borrow_mut() {
      observer.take();
    }
  }

  fn next(&self, value: Item) {
    if self.closed.get() {
      return;
    }
    let mut guard = self.observer.borrow_mut();
    let Some(observer) = guard.as_mut() else { return };
    if !observer.is_closed() {
      observer.next(value);
    }
    if self.closed.get() || observer.is_closed() {
      self.closed.set(true);
      guard.take();
    }
  }

  fn take_for_terminal(&self) -> Option<BoxedObserver<'a, Item, Err>> {
    if self.closed.replace(true) {
      return None;
    }
    self.observer.borrow_mut().take().filter(|o| !o.is_closed())
  }
}

/// Subscribers container using DynamicSubscriptions for ID-based management.
///
/// This struct holds the observers subscribed to the Subject and adds the
/// broadcast functionality on top of `DynamicSubscriptions`.
pub(crate) struct Subscribers<'a, Item, Err> {
  inner: DynamicSubscriptions<Rc<Slot<'a, Item, Err>>>,
}

impl<'a, Item, Err> Default for Subscribers<'a, Item, Err> {
  fn default() -> Self { Self { inner: DynamicSubscriptions::default() } }
}

impl<'a, Item, Err> Subscribers<'a, Item, Err> {
  /// Add a slot and return its unique ID.
  #[inline]
  pub(crate) fn add(&mut self, slot: Rc<Slot<'a, Item, Err>>) -> usize { self.inner.add(slot) }

  /// Remove a slot by ID.
  #[inline]
  pub(crate) fn remove(&mut self, id: usize) -> Option<Rc<Slot<'a, Item, Err>>> {
    self.inner.remove(id)
  }

  /// Number of observers still attached.
  pub(crate) fn len(&self) -> usize { self.inner.iter().filter(|s| !s.is_closed()).count() }

  /// Slots that should receive the value with sequence number `seq`.
  ///
  /// Closed slots are pruned on the way.
  pub(crate) fn value_targets(&mut self, seq: u64) -> Targets<'a, Item, Err> {
    self.inner.retain(|s| !s.is_closed());
    self.inner.iter().filter(|s| s.since <= seq).cloned().collect()
  }

  /// Every slot, leaving the container empty. Used for terminal signals.
  pub(crate) fn drain_all(&mut self) -> Targets<'a, Item, Err> {
    self.inner.drain().filter(|s| !s.is_closed()).collect()
  }
}

/// Broadcast value to all targets with optimal cloning.
///
/// The value is cloned for every target except the last one, which receives
/// the moved value.
pub(crate) fn broadcast_value<Item: Clone, Err>(targets: &Targets<'_, Item, Err>, value: Item) {
  let mut iter = targets.iter().peekable();
  while let Some(slot) = iter.next() {
    if iter.peek().is_some() {
      slot.next(value.clone());
    } else {
      slot.next(value);
      break;
    }
  }
}

/// Broadcast error to all targets, detaching each of them.
///
/// Each slot is taken only when its turn comes, so an observer unsubscribed
/// by an earlier error handler is skipped. The error is cloned for every
/// target except the last one.
pub(crate) fn broadcast_error<Item, Err: Clone>(targets: Targets<'_, Item, Err>, err: Err) {
  let Some((last, rest)) = targets.split_last() else { return };
  for slot in rest {
    if let Some(observer) = slot.take_for_terminal() {
      observer.error(err.clone());
    }
  }
  if let Some(observer) = last.take_for_terminal() {
    observer.error(err);
  }
}

/// Broadcast completion to all targets, detaching each of them.
pub(crate) fn broadcast_complete<Item, Err>(targets: Targets<'_, Item, Err>) {
  for slot in targets.iter() {
    if let Some(observer) = slot.take_for_terminal() {
      observer.complete();
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;
  use crate::observer::FnMutObserver;

  fn recording_slot(since: u64) -> (Rc<Slot<'static, i32, ()>>, Rc<RefCell<Vec<i32>>>) {
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let slot = Slot::new(Box::new(FnMutObserver(move |v: i32| c_seen.borrow_mut().push(v))), since);
    (slot, seen)
  }

  #[test]
  fn value_targets_respect_since() {
    let mut subscribers = Subscribers::default();
    let (early, early_seen) = recording_slot(0);
    let (late, late_seen) = recording_slot(2);
    subscribers.add(early);
    subscribers.add(late);

    for seq in 0..3 {
      let targets = subscribers.value_targets(seq);
      broadcast_value(&targets, seq as i32);
    }

    assert_eq!(*early_seen.borrow(), vec![0, 1, 2]);
    assert_eq!(*late_seen.borrow(), vec![2]);
  }

  #[test]
  fn closed_slots_are_pruned() {
    let mut subscribers = Subscribers::default();
    let (slot, seen) = recording_slot(0);
    subscribers.add(slot.clone());
    assert_eq!(subscribers.len(), 1);

    slot.close();
    assert_eq!(subscribers.len(), 0);
    assert!(subscribers.value_targets(0).is_empty());
    assert!(seen.borrow().is_empty());
  }

  #[test]
  fn terminal_reaches_each_slot_once() {
    let completed = Rc::new(Cell::new(0));
    let mut subscribers: Subscribers<'_, i32, ()> = Subscribers::default();
    for _ in 0..3 {
      let completed = completed.clone();
      let observer = crate::observer::AllObserver {
        next: |_: i32| {},
        error: |_: ()| {},
        complete: move || completed.set(completed.get() + 1),
      };
      subscribers.add(Slot::new(Box::new(observer), 0));
    }

    let targets = subscribers.drain_all();
    broadcast_complete(targets.clone());
    broadcast_complete(targets);
    assert_eq!(completed.get(), 3);
    assert_eq!(subscribers.len(), 0);
  }
}
