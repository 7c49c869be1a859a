use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use tracing::trace;

use super::{
  replay_buffer::ReplayBuffer, subject_core::Subject, subject_subscription::SubjectSubscription,
};
use crate::{observer::Observer, rc::MutRc, subscription::Subscription};

/// Replays a buffer's backlog to one observer, then hands it to the live
/// subject.
///
/// The observer is attached to the subject before replay starts, right after
/// the last value the snapshot covers. Whatever the subject sends while the
/// backlog is still being replayed, including values emitted from the
/// observer's own callbacks, is held back and delivered once replay is done.
/// Values evicted from the buffer in the meantime still arrive.
pub(crate) struct ReplaySource<'s, 'a, Item, Err> {
  pub(crate) buffer: &'s MutRc<ReplayBuffer<Item>>,
  pub(crate) subject: &'s Subject<'a, Item, Err>,
}

enum Held<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

struct Handoff<Item, Err, O> {
  held: RefCell<VecDeque<Held<Item, Err>>>,
  /// `None` until replay finishes.
  observer: RefCell<Option<O>>,
}

/// What the subject sees in place of the replaying observer.
struct HandoffObserver<Item, Err, O>(Rc<Handoff<Item, Err, O>>);

impl<Item, Err, O> Observer<Item, Err> for HandoffObserver<Item, Err, O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    match self.0.observer.borrow_mut().as_mut() {
      Some(observer) => observer.next(value),
      None => self.0.held.borrow_mut().push_back(Held::Next(value)),
    }
  }

  fn error(self, err: Err) {
    let observer = self.0.observer.borrow_mut().take();
    match observer {
      Some(observer) => observer.error(err),
      None => self.0.held.borrow_mut().push_back(Held::Error(err)),
    }
  }

  fn complete(self) {
    let observer = self.0.observer.borrow_mut().take();
    match observer {
      Some(observer) => observer.complete(),
      None => self.0.held.borrow_mut().push_back(Held::Complete),
    }
  }

  fn is_closed(&self) -> bool {
    self.0.observer.try_borrow().map_or(false, |o| o.as_ref().map_or(false, |o| o.is_closed()))
  }
}

impl<'s, 'a, Item, Err> ReplaySource<'s, 'a, Item, Err>
where
  Item: Clone + 'a,
  Err: Clone + 'a,
{
  pub(crate) fn subscribe<O>(&self, mut observer: O) -> SubjectSubscription<'a, Item, Err>
  where
    O: Observer<Item, Err> + 'a,
  {
    if observer.is_closed() {
      return SubjectSubscription::closed();
    }
    let snapshot = self.buffer.rc_deref_mut().snapshot();
    let handoff = Rc::new(Handoff { held: RefCell::default(), observer: RefCell::new(None) });
    let subscription =
      self.subject.subscribe_since(Box::new(HandoffObserver(handoff.clone())), snapshot.end());

    for value in &snapshot {
      if observer.is_closed() {
        trace!("observer closed during replay");
        subscription.unsubscribe();
        return SubjectSubscription::closed();
      }
      observer.next(value.clone());
    }
    trace!(replayed = snapshot.len(), "backlog replayed");

    loop {
      let held = handoff.held.borrow_mut().pop_front();
      let Some(held) = held else { break };
      if observer.is_closed() {
        subscription.unsubscribe();
        return SubjectSubscription::closed();
      }
      match held {
        Held::Next(value) => observer.next(value),
        Held::Error(err) => {
          observer.error(err);
          return subscription;
        }
        Held::Complete => {
          observer.complete();
          return subscription;
        }
      }
    }

    if observer.is_closed() {
      subscription.unsubscribe();
      return SubjectSubscription::closed();
    }
    *handoff.observer.borrow_mut() = Some(observer);
    subscription
  }
}
