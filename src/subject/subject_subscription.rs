use std::rc::Rc;

use tracing::trace;

use super::{subject_core::SubjectCore, subscribers::Slot};
use crate::{rc::MutRc, subscription::Subscription};

/// Subscription handle for a Subject.
///
/// This struct represents an observer attached to a Subject. Unsubscribing
/// removes the observer from the Subject; dropping the handle does not (use
/// [`Subscription::unsubscribe_when_dropped`] for that).
///
/// # Design
///
/// - **Shared Ownership**: Holds a reference-counted pointer to the Subject's
///   state, not a borrow of the Subject itself.
/// - **Closed handles**: Subscribing to a stopped subject, or with an
///   observer that is already closed, yields a handle that is closed from the
///   start.
pub struct SubjectSubscription<'a, Item, Err> {
  attached: Option<Attached<'a, Item, Err>>,
}

struct Attached<'a, Item, Err> {
  core: MutRc<SubjectCore<'a, Item, Err>>,
  id: usize,
  slot: Rc<Slot<'a, Item, Err>>,
}

impl<'a, Item, Err> SubjectSubscription<'a, Item, Err> {
  pub(crate) fn new(
    core: MutRc<SubjectCore<'a, Item, Err>>, id: usize, slot: Rc<Slot<'a, Item, Err>>,
  ) -> Self {
    Self { attached: Some(Attached { core, id, slot }) }
  }

  pub(crate) fn closed() -> Self { Self { attached: None } }
}

impl<'a, Item, Err> Subscription for SubjectSubscription<'a, Item, Err> {
  fn unsubscribe(self) {
    let Some(Attached { core, id, slot }) = self.attached else { return };
    if slot.is_closed() {
      return;
    }
    slot.close();
    // Closed slots are pruned on the next emission if the list is busy.
    if let Some(mut core) = core.try_rc_deref_mut() {
      core.subscribers.remove(id);
    }
    trace!(id, "observer unsubscribed");
  }

  fn is_closed(&self) -> bool { self.attached.as_ref().map_or(true, |a| a.slot.is_closed()) }
}
