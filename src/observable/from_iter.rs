use std::marker::PhantomData;

use super::Observable;
use crate::observer::Observer;

/// Creates an observable that produces values from an iterator.
///
/// Completes when all elements have been emitted. Never emits an error. The
/// error type is left to the caller so the source can feed any observer,
/// including a subject.
///
/// Emission stops early, without completing, if the observer reports
/// `is_closed()`.
///
/// # Examples
///
/// ```
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxreplay::prelude::*;
///
/// let seen = Rc::new(RefCell::new(vec![]));
/// let c_seen = seen.clone();
/// observable::from_iter::<_, ()>(0..3).subscribe(move |v| c_seen.borrow_mut().push(v));
/// assert_eq!(*seen.borrow(), vec![0, 1, 2]);
/// ```
pub fn from_iter<Iter, Err>(iter: Iter) -> ObservableIter<Iter, Err>
where
  Iter: IntoIterator,
{
  ObservableIter { iter, _err: PhantomData }
}

/// Creates an observable that emits a single value, then completes.
pub fn of<Item, Err>(value: Item) -> ObservableIter<std::iter::Once<Item>, Err> {
  from_iter(std::iter::once(value))
}

pub struct ObservableIter<Iter, Err> {
  iter: Iter,
  _err: PhantomData<fn() -> Err>,
}

impl<Iter: Clone, Err> Clone for ObservableIter<Iter, Err> {
  fn clone(&self) -> Self { Self { iter: self.iter.clone(), _err: PhantomData } }
}

impl<'a, Iter, Err> Observable<'a, Iter::Item, Err> for ObservableIter<Iter, Err>
where
  Iter: IntoIterator,
{
  type Unsub = ();

  fn subscribe_with<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<Iter::Item, Err> + 'a,
  {
    for v in self.iter {
      if observer.is_closed() {
        return;
      }
      observer.next(v);
    }
    observer.complete();
  }
}
